use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use openhr_core::{ListParams, ServiceError};

use crate::api::AppState;
use crate::model::AuditQuery;

/// Admin-only endpoints — the route policy restricts `/admin/` to the
/// ADMIN role before these handlers run.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/audit", get(list))
        .route("/admin/audit/export", get(export))
}

#[derive(Debug, Deserialize)]
struct AuditListQuery {
    #[serde(default)]
    actor_id: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    target_table: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_limit() -> usize {
    50
}

impl AuditListQuery {
    fn split(self) -> (AuditQuery, ListParams) {
        (
            AuditQuery {
                actor_id: self.actor_id,
                action: self.action,
                target_table: self.target_table,
                from: self.from,
                to: self.to,
            },
            ListParams {
                limit: self.limit,
                offset: self.offset,
            },
        )
    }
}

/// GET /admin/audit — filtered, paginated audit entries.
async fn list(
    State(svc): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let (filters, params) = query.split();
    let (items, total) = svc
        .list_audit(&filters, &params)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "items": items,
        "total": total,
    })))
}

/// GET /admin/audit/export — the filtered entries as CSV.
async fn export(
    State(svc): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (filters, _) = query.split();
    let csv = svc.export_audit_csv(&filters).map_err(ServiceError::from)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"audit.csv\"",
            ),
        ],
        csv,
    ))
}
