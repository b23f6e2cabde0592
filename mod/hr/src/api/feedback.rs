use axum::extract::{Extension, Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use auth::model::Claims;
use openhr_core::ServiceError;

use crate::api::{AppState, current_user};
use crate::model::{CreateFeedback, EditFeedback};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/feedback", get(list).post(create))
        .route("/feedback/{id}", get(get_one).put(edit))
}

/// POST /feedback — create an entry; a `model` field requests polishing.
async fn create(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<CreateFeedback>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let current = current_user(&svc, &claims)?;
    let entry = svc
        .create_feedback(&current, input)
        .map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(entry).unwrap()),
    ))
}

#[derive(Debug, Deserialize)]
struct FeedbackListQuery {
    /// Whose feedback to list; defaults to the caller.
    #[serde(default)]
    user_id: Option<String>,
}

/// GET /feedback?user_id= — entries authored by or targeting a user,
/// filtered to what the caller may see.
async fn list(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<FeedbackListQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let user_id = query.user_id.unwrap_or_else(|| current.id.clone());
    let items = svc
        .list_feedback_for_user(&current, &user_id)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": items})))
}

/// GET /feedback/{id}.
async fn get_one(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let entry = svc.get_feedback(&current, &id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(entry).unwrap()))
}

/// PUT /feedback/{id} — edit text, optionally re-polish.
async fn edit(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(input): Json<EditFeedback>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let entry = svc
        .edit_feedback(&current, &id, input)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(entry).unwrap()))
}
