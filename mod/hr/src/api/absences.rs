use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use auth::model::Claims;
use openhr_core::ServiceError;

use crate::api::{AppState, current_user};
use crate::model::{AbsenceStatus, SubmitAbsence};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/absences", get(list_own).post(submit))
        .route("/absences/team", get(list_team))
        .route("/absences/user/{id}", get(list_for_user))
        .route("/absences/{id}", get(get_one))
        .route("/absences/{id}/approve", post(approve))
        .route("/absences/{id}/reject", post(reject))
}

/// POST /absences — submit a request for the caller.
async fn submit(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<SubmitAbsence>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let current = current_user(&svc, &claims)?;
    let request = svc
        .submit_absence(&current, input)
        .map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(request).unwrap()),
    ))
}

/// GET /absences — the caller's own requests.
async fn list_own(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let items = svc.list_own_absences(&current).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": items})))
}

#[derive(Debug, Deserialize)]
struct TeamQuery {
    #[serde(default)]
    status: Option<AbsenceStatus>,
}

/// GET /absences/team?status= — requests of the caller's direct reports.
async fn list_team(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let items = svc
        .list_team_absences(&current, query.status)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": items})))
}

/// GET /absences/user/{id} — one user's requests (gated).
async fn list_for_user(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let items = svc
        .list_absences_for_user(&current, &id)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": items})))
}

/// GET /absences/{id}.
async fn get_one(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let request = svc.get_absence(&current, &id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(request).unwrap()))
}

/// POST /absences/{id}/approve.
async fn approve(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let request = svc
        .approve_absence(&current, &id)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(request).unwrap()))
}

/// POST /absences/{id}/reject.
async fn reject(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let request = svc
        .reject_absence(&current, &id)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(request).unwrap()))
}
