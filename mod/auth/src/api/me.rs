use axum::extract::{Extension, State};
use axum::routing::get;
use axum::{Json, Router};

use openhr_core::ServiceError;

use crate::api::{AppState, current_user};
use crate::model::Claims;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/me/authorities", get(my_authorities))
}

/// GET /me — the caller's own full profile.
async fn me(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let user = current_user(&svc, &claims)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}

/// GET /me/authorities — authority strings from the presented token.
async fn my_authorities(
    Extension(claims): Extension<Claims>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({"items": claims.roles}))
}
