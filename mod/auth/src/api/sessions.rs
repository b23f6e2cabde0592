use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};

use openhr_core::ServiceError;

use crate::api::AppState;
use crate::api::middleware::extract_bearer;
use crate::model::{LoginRequest, LogoutRequest, RefreshRequest, TokenPair};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

/// POST /auth/login — verify credentials, return a token pair.
async fn login(
    State(svc): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ServiceError> {
    let pair = svc
        .login(&body.email, &body.password)
        .map_err(ServiceError::from)?;
    Ok(Json(pair))
}

/// POST /auth/refresh — rotate a refresh token into a new pair.
async fn refresh(
    State(svc): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ServiceError> {
    let pair = svc
        .refresh(&body.refresh_token)
        .map_err(ServiceError::from)?;
    Ok(Json(pair))
}

/// POST /auth/logout — invalidate refresh tokens. Always 200.
///
/// With a `{"refresh_token": ...}` body, only that token is touched.
/// With no body (or no token in it), every live token of the caller is
/// invalidated. Unauthenticated calls without a body are a harmless
/// no-op, so the body is read manually instead of through an extractor
/// that would reject emptiness.
async fn logout(
    State(svc): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let from_body = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str::<LogoutRequest>(&body)
            .ok()
            .and_then(|req| req.refresh_token)
    };

    if let Some(token) = from_body {
        svc.logout(&token).map_err(ServiceError::from)?;
        return Ok(Json(serde_json::json!({})));
    }

    // Current-session variant: best-effort principal resolution. An
    // absent or invalid token means there is nothing to invalidate.
    if let Some(access_token) = extract_bearer(&headers) {
        if let Ok(claims) = svc.verify_access_token(access_token) {
            if let Ok(Some(user)) = svc.find_user_by_email(&claims.sub) {
                svc.logout_all(&user.id).map_err(ServiceError::from)?;
            }
        }
    }

    Ok(Json(serde_json::json!({})))
}
