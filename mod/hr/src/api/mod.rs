mod absences;
mod audit;
mod feedback;

use std::sync::Arc;

use axum::Router;

use auth::model::{Claims, User};
use openhr_core::ServiceError;

use crate::service::HrService;

/// Shared application state.
pub type AppState = Arc<HrService>;

/// Build the HR API router: absences, feedback, admin audit endpoints.
///
/// The JWT middleware is NOT applied here — the server binary composes
/// the middleware pipeline once, over all modules.
pub fn build_router(svc: Arc<HrService>) -> Router {
    Router::new()
        .merge(absences::routes())
        .merge(feedback::routes())
        .merge(audit::routes())
        .with_state(svc)
}

/// Resolve the backing user record for the request's claims, once per
/// request.
pub(crate) fn current_user(svc: &HrService, claims: &Claims) -> Result<User, ServiceError> {
    svc.auth_service()
        .find_user_by_email(&claims.sub)
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::Unauthorized("unknown principal".into()))
}
