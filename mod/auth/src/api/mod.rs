mod me;
pub mod middleware;
mod sessions;
mod users;

use std::sync::Arc;

use axum::Router;

use openhr_core::ServiceError;

use crate::model::{Claims, User};
use crate::service::AuthService;

pub use middleware::{AuthGate, RoutePolicy, RouteRule, auth_middleware};

/// Shared application state.
pub type AppState = Arc<AuthService>;

/// Build the auth API router: session lifecycle under `/auth`, user
/// management under `/users`, plus `/me`.
///
/// The JWT middleware is NOT applied here — the server binary composes
/// the middleware pipeline once, over all modules.
pub fn build_router(svc: Arc<AuthService>) -> Router {
    Router::new()
        .merge(sessions::routes())
        .merge(users::routes())
        .merge(me::routes())
        .with_state(svc)
}

/// Resolve the backing user record for the request's claims.
///
/// Called once per request by handlers; the resolved `User` is then
/// passed down into services by reference.
pub(crate) fn current_user(svc: &AuthService, claims: &Claims) -> Result<User, ServiceError> {
    svc.find_user_by_email(&claims.sub)
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::Unauthorized("unknown principal".into()))
}
