//! Route registration — module routes, system endpoints and the
//! middleware pipeline, composed once at startup.

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::get;

use auth::api::{AuthGate, RoutePolicy, RouteRule, auth_middleware};
use auth::model::Role;

/// The route policy table. Order matters: specific patterns first.
pub fn route_policy() -> RoutePolicy {
    let staff = vec![Role::Employee, Role::Manager, Role::Admin];
    RoutePolicy::new(RouteRule::Authenticated)
        // Session lifecycle is public; logout resolves its own principal.
        .route("/auth/login", RouteRule::Public)
        .route("/auth/refresh", RouteRule::Public)
        .route("/auth/logout", RouteRule::Public)
        .route("/health", RouteRule::Public)
        .route("/version", RouteRule::Public)
        // Admin area.
        .route("/admin/", RouteRule::AnyRole(vec![Role::Admin]))
        // Registration and absence decisions are manager/admin work.
        .route(
            "/users/register",
            RouteRule::AnyRole(vec![Role::Manager, Role::Admin]),
        )
        .route(
            "/absences/*/approve",
            RouteRule::AnyRole(vec![Role::Manager, Role::Admin]),
        )
        .route(
            "/absences/*/reject",
            RouteRule::AnyRole(vec![Role::Manager, Role::Admin]),
        )
        // Everything else in the application needs a staff role.
        .route("/users", RouteRule::AnyRole(staff.clone()))
        .route("/me", RouteRule::AnyRole(staff.clone()))
        .route("/absences", RouteRule::AnyRole(staff.clone()))
        .route("/feedback", RouteRule::AnyRole(staff))
}

/// Build the complete router: system endpoints, module routes, then the
/// middleware pipeline (request log outermost, then the auth gate).
pub fn build_router(
    module_routes: Vec<(String, Router)>,
    gate: AuthGate,
) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for (name, router) in module_routes {
        tracing::info!(module = %name, "mounting module routes");
        app = app.merge(router);
    }

    app.layer(middleware::from_fn_with_state(gate, auth_middleware))
        .layer(middleware::from_fn(log_requests))
}

/// Request log line: method, path, status. Deliberately nothing else —
/// no headers, no bodies, no query strings that could carry tokens.
async fn log_requests(request: Request, next: Next) -> axum::response::Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    tracing::debug!(%method, path = %path, status = %response.status(), "request");
    response
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "openhrd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_covers_the_surface() {
        let p = route_policy();
        assert!(matches!(p.rule_for("/auth/login"), RouteRule::Public));
        assert!(matches!(p.rule_for("/auth/refresh"), RouteRule::Public));
        assert!(matches!(p.rule_for("/health"), RouteRule::Public));
        assert!(matches!(p.rule_for("/admin/audit"), RouteRule::AnyRole(_)));
        assert!(matches!(p.rule_for("/admin/audit/export"), RouteRule::AnyRole(_)));
        assert!(matches!(p.rule_for("/users/register"), RouteRule::AnyRole(_)));
        assert!(matches!(p.rule_for("/absences/abc/approve"), RouteRule::AnyRole(_)));
        // Unknown paths require authentication by default.
        assert!(matches!(p.rule_for("/not-a-route"), RouteRule::Authenticated));
    }

    #[test]
    fn registration_is_not_employee_accessible() {
        let p = route_policy();
        match p.rule_for("/users/register") {
            RouteRule::AnyRole(roles) => {
                assert!(!roles.contains(&Role::Employee));
                assert!(roles.contains(&Role::Manager));
                assert!(roles.contains(&Role::Admin));
            }
            other => panic!("unexpected rule: {:?}", other),
        }
    }
}
