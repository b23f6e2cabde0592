//! JWT middleware and the route policy table.
//!
//! The middleware extracts and verifies the Bearer token when present.
//! A missing or invalid token is not an error by itself — the request
//! simply carries no principal, and the route policy then decides
//! whether that is acceptable for the path.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use openhr_core::ServiceError;

use crate::model::Role;
use crate::service::AuthService;

/// Access requirement for a group of paths.
#[derive(Debug, Clone)]
pub enum RouteRule {
    /// No principal required.
    Public,
    /// Any valid principal.
    Authenticated,
    /// A principal holding at least one of these roles.
    AnyRole(Vec<Role>),
}

/// Ordered prefix → rule table, composed once at startup.
/// The first matching prefix wins; unmatched paths get the fallback.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    rules: Vec<(String, RouteRule)>,
    fallback: RouteRule,
}

impl RoutePolicy {
    pub fn new(fallback: RouteRule) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Append a rule. Order matters: register specific patterns before
    /// broader ones.
    ///
    /// A plain pattern matches as a path prefix. A pattern containing
    /// `*` matches segment-wise, with each `*` standing for exactly one
    /// segment (e.g. `/absences/*/approve`).
    pub fn route(mut self, pattern: &str, rule: RouteRule) -> Self {
        self.rules.push((pattern.to_string(), rule));
        self
    }

    pub fn rule_for(&self, path: &str) -> &RouteRule {
        self.rules
            .iter()
            .find(|(pattern, _)| path_matches(pattern, path))
            .map(|(_, rule)| rule)
            .unwrap_or(&self.fallback)
    }
}

fn path_matches(pattern: &str, path: &str) -> bool {
    if !pattern.contains('*') {
        return path.starts_with(pattern);
    }
    let pattern_segs: Vec<&str> = pattern.split('/').collect();
    let path_segs: Vec<&str> = path.split('/').collect();
    pattern_segs.len() == path_segs.len()
        && pattern_segs
            .iter()
            .zip(&path_segs)
            .all(|(p, s)| *p == "*" || p == s)
}

/// State handed to the middleware: the verifying service + the policy.
#[derive(Clone)]
pub struct AuthGate {
    pub service: Arc<AuthService>,
    pub policy: Arc<RoutePolicy>,
}

/// Extract the Bearer token from the Authorization header.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Middleware enforcing the route policy.
///
/// Valid claims are stored in request extensions for handlers to pick
/// up via `Extension<Claims>`; the policy guarantees they are present
/// on every non-public route.
pub async fn auth_middleware(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let path = request.uri().path().to_string();

    let claims = extract_bearer(request.headers())
        .and_then(|token| gate.service.verify_access_token(token).ok());

    match gate.policy.rule_for(&path) {
        RouteRule::Public => {}
        RouteRule::Authenticated => {
            if claims.is_none() {
                return Err(ServiceError::Unauthorized(
                    "missing or invalid authorization token".into(),
                ));
            }
        }
        RouteRule::AnyRole(roles) => match &claims {
            None => {
                return Err(ServiceError::Unauthorized(
                    "missing or invalid authorization token".into(),
                ));
            }
            Some(claims) => {
                let allowed = roles
                    .iter()
                    .any(|role| claims.has_authority(&role.authority()));
                if !allowed {
                    let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                    return Err(ServiceError::PermissionDenied(format!(
                        "requires one of roles: {}",
                        names.join(", ")
                    )));
                }
            }
        },
    }

    if let Some(claims) = claims {
        request.extensions_mut().insert(claims);
    }

    Ok(next.run(request).await)
}
