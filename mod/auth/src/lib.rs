//! Auth module — credential verification, JWT sessions, RBAC.
//!
//! # Resources
//!
//! - **User** — employee identity with roles and a direct-manager link
//! - **RefreshToken** — opaque, rotated credential backing long-lived sessions
//! - **Claims** — the decoded access-token payload attached to each request
//!
//! # Usage
//!
//! ```ignore
//! use auth::{AuthModule, service::AuthConfig};
//!
//! let module = AuthModule::new(sql, config)?;
//! let router = module.routes();
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use openhr_core::Module;

use crate::service::{AuthConfig, AuthService};

/// Auth module implementing the Module trait.
///
/// Holds the AuthService and provides HTTP routes for login, token
/// refresh, logout, user management and the `/me` endpoint.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    /// Create a new AuthModule.
    pub fn new(
        sql: Arc<dyn openhr_sql::SQLStore>,
        config: AuthConfig,
    ) -> Result<Self, openhr_core::ServiceError> {
        let service = AuthService::new(sql, config)
            .map_err(openhr_core::ServiceError::from)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying AuthService.
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
