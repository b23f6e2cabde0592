//! HR module — absence requests, peer feedback, audit log.
//!
//! # Resources
//!
//! - **AbsenceRequest** — PENDING → APPROVED/REJECTED, decided by the
//!   owner's direct manager or an admin
//! - **Feedback** — peer feedback with optional background AI polishing
//! - **AuditLog** — append-only record of sensitive actions, with CSV
//!   export for admins
//!
//! Authentication and the RBAC predicates come from the `auth` crate;
//! every service method takes the already-resolved current user.

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use openhr_core::Module;

use crate::service::HrService;
use crate::service::polish::Polisher;

/// HR module implementing the Module trait.
pub struct HrModule {
    service: Arc<HrService>,
}

impl HrModule {
    pub fn new(
        sql: Arc<dyn openhr_sql::SQLStore>,
        auth: Arc<auth::service::AuthService>,
        polisher: Arc<dyn Polisher>,
    ) -> Result<Self, openhr_core::ServiceError> {
        let service = HrService::new(sql, auth, polisher)
            .map_err(openhr_core::ServiceError::from)?;
        Ok(Self { service })
    }

    pub fn service(&self) -> &Arc<HrService> {
        &self.service
    }
}

impl Module for HrModule {
    fn name(&self) -> &str {
        "hr"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
