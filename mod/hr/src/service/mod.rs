pub mod absence;
pub mod audit;
pub mod feedback;
pub mod polish;
pub mod schema;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use auth::service::AuthService;
use openhr_sql::{SQLStore, Value};

use crate::service::polish::Polisher;

/// HR service error type.
#[derive(Debug, Error)]
pub enum HrError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<HrError> for openhr_core::ServiceError {
    fn from(e: HrError) -> Self {
        match e {
            HrError::NotFound(m) => openhr_core::ServiceError::NotFound(m),
            HrError::Forbidden(m) => openhr_core::ServiceError::PermissionDenied(m),
            HrError::Validation(m) => openhr_core::ServiceError::Validation(m),
            HrError::Storage(m) => openhr_core::ServiceError::Storage(m),
            HrError::Internal(m) => openhr_core::ServiceError::Internal(m),
        }
    }
}

impl From<auth::service::AuthError> for HrError {
    fn from(e: auth::service::AuthError) -> Self {
        use auth::service::AuthError;
        match e {
            AuthError::NotFound(m) => HrError::NotFound(m),
            AuthError::Forbidden(m) => HrError::Forbidden(m),
            AuthError::Validation(m) => HrError::Validation(m),
            AuthError::Storage(m) => HrError::Storage(m),
            other => HrError::Internal(other.to_string()),
        }
    }
}

/// The HR service. Holds the storage backend, the auth service for user
/// lookups, and the feedback polisher.
pub struct HrService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) auth: Arc<AuthService>,
    pub(crate) polisher: Arc<dyn Polisher>,
}

impl HrService {
    /// Create a new HrService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        auth: Arc<AuthService>,
        polisher: Arc<dyn Polisher>,
    ) -> Result<Arc<Self>, HrError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql, auth, polisher }))
    }

    /// The auth service backing user lookups.
    pub fn auth_service(&self) -> &Arc<AuthService> {
        &self.auth
    }

    // ── Generic CRUD helpers (same pattern as AuthService) ──

    /// Insert a record as JSON into a table with indexed columns.
    pub(crate) fn insert_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), HrError> {
        let json = serde_json::to_string(record)
            .map_err(|e| HrError::Internal(e.to_string()))?;

        let mut cols = vec!["id", "data"];
        let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
        let mut params = vec![Value::Text(id.to_string()), Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 3;
            cols.push(col);
            placeholders.push(format!("?{}", idx));
            params.push(val.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", "),
        );

        self.sql
            .exec(&sql, &params)
            .map_err(|e| HrError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a record by id, deserializing the JSON `data` column.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<T, HrError> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table);
        let row = self
            .sql
            .query_one(&sql, &[Value::Text(id.to_string())])
            .map_err(|e| HrError::Storage(e.to_string()))?
            .ok_or_else(|| HrError::NotFound(format!("{}/{}", table, id)))?;
        let data = row
            .get_str("data")
            .ok_or_else(|| HrError::Internal("missing data column".into()))?;
        serde_json::from_str(data).map_err(|e| HrError::Internal(e.to_string()))
    }

    /// Update a record's JSON data and indexed columns.
    pub(crate) fn update_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), HrError> {
        let json = serde_json::to_string(record)
            .map_err(|e| HrError::Internal(e.to_string()))?;

        let mut sets = vec!["data = ?1".to_string()];
        let mut params: Vec<Value> = vec![Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 2;
            sets.push(format!("{} = ?{}", col, idx));
            params.push(val.clone());
        }

        let id_idx = params.len() + 1;
        params.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            sets.join(", "),
            id_idx,
        );

        let affected = self
            .sql
            .exec(&sql, &params)
            .map_err(|e| HrError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(HrError::NotFound(format!("{}/{}", table, id)));
        }
        Ok(())
    }

    /// Query a table's `data` column with a prepared WHERE clause.
    pub(crate) fn query_records<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<T>, HrError> {
        let rows = self
            .sql
            .query(sql, params)
            .map_err(|e| HrError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| HrError::Internal("missing data column".into()))?;
            items.push(
                serde_json::from_str(data).map_err(|e| HrError::Internal(e.to_string()))?,
            );
        }
        Ok(items)
    }

    /// Resolve a user by id, mapping absence to NotFound.
    pub(crate) fn get_auth_user(&self, id: &str) -> Result<auth::model::User, HrError> {
        self.auth
            .get_user(id)
            .map_err(|_| HrError::NotFound(format!("user {} not found", id)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use auth::model::{RegisterUser, Role, User};
    use auth::service::{AuthConfig, AuthService};
    use openhr_sql::SqliteStore;

    use super::HrService;
    use crate::service::polish::MockPolisher;

    pub fn test_services() -> (Arc<AuthService>, Arc<HrService>) {
        test_services_with_polisher(Arc::new(MockPolisher::succeeding()))
    }

    pub fn test_services_with_polisher(
        polisher: Arc<dyn super::Polisher>,
    ) -> (Arc<AuthService>, Arc<HrService>) {
        let sql: Arc<dyn openhr_sql::SQLStore> =
            Arc::new(SqliteStore::open_in_memory().unwrap());
        let auth = AuthService::new(
            sql.clone(),
            AuthConfig {
                jwt_secret: "unit-test-secret-0123456789abcdef".to_string(),
                ..AuthConfig::default()
            },
        )
        .unwrap();
        let hr = HrService::new(sql, auth.clone(), polisher).unwrap();
        (auth, hr)
    }

    pub fn register(
        auth: &AuthService,
        email: &str,
        roles: Vec<Role>,
        manager_id: Option<String>,
    ) -> User {
        auth.register_user(RegisterUser {
            email: email.to_string(),
            password: "pw".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            job_title: None,
            department: None,
            roles,
            manager_id,
            hire_date: None,
            sensitive: None,
        })
        .unwrap()
    }
}
