pub mod access;
pub mod authn;
pub mod password;
pub mod schema;
pub mod session;
pub mod token;
pub mod user;

use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey, Validation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use openhr_sql::{SQLStore, Value};

/// Auth service error type.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad email, bad password or inactive account — deliberately one
    /// variant with one message, so callers can't tell which factor failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Malformed, expired or bad-signature access token. Callers treat
    /// this as "no principal", never as a fatal error.
    #[error("invalid token: {0}")]
    TokenInvalid(String),

    /// Unknown, consumed or expired refresh token.
    #[error("refresh token expired or invalid")]
    RefreshTokenInvalid,

    #[error("{0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<AuthError> for openhr_core::ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => {
                openhr_core::ServiceError::Unauthorized("invalid credentials".into())
            }
            AuthError::TokenInvalid(m) => openhr_core::ServiceError::Unauthorized(m),
            AuthError::RefreshTokenInvalid => {
                openhr_core::ServiceError::Unauthorized("refresh token expired or invalid".into())
            }
            AuthError::Forbidden(m) => openhr_core::ServiceError::PermissionDenied(m),
            AuthError::NotFound(m) => openhr_core::ServiceError::NotFound(m),
            AuthError::Conflict(m) => openhr_core::ServiceError::Conflict(m),
            AuthError::Validation(m) => openhr_core::ServiceError::Validation(m),
            AuthError::Storage(m) => openhr_core::ServiceError::Storage(m),
            AuthError::Internal(m) => openhr_core::ServiceError::Internal(m),
        }
    }
}

/// Configuration for the auth service.
///
/// There is no built-in signing secret: an empty `jwt_secret` makes
/// [`AuthService::new`] fail. Secrets come from deployment config only.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret (HMAC key material, at least 32 bytes).
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 1h).
    pub access_token_ttl: i64,
    /// Refresh token lifetime in seconds (default: 7 days).
    pub refresh_token_ttl: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_ttl: 3600,    // 1h
            refresh_token_ttl: 604800, // 7 days
        }
    }
}

/// Minimum accepted HMAC key length in bytes.
const MIN_SECRET_LEN: usize = 32;

/// The Auth service. Holds the storage backend, configuration and the
/// signing keys, which are derived exactly once here and never rebuilt.
pub struct AuthService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) config: AuthConfig,
    pub(crate) encoding_key: EncodingKey,
    pub(crate) decoding_key: DecodingKey,
    pub(crate) validation: Validation,
}

impl AuthService {
    /// Create a new AuthService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        config: AuthConfig,
    ) -> Result<Arc<Self>, AuthError> {
        if config.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Validation(format!(
                "jwt secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        schema::init_schema(sql.as_ref())?;

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Ok(Arc::new(Self {
            sql,
            config,
            encoding_key,
            decoding_key,
            validation,
        }))
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    // ── Generic CRUD helpers (JSON record + indexed columns) ──

    /// Insert a record as JSON into a table with indexed columns.
    pub(crate) fn insert_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), AuthError> {
        let json = serde_json::to_string(record)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

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

        self.sql.exec(&sql, &params).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                AuthError::Conflict(msg)
            } else {
                AuthError::Storage(msg)
            }
        })?;

        Ok(())
    }

    /// Get a record by id, deserializing the JSON `data` column.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<T, AuthError> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table);
        let row = self
            .sql
            .query_one(&sql, &[Value::Text(id.to_string())])
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or_else(|| AuthError::NotFound(format!("{}/{}", table, id)))?;
        let data = row
            .get_str("data")
            .ok_or_else(|| AuthError::Internal("missing data column".into()))?;
        serde_json::from_str(data).map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Update a record's JSON data and indexed columns.
    pub(crate) fn update_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), AuthError> {
        let json = serde_json::to_string(record)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

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
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(AuthError::NotFound(format!("{}/{}", table, id)));
        }

        Ok(())
    }

    /// List records with optional equality filters and pagination.
    pub(crate) fn list_records<T: DeserializeOwned + Serialize>(
        &self,
        table: &str,
        filters: &[(&str, Value)],
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<T>, usize), AuthError> {
        let mut where_clauses = Vec::new();
        let mut params = Vec::new();

        for (i, (col, val)) in filters.iter().enumerate() {
            let idx = i + 1;
            where_clauses.push(format!("{} = ?{}", col, idx));
            params.push(val.clone());
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", where_clauses.join(" AND "))
        };

        // Count
        let count_sql = format!("SELECT COUNT(*) as cnt FROM {}{}", table, where_sql);
        let total = self
            .sql
            .query_one(&count_sql, &params)
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        // Items
        let limit_idx = params.len() + 1;
        let offset_idx = params.len() + 2;
        params.push(Value::Integer(limit as i64));
        params.push(Value::Integer(offset as i64));

        let sql = format!(
            "SELECT data FROM {}{} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            table, where_sql, limit_idx, offset_idx,
        );

        let rows = self
            .sql
            .query(&sql, &params)
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| AuthError::Internal("missing data column".into()))?;
            let item: T =
                serde_json::from_str(data).map_err(|e| AuthError::Internal(e.to_string()))?;
            items.push(item);
        }

        Ok((items, total))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use openhr_sql::SqliteStore;

    use super::{AuthConfig, AuthService};
    use crate::model::{RegisterUser, Role, User};

    pub fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret-0123456789abcdef".to_string(),
            ..AuthConfig::default()
        }
    }

    pub fn test_service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        AuthService::new(sql, test_config()).unwrap()
    }

    pub fn register(
        svc: &AuthService,
        email: &str,
        password: &str,
        roles: Vec<Role>,
        manager_id: Option<String>,
    ) -> User {
        svc.register_user(RegisterUser {
            email: email.to_string(),
            password: password.to_string(),
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
