use serde::{Deserialize, Deserializer, Serialize};

/// A persisted refresh token record.
///
/// Records are only ever mutated to flip `valid` to false; consumed and
/// expired tokens stay in the table as an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    /// The opaque token string itself (also the primary key).
    pub token: String,

    /// User id that owns this token.
    pub user_id: String,

    /// RFC 3339 expiry. A token whose expiry equals "now" is expired.
    pub expires_at: String,

    /// False once consumed by a refresh or invalidated by a logout.
    #[serde(default = "default_true")]
    pub valid: bool,

    /// RFC 3339 timestamp of issuance.
    pub created_at: String,
}

/// JWT claims payload of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email.
    pub sub: String,

    /// The user's id.
    pub uid: String,

    /// Authority strings (`ROLE_<NAME>`). Always written as a list, but
    /// read leniently: legacy tokens carry a comma-joined string or omit
    /// the claim entirely.
    #[serde(default, deserialize_with = "lenient_roles")]
    pub roles: Vec<String>,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.roles.iter().any(|r| r == authority)
    }
}

/// Accept the three `roles` encodings seen in the wild: a native list,
/// a comma-joined string, or nothing at all.
fn lenient_roles<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::String(s) => {
            if s.trim().is_empty() {
                Vec::new()
            } else {
                s.split(',').map(|p| p.trim().to_string()).collect()
            }
        }
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Token pair returned after login or refresh.
#[derive(Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Request body for login.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Request body for token refresh.
#[derive(Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl std::fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("refresh_token", &"***")
            .finish()
    }
}

/// Optional request body for logout.
#[derive(Clone, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for LogoutRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoutRequest")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_as_list() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "a@x.com", "uid": "u1",
            "roles": ["ROLE_MANAGER", "ROLE_EMPLOYEE"],
            "iat": 1, "exp": 2
        }))
        .unwrap();
        assert_eq!(claims.roles, vec!["ROLE_MANAGER", "ROLE_EMPLOYEE"]);
    }

    #[test]
    fn roles_as_comma_string() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "a@x.com", "uid": "u1",
            "roles": "ROLE_MANAGER, ROLE_EMPLOYEE",
            "iat": 1, "exp": 2
        }))
        .unwrap();
        assert_eq!(claims.roles, vec!["ROLE_MANAGER", "ROLE_EMPLOYEE"]);
    }

    #[test]
    fn roles_absent_or_blank() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "a@x.com", "uid": "u1", "iat": 1, "exp": 2
        }))
        .unwrap();
        assert!(claims.roles.is_empty());

        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "a@x.com", "uid": "u1", "roles": "", "iat": 1, "exp": 2
        }))
        .unwrap();
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn debug_never_prints_secrets() {
        let login = LoginRequest {
            email: "a@x.com".into(),
            password: "s3cret".into(),
        };
        assert!(!format!("{:?}", login).contains("s3cret"));

        let pair = TokenPair {
            access_token: "eyJhbGci.secret.sig".into(),
            refresh_token: "opaque-refresh".into(),
            token_type: "Bearer".into(),
            expires_in: 3600,
        };
        let debug = format!("{:?}", pair);
        assert!(!debug.contains("eyJhbGci"));
        assert!(!debug.contains("opaque-refresh"));
    }
}
