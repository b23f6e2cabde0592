use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

use openhr_core::now_rfc3339;
use openhr_sql::Value;

use crate::model::{RefreshToken, TokenPair, User};
use crate::service::{AuthError, AuthService};

/// Bytes of entropy behind each opaque refresh token.
const REFRESH_TOKEN_BYTES: usize = 32;

fn new_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl AuthService {
    /// Full login flow: verify credentials, issue an access token and a
    /// fresh refresh token.
    pub fn login(&self, email: &str, raw_password: &str) -> Result<TokenPair, AuthError> {
        let principal = self.authenticate(email, raw_password)?;
        let access_token = self.issue_access_token(&principal.user)?;
        let refresh_token = self.store_refresh_token(&principal.user)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_ttl,
        })
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The consumed token is invalidated in the same statement that
    /// checks it is still consumable (`valid` and unexpired, with
    /// `expires_at == now` counting as expired). Of two concurrent
    /// calls with the same token, at most one sees an affected row;
    /// the other gets [`AuthError::RefreshTokenInvalid`]. Consumed
    /// tokens are never reactivated.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let record = self.find_refresh_token(refresh_token)?
            .ok_or(AuthError::RefreshTokenInvalid)?;

        let now = now_rfc3339();
        let affected = self
            .sql
            .exec(
                "UPDATE refresh_tokens SET valid = 0
                 WHERE id = ?1 AND valid = 1 AND expires_at > ?2",
                &[Value::Text(refresh_token.to_string()), Value::Text(now)],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(AuthError::RefreshTokenInvalid);
        }

        let user = self
            .get_user(&record.user_id)
            .map_err(|_| AuthError::RefreshTokenInvalid)?;
        if !user.active {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.issue_access_token(&user)?;
        let new_refresh = self.store_refresh_token(&user)?;

        tracing::debug!(user_id = %user.id, "rotated refresh token");
        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_ttl,
        })
    }

    /// Invalidate one refresh token. Unknown tokens are a silent no-op,
    /// so the call is idempotent.
    pub fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.sql
            .exec(
                "UPDATE refresh_tokens SET valid = 0 WHERE id = ?1",
                &[Value::Text(refresh_token.to_string())],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Invalidate every live (valid, unexpired) refresh token of a user.
    /// Returns how many were invalidated.
    pub fn logout_all(&self, user_id: &str) -> Result<u64, AuthError> {
        let now = now_rfc3339();
        self.sql
            .exec(
                "UPDATE refresh_tokens SET valid = 0
                 WHERE user_id = ?1 AND valid = 1 AND expires_at > ?2",
                &[Value::Text(user_id.to_string()), Value::Text(now)],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    /// Generate and persist a new refresh token for a user.
    fn store_refresh_token(&self, user: &User) -> Result<String, AuthError> {
        let now = chrono::Utc::now();
        let expires = now + chrono::Duration::seconds(self.config.refresh_token_ttl);

        let record = RefreshToken {
            token: new_refresh_token(),
            user_id: user.id.clone(),
            expires_at: expires.to_rfc3339(),
            valid: true,
            created_at: now.to_rfc3339(),
        };

        self.insert_record(
            "refresh_tokens",
            &record.token,
            &record,
            &[
                ("user_id", Value::Text(record.user_id.clone())),
                ("valid", Value::Integer(1)),
                ("expires_at", Value::Text(record.expires_at.clone())),
                ("created_at", Value::Text(record.created_at.clone())),
            ],
        )?;

        Ok(record.token)
    }

    fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AuthError> {
        let row = self
            .sql
            .query_one(
                "SELECT data FROM refresh_tokens WHERE id = ?1",
                &[Value::Text(token.to_string())],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        match row {
            Some(row) => {
                let data = row
                    .get_str("data")
                    .ok_or_else(|| AuthError::Internal("missing data column".into()))?;
                let record =
                    serde_json::from_str(data).map_err(|e| AuthError::Internal(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::service::test_support::{register, test_service};

    #[test]
    fn test_login_issues_pair() {
        let svc = test_service();
        register(&svc, "alice@x.com", "correct-pw", vec![Role::Manager], None);

        let pair = svc.login("alice@x.com", "correct-pw").unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 3600);

        let claims = svc.verify_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, "alice@x.com");
        assert_eq!(claims.roles, vec!["ROLE_MANAGER"]);
    }

    #[test]
    fn test_login_bad_credentials() {
        let svc = test_service();
        register(&svc, "alice@x.com", "correct-pw", vec![], None);
        assert!(matches!(
            svc.login("alice@x.com", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            svc.login("ghost@x.com", "correct-pw"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_refresh_rotates() {
        let svc = test_service();
        register(&svc, "alice@x.com", "correct-pw", vec![Role::Manager], None);

        let pair1 = svc.login("alice@x.com", "correct-pw").unwrap();
        let pair2 = svc.refresh(&pair1.refresh_token).unwrap();

        // A brand-new refresh token every time.
        assert_ne!(pair1.refresh_token, pair2.refresh_token);

        // The consumed token is spent forever.
        assert!(matches!(
            svc.refresh(&pair1.refresh_token),
            Err(AuthError::RefreshTokenInvalid)
        ));

        // The replacement works exactly once.
        let pair3 = svc.refresh(&pair2.refresh_token).unwrap();
        assert!(matches!(
            svc.refresh(&pair2.refresh_token),
            Err(AuthError::RefreshTokenInvalid)
        ));
        let claims = svc.verify_access_token(&pair3.access_token).unwrap();
        assert_eq!(claims.sub, "alice@x.com");
    }

    #[test]
    fn test_refresh_unknown_token() {
        let svc = test_service();
        assert!(matches!(
            svc.refresh("never-issued"),
            Err(AuthError::RefreshTokenInvalid)
        ));
    }

    #[test]
    fn test_expiry_boundary_counts_as_expired() {
        let svc = test_service();
        let user = register(&svc, "alice@x.com", "pw", vec![], None);

        // Plant a token whose expiry is not in the future.
        let now = now_rfc3339();
        let record = RefreshToken {
            token: "boundary-token".to_string(),
            user_id: user.id.clone(),
            expires_at: now.clone(),
            valid: true,
            created_at: now,
        };
        svc.insert_record(
            "refresh_tokens",
            &record.token,
            &record,
            &[
                ("user_id", Value::Text(record.user_id.clone())),
                ("valid", Value::Integer(1)),
                ("expires_at", Value::Text(record.expires_at.clone())),
                ("created_at", Value::Text(record.created_at.clone())),
            ],
        )
        .unwrap();

        assert!(matches!(
            svc.refresh("boundary-token"),
            Err(AuthError::RefreshTokenInvalid)
        ));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let svc = test_service();
        register(&svc, "alice@x.com", "pw", vec![], None);
        let pair = svc.login("alice@x.com", "pw").unwrap();

        svc.logout(&pair.refresh_token).unwrap();
        // Second call: no-op, token stays invalid.
        svc.logout(&pair.refresh_token).unwrap();
        assert!(matches!(
            svc.refresh(&pair.refresh_token),
            Err(AuthError::RefreshTokenInvalid)
        ));

        // Logging out a token that never existed is fine too.
        svc.logout("never-issued").unwrap();
    }

    #[test]
    fn test_logout_all_kills_every_live_token() {
        let svc = test_service();
        let user = register(&svc, "alice@x.com", "pw", vec![], None);

        let pair1 = svc.login("alice@x.com", "pw").unwrap();
        let pair2 = svc.login("alice@x.com", "pw").unwrap();

        let count = svc.logout_all(&user.id).unwrap();
        assert_eq!(count, 2);

        assert!(svc.refresh(&pair1.refresh_token).is_err());
        assert!(svc.refresh(&pair2.refresh_token).is_err());

        // Nothing left to invalidate.
        assert_eq!(svc.logout_all(&user.id).unwrap(), 0);
    }

    #[test]
    fn test_consumed_tokens_survive_as_audit_rows() {
        let svc = test_service();
        register(&svc, "alice@x.com", "pw", vec![], None);
        let pair = svc.login("alice@x.com", "pw").unwrap();
        svc.refresh(&pair.refresh_token).unwrap();

        // The consumed row is still there, just invalid.
        let record = svc.find_refresh_token(&pair.refresh_token).unwrap().unwrap();
        assert_eq!(record.token, pair.refresh_token);
        let live = svc
            .sql
            .query_one(
                "SELECT valid FROM refresh_tokens WHERE id = ?1",
                &[Value::Text(pair.refresh_token.clone())],
            )
            .unwrap()
            .unwrap();
        assert_eq!(live.get_bool("valid"), Some(false));
    }

    #[test]
    fn test_refresh_for_deactivated_user_fails() {
        let svc = test_service();
        let user = register(&svc, "alice@x.com", "pw", vec![], None);
        let admin = register(&svc, "admin@x.com", "pw", vec![Role::Admin], None);
        let pair = svc.login("alice@x.com", "pw").unwrap();

        svc.set_user_active(&user.id, false, &admin).unwrap();
        // Deactivation already revoked the token.
        assert!(svc.refresh(&pair.refresh_token).is_err());
    }

    #[test]
    fn test_token_strings_are_opaque_and_distinct() {
        let a = new_refresh_token();
        let b = new_refresh_token();
        assert_ne!(a, b);
        // 32 bytes base64url without padding.
        assert_eq!(a.len(), 43);
        assert!(!a.contains('='));
    }
}
