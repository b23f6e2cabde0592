use jsonwebtoken::{Header, decode, encode};

use crate::model::{Claims, User};
use crate::service::{AuthError, AuthService};

impl AuthService {
    /// Issue a signed access token for a user.
    ///
    /// Claims: subject = email, `uid` = user id, `roles` = authority
    /// strings (always a list), `iat`/`exp` = now / now + configured TTL.
    pub fn issue_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = chrono::Utc::now();
        let expires = now + chrono::Duration::seconds(self.config.access_token_ttl);

        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id.clone(),
            roles: user.authorities(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("JWT encode failed: {}", e)))
    }

    /// Verify and decode an access token.
    ///
    /// Malformed tokens, bad signatures and expired timestamps all come
    /// back as [`AuthError::TokenInvalid`]; nothing here panics.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenInvalid(e.to_string()))
    }
}
