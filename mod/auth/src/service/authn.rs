use crate::model::User;
use crate::service::{AuthError, AuthService, password};

/// The authenticated principal produced by a successful credential check.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    /// `ROLE_<NAME>` strings derived from the user's role set.
    pub authorities: Vec<String>,
}

impl AuthService {
    /// Verify an email/password pair against the credential store.
    ///
    /// Unknown email, inactive account and wrong password all fail with
    /// the same [`AuthError::InvalidCredentials`] — the caller must not
    /// be able to tell which factor was wrong.
    pub fn authenticate(&self, email: &str, raw_password: &str) -> Result<AuthUser, AuthError> {
        let (user, hash) = self
            .find_user_with_hash(email)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.active {
            return Err(AuthError::InvalidCredentials);
        }
        if !password::verify_password(raw_password, &hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let authorities = user.authorities();
        tracing::info!(email = %user.email, ?authorities, "authenticated user");
        Ok(AuthUser { user, authorities })
    }
}
