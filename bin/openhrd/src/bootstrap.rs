//! Bootstrap — first-start checks and seed admin creation.
//!
//! When openhrd starts:
//! 1. Verify the config carries usable secrets — refuse to start otherwise.
//! 2. Ensure the seed admin account exists.

use auth::service::AuthService;
use tracing::info;

use crate::config::ServerConfig;

/// Minimum accepted JWT secret length in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Verify server configuration is ready for production use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.jwt.secret.len() < MIN_SECRET_LEN {
        anyhow::bail!(
            "JWT secret must be at least {} bytes. Generate one and set [jwt].secret.",
            MIN_SECRET_LEN
        );
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if !config.admin.email.contains('@') {
        anyhow::bail!("Admin email is missing or not valid.");
    }
    if config.admin.password_hash.is_empty() {
        anyhow::bail!(
            "No admin password hash found in configuration.\n\
             Hash a password (argon2id PHC string) and set [admin].password_hash."
        );
    }
    Ok(())
}

/// Ensure the seed admin account exists. A no-op on every start after
/// the first.
pub fn ensure_admin(auth: &AuthService, config: &ServerConfig) -> anyhow::Result<()> {
    auth.bootstrap_admin(&config.admin.email, &config.admin.password_hash)
        .map_err(|e| anyhow::anyhow!("failed to create seed admin: {}", e))?;
    info!(email = %config.admin.email, "seed admin ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdminConfig, JwtConfig, PolishConfig, StorageConfig};

    fn valid_config() -> ServerConfig {
        ServerConfig {
            storage: StorageConfig {
                data_dir: "/tmp/openhr".to_string(),
            },
            jwt: JwtConfig {
                secret: "0123456789abcdef0123456789abcdef".to_string(),
                access_expire_secs: 3600,
                refresh_expire_secs: 604800,
            },
            admin: AdminConfig {
                email: "admin@example.com".to_string(),
                password_hash: "$argon2id$...".to_string(),
            },
            polish: PolishConfig::default(),
        }
    }

    #[test]
    fn test_verify_config_ok() {
        assert!(verify_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_verify_config_short_secret() {
        let mut config = valid_config();
        config.jwt.secret = "short".to_string();
        assert!(verify_config(&config).is_err());
    }

    #[test]
    fn test_verify_config_empty_admin_hash() {
        let mut config = valid_config();
        config.admin.password_hash = String::new();
        assert!(verify_config(&config).is_err());
    }

    #[test]
    fn test_verify_config_bad_admin_email() {
        let mut config = valid_config();
        config.admin.email = "not-an-email".to_string();
        assert!(verify_config(&config).is_err());
    }
}
