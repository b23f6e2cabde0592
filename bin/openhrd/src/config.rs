//! Server-side configuration.
//!
//! Loaded from TOML at startup. A bare context name resolves to
//! `/etc/openhr/<name>.toml`; anything containing `/` or `.` is used as
//! a path directly.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub polish: PolishConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory for the sqlite database and other persistent data.
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HMAC signing secret. No default — deployment must provide it.
    pub secret: String,

    /// Access token lifetime in seconds.
    #[serde(default = "default_access_expire")]
    pub access_expire_secs: i64,

    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_expire")]
    pub refresh_expire_secs: i64,
}

/// Seed admin account, created at first start if missing. The password
/// arrives pre-hashed (PHC string) — the config never holds a cleartext
/// password.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolishConfig {
    #[serde(default = "default_polish_url")]
    pub api_url: String,

    /// Empty disables polishing (runs fail with a configuration error).
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_polish_model")]
    pub model: String,
}

impl Default for PolishConfig {
    fn default() -> Self {
        Self {
            api_url: default_polish_url(),
            api_key: String::new(),
            model: default_polish_model(),
        }
    }
}

fn default_access_expire() -> i64 {
    3600 // 1h
}

fn default_refresh_expire() -> i64 {
    604800 // 7 days
}

fn default_polish_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_polish_model() -> String {
    "google/flan-t5-base".to_string()
}

impl ServerConfig {
    /// Resolve a context name or path to a config file path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from("/etc/openhr").join(format!("{}.toml", name_or_path))
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            ServerConfig::resolve_path("prod"),
            PathBuf::from("/etc/openhr/prod.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
    }

    #[test]
    fn test_load_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.toml");
        std::fs::write(
            &path,
            r#"
[storage]
data_dir = "/tmp/openhr"

[jwt]
secret = "0123456789abcdef0123456789abcdef"

[admin]
email = "admin@example.com"
password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$hash"
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.jwt.access_expire_secs, 3600);
        assert_eq!(config.jwt.refresh_expire_secs, 604800);
        assert_eq!(config.admin.email, "admin@example.com");
        assert!(config.polish.api_key.is_empty());
        assert_eq!(config.polish.model, "google/flan-t5-base");
    }

    #[test]
    fn test_missing_secret_fails_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(
            &path,
            r#"
[storage]
data_dir = "/tmp/openhr"

[jwt]

[admin]
email = "admin@example.com"
password_hash = "x"
"#,
        )
        .unwrap();
        assert!(ServerConfig::load(&path).is_err());
    }
}
