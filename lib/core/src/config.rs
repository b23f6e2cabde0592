use std::path::PathBuf;

/// Runtime configuration shared by all services.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Directory for persistent data. `None` means the current directory.
    pub data_dir: Option<PathBuf>,

    /// Listen address of the server (informational for services).
    pub listen: String,
}

impl ServiceConfig {
    /// Path of the sqlite database file under the data directory.
    pub fn resolve_sqlite_path(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.join("openhr.db"),
            None => PathBuf::from("openhr.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_path_under_data_dir() {
        let config = ServiceConfig {
            data_dir: Some(PathBuf::from("/var/lib/openhr")),
            listen: String::new(),
        };
        assert_eq!(
            config.resolve_sqlite_path(),
            PathBuf::from("/var/lib/openhr/openhr.db")
        );
    }

    #[test]
    fn sqlite_path_defaults_to_cwd() {
        assert_eq!(
            ServiceConfig::default().resolve_sqlite_path(),
            PathBuf::from("openhr.db")
        );
    }
}
