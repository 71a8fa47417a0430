//! Runtime configuration.

use crate::error::{Result, StepinError};
use crate::storage::FileStore;
use std::path::PathBuf;

/// Environment variable naming the database file.
pub const DATABASE_FILENAME_VAR: &str = "STEPIN_DATABASE_FILENAME";
/// Environment variable holding the database seal password.
pub const DATABASE_PASSWORD_VAR: &str = "STEPIN_DATABASE_PASSWORD";
/// Environment variable holding the log filter directives.
pub const LOG_VAR: &str = "STEPIN_LOG";

/// Configuration for the stepin store and logging.
#[derive(Clone)]
pub struct Config {
    /// Path of the JSON certificate database (default: `stepin.json`).
    pub database_filename: PathBuf,
    /// Password sealing the database file at rest. `None` stores plain JSON.
    pub database_password: Option<String>,
    /// `tracing-subscriber` filter directives (default: `stepin=info`).
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_filename: PathBuf::from("stepin.json"),
            database_password: None,
            log_filter: "stepin=info".into(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_filename", &self.database_filename)
            .field("database_password", &self.database_password.as_ref().map(|_| "***"))
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(filename) = lookup(DATABASE_FILENAME_VAR) {
            if filename.trim().is_empty() {
                return Err(StepinError::ConfigError(format!(
                    "{} must not be empty",
                    DATABASE_FILENAME_VAR
                )));
            }
            config.database_filename = PathBuf::from(filename);
        }

        config.database_password = lookup(DATABASE_PASSWORD_VAR).filter(|p| !p.is_empty());

        if let Some(filter) = lookup(LOG_VAR).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }

        Ok(config)
    }

    /// Open the file store this configuration points at.
    pub fn open_store(&self) -> Result<FileStore> {
        FileStore::open(&self.database_filename, self.database_password.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_filename, PathBuf::from("stepin.json"));
        assert_eq!(config.database_password, None);
        assert_eq!(config.log_filter, "stepin=info");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (DATABASE_FILENAME_VAR, "/var/lib/stepin/db.json"),
            (DATABASE_PASSWORD_VAR, "s3cret"),
            (LOG_VAR, "stepin=debug"),
        ]))
        .unwrap();

        assert_eq!(config.database_filename, PathBuf::from("/var/lib/stepin/db.json"));
        assert_eq!(config.database_password.as_deref(), Some("s3cret"));
        assert_eq!(config.log_filter, "stepin=debug");
    }

    #[test]
    fn test_empty_values() {
        let config = Config::from_lookup(lookup(&[(DATABASE_PASSWORD_VAR, "")])).unwrap();
        assert_eq!(config.database_password, None);

        match Config::from_lookup(lookup(&[(DATABASE_FILENAME_VAR, " ")])) {
            Err(StepinError::ConfigError(msg)) => assert!(msg.contains(DATABASE_FILENAME_VAR)),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_password() {
        let config = Config {
            database_password: Some("s3cret".to_string()),
            ..Config::default()
        };
        assert!(!format!("{:?}", config).contains("s3cret"));
    }

    #[test]
    fn test_open_store() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            database_filename: temp_dir.path().join("certs.json"),
            ..Config::default()
        };

        let store = config.open_store().unwrap();
        assert!(store.path().exists());
    }
}
