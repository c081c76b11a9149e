//! Application settings loaded from `hirebook.toml`
//!
//! Every setting is optional. Lookup order is environment variable, then the
//! settings file, then the built-in default.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings file read when no explicit path is given
pub const DEFAULT_CONFIG_PATH: &str = "hirebook.toml";

/// Directory backups are written to when nothing else is configured
pub const DEFAULT_BACKUP_DIR: &str = "backups";

/// Configuration structure representing the whole `hirebook.toml` file
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `SQLite` connection URL
    #[serde(default)]
    pub database_url: Option<String>,
    /// Where backup JSON files are written
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Effective database URL: `DATABASE_URL`, then the file, then the default.
    #[must_use]
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .ok()
            .or_else(|| self.database_url.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }

    /// Effective backup directory: `HIREBOOK_BACKUP_DIR`, then the file, then the default.
    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        std::env::var_os("HIREBOOK_BACKUP_DIR")
            .map(PathBuf::from)
            .or_else(|| self.backup_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR))
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads the application configuration.
///
/// An explicitly requested file must exist. Without one, `hirebook.toml` is
/// read if present and defaults are used otherwise.
pub fn load_app_configuration(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(explicit) => load_config(explicit),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH),
        None => {
            tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
            Ok(AppConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_app_config() {
        let toml_str = r#"
            database_url = "sqlite://book.sqlite?mode=rwc"
            backup_dir = "/tmp/hirebook"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("sqlite://book.sqlite?mode=rwc")
        );
        assert_eq!(config.backup_dir, Some(PathBuf::from("/tmp/hirebook")));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        if std::env::var_os("HIREBOOK_BACKUP_DIR").is_none() {
            assert_eq!(config.backup_dir(), PathBuf::from(DEFAULT_BACKUP_DIR));
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backup_dir = \"exports\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.backup_dir, Some(PathBuf::from("exports")));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_url = [").unwrap();

        let result = load_config(file.path());
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_app_configuration(Some(Path::new("/nonexistent/hirebook.toml")));
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
