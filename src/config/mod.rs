//! Configuration management for tcping-api.
//!
//! Settings are read from the environment, optionally seeded from a
//! `.env` file in the working directory.

mod settings;

pub use settings::{environment, log_level_for, PushSettings, SecretKey, Settings, REQUIRED_VARS};

use crate::error::{ConfigError, ConfigResult};
use std::path::Path;

/// Load `.env` from the working directory if it exists.
///
/// Variables already present in the environment are not overwritten.
/// Returns whether a file was loaded.
pub fn load_env_file() -> ConfigResult<bool> {
    load_env_file_from(Path::new(".env"))
}

/// Load a specific env file if it exists.
pub fn load_env_file_from(path: &Path) -> ConfigResult<bool> {
    if !path.exists() {
        return Ok(false);
    }

    dotenv::from_path(path).map_err(|e| ConfigError::EnvFile(e.to_string()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_file_is_not_an_error() {
        let loaded = load_env_file_from(Path::new("/nonexistent/tcping-api/.env")).unwrap();
        assert!(!loaded);
    }

    #[test]
    fn test_loads_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "TCPING_API_ENV_FILE_TEST=loaded\n").unwrap();

        assert!(load_env_file_from(&path).unwrap());
        assert_eq!(std::env::var("TCPING_API_ENV_FILE_TEST").unwrap(), "loaded");
    }
}
