//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ServeConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("liveserve.toml");
        let mut file = fs::File::create(&config_path).unwrap();
        writeln!(file, "root = {:?}", dir.path()).unwrap();
        writeln!(file, "port = 9000").unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.root, dir.path());
    }

    #[test]
    fn rejects_config_without_root() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("liveserve.toml");
        fs::write(&config_path, "port = 9000\n").unwrap();

        match load_config(&config_path) {
            Err(ConfigError::Validation(errors)) => assert!(!errors.is_empty()),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}
