//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the serving root and watch directories exist
//! - Check ignore patterns compile as globs
//! - Check TLS material is present when configured
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ServeConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into the system

use std::path::PathBuf;

use crate::config::schema::ServeConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug)]
pub enum ValidationError {
    /// No serving root was configured.
    MissingRoot,
    /// The serving root does not exist or is not a directory.
    RootNotFound(PathBuf),
    /// A configured watch directory does not exist.
    WatchDirNotFound(PathBuf),
    /// An ignore entry is not a valid glob pattern.
    InvalidIgnorePattern {
        pattern: String,
        error: glob::PatternError,
    },
    /// A configured TLS file does not exist.
    TlsFileNotFound(PathBuf),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingRoot => write!(f, "no serving root configured"),
            ValidationError::RootNotFound(path) => {
                write!(f, "serving root is not a directory: {}", path.display())
            }
            ValidationError::WatchDirNotFound(path) => {
                write!(f, "watch directory does not exist: {}", path.display())
            }
            ValidationError::InvalidIgnorePattern { pattern, error } => {
                write!(f, "invalid ignore pattern {:?}: {}", pattern, error)
            }
            ValidationError::TlsFileNotFound(path) => {
                write!(f, "TLS file not found: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.root.as_os_str().is_empty() {
        errors.push(ValidationError::MissingRoot);
    } else if !config.root.is_dir() {
        errors.push(ValidationError::RootNotFound(config.root.clone()));
    }

    for dir in &config.watch_dirs {
        if !dir.is_dir() {
            errors.push(ValidationError::WatchDirNotFound(dir.clone()));
        }
    }

    for pattern in &config.ignore {
        if let Err(error) = glob::Pattern::new(pattern) {
            errors.push(ValidationError::InvalidIgnorePattern {
                pattern: pattern.clone(),
                error,
            });
        }
    }

    if let Some(tls) = &config.tls {
        if !tls.cert_path.exists() {
            errors.push(ValidationError::TlsFileNotFound(tls.cert_path.clone()));
        }
        if !tls.key_path.exists() {
            errors.push(ValidationError::TlsFileNotFound(tls.key_path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServeConfig::new(dir.path());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_missing_root() {
        let config = ServeConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::MissingRoot));
    }

    #[test]
    fn rejects_nonexistent_root() {
        let config = ServeConfig::new("/definitely/not/a/real/dir");
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::RootNotFound(_)));
    }

    #[test]
    fn rejects_invalid_glob() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServeConfig::new(dir.path());
        config.ignore.push("[".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidIgnorePattern { .. })));
    }

    #[test]
    fn rejects_missing_tls_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServeConfig::new(dir.path());
        config.tls = Some(crate::config::TlsConfig {
            cert_path: dir.path().join("missing.pem"),
            key_path: dir.path().join("missing-key.pem"),
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
