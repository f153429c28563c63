//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `bustool.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// An entity selected for output does not exist in the description.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_entity() {
        let err = ConfigError::UnknownEntity("mux9".to_string());
        assert_eq!(format!("{err}"), "unknown entity 'mux9'");
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("indent must not be empty".to_string());
        assert_eq!(
            format!("{err}"),
            "validation error: indent must not be empty"
        );
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let display = format!("{}", ConfigError::IoError(io_err));
        assert!(display.starts_with("failed to read configuration:"));
    }
}
