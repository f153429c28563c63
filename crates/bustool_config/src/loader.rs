//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::GeneratorConfig;
use std::path::Path;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "bustool.toml";

/// Loads and validates a `bustool.toml` configuration file.
pub fn load_config(path: &Path) -> Result<GeneratorConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `bustool.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<GeneratorConfig, ConfigError> {
    let config: GeneratorConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates values serde cannot check on its own.
fn validate_config(config: &GeneratorConfig) -> Result<(), ConfigError> {
    let indent = &config.output.indent;
    if indent.is_empty() {
        return Err(ConfigError::ValidationError(
            "output.indent must not be empty".to_string(),
        ));
    }
    if !indent.chars().all(|c| c == ' ' || c == '\t') {
        return Err(ConfigError::ValidationError(
            "output.indent may only contain spaces and tabs".to_string(),
        ));
    }
    if let Some(empty) = config.build.entities.iter().find(|e| e.is_empty()) {
        return Err(ConfigError::ValidationError(format!(
            "build.entities contains an empty id '{empty}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LineEnding;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.output.indent, "    ");
        assert!(config.output.banner);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[output]
indent = "\t"
line_ending = "crlf"
banner = false

[build]
entities = ["bus_a", "mux"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.output.indent, "\t");
        assert_eq!(config.output.line_ending, LineEnding::Crlf);
        assert!(!config.output.banner);
        assert_eq!(config.build.entities, vec!["bus_a", "mux"]);
    }

    #[test]
    fn empty_indent_errors() {
        let err = load_config_from_str("[output]\nindent = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn non_whitespace_indent_errors() {
        let err = load_config_from_str("[output]\nindent = \"--\"").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_line_ending_errors() {
        let err = load_config_from_str("[output]\nline_ending = \"cr\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_key_errors() {
        let err = load_config_from_str("[output]\ntabs = 4").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[build]\nentities = [\"mux\"]\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.build.entities, vec!["mux"]);
    }

    #[test]
    fn io_error_from_missing_file() {
        let err = load_config(Path::new("/nonexistent/bustool.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
