//! Configuration types deserialized from `bustool.toml`.

use serde::Deserialize;

use crate::error::ConfigError;

/// The top-level generator configuration parsed from `bustool.toml`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Text output settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// Entity selection settings.
    #[serde(default)]
    pub build: BuildConfig,
}

/// Shape of the emitted hardware-description text.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// One level of indentation.
    #[serde(default = "default_indent")]
    pub indent: String,
    /// Line terminator style.
    #[serde(default)]
    pub line_ending: LineEnding,
    /// Whether to start the output with a "generated by" comment.
    #[serde(default = "default_banner")]
    pub banner: bool,
}

fn default_indent() -> String {
    "    ".to_string()
}

fn default_banner() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            line_ending: LineEnding::default(),
            banner: default_banner(),
        }
    }
}

/// Line terminator written after every emitted line.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\n` (default).
    #[default]
    Lf,
    /// `\r\n`.
    Crlf,
}

impl LineEnding {
    /// Returns the terminator text.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Which entities of a description get emitted.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Entity ids to emit. Empty means every entity. Output always follows
    /// document order.
    #[serde(default)]
    pub entities: Vec<String>,
}

impl BuildConfig {
    /// Checks every selected id with `exists`, failing on the first unknown one.
    pub fn check_entities<F>(&self, exists: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> bool,
    {
        match self.entities.iter().find(|id| !exists(id)) {
            Some(id) => Err(ConfigError::UnknownEntity(id.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.output.indent, "    ");
        assert_eq!(config.output.line_ending, LineEnding::Lf);
        assert!(config.output.banner);
        assert!(config.build.entities.is_empty());
    }

    #[test]
    fn check_entities_reports_first_unknown() {
        let build = BuildConfig {
            entities: vec!["bus_a".into(), "mux9".into(), "xbar9".into()],
        };
        let err = build.check_entities(|id| id == "bus_a").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEntity(ref id) if id == "mux9"));
        assert!(build.check_entities(|_| true).is_ok());
    }

    #[test]
    fn line_ending_text() {
        assert_eq!(LineEnding::Lf.as_str(), "\n");
        assert_eq!(LineEnding::Crlf.as_str(), "\r\n");
    }
}
