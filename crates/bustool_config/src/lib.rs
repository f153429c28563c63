//! Parsing and validation of `bustool.toml` generator configuration files.
//!
//! The configuration controls the shape of the emitted text (indent unit,
//! line endings, banner) and which entities of a description are emitted.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
