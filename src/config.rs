//! Engine configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! [limits]
//! max_extend_depth = 32
//! max_include_depth = 32
//!
//! [templates]
//! dir = "templates"
//! extension = "html"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration options for rendering
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: Limits,
    pub templates: DirectoryConfig,
}

/// Bounds on resolution passes, so reference cycles fail instead of hanging
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Parent hops, and section substitution passes
    pub max_extend_depth: usize,
    /// Include substitution passes
    pub max_include_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_extend_depth: 32,
            max_include_depth: 32,
        }
    }
}

impl Limits {
    pub fn with_max_extend_depth(mut self, depth: usize) -> Self {
        self.max_extend_depth = depth;
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }
}

/// Where a directory-backed template source looks for templates
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub dir: Option<PathBuf>,
    /// Appended to names without an extension
    pub extension: Option<String>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates.dir = Some(dir.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.templates.extension = Some(extension.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.limits.max_extend_depth, 32);
        assert_eq!(config.limits.max_include_depth, 32);
        assert!(config.templates.dir.is_none());
    }

    #[test]
    fn test_from_str_partial() {
        let config = EngineConfig::from_str(
            r#"
[limits]
max_include_depth = 8

[templates]
dir = "views"
extension = "html"
"#,
        )
        .expect("Should parse");

        assert_eq!(config.limits.max_extend_depth, 32);
        assert_eq!(config.limits.max_include_depth, 8);
        assert_eq!(config.templates.dir, Some(PathBuf::from("views")));
        assert_eq!(config.templates.extension.as_deref(), Some("html"));
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(EngineConfig::from_str("").expect("Should parse"), EngineConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let err = EngineConfig::from_str("[limits]\nmax_extend_depth = 'deep'").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new()
            .with_limits(Limits::default().with_max_extend_depth(2))
            .with_template_dir("views")
            .with_extension("tpl");

        assert_eq!(config.limits.max_extend_depth, 2);
        assert_eq!(config.templates.dir, Some(PathBuf::from("views")));
        assert_eq!(config.templates.extension.as_deref(), Some("tpl"));
    }
}
