//! Configuration loader for the xprot toolchain.
//!
//! `defaults/xprot.default.toml` is embedded into every binary so that docs and runtime
//! behavior stay in sync. Applications layer user-specific files on top of those defaults
//! via [`Loader`] before deserializing into [`XprotConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/xprot.default.toml");

/// Top-level configuration consumed by xprot applications.
#[derive(Debug, Clone, Deserialize)]
pub struct XprotConfig {
    pub parser: ParserConfig,
    pub output: OutputConfig,
}

/// Knobs that change how the grammar treats borderline input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ParserConfig {
    pub dependency_attributes: DependencyAttributePolicy,
}

/// Policy for a dependency block with more than one trailing attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyAttributePolicy {
    /// Fail the parse
    #[default]
    Strict,
    /// Keep the first attribute and log the rest
    KeepFirst,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Processing spec used when none is given, e.g. `ast-treeviz`
    pub format: String,
    pub treeviz: TreevizConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreevizConfig {
    pub max_label_width: usize,
    pub show_values: bool,
}

impl Default for TreevizConfig {
    fn default() -> Self {
        Self {
            max_label_width: 40,
            show_values: true,
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<XprotConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<XprotConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(
            config.parser.dependency_attributes,
            DependencyAttributePolicy::Strict
        );
        assert_eq!(config.output.format, "ast-treeviz");
        assert_eq!(config.output.treeviz, TreevizConfig::default());
    }

    #[test]
    fn defaults_match_parser_default() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.parser, ParserConfig::default());
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("parser.dependency_attributes", "keep-first")
            .expect("override to apply")
            .set_override("output.treeviz.max_label_width", 12i64)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(
            config.parser.dependency_attributes,
            DependencyAttributePolicy::KeepFirst
        );
        assert_eq!(config.output.treeviz.max_label_width, 12);
    }

    #[test]
    fn layers_user_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "[output]\nformat = \"ast-json\"").expect("write config");

        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(config.output.format, "ast-json");
        assert!(config.output.treeviz.show_values);
    }

    #[test]
    fn optional_file_may_be_missing() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/xprot.toml")
            .build()
            .expect("config to build");
        assert_eq!(config.output.format, "ast-treeviz");
    }

    #[test]
    fn required_file_must_exist() {
        assert!(Loader::new()
            .with_file("/nonexistent/xprot.toml")
            .build()
            .is_err());
    }
}
