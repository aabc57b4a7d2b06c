//! File processing API for XProtocol exports
//!
//! A processing spec names a stage (what data to extract) and a format (how to render
//! it), written as `<stage>-<format>`:
//!
//!     token-simple   one row per token with its line
//!     token-json     token stream as JSON
//!     ast-json       parsed document as JSON
//!     ast-yaml       parsed document as YAML
//!     ast-treeviz    parsed document as a one-line-per-node tree

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::xprot::config::XprotConfig;
use crate::xprot::formats;
use crate::xprot::lexing::tokenize;
use crate::xprot::parsing::{parse_with, ParseError};

/// Represents the processing stage (what data to extract)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Token,
    Ast,
}

/// Represents the output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Simple,
    Json,
    Yaml,
    Treeviz,
}

/// Represents a complete processing specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingSpec {
    pub stage: ProcessingStage,
    pub format: OutputFormat,
}

/// Errors that can occur during processing
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("invalid format '{0}', expected <stage>-<format>")]
    InvalidFormat(String),
    #[error("invalid stage '{0}'")]
    InvalidStage(String),
    #[error("invalid format type: {0}")]
    InvalidFormatType(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ProcessingSpec {
    /// Parse a format string like "token-simple" or "ast-treeviz"
    pub fn from_string(format_str: &str) -> Result<Self, ProcessingError> {
        let Some((stage, format)) = format_str.split_once('-') else {
            return Err(ProcessingError::InvalidFormat(format_str.to_string()));
        };

        let stage = match stage {
            "token" => ProcessingStage::Token,
            "ast" => ProcessingStage::Ast,
            _ => return Err(ProcessingError::InvalidStage(stage.to_string())),
        };

        let format = match format {
            "simple" => OutputFormat::Simple,
            "json" => OutputFormat::Json,
            "yaml" => OutputFormat::Yaml,
            "treeviz" => OutputFormat::Treeviz,
            _ => return Err(ProcessingError::InvalidFormatType(format.to_string())),
        };

        // Validate stage/format compatibility
        match (stage, format) {
            (ProcessingStage::Token, OutputFormat::Simple | OutputFormat::Json) => {}
            (
                ProcessingStage::Ast,
                OutputFormat::Json | OutputFormat::Yaml | OutputFormat::Treeviz,
            ) => {}
            (ProcessingStage::Token, _) => {
                return Err(ProcessingError::InvalidFormatType(format!(
                    "'{}' not supported for token stage (only 'simple' and 'json' are supported)",
                    format
                )))
            }
            (ProcessingStage::Ast, _) => {
                return Err(ProcessingError::InvalidFormatType(format!(
                    "'{}' not supported for AST stage (only 'json', 'yaml' and 'treeviz' are supported)",
                    format
                )))
            }
        }

        Ok(ProcessingSpec { stage, format })
    }

    /// Get all available processing specifications
    pub fn available_specs() -> Vec<ProcessingSpec> {
        vec![
            ProcessingSpec {
                stage: ProcessingStage::Token,
                format: OutputFormat::Simple,
            },
            ProcessingSpec {
                stage: ProcessingStage::Token,
                format: OutputFormat::Json,
            },
            ProcessingSpec {
                stage: ProcessingStage::Ast,
                format: OutputFormat::Json,
            },
            ProcessingSpec {
                stage: ProcessingStage::Ast,
                format: OutputFormat::Yaml,
            },
            ProcessingSpec {
                stage: ProcessingStage::Ast,
                format: OutputFormat::Treeviz,
            },
        ]
    }
}

impl FromStr for ProcessingSpec {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProcessingSpec::from_string(s)
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStage::Token => write!(f, "token"),
            ProcessingStage::Ast => write!(f, "ast"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Simple => write!(f, "simple"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Treeviz => write!(f, "treeviz"),
        }
    }
}

impl fmt::Display for ProcessingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.stage, self.format)
    }
}

/// Process source text according to the given specification
pub fn process(
    source: &str,
    spec: &ProcessingSpec,
    config: &XprotConfig,
) -> Result<String, ProcessingError> {
    let tokens = tokenize(source);

    if spec.stage == ProcessingStage::Token {
        return match spec.format {
            OutputFormat::Json => Ok(formats::tokens_to_json(&tokens)?),
            _ => Ok(formats::tokens_to_simple(&tokens)),
        };
    }

    let doc = parse_with(&tokens, &config.parser)?;
    match spec.format {
        OutputFormat::Json => Ok(formats::document_to_json(&doc)?),
        OutputFormat::Yaml => Ok(formats::document_to_yaml(&doc)?),
        _ => Ok(formats::to_treeviz_str(&doc, &config.output.treeviz)),
    }
}

/// Process an XProtocol file according to the given specification
pub fn process_file<P: AsRef<Path>>(
    file_path: P,
    spec: &ProcessingSpec,
    config: &XprotConfig,
) -> Result<String, ProcessingError> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).map_err(|source| ProcessingError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    process(&content, spec, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xprot::config::load_defaults;

    const SOURCE: &str = r#"<XProtocol> {
  <Name> "Tiny"
  <ID> 7
  <Userversion> 1.0
  <EVAStringTable> { }
  <ParamCardLayout."Card"> { }
}"#;

    #[test]
    fn test_spec_parsing() {
        let spec = ProcessingSpec::from_string("ast-treeviz").unwrap();
        assert_eq!(spec.stage, ProcessingStage::Ast);
        assert_eq!(spec.format, OutputFormat::Treeviz);

        let spec: ProcessingSpec = "token-json".parse().unwrap();
        assert_eq!(spec.stage, ProcessingStage::Token);
        assert_eq!(spec.format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_specs() {
        assert!(matches!(
            ProcessingSpec::from_string("treeviz"),
            Err(ProcessingError::InvalidFormat(_))
        ));
        assert!(matches!(
            ProcessingSpec::from_string("xml-json"),
            Err(ProcessingError::InvalidStage(_))
        ));
        assert!(matches!(
            ProcessingSpec::from_string("ast-xml"),
            Err(ProcessingError::InvalidFormatType(_))
        ));
        assert!(matches!(
            ProcessingSpec::from_string("token-treeviz"),
            Err(ProcessingError::InvalidFormatType(_))
        ));
        assert!(matches!(
            ProcessingSpec::from_string("ast-simple"),
            Err(ProcessingError::InvalidFormatType(_))
        ));
    }

    #[test]
    fn test_available_specs_round_trip() {
        for spec in ProcessingSpec::available_specs() {
            let parsed = ProcessingSpec::from_string(&spec.to_string()).unwrap();
            assert_eq!(parsed, spec);
        }
    }

    #[test]
    fn test_process_each_spec() {
        let config = load_defaults().unwrap();
        for spec in ProcessingSpec::available_specs() {
            let output = process(SOURCE, &spec, &config).unwrap();
            assert!(!output.is_empty(), "empty output for {}", spec);
        }
    }

    #[test]
    fn test_process_reports_parse_errors() {
        let config = load_defaults().unwrap();
        let spec = ProcessingSpec::from_string("ast-json").unwrap();
        let err = process("<XProtocol> {", &spec, &config).unwrap_err();
        assert!(matches!(err, ProcessingError::Parse(_)));
        assert!(err.to_string().starts_with("line 1:"));
    }

    #[test]
    fn test_token_stage_ignores_structure() {
        let config = load_defaults().unwrap();
        let spec = ProcessingSpec::from_string("token-simple").unwrap();
        let output = process("} } {", &spec, &config).unwrap();
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_process_file_missing() {
        let config = load_defaults().unwrap();
        let spec = ProcessingSpec::from_string("ast-json").unwrap();
        let err = process_file("/nonexistent/file.xprot", &spec, &config).unwrap_err();
        assert!(matches!(err, ProcessingError::Io { .. }));
    }
}
