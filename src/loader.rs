//! Language definition loading
//!
//! This module provides `DefinitionLoader` - a utility for reading language definitions from
//! YAML or JSON, either from files or from strings, and turning them into rule tables. The CLI
//! uses it for `--definition` and `check`; tests use it for fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use asmlex::loader::DefinitionLoader;
//!
//! // From file, format chosen by extension
//! let tokenizer = DefinitionLoader::from_path("my-asm.yaml")?.tokenizer()?;
//!
//! // From string
//! let table = DefinitionLoader::from_yaml_str(source)?.table()?;
//! ```
//!
//! The on-disk shape is the serde form of [LanguageDefinition]:
//!
//!     name: demo
//!     base_mode: root
//!     default_token: invalid
//!     patterns:
//!       digits: '[0-9]+'
//!     modes:
//!       root:
//!         - { regex: '@digits', token: number }
//!         - { regex: '"', token: string.quote, next: '@push string' }
//!         - { include: whitespace }

use crate::lexing::{ConfigError, LanguageDefinition, RuleTable, Tokenizer};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a definition
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("cannot read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML definition: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON definition: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported definition file '{}' (expected .yaml, .yml or .json)", .0.display())]
    UnsupportedExtension(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Source formats a definition can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Yaml,
    Json,
}

impl DefinitionFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Some(DefinitionFormat::Yaml),
            "json" => Some(DefinitionFormat::Json),
            _ => None,
        }
    }
}

/// A parsed but not yet compiled language definition
#[derive(Debug, Clone)]
pub struct DefinitionLoader {
    definition: LanguageDefinition,
}

impl DefinitionLoader {
    /// Load from a file path; `.yaml`/`.yml` or `.json`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DefinitionError> {
        let path = path.as_ref();
        let format = DefinitionFormat::from_path(path)
            .ok_or_else(|| DefinitionError::UnsupportedExtension(path.to_path_buf()))?;
        let source = fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loading {:?} definition from {}", format, path.display());
        Self::from_source(&source, format)
    }

    pub fn from_source(source: &str, format: DefinitionFormat) -> Result<Self, DefinitionError> {
        match format {
            DefinitionFormat::Yaml => Self::from_yaml_str(source),
            DefinitionFormat::Json => Self::from_json_str(source),
        }
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, DefinitionError> {
        Ok(DefinitionLoader {
            definition: serde_yaml::from_str(source)?,
        })
    }

    pub fn from_json_str(source: &str) -> Result<Self, DefinitionError> {
        Ok(DefinitionLoader {
            definition: serde_json::from_str(source)?,
        })
    }

    pub fn definition(&self) -> &LanguageDefinition {
        &self.definition
    }

    pub fn into_definition(self) -> LanguageDefinition {
        self.definition
    }

    /// Compile the definition, reporting any configuration error.
    pub fn table(&self) -> Result<RuleTable, DefinitionError> {
        Ok(RuleTable::build(&self.definition)?)
    }

    pub fn tokenizer(&self) -> Result<Tokenizer, DefinitionError> {
        Ok(Tokenizer::from_definition(&self.definition)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: demo
base_mode: root
patterns:
  digits: '[0-9]+'
modes:
  root:
    - { regex: '@digits', token: number }
    - { regex: '"', token: string.quote, next: '@push string' }
    - { include: ws }
  ws:
    - { regex: '\s+', token: white }
  string:
    - { regex: '[^"]+', token: string }
    - { regex: '"', token: string.quote, next: '@pop' }
"#;

    #[test]
    fn test_yaml_definition_builds() {
        let loader = DefinitionLoader::from_yaml_str(YAML).unwrap();
        assert_eq!(loader.definition().name, "demo");
        assert_eq!(loader.definition().default_token, "unclassified");

        let tokenizer = loader.tokenizer().unwrap();
        let out = tokenizer.tokenize(&[r#"12 "a b""#]);
        let classes: Vec<&str> = out.tokens().iter().map(|t| t.class.as_str()).collect();
        assert_eq!(
            classes,
            vec!["number", "white", "string.quote", "string", "string.quote"]
        );
    }

    #[test]
    fn test_json_definition() {
        let json = r#"{
            "name": "j",
            "base_mode": "root",
            "modes": { "root": [ { "regex": "x", "token": ["", "y"] } ] }
        }"#;
        let loader = DefinitionLoader::from_json_str(json).unwrap();
        assert!(loader.table().is_ok());
    }

    #[test]
    fn test_configuration_errors_surface() {
        let broken = YAML.replace("'@push string'", "'@push nowhere'");
        let err = DefinitionLoader::from_yaml_str(&broken)
            .unwrap()
            .table()
            .unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::Config(ConfigError::UndefinedMode { .. })
        ));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let broken = YAML.replace("token: white", "tokn: white");
        assert!(matches!(
            DefinitionLoader::from_yaml_str(&broken),
            Err(DefinitionError::Yaml(_))
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DefinitionFormat::from_path(Path::new("a.YML")),
            Some(DefinitionFormat::Yaml)
        );
        assert_eq!(
            DefinitionFormat::from_path(Path::new("a.json")),
            Some(DefinitionFormat::Json)
        );
        assert_eq!(DefinitionFormat::from_path(Path::new("a.txt")), None);
        assert!(matches!(
            DefinitionLoader::from_path("defs.toml"),
            Err(DefinitionError::UnsupportedExtension(_))
        ));
    }
}
