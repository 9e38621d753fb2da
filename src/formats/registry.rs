//! Format registry for token serialization
//!
//! This module provides a pluggable registry of token stream formats. Each format implements
//! the `TokenFormatter` trait and can be registered with `FormatRegistry`.

use crate::lexing::{Document, TokenizedDocument};
use std::collections::HashMap;
use thiserror::Error;

/// Error that can occur during formatting
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Format not found in registry
    #[error("Format '{0}' not found")]
    FormatNotFound(String),
    /// Error during serialization
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// A token that does not lie inside the document it is printed against
    #[error("Token {line}:{start}..{end} is outside the document")]
    TokenOutOfRange {
        line: usize,
        start: usize,
        end: usize,
    },
}

/// Trait for token stream formatters
///
/// Implementors turn the tokens of a document into a string. The source document is passed
/// along so formats can print the text of every token.
pub trait TokenFormatter: Send + Sync {
    /// The name of this format (e.g., "tagged", "json")
    fn name(&self) -> &str;

    /// Serialize the tokens of `document`, tokenized as `language`
    fn serialize(
        &self,
        document: &Document,
        tokens: &TokenizedDocument,
        language: &str,
    ) -> Result<String, FormatError>;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }
}

/// Registry of token formatters
pub struct FormatRegistry {
    formatters: HashMap<String, Box<dyn TokenFormatter>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Register a formatter
    ///
    /// If a formatter with the same name already exists, it will be replaced.
    pub fn register<F: TokenFormatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<&dyn TokenFormatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Serialize using the named format
    pub fn serialize(
        &self,
        format: &str,
        document: &Document,
        tokens: &TokenizedDocument,
        language: &str,
    ) -> Result<String, FormatError> {
        let formatter = self
            .get(format)
            .ok_or_else(|| FormatError::FormatNotFound(format.to_string()))?;
        formatter.serialize(document, tokens, language)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formatters.keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a registry with the built-in formatters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(super::TaggedFormatter);
        registry.register(super::JsonFormatter);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
