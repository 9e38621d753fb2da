//! Language registry
//!
//! This module provides an explicit name -> language registry. Hosts build one at start-up,
//! register the languages they want and ask it for tokenizers. There is no global state: a
//! registry is an ordinary value, and two registries never see each other's languages.
//!
//! Rule tables are compiled once at registration and shared by every tokenizer handed out.

use crate::languages;
use crate::lexing::{ConfigError, LanguageDefinition, RuleTable, Tokenizer};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of compiled languages
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    tables: HashMap<String, Arc<RuleTable>>,
}

impl LanguageRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        LanguageRegistry {
            tables: HashMap::new(),
        }
    }

    /// Compile and register a language under its definition's name
    ///
    /// If a language with the same name already exists, it will be replaced.
    pub fn register(&mut self, definition: &LanguageDefinition) -> Result<(), ConfigError> {
        let table = RuleTable::build(definition)?;
        self.register_table(Arc::new(table));
        Ok(())
    }

    /// Register an already compiled table
    pub fn register_table(&mut self, table: Arc<RuleTable>) {
        let name = table.language().to_string();
        if self.tables.insert(name.clone(), table).is_some() {
            log::debug!("replaced language '{name}'");
        } else {
            log::debug!("registered language '{name}'");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<RuleTable>> {
        self.tables.get(name).cloned()
    }

    pub fn tokenizer(&self, name: &str) -> Option<Tokenizer> {
        self.get(name).map(Tokenizer::new)
    }

    pub fn has(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// List all registered language names (sorted)
    pub fn list_languages(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a registry holding every built-in language
    pub fn with_defaults() -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for definition in languages::builtin_definitions() {
            registry.register(&definition)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexing::rule;

    fn tiny(name: &str, class: &str) -> LanguageDefinition {
        LanguageDefinition::new(name, "root").mode("root", vec![rule(r"\S+", class)])
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = LanguageRegistry::default();
        assert!(registry.list_languages().is_empty());
        assert!(registry.tokenizer("asm").is_none());
    }

    #[test]
    fn test_registry_register_and_tokenize() {
        let mut registry = LanguageRegistry::new();
        registry.register(&tiny("tiny", "word")).unwrap();

        assert!(registry.has("tiny"));
        let tokenizer = registry.tokenizer("tiny").unwrap();
        assert_eq!(tokenizer.tokenize(&["x"]).tokens()[0].class, "word");
    }

    #[test]
    fn test_registry_replaces_by_name() {
        let mut registry = LanguageRegistry::new();
        registry.register(&tiny("tiny", "word")).unwrap();
        registry.register(&tiny("tiny", "other")).unwrap();

        assert_eq!(registry.list_languages(), vec!["tiny"]);
        let tokenizer = registry.tokenizer("tiny").unwrap();
        assert_eq!(tokenizer.tokenize(&["x"]).tokens()[0].class, "other");
    }

    #[test]
    fn test_registry_rejects_broken_definitions() {
        let mut registry = LanguageRegistry::new();
        let broken = LanguageDefinition::new("broken", "missing");
        assert_eq!(
            registry.register(&broken),
            Err(ConfigError::UndefinedBaseMode("missing".into()))
        );
        assert!(!registry.has("broken"));
    }

    #[test]
    fn test_registry_tables_are_shared() {
        let registry = LanguageRegistry::with_defaults().unwrap();
        assert_eq!(registry.list_languages(), vec!["asm"]);
        let a = registry.tokenizer("asm").unwrap();
        let b = registry.tokenizer("asm").unwrap();
        assert!(Arc::ptr_eq(&a.shared_table(), &b.shared_table()));
    }
}
