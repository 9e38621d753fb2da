//! # asmlex
//!
//! A rule-table driven tokenizer for compiler and assembler output.
//!
//! File Layout
//!
//!     The crate is split the same way the tokenizer is layered: the engine is generic and
//!     knows nothing about assembly, the languages are plain data fed into it.
//!
//!     src/
//!       ├── lexing       The engine: pattern library, rule table, mode stack machine, line driver
//!       ├── languages    Built-in language definitions (rule tables as data)
//!       ├── loader       Loading user language definitions from YAML / JSON
//!       ├── registry     Explicit name -> language registry for host integrations
//!       ├── formats      Serializers for token streams (tagged text, json)
//!       └── testing      Fluent assertions over tokenized documents
//!
//!     Hosts own presentation (themes, rendering). They ask the engine, line by line, for the
//!     next token run and never do lexical work themselves.
//!
//! Quick Start
//!
//!     let registry = LanguageRegistry::with_defaults()?;
//!     let tokenizer = registry.tokenizer("asm").unwrap();
//!     let tokens = tokenizer.tokenize_text("main:\n        ret\n");

#![allow(rustdoc::invalid_html_tags)]

pub mod formats;
pub mod languages;
pub mod lexing;
pub mod loader;
pub mod registry;
pub mod testing;

pub use lexing::{
    ConfigError, Document, LanguageDefinition, RuleTable, ScannerState, Token, TokenClass,
    TokenizedDocument, Tokenizer,
};
pub use registry::LanguageRegistry;
