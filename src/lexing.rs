//! Lexing engine
//!
//!     This module holds the language-independent tokenizer. A language is a set of named
//!     modes, each an ordered list of rules. Scanning a line means repeatedly asking the
//!     active mode (the top of the mode stack) for its first rule that matches at the cursor,
//!     emitting that rule's tokens and applying its stack transition.
//!
//! The Layers
//!
//!     1. Pattern library. See [patterns]. Named sub-patterns referenced as `@name` and
//!        substituted textually when the rule table is built.
//!
//!     2. Rule definitions. See [rules]. The serde-friendly, declarative description of a
//!        language: modes, rules, emissions and transitions as written by humans.
//!
//!     3. Rule table. See [rule_table]. The validated, compiled form of a definition. Mode
//!        references are resolved to ids, patterns are compiled once and shared. Every
//!        configuration mistake surfaces here, before any text is scanned.
//!
//!     4. Mode stack machine. See [machine]. Scans one line against the rule table, mutating
//!        a [ScannerState].
//!
//!     5. Line driver. See [driver]. Feeds a document to the machine one line at a time and
//!        carries the mode stack across line boundaries.
//!
//! Coverage
//!
//!     The machine never rejects input. When no rule matches, one character is emitted with
//!     the language's default token class and scanning moves on. Together with gap filling
//!     for group emissions this guarantees the output partitions every line exactly.

pub mod driver;
pub mod error;
pub mod machine;
pub mod patterns;
pub mod rule_table;
pub mod rules;
pub mod token;

pub use driver::{Document, LineDriver, TokenizedDocument, Tokenizer};
pub use error::ConfigError;
pub use machine::{ModeStackMachine, ScannerState, MAX_ZERO_WIDTH_STEPS};
pub use patterns::{Pattern, PatternLibrary, PatternMatch};
pub use rule_table::{Action, CompiledEmission, Mode, ModeId, Rule, RuleTable};
pub use rules::{include, rule, Emission, LanguageDefinition, MatchRule, RuleSpec, Transition};
pub use token::{Token, TokenClass};
