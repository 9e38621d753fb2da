//! Configuration errors raised while building a rule table.
//!
//! Lexical problems never produce errors: they degrade to default-class tokens. Everything in
//! here is a mistake in a language definition and is reported before any text is scanned.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("base mode '{0}' is not defined")]
    UndefinedBaseMode(String),

    #[error("mode '{mode}' rule {rule}: transition references undefined mode '{target}'")]
    UndefinedMode {
        mode: String,
        rule: usize,
        target: String,
    },

    #[error("mode '{0}' has no rules")]
    EmptyMode(String),

    #[error("mode '{mode}' includes undefined mode '{target}'")]
    UndefinedInclude { mode: String, target: String },

    #[error("include cycle: {0}")]
    IncludeCycle(String),

    #[error("unknown pattern '@{name}' referenced from {context}")]
    UnknownPattern { name: String, context: String },

    #[error("pattern cycle: {0}")]
    PatternCycle(String),

    #[error("{context}: invalid pattern: {message}")]
    InvalidPattern { context: String, message: String },

    #[error("base mode '{mode}' rule {rule} uses '{transition}', which would unwind the base mode")]
    BaseModeUnwinds {
        mode: String,
        rule: usize,
        transition: String,
    },

    #[error("mode '{mode}' can rematch onto mode '{under}', whose first rule rematches again")]
    RematchChain { mode: String, under: String },
}
