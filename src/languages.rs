//! Built-in language definitions
//!
//!     Languages are plain [LanguageDefinition] values. Their rule lists are written as
//!     ordered data so precedence can be read straight off the table; nothing is registered
//!     anywhere as a side effect of this module being linked in. Hosts pick the ones they want
//!     through [crate::registry::LanguageRegistry].

use crate::lexing::LanguageDefinition;

pub mod asm;

/// Every language shipped with the crate.
pub fn builtin_definitions() -> Vec<LanguageDefinition> {
    vec![asm::definition()]
}
