//! Output format implementations for token streams
//!
//! This module contains the serializers the CLI and hosts use to print a tokenized document:
//! - tagged: one human-readable line per token
//! - json: the token list with its text, for tooling

pub mod json;
pub mod registry;
pub mod tagged;

pub use json::JsonFormatter;
pub use registry::{FormatError, FormatRegistry, TokenFormatter};
pub use tagged::TaggedFormatter;

use crate::lexing::{Document, Token};

/// The text `token` covers in `document`, or an error if the token does not fit it.
pub(crate) fn token_text<'d>(document: &'d Document, token: &Token) -> Result<&'d str, FormatError> {
    document
        .line(token.line)
        .and_then(|line| line.get(token.span.clone()))
        .ok_or(FormatError::TokenOutOfRange {
            line: token.line,
            start: token.span.start,
            end: token.span.end,
        })
}
