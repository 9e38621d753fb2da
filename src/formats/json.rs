//! JSON token listing
//!
//!     { "language": "asm", "tokens": [ { "class", "line", "start", "end", "text" }, ... ] }

use super::registry::{FormatError, TokenFormatter};
use super::token_text;
use crate::lexing::{Document, TokenizedDocument};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    language: &'a str,
    tokens: Vec<JsonToken<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonToken<'a> {
    class: &'a str,
    line: usize,
    start: usize,
    end: usize,
    text: &'a str,
}

pub struct JsonFormatter;

impl TokenFormatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Token list as pretty-printed JSON"
    }

    fn serialize(
        &self,
        document: &Document,
        tokens: &TokenizedDocument,
        language: &str,
    ) -> Result<String, FormatError> {
        let tokens = tokens
            .tokens()
            .iter()
            .map(|token| {
                Ok(JsonToken {
                    class: token.class.as_str(),
                    line: token.line,
                    start: token.span.start,
                    end: token.span.end,
                    text: token_text(document, token)?,
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;

        serde_json::to_string_pretty(&JsonDocument { language, tokens })
            .map_err(|e| FormatError::SerializationError(e.to_string()))
    }
}
