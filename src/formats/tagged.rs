//! Tagged token listing
//!
//!     One line per token: `<line>:<start>..<end> <class> <text>`, where the line index is
//!     zero based, the columns are byte offsets and the text is printed as a quoted Rust
//!     string so whitespace and escapes stay visible:
//!
//!         0:0..5 type.identifier "main:"
//!         1:0..8 white "        "
//!         1:8..11 keyword "ret"

use super::registry::{FormatError, TokenFormatter};
use super::token_text;
use crate::lexing::{Document, TokenizedDocument};
use std::fmt::Write;

pub struct TaggedFormatter;

impl TokenFormatter for TaggedFormatter {
    fn name(&self) -> &str {
        "tagged"
    }

    fn description(&self) -> &str {
        "One line per token: position, class and text"
    }

    fn serialize(
        &self,
        document: &Document,
        tokens: &TokenizedDocument,
        _language: &str,
    ) -> Result<String, FormatError> {
        let mut out = String::new();
        for token in tokens.tokens() {
            let text = token_text(document, token)?;
            writeln!(
                out,
                "{}:{}..{} {} {:?}",
                token.line, token.span.start, token.span.end, token.class, text
            )
            .map_err(|e| FormatError::SerializationError(e.to_string()))?;
        }
        Ok(out)
    }
}
