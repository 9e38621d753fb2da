//! Token types emitted by the engine.
//!
//!     A token is a classification of one span of one line. Token classes are free-form,
//!     dot-separated labels (`keyword`, `string.escape`, `type.identifier`) chosen by the
//!     language definition; the host maps them onto visual styles.

use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// A token-class label.
///
/// Labels are interned per rule table, so cloning one is a reference count bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TokenClass(Arc<str>);

impl TokenClass {
    pub fn new(label: &str) -> Self {
        TokenClass(Arc::from(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenClass {
    fn from(label: &str) -> Self {
        TokenClass::new(label)
    }
}

impl PartialEq<str> for TokenClass {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for TokenClass {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// One classified span.
///
/// `span` holds byte offsets into the line identified by `line`, end exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub class: TokenClass,
    pub line: usize,
    pub span: Range<usize>,
}

impl Token {
    pub fn new(class: TokenClass, line: usize, span: Range<usize>) -> Self {
        Token { class, line, span }
    }

    /// The slice of `line_text` this token covers.
    pub fn text<'a>(&self, line_text: &'a str) -> &'a str {
        &line_text[self.span.clone()]
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}
