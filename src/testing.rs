//! Testing utilities for token assertions
//!
//! Checking token runs by hand means indexing into vectors, slicing line text and comparing
//! labels one field at a time. `assert_tokens` wraps a tokenized document in a fluent API
//! instead, so a whole line can be checked in one expression:
//!
//! ```rust-example
//! use asmlex::testing::assert_tokens;
//!
//! let document = Document::from_text("        mov     eax, 1");
//! let tokens = tokenizer.tokenize_document(&document);
//!
//! assert_tokens(&tokens, &document)
//!     .line_count(1)
//!     .covers_every_line()
//!     .line(0, |line| {
//!         line.significant(&[
//!             ("keyword", "mov"),
//!             ("variable.predefined", "eax"),
//!             ("operator", ","),
//!             ("number", "1"),
//!         ]);
//!     });
//! ```
//!
//! Failures name the line and token index they were raised for and print the run that was
//! actually produced.

use crate::lexing::{Document, Token, TokenizedDocument};

/// Class of whitespace tokens, skipped by [LineAssertion::significant].
pub const WHITESPACE_CLASS: &str = "white";

pub fn assert_tokens<'a>(
    tokens: &'a TokenizedDocument,
    document: &'a Document,
) -> DocumentAssertion<'a> {
    DocumentAssertion { tokens, document }
}

pub struct DocumentAssertion<'a> {
    tokens: &'a TokenizedDocument,
    document: &'a Document,
}

impl<'a> DocumentAssertion<'a> {
    pub fn line_count(self, expected: usize) -> Self {
        assert_eq!(
            self.tokens.line_count(),
            expected,
            "Expected {} tokenized lines, found {}",
            expected,
            self.tokens.line_count()
        );
        self
    }

    pub fn line<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(LineAssertion<'a>),
    {
        assert!(
            index < self.tokens.line_count(),
            "Line index {} out of bounds (document has {} lines)",
            index,
            self.tokens.line_count()
        );
        let text = self.document.line(index).unwrap_or_default();
        assertion(LineAssertion {
            tokens: self.tokens.line(index),
            text,
            context: format!("line {index}"),
        });
        self
    }

    /// Every line is covered exactly by its tokens.
    pub fn covers_every_line(self) -> Self {
        for index in 0..self.tokens.line_count() {
            let text = self.document.line(index).unwrap_or_default();
            LineAssertion {
                tokens: self.tokens.line(index),
                text,
                context: format!("line {index}"),
            }
            .covers_exactly();
        }
        self
    }

    /// Stack depth after line `index`.
    pub fn depth_after(self, index: usize, expected: usize) -> Self {
        let actual = self
            .tokens
            .end_state(index)
            .map(|state| state.depth())
            .unwrap_or_else(|| panic!("No end state recorded for line {index}"));
        assert_eq!(
            actual, expected,
            "line {index}: Expected stack depth {expected} at end of line, found {actual}"
        );
        self
    }
}

pub struct LineAssertion<'a> {
    tokens: &'a [Token],
    text: &'a str,
    context: String,
}

impl<'a> LineAssertion<'a> {
    pub fn token_count(self, expected: usize) -> Self {
        assert_eq!(
            self.tokens.len(),
            expected,
            "{}: Expected {} tokens, found {}: [{}]",
            self.context,
            expected,
            self.tokens.len(),
            self.summary()
        );
        self
    }

    /// The token at `index` has `class` and covers `text`.
    pub fn token(self, index: usize, class: &str, text: &str) -> Self {
        let token = self.tokens.get(index).unwrap_or_else(|| {
            panic!(
                "{}: Token index {} out of bounds (line has {} tokens): [{}]",
                self.context,
                index,
                self.tokens.len(),
                self.summary()
            )
        });
        let actual = (token.class.as_str(), self.text_of(token));
        assert_eq!(
            actual,
            (class, text),
            "{}: token {} mismatch in [{}]",
            self.context,
            index,
            self.summary()
        );
        self
    }

    /// The full run of `(class, text)` pairs.
    pub fn sequence(self, expected: &[(&str, &str)]) -> Self {
        let actual = self.pairs(|_| true);
        assert_eq!(actual, expected, "{}: token run mismatch", self.context);
        self
    }

    /// The run of `(class, text)` pairs with whitespace tokens left out.
    pub fn significant(self, expected: &[(&str, &str)]) -> Self {
        let actual = self.pairs(|token| token.class != WHITESPACE_CLASS);
        assert_eq!(
            actual, expected,
            "{}: significant token run mismatch",
            self.context
        );
        self
    }

    /// Some token has `class` and covers `text`.
    pub fn contains(self, class: &str, text: &str) -> Self {
        let found = self
            .tokens
            .iter()
            .any(|token| token.class == class && self.text_of(token) == text);
        assert!(
            found,
            "{}: Expected a {} token {:?} in [{}]",
            self.context,
            class,
            text,
            self.summary()
        );
        self
    }

    /// No token has `class`.
    pub fn lacks_class(self, class: &str) -> Self {
        assert!(
            self.tokens.iter().all(|token| token.class != class),
            "{}: Expected no {} token in [{}]",
            self.context,
            class,
            self.summary()
        );
        self
    }

    /// Tokens tile the line: they start at column 0, each starts where the last ended, none is
    /// empty and the last ends at the end of the line.
    pub fn covers_exactly(self) -> Self {
        let mut column = 0;
        for (index, token) in self.tokens.iter().enumerate() {
            assert!(
                !token.is_empty(),
                "{}: token {} is empty",
                self.context,
                index
            );
            assert_eq!(
                token.span.start, column,
                "{}: token {} starts at {} but the previous token ended at {}",
                self.context, index, token.span.start, column
            );
            column = token.span.end;
        }
        assert_eq!(
            column,
            self.text.len(),
            "{}: tokens end at column {} but the line is {} bytes long",
            self.context,
            column,
            self.text.len()
        );
        self
    }

    fn text_of(&self, token: &Token) -> &'a str {
        self.text.get(token.span.clone()).unwrap_or_else(|| {
            panic!(
                "{}: token span {:?} is outside the line {:?}",
                self.context, token.span, self.text
            )
        })
    }

    fn pairs(&self, keep: impl Fn(&Token) -> bool) -> Vec<(&str, &'a str)> {
        self.tokens
            .iter()
            .filter(|token| keep(token))
            .map(|token| (token.class.as_str(), self.text_of(token)))
            .collect()
    }

    fn summary(&self) -> String {
        self.tokens
            .iter()
            .map(|token| format!("{} {:?}", token.class, self.text_of(token)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
