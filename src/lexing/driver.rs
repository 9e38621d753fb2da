//! Line driver
//!
//!     Feeds a document to the mode stack machine one line at a time. The mode stack is
//!     carried from each line into the next; only the cursor goes back to column 0. Lines are
//!     processed strictly in order and the machine never looks past the line it is given:
//!     anything that depends on the next line has to be expressed as a mode transition.
//!
//!     The driver records the scanner state left behind by every line. Re-tokenizing after an
//!     edit can start from the state saved for the line before the edit instead of from the
//!     top of the document. See [Tokenizer::retokenize_from].

use crate::lexing::error::ConfigError;
use crate::lexing::machine::{ModeStackMachine, ScannerState};
use crate::lexing::rule_table::RuleTable;
use crate::lexing::rules::LanguageDefinition;
use crate::lexing::token::Token;
use std::sync::Arc;

/// A document as an ordered sequence of lines, without line terminators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Document {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Split text on `\n`, dropping one trailing `\r` per line.
    pub fn from_text(text: &str) -> Self {
        Document::from_lines(text.lines())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The tokens of a whole document, grouped by line, with the state each line ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedDocument {
    tokens: Vec<Token>,
    /// `line_starts[i]` is the index in `tokens` of line `i`'s first token.
    line_starts: Vec<usize>,
    end_states: Vec<ScannerState>,
}

impl TokenizedDocument {
    fn with_capacity(lines: usize) -> Self {
        TokenizedDocument {
            tokens: Vec::new(),
            line_starts: Vec::with_capacity(lines),
            end_states: Vec::with_capacity(lines),
        }
    }

    fn push_line(&mut self, tokens: Vec<Token>, end_state: ScannerState) {
        self.line_starts.push(self.tokens.len());
        self.tokens.extend(tokens);
        self.end_states.push(end_state);
    }

    /// Every token in document order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The tokens of line `index`; empty for blank or out of range lines.
    pub fn line(&self, index: usize) -> &[Token] {
        let Some(&start) = self.line_starts.get(index) else {
            return &[];
        };
        let end = self
            .line_starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.tokens.len());
        &self.tokens[start..end]
    }

    /// The scanner state line `index` left behind.
    pub fn end_state(&self, index: usize) -> Option<&ScannerState> {
        self.end_states.get(index)
    }

    /// The state after the last line, if there was one.
    pub fn final_state(&self) -> Option<&ScannerState> {
        self.end_states.last()
    }
}

/// An owned tokenizer for one language. Cheap to clone; the rule table is shared.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    table: Arc<RuleTable>,
}

impl Tokenizer {
    pub fn new(table: Arc<RuleTable>) -> Self {
        Tokenizer { table }
    }

    /// Build the rule table for `definition` and wrap it.
    pub fn from_definition(definition: &LanguageDefinition) -> Result<Self, ConfigError> {
        Ok(Tokenizer::new(Arc::new(RuleTable::build(definition)?)))
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn shared_table(&self) -> Arc<RuleTable> {
        Arc::clone(&self.table)
    }

    /// A fresh state: the base mode alone on the stack.
    pub fn initial_state(&self) -> ScannerState {
        ScannerState::new(self.table.base_mode())
    }

    /// Start a line-at-a-time session from the base mode.
    pub fn session(&self) -> LineDriver<'_> {
        self.session_from(self.initial_state(), 0)
    }

    /// Start a session from a saved state, numbering lines from `first_line`.
    pub fn session_from(&self, state: ScannerState, first_line: usize) -> LineDriver<'_> {
        LineDriver {
            machine: ModeStackMachine::new(&self.table),
            state,
            next_line: first_line,
        }
    }

    pub fn tokenize<S: AsRef<str>>(&self, lines: &[S]) -> TokenizedDocument {
        let mut session = self.session();
        let mut out = TokenizedDocument::with_capacity(lines.len());
        for line in lines {
            let tokens = session.feed(line.as_ref());
            out.push_line(tokens, session.state().clone());
        }
        log::debug!(
            "tokenized {} lines into {} tokens ({})",
            out.line_count(),
            out.tokens.len(),
            self.table.language()
        );
        out
    }

    pub fn tokenize_document(&self, document: &Document) -> TokenizedDocument {
        self.tokenize(document.lines())
    }

    pub fn tokenize_text(&self, text: &str) -> TokenizedDocument {
        self.tokenize_document(&Document::from_text(text))
    }

    /// Re-tokenize `lines` after an edit starting at line `first_changed`.
    ///
    /// Lines before `first_changed` keep the tokens and end states of `previous`; scanning
    /// resumes from the state `previous` recorded at the end of the line before. The result
    /// is identical to tokenizing `lines` from scratch as long as the lines before
    /// `first_changed` really are unchanged.
    pub fn retokenize_from<S: AsRef<str>>(
        &self,
        previous: &TokenizedDocument,
        lines: &[S],
        first_changed: usize,
    ) -> TokenizedDocument {
        let keep = first_changed.min(previous.line_count()).min(lines.len());
        let seed = match keep.checked_sub(1) {
            Some(last_kept) => previous.end_states[last_kept].clone(),
            None => self.initial_state(),
        };

        let mut out = TokenizedDocument::with_capacity(lines.len());
        for index in 0..keep {
            out.push_line(previous.line(index).to_vec(), previous.end_states[index].clone());
        }

        let mut session = self.session_from(seed, keep);
        for line in &lines[keep..] {
            let tokens = session.feed(line.as_ref());
            out.push_line(tokens, session.state().clone());
        }
        log::debug!(
            "retokenized {} of {} lines ({})",
            lines.len() - keep,
            lines.len(),
            self.table.language()
        );
        out
    }
}

/// A tokenization session: one scanner state, fed one line at a time.
///
/// Callers that want to stop early simply stop feeding lines.
#[derive(Debug, Clone)]
pub struct LineDriver<'t> {
    machine: ModeStackMachine<'t>,
    state: ScannerState,
    next_line: usize,
}

impl LineDriver<'_> {
    /// Tokenize the next line of the document.
    pub fn feed(&mut self, text: &str) -> Vec<Token> {
        let line = self.next_line;
        self.next_line += 1;
        self.machine.scan_line(&mut self.state, line, text)
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    /// Index the next fed line will get.
    pub fn next_line(&self) -> usize {
        self.next_line
    }

    pub fn into_state(self) -> ScannerState {
        self.state
    }
}
