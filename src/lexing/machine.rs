//! Mode stack machine
//!
//!     Scans one line at a time against a [RuleTable], mutating a [ScannerState]. Each step:
//!
//!         1. Take the active mode (top of the stack) and the cursor.
//!         2. Try the mode's rules top to bottom, each anchored at the cursor. First match wins.
//!         3. Emit the rule's tokens, apply its transition, advance past the match.
//!         4. If nothing matches, emit one character of the default class and advance by it.
//!
//! Rematch
//!
//!     A rematch rule consumes nothing. It pops the active mode, throws away the tokens
//!     already produced for the line and starts the line over from column 0 under the mode
//!     beneath. Every further rematch on the same line has to take the stack strictly below
//!     the height the previous one left it at; otherwise it is demoted to a plain pop that
//!     consumes its match. The number of rematches per line is therefore bounded by the stack
//!     height.
//!
//! Zero-width matches
//!
//!     A zero-width match only counts when it changes the stack (or rematches); otherwise the
//!     rule is passed over and the next one is tried. Only [MAX_ZERO_WIDTH_STEPS] zero-width
//!     steps in a row are honoured at one position. After that the machine falls back to the
//!     single-character default token, so it always moves forward.

use crate::lexing::patterns::PatternMatch;
use crate::lexing::rule_table::{Action, CompiledEmission, ModeId, Rule, RuleTable};
use crate::lexing::token::{Token, TokenClass};
use std::ops::Range;

/// Consecutive zero-width, stack-changing steps allowed at a single position.
pub const MAX_ZERO_WIDTH_STEPS: usize = 16;

/// The mutable state of one tokenization session.
///
/// The stack is never empty and its bottom is always the base mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScannerState {
    stack: Vec<ModeId>,
    cursor: usize,
}

impl ScannerState {
    pub fn new(base: ModeId) -> Self {
        ScannerState {
            stack: vec![base],
            cursor: 0,
        }
    }

    /// Mode ids from bottom (base) to top (active).
    pub fn stack(&self) -> &[ModeId] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn active(&self) -> ModeId {
        self.stack[self.stack.len() - 1]
    }

    /// Byte offset of the cursor in the line being scanned.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Mode names from bottom to top, for diagnostics.
    pub fn describe(&self, table: &RuleTable) -> Vec<String> {
        self.stack
            .iter()
            .map(|&id| table.mode_name(id).to_string())
            .collect()
    }

    fn push(&mut self, mode: ModeId) {
        self.stack.push(mode);
    }

    /// Pop the active mode; refuses to remove the base mode.
    fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    fn switch_to(&mut self, mode: ModeId) -> bool {
        if self.stack.len() > 1 {
            let top = self.stack.len() - 1;
            self.stack[top] = mode;
            true
        } else {
            false
        }
    }

    /// Whether applying `action` would change the stack.
    fn changed_by(&self, action: Action) -> bool {
        match action {
            Action::None => false,
            Action::Push(_) => true,
            Action::Pop | Action::Rematch => self.depth() > 1,
            Action::SwitchTo(mode) => self.depth() > 1 && self.active() != mode,
        }
    }
}

/// Scans lines against one rule table.
#[derive(Debug, Clone, Copy)]
pub struct ModeStackMachine<'t> {
    table: &'t RuleTable,
}

impl<'t> ModeStackMachine<'t> {
    pub fn new(table: &'t RuleTable) -> Self {
        ModeStackMachine { table }
    }

    pub fn table(&self) -> &'t RuleTable {
        self.table
    }

    /// Tokenize `text`, line number `line`, starting from `state`. On return the cursor sits
    /// at the end of the line and the stack is whatever the line left behind.
    pub fn scan_line(&self, state: &mut ScannerState, line: usize, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut rematch_floor: Option<usize> = None;
        let mut zero_width_steps = 0;
        state.cursor = 0;

        while state.cursor < text.len() {
            let pos = state.cursor;
            let allow_zero_width = zero_width_steps < MAX_ZERO_WIDTH_STEPS;
            let Some((rule, matched)) = self.first_match(state, text, allow_zero_width) else {
                if !allow_zero_width {
                    log::warn!(
                        "line {line}: zero-width transitions loop at column {pos}, skipping a character"
                    );
                }
                self.emit_unclassified(line, text, state, &mut tokens);
                zero_width_steps = 0;
                continue;
            };
            let span = matched.span();
            let action = rule.action();

            if action == Action::Rematch && state.depth() > 1 {
                let lowered = state.depth() - 1;
                if rematch_floor.map_or(true, |floor| lowered < floor) {
                    state.pop();
                    rematch_floor = Some(lowered);
                    tokens.clear();
                    state.cursor = 0;
                    zero_width_steps = 0;
                    log::debug!(
                        "line {line}: rematch from column {pos} into '{}'",
                        self.table.mode_name(state.active())
                    );
                    continue;
                }
                log::warn!(
                    "line {line}: repeated rematch in mode '{}' at column {pos} treated as a pop",
                    self.table.mode_name(state.active())
                );
            }

            if span.is_empty() {
                zero_width_steps += 1;
            } else {
                zero_width_steps = 0;
            }
            self.emit(rule.emission(), &matched, line, &mut tokens);
            self.apply(action, state, line);
            state.cursor = span.end;
        }

        tokens
    }

    /// The first rule of the active mode matching at the cursor. Zero-width matches are
    /// skipped unless they change the stack (and `allow_zero_width` holds) or rematch.
    fn first_match<'a>(
        &self,
        state: &ScannerState,
        text: &'a str,
        allow_zero_width: bool,
    ) -> Option<(&'t Rule, PatternMatch<'a>)> {
        self.table
            .mode(state.active())
            .rules()
            .iter()
            .find_map(|rule| {
                let matched = rule.pattern().match_at(text, state.cursor)?;
                let action = rule.action();
                let usable = !matched.span().is_empty()
                    || (action == Action::Rematch && state.depth() > 1)
                    || (allow_zero_width && state.changed_by(action));
                usable.then_some((rule, matched))
            })
    }

    fn apply(&self, action: Action, state: &mut ScannerState, line: usize) {
        match action {
            Action::None => {}
            Action::Push(mode) => {
                log::debug!("line {line}: push '{}'", self.table.mode_name(mode));
                state.push(mode);
            }
            // A rematch reaching this point was demoted to a pop.
            Action::Pop | Action::Rematch => {
                if !state.pop() {
                    log::warn!("line {line}: pop in the base mode ignored");
                }
            }
            Action::SwitchTo(mode) => {
                log::debug!("line {line}: switch to '{}'", self.table.mode_name(mode));
                if !state.switch_to(mode) {
                    log::warn!("line {line}: switch away from the base mode ignored");
                }
            }
        }
    }

    fn emit(
        &self,
        emission: &CompiledEmission,
        matched: &PatternMatch<'_>,
        line: usize,
        tokens: &mut Vec<Token>,
    ) {
        let span = matched.span();
        if span.is_empty() {
            return;
        }
        match emission {
            CompiledEmission::Whole(class) => tokens.push(Token::new(class.clone(), line, span)),
            CompiledEmission::Groups(labels) => {
                let mut covered = span.start;
                for (index, label) in labels.iter().enumerate() {
                    let (Some(class), Some(group)) = (label, matched.group(index + 1)) else {
                        continue;
                    };
                    // Nested, overlapping or lookahead groups cannot be laid out in order.
                    if group.is_empty() || group.start < covered || group.end > span.end {
                        continue;
                    }
                    self.fill(covered..group.start, line, tokens);
                    covered = group.end;
                    tokens.push(Token::new(class.clone(), line, group));
                }
                self.fill(covered..span.end, line, tokens);
            }
        }
    }

    /// Cover a part of a match no group accounted for with the default class.
    fn fill(&self, gap: Range<usize>, line: usize, tokens: &mut Vec<Token>) {
        if !gap.is_empty() {
            tokens.push(Token::new(self.default_class(), line, gap));
        }
    }

    fn emit_unclassified(
        &self,
        line: usize,
        text: &str,
        state: &mut ScannerState,
        tokens: &mut Vec<Token>,
    ) {
        let pos = state.cursor;
        let width = text[pos..].chars().next().map_or(1, char::len_utf8);
        tokens.push(Token::new(self.default_class(), line, pos..pos + width));
        state.cursor = pos + width;
    }

    fn default_class(&self) -> TokenClass {
        self.table.default_token().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexing::rules::{include, rule, LanguageDefinition};

    fn table(def: LanguageDefinition) -> RuleTable {
        RuleTable::build(&def).unwrap()
    }

    fn scan(table: &RuleTable, state: &mut ScannerState, text: &str) -> Vec<(String, String)> {
        ModeStackMachine::new(table)
            .scan_line(state, 0, text)
            .iter()
            .map(|t| (t.class.to_string(), t.text(text).to_string()))
            .collect()
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(c, t)| (c.to_string(), t.to_string()))
            .collect()
    }

    fn comments() -> RuleTable {
        table(
            LanguageDefinition::new("c", "root")
                .mode(
                    "root",
                    vec![
                        rule(r"/\*", "comment").push("comment"),
                        rule(r"[a-z]+", "word"),
                        include("ws"),
                    ],
                )
                .mode("ws", vec![rule(r"\s+", "white")])
                .mode(
                    "comment",
                    vec![
                        rule(r"[^/*]+", "comment"),
                        rule(r"/\*", "comment").push_self(),
                        rule(r"\*/", "comment").pop(),
                        rule(r"[/*]", "comment"),
                    ],
                ),
        )
    }

    #[test]
    fn test_first_rule_wins() {
        let t = table(LanguageDefinition::new("p", "root").mode(
            "root",
            vec![
                rule(r"e[abcd]x\b", "register"),
                rule(r"[a-z]+", "identifier"),
                rule(r"\s+", "white"),
            ],
        ));
        let mut state = ScannerState::new(t.base_mode());
        assert_eq!(
            scan(&t, &mut state, "eax eaxy"),
            pairs(&[
                ("register", "eax"),
                ("white", " "),
                ("identifier", "eaxy")
            ])
        );
    }

    #[test]
    fn test_unmatched_characters_become_default_tokens() {
        let t = comments();
        let mut state = ScannerState::new(t.base_mode());
        assert_eq!(
            scan(&t, &mut state, "a é!"),
            pairs(&[
                ("word", "a"),
                ("white", " "),
                ("unclassified", "é"),
                ("unclassified", "!")
            ])
        );
    }

    #[test]
    fn test_nested_comment_depth_follows_stack() {
        let t = comments();
        let mut state = ScannerState::new(t.base_mode());
        scan(&t, &mut state, "x /* a /* b */");
        assert_eq!(state.depth(), 2);
        assert_eq!(state.describe(&t), vec!["root", "comment"]);
        scan(&t, &mut state, "*/ y");
        assert_eq!(state.depth(), 1);
    }

    #[test]
    fn test_group_emission_fills_unlabelled_gaps() {
        let t = table(
            LanguageDefinition::new("g", "root")
                .default_token("source")
                .mode("root", vec![rule(r"(a)(b)(c)", ["x", "", "z"])]),
        );
        let mut state = ScannerState::new(t.base_mode());
        assert_eq!(
            scan(&t, &mut state, "abc"),
            pairs(&[("x", "a"), ("source", "b"), ("z", "c")])
        );
    }

    #[test]
    fn test_optional_group_that_did_not_participate() {
        let t = table(
            LanguageDefinition::new("g", "root")
                .mode("root", vec![rule(r"(a)(b)?(c)", ["x", "y", "z"])]),
        );
        let mut state = ScannerState::new(t.base_mode());
        assert_eq!(scan(&t, &mut state, "ac"), pairs(&[("x", "a"), ("z", "c")]));
    }

    #[test]
    fn test_switch_to_replaces_top() {
        let t = table(
            LanguageDefinition::new("s", "root")
                .mode("root", vec![rule("<", "open").push("a"), rule(".", "text")])
                .mode("a", vec![rule("-", "dash").switch_to("b"), rule(".", "a")])
                .mode("b", vec![rule(">", "close").pop(), rule(".", "b")]),
        );
        let mut state = ScannerState::new(t.base_mode());
        assert_eq!(
            scan(&t, &mut state, "<x-y>z"),
            pairs(&[
                ("open", "<"),
                ("a", "x"),
                ("dash", "-"),
                ("b", "y"),
                ("close", ">"),
                ("text", "z")
            ])
        );
        assert_eq!(state.depth(), 1);
    }

    fn rematching() -> RuleTable {
        table(
            LanguageDefinition::new("r", "root")
                .mode(
                    "root",
                    vec![
                        rule(r"[a-z]+", "keyword").push("rest"),
                        rule(r"\s+", "white"),
                    ],
                )
                .mode(
                    "rest",
                    vec![
                        rule(r"^.*$", "").rematch(),
                        rule(r"[0-9]+", "number"),
                        rule(r";", "").rematch(),
                        rule(r"\s+", "white"),
                    ],
                ),
        )
    }

    #[test]
    fn test_rematch_rescans_line_in_under_mode() {
        let t = rematching();
        let mut state = ScannerState::new(t.base_mode());
        scan(&t, &mut state, "mov 1");
        assert_eq!(state.describe(&t), vec!["root", "rest"]);

        let rescanned = scan(&t, &mut state, "ret 2");
        let mut fresh = ScannerState::new(t.base_mode());
        assert_eq!(rescanned, scan(&t, &mut fresh, "ret 2"));
        assert_eq!(state, fresh);
    }

    #[test]
    fn test_repeated_rematch_is_demoted_to_pop() {
        let t = rematching();
        let mut state = ScannerState::new(t.base_mode());
        // First ';' rematches back into root, root pushes rest again on "a", and the second
        // ';' can no longer lower the stack: it pops and consumes instead.
        assert_eq!(
            scan(&t, &mut state, "a;"),
            pairs(&[("keyword", "a"), ("unclassified", ";")])
        );
        assert_eq!(state.depth(), 1);
    }

    #[test]
    fn test_zero_width_ping_pong_still_progresses() {
        let t = table(
            LanguageDefinition::new("z", "root")
                .mode("root", vec![rule(r"(?:)", "").push("other")])
                .mode("other", vec![rule(r"(?:)", "").pop()]),
        );
        let mut state = ScannerState::new(t.base_mode());
        let tokens = scan(&t, &mut state, "ab");
        assert_eq!(
            tokens,
            pairs(&[("unclassified", "a"), ("unclassified", "b")])
        );
    }
}
