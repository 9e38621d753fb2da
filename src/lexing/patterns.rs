//! Pattern library and compiled patterns
//!
//!     Rules reference reusable sub-patterns by name, written `@name` inside a rule's regex
//!     (`@registers`, `@escapes`). References are resolved by textual substitution once, when
//!     the rule table is built, never at match time. Each substitution is wrapped in a
//!     non-capturing group so it cannot shift the capture numbering of the rule that uses it.
//!     Library patterns may reference each other; cycles are configuration errors. A literal
//!     at-sign followed by a word character is written `\@`.
//!
//! Anchoring
//!
//!     A pattern is always matched anchored at the scan cursor, against the rest of the line.
//!     A pattern whose source starts with `^` only matches when the cursor is at column 0:
//!     the `^` is stripped and kept as a flag, so alternations after it are line-start-only
//!     as a whole. `$` matches the end of the line.
//!
//! Lookahead
//!
//!     The regex crate has no look-around. A single trailing positive lookahead, `X(?=Y)`,
//!     is supported by compiling `^(X)(?:Y)` and consuming only the first group. Leftmost-first
//!     semantics give X the same extent a backtracking engine would. Any other look-around,
//!     including a lookahead ending only one branch of a top-level alternation, is rejected
//!     when the pattern is compiled.

use crate::lexing::error::ConfigError;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::ops::Range;

/// Named sub-patterns with every `@name` reference already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternLibrary {
    resolved: BTreeMap<String, String>,
}

impl PatternLibrary {
    /// Resolve a set of raw named patterns, following references between them.
    pub fn new(raw: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut resolved = BTreeMap::new();
        for name in raw.keys() {
            resolve_named(name, "pattern library", raw, &mut resolved, &mut Vec::new())?;
        }
        Ok(PatternLibrary { resolved })
    }

    /// The fully expanded source of a named pattern.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.resolved.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resolved.keys().map(String::as_str)
    }

    /// Substitute every `@name` reference in `source`. `context` names the referencing site
    /// in error messages.
    pub fn expand(&self, source: &str, context: &str) -> Result<String, ConfigError> {
        substitute(source, |name| {
            self.get(name)
                .map(str::to_string)
                .ok_or_else(|| ConfigError::UnknownPattern {
                    name: name.to_string(),
                    context: context.to_string(),
                })
        })
    }

    /// Compile a library pattern on its own, e.g. to probe it from a host or a test.
    pub fn compile(&self, name: &str, ignore_case: bool) -> Result<Pattern, ConfigError> {
        let context = format!("pattern '@{name}'");
        let source = self.get(name).ok_or_else(|| ConfigError::UnknownPattern {
            name: name.to_string(),
            context: "caller".to_string(),
        })?;
        Pattern::compile(source, ignore_case).map_err(|err| ConfigError::InvalidPattern {
            context,
            message: err.to_string(),
        })
    }
}

fn resolve_named(
    name: &str,
    context: &str,
    raw: &BTreeMap<String, String>,
    resolved: &mut BTreeMap<String, String>,
    visiting: &mut Vec<String>,
) -> Result<String, ConfigError> {
    if let Some(done) = resolved.get(name) {
        return Ok(done.clone());
    }
    if visiting.iter().any(|v| v == name) {
        let chain: Vec<String> = visiting
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(name))
            .map(|n| format!("@{n}"))
            .collect();
        return Err(ConfigError::PatternCycle(chain.join(" -> ")));
    }
    let source = raw.get(name).ok_or_else(|| ConfigError::UnknownPattern {
        name: name.to_string(),
        context: context.to_string(),
    })?;

    visiting.push(name.to_string());
    let inner_context = format!("pattern '@{name}'");
    let expanded = substitute(source, |inner| {
        resolve_named(inner, &inner_context, raw, resolved, visiting)
    })?;
    visiting.pop();

    resolved.insert(name.to_string(), expanded.clone());
    Ok(expanded)
}

/// Replace `@name` references using `resolve`, leaving escaped characters untouched.
fn substitute(
    source: &str,
    mut resolve: impl FnMut(&str) -> Result<String, ConfigError>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            }
            '@' => {
                let rest = &source[i + 1..];
                let len = reference_len(rest);
                if len == 0 {
                    out.push('@');
                    continue;
                }
                out.push_str("(?:");
                out.push_str(&resolve(&rest[..len])?);
                out.push(')');
                // Reference names are ASCII, so bytes and chars line up.
                for _ in 0..len {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

fn reference_len(rest: &str) -> usize {
    rest.bytes()
        .enumerate()
        .take_while(|&(i, b)| b == b'_' || b.is_ascii_alphabetic() || (i > 0 && b.is_ascii_digit()))
        .count()
}

/// Split a top-level trailing `(?=...)` off a pattern body.
///
/// A body with a top-level `|` is left whole: the lookahead belongs to the last branch only,
/// so the regex crate gets to reject it.
fn split_trailing_lookahead(source: &str) -> (&str, Option<&str>) {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut class_open: Option<usize> = None;
    let mut escaped = false;
    let mut candidate = None;
    let mut alternation = false;

    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        if let Some(open) = class_open {
            // `]` directly after `[` or `[^` is a literal.
            let literal_close = i == open + 1 || (i == open + 2 && bytes[open + 1] == b'^');
            match b {
                b'\\' => escaped = true,
                b']' if !literal_close => class_open = None,
                _ => {}
            }
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'[' => class_open = Some(i),
            b'|' if depth == 0 => alternation = true,
            b'(' => {
                if depth == 0 {
                    candidate = source[i..].starts_with("(?=").then_some(i);
                }
                depth += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i == bytes.len() - 1 && !alternation {
                    if let Some(start) = candidate {
                        return (&source[..start], Some(&source[start + 3..i]));
                    }
                }
            }
            _ => {}
        }
    }
    (source, None)
}

/// A compiled, immutable rule pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    line_start_only: bool,
    group_offset: usize,
}

impl Pattern {
    /// Compile an already expanded pattern source.
    pub fn compile(source: &str, ignore_case: bool) -> Result<Self, regex::Error> {
        let (line_start_only, body) = match source.strip_prefix('^') {
            Some(rest) => (true, rest),
            None => (false, source),
        };
        let (body, lookahead) = split_trailing_lookahead(body);
        let flags = if ignore_case { "(?i)" } else { "" };
        let (anchored, group_offset) = match lookahead {
            Some(ahead) => (format!("{flags}^({body})(?:{ahead})"), 1),
            None => (format!("{flags}^(?:{body})"), 0),
        };

        Ok(Pattern {
            source: source.to_string(),
            regex: Regex::new(&anchored)?,
            line_start_only,
            group_offset,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_line_start_only(&self) -> bool {
        self.line_start_only
    }

    pub fn has_lookahead(&self) -> bool {
        self.group_offset == 1
    }

    /// Match anchored at byte offset `pos` of `line`.
    pub fn match_at<'t>(&self, line: &'t str, pos: usize) -> Option<PatternMatch<'t>> {
        if self.line_start_only && pos != 0 {
            return None;
        }
        let captures = self.regex.captures(line.get(pos..)?)?;
        Some(PatternMatch {
            captures,
            offset: pos,
            group_offset: self.group_offset,
        })
    }
}

/// A successful match, with spans expressed as byte offsets into the whole line.
#[derive(Debug)]
pub struct PatternMatch<'t> {
    captures: Captures<'t>,
    offset: usize,
    group_offset: usize,
}

impl PatternMatch<'_> {
    /// The consumed span. A trailing lookahead is not part of it.
    pub fn span(&self) -> Range<usize> {
        let whole = self
            .captures
            .get(self.group_offset)
            .or_else(|| self.captures.get(0));
        match whole {
            Some(m) => m.start() + self.offset..m.end() + self.offset,
            None => self.offset..self.offset,
        }
    }

    /// Span of capture group `index` (1-based, as written in the rule), if it participated.
    pub fn group(&self, index: usize) -> Option<Range<usize>> {
        if index == 0 {
            return Some(self.span());
        }
        self.captures
            .get(index + self.group_offset)
            .map(|m| m.start() + self.offset..m.end() + self.offset)
    }

    /// Number of capture groups written in the rule.
    pub fn group_count(&self) -> usize {
        self.captures.len() - 1 - self.group_offset
    }
}
