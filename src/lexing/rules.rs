//! Declarative language definitions
//!
//!     A language is data: a base mode, a default token class, a pattern library and a map of
//!     modes to ordered rule lists. Definitions are built in Rust through the small builder
//!     below (see [crate::languages]) or deserialized from YAML / JSON (see [crate::loader]).
//!     Nothing here is validated; [RuleTable::build](crate::lexing::RuleTable::build) does that.
//!
//! Rule Syntax
//!
//!     A rule is a map with a `regex`, a `token` and an optional `next`:
//!
//!         - regex: '/\*'
//!           token: comment
//!           next: '@push comment'
//!
//!     `token` is either one label for the whole match or a list of labels, one per capture
//!     group. An empty label means the language's default token class.
//!
//!     `next` is written the way Monarch-style definitions write it:
//!         "@push <mode>", "@<mode>" or "<mode>"   push a mode
//!         "@push"                                 push the mode the rule runs in
//!         "@pop"                                  leave the current mode
//!         "@switchTo <mode>"                      replace the current mode
//!         "@rematch"                              pop and re-scan the line from its start
//!
//!     `{ include: <mode> }` in place of a rule splices that mode's rules in at that position.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What a matching rule emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Emission {
    /// One label for the whole match.
    Token(String),
    /// One label per capture group, positionally.
    Groups(Vec<String>),
}

impl From<&str> for Emission {
    fn from(label: &str) -> Self {
        Emission::Token(label.to_string())
    }
}

impl<const N: usize> From<[&str; N]> for Emission {
    fn from(labels: [&str; N]) -> Self {
        Emission::Groups(labels.iter().map(|l| l.to_string()).collect())
    }
}

/// Mode names usable as transition targets.
static MODE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap());

fn mode_name(name: &str) -> Result<String, String> {
    if MODE_NAME.is_match(name) {
        Ok(name.to_string())
    } else {
        Err(format!("invalid mode name '{name}'"))
    }
}

/// How a matching rule changes the mode stack.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Transition {
    #[default]
    None,
    Push(String),
    /// Push the mode the rule is running in. Nested comments use this.
    PushSelf,
    Pop,
    SwitchTo(String),
    Rematch,
}

impl Transition {
    pub fn is_none(&self) -> bool {
        matches!(self, Transition::None)
    }

    /// The mode this transition names, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Transition::Push(mode) | Transition::SwitchTo(mode) => Some(mode),
            _ => None,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::None => Ok(()),
            Transition::Push(mode) => write!(f, "@push {mode}"),
            Transition::PushSelf => write!(f, "@push"),
            Transition::Pop => write!(f, "@pop"),
            Transition::SwitchTo(mode) => write!(f, "@switchTo {mode}"),
            Transition::Rematch => write!(f, "@rematch"),
        }
    }
}

impl FromStr for Transition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut words = s.split_whitespace();
        let (head, arg, extra) = (words.next(), words.next(), words.next());
        if extra.is_some() {
            return Err(format!("invalid transition '{s}'"));
        }
        match (head, arg) {
            (None, _) => Ok(Transition::None),
            (Some("@push"), None) => Ok(Transition::PushSelf),
            (Some("@push"), Some(mode)) => mode_name(mode).map(Transition::Push),
            (Some("@switchTo"), Some(mode)) => mode_name(mode).map(Transition::SwitchTo),
            (Some("@switchTo"), None) => Err("'@switchTo' needs a target mode".to_string()),
            (Some("@pop"), None) => Ok(Transition::Pop),
            (Some("@rematch"), None) => Ok(Transition::Rematch),
            (Some(mode), None) => {
                let name = mode.strip_prefix('@').unwrap_or(mode);
                mode_name(name).map(Transition::Push)
            }
            (Some(_), Some(_)) => Err(format!("invalid transition '{s}'")),
        }
    }
}

impl TryFrom<String> for Transition {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Transition> for String {
    fn from(transition: Transition) -> Self {
        transition.to_string()
    }
}

/// A pattern / emission / transition triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchRule {
    pub regex: String,
    pub token: Emission,
    #[serde(default, skip_serializing_if = "Transition::is_none")]
    pub next: Transition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncludeRule {
    pub include: String,
}

/// One entry of a mode's rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Include(IncludeRule),
    Match(MatchRule),
}

impl RuleSpec {
    fn with_next(self, next: Transition) -> Self {
        match self {
            RuleSpec::Match(rule) => RuleSpec::Match(MatchRule { next, ..rule }),
            include => include,
        }
    }

    /// Push `mode` on match. Has no effect on an include entry.
    pub fn push(self, mode: &str) -> Self {
        self.with_next(Transition::Push(mode.to_string()))
    }

    pub fn push_self(self) -> Self {
        self.with_next(Transition::PushSelf)
    }

    pub fn pop(self) -> Self {
        self.with_next(Transition::Pop)
    }

    pub fn switch_to(self, mode: &str) -> Self {
        self.with_next(Transition::SwitchTo(mode.to_string()))
    }

    pub fn rematch(self) -> Self {
        self.with_next(Transition::Rematch)
    }
}

/// A rule matching `regex` and emitting `token`, with no transition.
pub fn rule(regex: &str, token: impl Into<Emission>) -> RuleSpec {
    RuleSpec::Match(MatchRule {
        regex: regex.to_string(),
        token: token.into(),
        next: Transition::None,
    })
}

/// Splice the rules of `mode` in at this position.
pub fn include(mode: &str) -> RuleSpec {
    RuleSpec::Include(IncludeRule {
        include: mode.to_string(),
    })
}

fn default_token_class() -> String {
    "unclassified".to_string()
}

/// A complete, unvalidated language definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageDefinition {
    pub name: String,
    pub base_mode: String,
    /// Class of tokens no rule accounts for.
    #[serde(default = "default_token_class")]
    pub default_token: String,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
    pub modes: BTreeMap<String, Vec<RuleSpec>>,
}

impl LanguageDefinition {
    pub fn new(name: &str, base_mode: &str) -> Self {
        LanguageDefinition {
            name: name.to_string(),
            base_mode: base_mode.to_string(),
            default_token: default_token_class(),
            ignore_case: false,
            patterns: BTreeMap::new(),
            modes: BTreeMap::new(),
        }
    }

    pub fn default_token(mut self, class: &str) -> Self {
        self.default_token = class.to_string();
        self
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn pattern(mut self, name: &str, source: &str) -> Self {
        self.patterns.insert(name.to_string(), source.to_string());
        self
    }

    /// Define (or replace) a mode with its ordered rules.
    pub fn mode(mut self, name: &str, rules: Vec<RuleSpec>) -> Self {
        self.modes.insert(name.to_string(), rules);
        self
    }
}
