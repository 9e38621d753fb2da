//! Rule table construction and validation
//!
//!     [RuleTable::build] turns a [LanguageDefinition] into the immutable structure the mode
//!     stack machine scans with. Construction is the only place configuration can fail:
//!
//!         1. The base mode must exist.
//!         2. The pattern library resolves (no unknown references, no cycles).
//!         3. Includes are spliced in place (no unknown modes, no cycles).
//!         4. Every mode has at least one rule after splicing.
//!         5. Every pattern compiles and every transition names a defined mode.
//!         6. The base mode never pops, switches or rematches, so the bottom of the stack is
//!            always the base mode and the base mode alone can run forever.
//!         7. No mode can rematch onto a mode whose first rule rematches again.
//!
//!     Rule order inside a mode is preserved exactly: the first matching rule wins, there is
//!     no longest-match comparison anywhere.

use crate::lexing::error::ConfigError;
use crate::lexing::patterns::{Pattern, PatternLibrary};
use crate::lexing::rules::{Emission, LanguageDefinition, MatchRule, RuleSpec, Transition};
use crate::lexing::token::TokenClass;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub type ModeId = usize;

/// A resolved transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Push(ModeId),
    Pop,
    SwitchTo(ModeId),
    Rematch,
}

/// A resolved emission. `None` labels are skipped groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledEmission {
    Whole(TokenClass),
    Groups(Vec<Option<TokenClass>>),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Arc<Pattern>,
    emission: CompiledEmission,
    action: Action,
}

impl Rule {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn emission(&self) -> &CompiledEmission {
        &self.emission
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

#[derive(Debug, Clone)]
pub struct Mode {
    name: String,
    rules: Vec<Rule>,
}

impl Mode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// The compiled, immutable rule table of one language.
#[derive(Debug, Clone)]
pub struct RuleTable {
    language: String,
    modes: Vec<Mode>,
    index: HashMap<String, ModeId>,
    base: ModeId,
    default_token: TokenClass,
}

impl RuleTable {
    pub fn build(definition: &LanguageDefinition) -> Result<Self, ConfigError> {
        let index: HashMap<String, ModeId> = definition
            .modes
            .keys()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();
        let base = *index
            .get(&definition.base_mode)
            .ok_or_else(|| ConfigError::UndefinedBaseMode(definition.base_mode.clone()))?;

        let library = PatternLibrary::new(&definition.patterns)?;
        let default_token = TokenClass::new(&definition.default_token);
        let modes = {
            let mut builder = Builder {
                library: &library,
                ignore_case: definition.ignore_case,
                index: &index,
                patterns: HashMap::new(),
                classes: HashMap::new(),
                default_token: default_token.clone(),
            };
            let mut modes = Vec::with_capacity(definition.modes.len());
            for (id, name) in definition.modes.keys().enumerate() {
                let mut flattened = Vec::new();
                flatten(name, definition, &mut Vec::new(), &mut flattened)?;
                if flattened.is_empty() {
                    return Err(ConfigError::EmptyMode(name.clone()));
                }
                let rules = flattened
                    .into_iter()
                    .enumerate()
                    .map(|(position, spec)| builder.compile_rule(name, id, position, spec))
                    .collect::<Result<Vec<_>, _>>()?;
                modes.push(Mode {
                    name: name.clone(),
                    rules,
                });
            }
            modes
        };

        let table = RuleTable {
            language: definition.name.clone(),
            modes,
            index,
            base,
            default_token,
        };
        table.check_base_mode()?;
        table.check_rematch_chains()?;

        log::debug!(
            "built rule table '{}': {} modes, {} rules, base mode '{}'",
            table.language,
            table.modes.len(),
            table.modes.iter().map(|m| m.rules.len()).sum::<usize>(),
            table.mode_name(table.base)
        );
        Ok(table)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn base_mode(&self) -> ModeId {
        self.base
    }

    pub fn default_token(&self) -> &TokenClass {
        &self.default_token
    }

    pub fn mode(&self, id: ModeId) -> &Mode {
        &self.modes[id]
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn mode_id(&self, name: &str) -> Option<ModeId> {
        self.index.get(name).copied()
    }

    pub fn mode_name(&self, id: ModeId) -> &str {
        &self.modes[id].name
    }

    fn check_base_mode(&self) -> Result<(), ConfigError> {
        let base = self.mode(self.base);
        for (position, rule) in base.rules.iter().enumerate() {
            let transition = match rule.action {
                Action::Pop => "@pop".to_string(),
                Action::Rematch => "@rematch".to_string(),
                Action::SwitchTo(target) => format!("@switchTo {}", self.mode_name(target)),
                Action::None | Action::Push(_) => continue,
            };
            return Err(ConfigError::BaseModeUnwinds {
                mode: base.name.clone(),
                rule: position,
                transition,
            });
        }
        Ok(())
    }

    /// For every mode, the set of modes it can sit directly above on the stack.
    fn under_modes(&self) -> Vec<BTreeSet<ModeId>> {
        let mut under = vec![BTreeSet::new(); self.modes.len()];
        for (id, mode) in self.modes.iter().enumerate() {
            for rule in &mode.rules {
                if let Action::Push(target) = rule.action {
                    under[target].insert(id);
                }
            }
        }
        // A switch keeps whatever was beneath the mode that switched.
        let mut changed = true;
        while changed {
            changed = false;
            for (id, mode) in self.modes.iter().enumerate() {
                for rule in &mode.rules {
                    if let Action::SwitchTo(target) = rule.action {
                        let inherited: Vec<ModeId> = under[id].iter().copied().collect();
                        for below in inherited {
                            changed |= under[target].insert(below);
                        }
                    }
                }
            }
        }
        under
    }

    fn check_rematch_chains(&self) -> Result<(), ConfigError> {
        let under = self.under_modes();
        for (id, mode) in self.modes.iter().enumerate() {
            if !mode.rules.iter().any(|r| r.action == Action::Rematch) {
                continue;
            }
            for &below in &under[id] {
                if self.mode(below).rules[0].action == Action::Rematch {
                    return Err(ConfigError::RematchChain {
                        mode: mode.name.clone(),
                        under: self.mode_name(below).to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Splice includes of `mode` depth first, in rule order.
fn flatten<'d>(
    mode: &str,
    definition: &'d LanguageDefinition,
    visiting: &mut Vec<String>,
    out: &mut Vec<&'d MatchRule>,
) -> Result<(), ConfigError> {
    if visiting.iter().any(|v| v == mode) {
        let mut chain = visiting.clone();
        chain.push(mode.to_string());
        return Err(ConfigError::IncludeCycle(chain.join(" -> ")));
    }
    let Some(specs) = definition.modes.get(mode) else {
        return Err(ConfigError::UndefinedInclude {
            mode: visiting.last().cloned().unwrap_or_default(),
            target: mode.to_string(),
        });
    };

    visiting.push(mode.to_string());
    for spec in specs {
        match spec {
            RuleSpec::Match(rule) => out.push(rule),
            RuleSpec::Include(include) => flatten(&include.include, definition, visiting, out)?,
        }
    }
    visiting.pop();
    Ok(())
}

struct Builder<'a> {
    library: &'a PatternLibrary,
    ignore_case: bool,
    index: &'a HashMap<String, ModeId>,
    /// Identical expanded sources share one compiled pattern.
    patterns: HashMap<String, Arc<Pattern>>,
    classes: HashMap<String, TokenClass>,
    default_token: TokenClass,
}

impl Builder<'_> {
    fn compile_rule(
        &mut self,
        mode: &str,
        mode_id: ModeId,
        position: usize,
        spec: &MatchRule,
    ) -> Result<Rule, ConfigError> {
        let context = format!("mode '{mode}' rule {position}");
        let source = self.library.expand(&spec.regex, &context)?;
        let pattern = match self.patterns.get(&source) {
            Some(shared) => Arc::clone(shared),
            None => {
                let compiled = Pattern::compile(&source, self.ignore_case).map_err(|err| {
                    ConfigError::InvalidPattern {
                        context: context.clone(),
                        message: err.to_string(),
                    }
                })?;
                let compiled = Arc::new(compiled);
                self.patterns.insert(source, Arc::clone(&compiled));
                compiled
            }
        };

        let emission = match &spec.token {
            Emission::Token(label) => CompiledEmission::Whole(
                self.class(label)
                    .unwrap_or_else(|| self.default_token.clone()),
            ),
            Emission::Groups(labels) => {
                CompiledEmission::Groups(labels.iter().map(|l| self.class(l)).collect())
            }
        };

        let resolve = |target: &str| {
            self.index
                .get(target)
                .copied()
                .ok_or_else(|| ConfigError::UndefinedMode {
                    mode: mode.to_string(),
                    rule: position,
                    target: target.to_string(),
                })
        };
        let action = match &spec.next {
            Transition::None => Action::None,
            Transition::Push(target) => Action::Push(resolve(target)?),
            Transition::PushSelf => Action::Push(mode_id),
            Transition::Pop => Action::Pop,
            Transition::SwitchTo(target) => Action::SwitchTo(resolve(target)?),
            Transition::Rematch => Action::Rematch,
        };

        Ok(Rule {
            pattern,
            emission,
            action,
        })
    }

    /// Intern a label; empty labels have no class.
    fn class(&mut self, label: &str) -> Option<TokenClass> {
        if label.is_empty() {
            return None;
        }
        Some(
            self.classes
                .entry(label.to_string())
                .or_insert_with(|| TokenClass::new(label))
                .clone(),
        )
    }
}
