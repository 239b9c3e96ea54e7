//! Requirements gate effects and single modifiers.
//!
//! A requirement list is satisfied only if every entry is satisfied.
//! Requirements are always evaluated against current external state;
//! nothing about activity is ever stored on the effect.
//!
//! ## String form
//!
//! | Form             | Meaning                                        |
//! |------------------|------------------------------------------------|
//! | `equipped`       | owning item is equipped                        |
//! | `attuned`        | owning item is attuned                         |
//! | `cl>=5`          | class level comparison (`<`,`<=`,`=`,`>`,`>=`) |
//! | `ol<3`           | overall level comparison                       |
//! | `$picker:0==1`   | picker 0 currently selects `1`                 |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{EngineConfig, MissingOwnerPolicy, RequirementParseError};

use super::effect::{Effect, Picker, SingleModifier};

/// Which level a level requirement compares against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelScope {
    /// Level in the class that owns the effect (`cl`).
    Class,
    /// Overall character level (`ol`).
    Overall,
}

impl LevelScope {
    const fn prefix(self) -> &'static str {
        match self {
            LevelScope::Class => "cl",
            LevelScope::Overall => "ol",
        }
    }
}

/// Comparison operator of a level requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Less,
    LessOrEqual,
    Equal,
    Greater,
    GreaterOrEqual,
}

impl Comparison {
    /// Operators in match order: two-character forms first.
    const TOKENS: [(&'static str, Comparison); 6] = [
        ("<=", Comparison::LessOrEqual),
        (">=", Comparison::GreaterOrEqual),
        ("==", Comparison::Equal),
        ("<", Comparison::Less),
        (">", Comparison::Greater),
        ("=", Comparison::Equal),
    ];

    const fn symbol(self) -> &'static str {
        match self {
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Equal => "=",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
        }
    }

    /// Compare `actual` against `bound`.
    #[must_use]
    pub fn holds(self, actual: u32, bound: u32) -> bool {
        match self {
            Comparison::Less => actual < bound,
            Comparison::LessOrEqual => actual <= bound,
            Comparison::Equal => actual == bound,
            Comparison::Greater => actual > bound,
            Comparison::GreaterOrEqual => actual >= bound,
        }
    }
}

/// A condition gating an effect or a single modifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Requirement {
    /// The owning item must be equipped.
    Equipped,
    /// The owning item must be attuned.
    Attuned,
    /// A level comparison.
    Level {
        scope: LevelScope,
        comparison: Comparison,
        bound: u8,
    },
    /// Picker `index` on the owning effect must currently select `value`.
    Picker { index: usize, value: String },
    /// Text that matched no known form. Never satisfied; kept for round-trips.
    Unrecognized(String),
}

impl Requirement {
    /// Create a level requirement.
    #[must_use]
    pub fn level(scope: LevelScope, comparison: Comparison, bound: u8) -> Self {
        Self::Level {
            scope,
            comparison,
            bound,
        }
    }

    /// Create a picker-equality requirement.
    pub fn picker(index: usize, value: impl Into<String>) -> Self {
        Self::Picker {
            index,
            value: value.into(),
        }
    }

    /// Parse with the level bounds of `config`.
    pub fn parse_with(text: &str, config: &EngineConfig) -> Result<Self, RequirementParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RequirementParseError::Empty);
        }

        match text {
            "equipped" => return Ok(Self::Equipped),
            "attuned" => return Ok(Self::Attuned),
            _ => {}
        }

        if let Some(rest) = text.strip_prefix("$picker:") {
            let (index, value) = rest
                .split_once("==")
                .ok_or_else(|| RequirementParseError::InvalidPicker(text.to_string()))?;
            let index: usize = index
                .trim()
                .parse()
                .map_err(|_| RequirementParseError::InvalidPicker(text.to_string()))?;
            return Ok(Self::picker(index, value.trim()));
        }

        let (scope, rest) = if let Some(rest) = text.strip_prefix("cl") {
            (LevelScope::Class, rest)
        } else if let Some(rest) = text.strip_prefix("ol") {
            (LevelScope::Overall, rest)
        } else if text.starts_with(|c: char| c.is_ascii_alphabetic())
            && text.contains(&['<', '>', '='][..])
        {
            return Err(RequirementParseError::UnknownPrefix(text.to_string()));
        } else {
            return Err(RequirementParseError::Unrecognized(text.to_string()));
        };

        let rest = rest.trim_start();
        let (comparison, bound) = Comparison::TOKENS
            .iter()
            .find_map(|(token, cmp)| rest.strip_prefix(*token).map(|b| (*cmp, b)))
            .ok_or_else(|| RequirementParseError::UnknownOperator(text.to_string()))?;

        let bound: u8 = bound
            .trim()
            .parse()
            .map_err(|_| RequirementParseError::InvalidBound(text.to_string()))?;
        if !config.level_in_bounds(bound) {
            return Err(RequirementParseError::InvalidBound(text.to_string()));
        }

        Ok(Self::level(scope, comparison, bound))
    }

    /// Parse, keeping unparseable text as `Unrecognized`.
    pub fn parse_lenient(text: &str) -> Self {
        text.parse().unwrap_or_else(|e: RequirementParseError| {
            tracing::warn!(
                requirement = %text,
                error = %e,
                "unrecognized requirement kept as unsatisfiable"
            );
            Self::Unrecognized(text.to_string())
        })
    }
}

impl FromStr for Requirement {
    type Err = RequirementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with(s, &EngineConfig::default())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Equipped => f.write_str("equipped"),
            Requirement::Attuned => f.write_str("attuned"),
            Requirement::Level {
                scope,
                comparison,
                bound,
            } => write!(f, "{}{}{}", scope.prefix(), comparison.symbol(), bound),
            Requirement::Picker { index, value } => write!(f, "$picker:{index}=={value}"),
            Requirement::Unrecognized(text) => f.write_str(text),
        }
    }
}

impl From<String> for Requirement {
    fn from(text: String) -> Self {
        Self::parse_lenient(&text)
    }
}

impl From<Requirement> for String {
    fn from(req: Requirement) -> Self {
        req.to_string()
    }
}

/// State of the item an effect is attached to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerState {
    /// Item is equipped.
    pub equipped: bool,
    /// Item is attuned.
    pub attuned: bool,
}

/// External state one effect's requirements are evaluated against.
#[derive(Clone, Copy, Debug)]
pub struct RequirementContext<'a> {
    /// Owning item state, `None` if the effect is not attached to an item.
    pub owner: Option<OwnerState>,
    /// Level in the class owning the effect, if any.
    pub class_level: Option<u32>,
    /// Overall character level.
    pub overall_level: u32,
    /// Pickers of the effect being evaluated.
    pub pickers: &'a [Picker],
    /// Outcome for `equipped`/`attuned` when `owner` is `None`.
    pub missing_owner: MissingOwnerPolicy,
}

impl<'a> RequirementContext<'a> {
    /// Create a context for a character at `overall_level` with no owning item.
    #[must_use]
    pub fn new(overall_level: u32) -> Self {
        Self {
            owner: None,
            class_level: None,
            overall_level,
            pickers: &[],
            missing_owner: MissingOwnerPolicy::default(),
        }
    }

    /// Set the owning item state.
    #[must_use]
    pub fn with_owner(mut self, owner: OwnerState) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set the class level.
    #[must_use]
    pub fn with_class_level(mut self, level: u32) -> Self {
        self.class_level = Some(level);
        self
    }

    /// Set the pickers.
    #[must_use]
    pub fn with_pickers(mut self, pickers: &'a [Picker]) -> Self {
        self.pickers = pickers;
        self
    }

    /// Set the missing-owner policy.
    #[must_use]
    pub fn with_missing_owner(mut self, policy: MissingOwnerPolicy) -> Self {
        self.missing_owner = policy;
        self
    }

    fn owner_flag(&self, flag: impl Fn(&OwnerState) -> bool) -> bool {
        match &self.owner {
            Some(owner) => flag(owner),
            None => {
                let outcome = self.missing_owner.outcome();
                tracing::debug!(
                    outcome,
                    "no owning item for equipment requirement, applying policy"
                );
                outcome
            }
        }
    }
}

/// Evaluator for requirements.
pub struct RequirementEvaluator;

impl RequirementEvaluator {
    /// Check a single requirement.
    pub fn evaluate(requirement: &Requirement, ctx: &RequirementContext) -> bool {
        match requirement {
            Requirement::Equipped => ctx.owner_flag(|o| o.equipped),

            Requirement::Attuned => ctx.owner_flag(|o| o.attuned),

            Requirement::Level {
                scope,
                comparison,
                bound,
            } => {
                let actual = match scope {
                    LevelScope::Class => ctx.class_level.unwrap_or(ctx.overall_level),
                    LevelScope::Overall => ctx.overall_level,
                };
                comparison.holds(actual, u32::from(*bound))
            }

            Requirement::Picker { index, value } => ctx
                .pickers
                .get(*index)
                .is_some_and(|picker| picker.selected == *value),

            Requirement::Unrecognized(_) => false,
        }
    }

    /// Check a requirement list. An empty list is satisfied.
    pub fn is_satisfied(requirements: &[Requirement], ctx: &RequirementContext) -> bool {
        requirements.iter().all(|r| Self::evaluate(r, ctx))
    }

    /// An effect is active iff it is enabled and its requirements hold.
    pub fn is_effect_active(effect: &Effect, ctx: &RequirementContext) -> bool {
        effect.enabled && Self::is_satisfied(&effect.requirements, ctx)
    }

    /// A single modifier is active iff its effect is active and its own
    /// requirements hold.
    pub fn is_single_modifier_active(
        effect: &Effect,
        modifier: &SingleModifier,
        ctx: &RequirementContext,
    ) -> bool {
        Self::is_effect_active(effect, ctx) && Self::is_satisfied(&modifier.requirements, ctx)
    }
}
