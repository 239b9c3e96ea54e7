//! Resolved result shapes.
//!
//! Breakdowns are projections for explaining a result in the UI. They
//! are rebuilt on every resolution and never fed back into state.

use serde::{Deserialize, Serialize};

use crate::core::{DiceRng, DiceRollError, EffectId};
use crate::formula::{arith::format_number, DiceExpression, DiceRoll, DiceTerm};

/// One labeled contribution to a resolved value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    /// Label of the contributing effect.
    pub name: String,
    pub value: f64,
}

/// A resolved scalar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifiedValue {
    #[serde(rename = "final")]
    pub final_value: f64,
    /// Contributions in application order.
    pub modifiers: Vec<Breakdown>,
}

impl ModifiedValue {
    /// An unmodified value.
    #[must_use]
    pub fn unmodified(value: f64) -> Self {
        Self {
            final_value: value,
            modifiers: Vec::new(),
        }
    }
}

/// One entry of a dice pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PoolTerm {
    /// Dice notation, e.g. `2d6` or `1d8+2`.
    Dice(String),
    /// A flat number.
    Number(f64),
}

impl PoolTerm {
    /// Parse this entry as a dice expression.
    ///
    /// Non-integral numbers are truncated.
    pub fn expression(&self) -> Option<DiceExpression> {
        match self {
            PoolTerm::Dice(text) => text.parse().ok(),
            // Saturating float-to-int cast.
            PoolTerm::Number(n) => Some(DiceExpression::from_terms([DiceTerm::Flat(*n as i64)])),
        }
    }
}

impl From<&str> for PoolTerm {
    fn from(text: &str) -> Self {
        PoolTerm::Dice(text.to_string())
    }
}

impl From<f64> for PoolTerm {
    fn from(n: f64) -> Self {
        PoolTerm::Number(n)
    }
}

impl std::fmt::Display for PoolTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolTerm::Dice(text) => f.write_str(text),
            PoolTerm::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

/// One labeled contribution to a dice pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DicePoolBreakdown {
    pub name: String,
    /// Normalized dice text that was pushed.
    pub value: String,
    /// Structured terms of `value`, for rendering.
    pub terms: Vec<DiceTerm>,
}

/// A resolved dice pool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifiedDicePool {
    #[serde(rename = "final")]
    pub final_pool: Vec<PoolTerm>,
    pub modifiers: Vec<DicePoolBreakdown>,
}

impl ModifiedDicePool {
    /// All pool entries combined into one normalized expression.
    /// Entries that do not parse are skipped.
    #[must_use]
    pub fn expression(&self) -> DiceExpression {
        DiceExpression::from_terms(
            self.final_pool
                .iter()
                .filter_map(PoolTerm::expression)
                .flat_map(|e| e.terms().to_vec()),
        )
    }

    /// Roll the whole pool.
    pub fn roll(&self, rng: &mut DiceRng) -> Result<DiceRoll, DiceRollError> {
        self.expression().roll(rng)
    }
}

/// A single die group or flat bonus, kept separate for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollBonusComponent {
    /// Label of the contributing effect.
    pub label: String,
    pub effect: EffectId,
    pub term: DiceTerm,
}

impl RollBonusComponent {
    /// Roll just this component.
    pub fn roll(&self, rng: &mut DiceRng) -> Result<DiceRoll, DiceRollError> {
        DiceExpression::from_terms([self.term]).roll(rng)
    }
}

/// A proficiency level: automatic, or pinned to a concrete value.
///
/// Stored as a number, with `-1` meaning automatic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub enum ProficiencyLevel {
    /// Resolved from effects.
    Automatic,
    /// Set manually. Effects never change it.
    Fixed(f64),
}

impl ProficiencyLevel {
    /// Raw sentinel for `Automatic`.
    pub const AUTOMATIC_RAW: f64 = -1.0;

    /// The stored numeric form.
    #[must_use]
    pub fn raw(self) -> f64 {
        match self {
            ProficiencyLevel::Automatic => Self::AUTOMATIC_RAW,
            ProficiencyLevel::Fixed(level) => level,
        }
    }
}

impl From<f64> for ProficiencyLevel {
    fn from(raw: f64) -> Self {
        if raw == Self::AUTOMATIC_RAW {
            ProficiencyLevel::Automatic
        } else {
            ProficiencyLevel::Fixed(raw)
        }
    }
}

impl From<ProficiencyLevel> for f64 {
    fn from(level: ProficiencyLevel) -> Self {
        level.raw()
    }
}

/// A resolved proficiency level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifiedProficiency {
    #[serde(rename = "final")]
    pub final_level: f64,
    pub modifiers: Vec<Breakdown>,
}
