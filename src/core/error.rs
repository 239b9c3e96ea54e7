//! Error taxonomy for the engine.
//!
//! None of these errors escape the public resolution entry points: a
//! failing formula degrades to a neutral `0`, and a malformed persisted
//! entry degrades to an empty collection. The typed errors exist for the
//! `try_*` entry points and for logging.

use thiserror::Error;

use super::entity::{EffectId, GrantedItemId};

/// Error when parsing dice notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The notation string is empty.
    #[error("Empty dice notation")]
    Empty,
    /// A term could not be read as `NdS` or an integer.
    #[error("Invalid dice term: '{0}'")]
    InvalidTerm(String),
    /// Die size must be at least 1.
    #[error("Die size must be at least 1")]
    InvalidDieSize,
    /// Count or constant does not fit.
    #[error("Dice value overflow in '{0}'")]
    Overflow(String),
}

/// Error when rolling a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceRollError {
    /// More dice than one roll may throw.
    #[error("Cannot roll {count} dice, the limit is {max}")]
    TooManyDice { count: u64, max: u32 },
}

/// Error when resolving or evaluating a formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// An `@{...}` reference names no known attribute.
    #[error("Unresolved attribute reference: '{0}'")]
    UnresolvedReference(String),
    /// A `$picker:N` reference names no picker on the owning effect.
    #[error("Unknown picker index {0}")]
    UnknownPicker(usize),
    /// A `@{...}` token is malformed (bad clamp, unterminated brace).
    #[error("Malformed token: '{0}'")]
    MalformedToken(String),
    /// Arithmetic text could not be parsed.
    #[error("Invalid arithmetic at position {position} in '{text}'")]
    Syntax { text: String, position: usize },
    /// Arithmetic produced NaN or infinity.
    #[error("Arithmetic result is not finite: '{0}'")]
    NotFinite(String),
    /// Arithmetic nests deeper than the evaluator accepts.
    #[error("Arithmetic nested deeper than {0} levels")]
    TooDeep(usize),
    /// Unknown function name in arithmetic.
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    /// Dice notation failed to parse.
    #[error(transparent)]
    Dice(#[from] DiceParseError),
}

impl FormulaError {
    /// Create a syntax error at a position.
    pub fn syntax(text: impl Into<String>, position: usize) -> Self {
        Self::Syntax {
            text: text.into(),
            position,
        }
    }
}

/// Error when parsing a requirement string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementParseError {
    /// The requirement string is empty.
    #[error("Empty requirement")]
    Empty,
    /// Level prefix is not `cl` or `ol`.
    #[error("Unknown level prefix in '{0}'")]
    UnknownPrefix(String),
    /// Comparison operator missing or unknown.
    #[error("Unknown comparison operator in '{0}'")]
    UnknownOperator(String),
    /// Level bound missing or outside the accepted range.
    #[error("Invalid level bound in '{0}'")]
    InvalidBound(String),
    /// Picker requirement is not `$picker:<index>==<value>`.
    #[error("Invalid picker requirement '{0}'")]
    InvalidPicker(String),
    /// The text matches no requirement form.
    #[error("Unrecognized requirement '{0}'")]
    Unrecognized(String),
}

/// Error when parsing an operation code such as `add-formula`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown operation '{0}'")]
pub struct OperationParseError(pub String);

/// Error when mutating the effect registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No effect with this id is registered.
    #[error("{0} not found")]
    NotFound(EffectId),
    /// The effect cannot be toggled.
    #[error("{0} is not toggleable")]
    NotToggleable(EffectId),
    /// The effect cannot be removed.
    #[error("{0} is not removable")]
    NotRemovable(EffectId),
    /// Picker index is out of range for the effect.
    #[error("{effect} has no picker {index}")]
    NoSuchPicker { effect: EffectId, index: usize },
    /// No granted item with this id on the effect.
    #[error("{effect} has no granted {kind} {item}")]
    NoSuchItem {
        effect: EffectId,
        kind: &'static str,
        item: GrantedItemId,
    },
}

/// Error when encoding or decoding the stored form.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Binary encoding or decoding failed.
    #[error("Binary codec failed: {0}")]
    Codec(#[from] bincode::Error),
}
