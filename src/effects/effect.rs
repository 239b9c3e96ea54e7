//! Effect definitions.
//!
//! An `Effect` is a named, independently toggleable bundle of
//! `SingleModifier`s, gated by `Requirement`s and optionally carrying
//! pickers and granted sub-entities. Effects hold no derived state:
//! whether one is active is always recomputed from external state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{AttributeKey, AttributeKeys, EffectId, OperationParseError};

use super::grants::Grants;
use super::requirement::Requirement;

/// The operation a single modifier performs.
///
/// Resolution applies operations in a fixed precedence regardless of
/// the order modifiers were declared:
/// `SetBase`, `Set`, `Add`/`Subtract`, `SetMin`, `SetMax`,
/// `SetBaseFinal`, `SetFinal`. `Push` only applies to dice pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Replace the running baseline.
    SetBase,
    /// Replace the running value outright.
    Set,
    /// Add to the running value.
    Add,
    /// Subtract from the running value.
    Subtract,
    /// Floor: the value never falls below this.
    SetMin,
    /// Ceiling: the value never rises above this.
    SetMax,
    /// Override the result after all other steps.
    SetBaseFinal,
    /// Override the result after all other steps, including `SetBaseFinal`.
    SetFinal,
    /// Append dice or a flat number to a dice pool.
    Push,
}

impl Operation {
    /// All operations in resolution precedence.
    pub const PRECEDENCE: [Operation; 9] = [
        Operation::SetBase,
        Operation::Set,
        Operation::Add,
        Operation::Subtract,
        Operation::SetMin,
        Operation::SetMax,
        Operation::SetBaseFinal,
        Operation::SetFinal,
        Operation::Push,
    ];

    /// The operation code without the `-formula` suffix.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Operation::SetBase => "set-base",
            Operation::Set => "set",
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::SetMin => "set-min",
            Operation::SetMax => "set-max",
            Operation::SetBaseFinal => "set-base-final",
            Operation::SetFinal => "set-final",
            Operation::Push => "push",
        }
    }

    /// Whether this operation gives a zero base a baseline to build on.
    #[must_use]
    pub const fn establishes_baseline(self) -> bool {
        matches!(self, Operation::SetBase | Operation::Set)
    }

    /// Parse an operation code, reporting whether it carried `-formula`.
    ///
    /// ```
    /// use sheet_effects::effects::Operation;
    ///
    /// assert_eq!(Operation::parse_code("add-formula"), Ok((Operation::Add, true)));
    /// assert_eq!(Operation::parse_code("set-min"), Ok((Operation::SetMin, false)));
    /// assert!(Operation::parse_code("multiply").is_err());
    /// ```
    pub fn parse_code(code: &str) -> Result<(Operation, bool), OperationParseError> {
        let code = code.trim();
        let (base, formula) = match code.strip_suffix("-formula") {
            Some(base) => (base, true),
            None => (code, false),
        };
        let op = base.parse()?;
        Ok((op, formula))
    }
}

impl FromStr for Operation {
    type Err = OperationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::PRECEDENCE
            .into_iter()
            .find(|op| op.code() == s)
            .ok_or_else(|| OperationParseError(s.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A literal modifier value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModifierValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl From<f64> for ModifierValue {
    fn from(v: f64) -> Self {
        ModifierValue::Number(v)
    }
}

impl From<i32> for ModifierValue {
    fn from(v: i32) -> Self {
        ModifierValue::Number(f64::from(v))
    }
}

impl From<&str> for ModifierValue {
    fn from(v: &str) -> Self {
        ModifierValue::Text(v.to_string())
    }
}

impl From<String> for ModifierValue {
    fn from(v: String) -> Self {
        ModifierValue::Text(v)
    }
}

impl From<Vec<String>> for ModifierValue {
    fn from(v: Vec<String>) -> Self {
        ModifierValue::List(v)
    }
}

/// What a modifier applies: a literal value or a formula, never both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModifierAmount {
    /// Literal value (operation code without `-formula`).
    Value(ModifierValue),
    /// Formula text (operation code with `-formula`).
    Formula(String),
}

impl ModifierAmount {
    /// Whether this amount is a formula.
    #[must_use]
    pub const fn is_formula(&self) -> bool {
        matches!(self, ModifierAmount::Formula(_))
    }
}

/// One operation against one or more attribute keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleModifier {
    /// Keys this modifier targets.
    pub keys: AttributeKeys,
    /// The operation.
    pub operation: Operation,
    /// The literal value or formula.
    pub amount: ModifierAmount,
    /// Extra requirements, evaluated in addition to the effect's.
    pub requirements: Vec<Requirement>,
}

impl SingleModifier {
    /// Create a modifier on one key.
    pub fn new(key: impl Into<AttributeKey>, operation: Operation, amount: ModifierAmount) -> Self {
        let mut keys = AttributeKeys::new();
        keys.push(key.into());
        Self {
            keys,
            operation,
            amount,
            requirements: Vec::new(),
        }
    }

    /// Create a modifier with a literal value.
    pub fn value(
        key: impl Into<AttributeKey>,
        operation: Operation,
        value: impl Into<ModifierValue>,
    ) -> Self {
        Self::new(key, operation, ModifierAmount::Value(value.into()))
    }

    /// Create a modifier with a formula.
    pub fn formula(
        key: impl Into<AttributeKey>,
        operation: Operation,
        formula: impl Into<String>,
    ) -> Self {
        Self::new(key, operation, ModifierAmount::Formula(formula.into()))
    }

    /// Also target another key (builder pattern).
    #[must_use]
    pub fn also_on(mut self, key: impl Into<AttributeKey>) -> Self {
        let key = key.into();
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    /// Add a requirement (builder pattern).
    #[must_use]
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// The full operation code, e.g. `add-formula`.
    #[must_use]
    pub fn operation_code(&self) -> String {
        if self.amount.is_formula() {
            format!("{}-formula", self.operation.code())
        } else {
            self.operation.code().to_string()
        }
    }

    /// Check whether this modifier targets any of `keys`.
    #[must_use]
    pub fn targets_any(&self, keys: &[AttributeKey]) -> bool {
        crate::core::attributes::intersects(&self.keys, keys)
    }
}

/// One selectable option of a picker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerOption {
    /// Text shown to the user.
    pub label: String,
    /// Value compared by requirements and substituted into formulas.
    pub value: String,
}

/// A labeled single-choice control on an effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picker {
    /// Picker label.
    pub label: String,
    /// Available options.
    pub options: Vec<PickerOption>,
    /// Currently selected option value.
    pub selected: String,
}

impl Picker {
    /// Create a picker whose option labels equal their values.
    /// The first option starts selected.
    pub fn new<I, S>(label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<PickerOption> = values
            .into_iter()
            .map(|v| {
                let value = v.into();
                PickerOption {
                    label: value.clone(),
                    value,
                }
            })
            .collect();
        let selected = options.first().map(|o| o.value.clone()).unwrap_or_default();
        Self {
            label: label.into(),
            options,
            selected,
        }
    }

    /// Set the selection (builder pattern).
    #[must_use]
    pub fn with_selected(mut self, value: impl Into<String>) -> Self {
        self.selected = value.into();
        self
    }

    /// Select an option. Returns `false` and leaves the selection unchanged
    /// if the picker has options and `value` is not one of them.
    pub fn select(&mut self, value: &str) -> bool {
        if !self.options.is_empty() && !self.options.iter().any(|o| o.value == value) {
            return false;
        }
        self.selected = value.to_string();
        true
    }
}

/// A named, toggleable bundle of modifiers.
///
/// ## Example
///
/// ```
/// use sheet_effects::effects::{Effect, Operation, Requirement, SingleModifier};
///
/// let ring = Effect::new("Ring of Protection")
///     .with_requirement(Requirement::Attuned)
///     .with_modifier(SingleModifier::value("ac", Operation::Add, 1))
///     .with_modifier(SingleModifier::value("saving-throws", Operation::Add, 1));
///
/// assert_eq!(ring.modifiers.len(), 2);
/// assert!(ring.enabled);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Identity within the registry.
    pub id: EffectId,
    /// Label shown in breakdowns.
    pub label: String,
    /// Whether the user has this effect switched on.
    pub enabled: bool,
    /// Whether the user may switch it.
    pub toggleable: bool,
    /// Whether the user may delete it.
    pub removable: bool,
    /// Free-text description.
    pub description: String,
    /// Requirements gating the whole effect.
    pub requirements: Vec<Requirement>,
    /// Modifiers applied while active.
    pub modifiers: Vec<SingleModifier>,
    /// Sub-entities granted while active.
    pub grants: Grants,
    /// User-selectable options.
    pub pickers: Vec<Picker>,
}

impl Effect {
    /// Create an enabled, toggleable, removable effect with no modifiers.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: EffectId::UNASSIGNED,
            label: label.into(),
            enabled: true,
            toggleable: true,
            removable: true,
            description: String::new(),
            requirements: Vec::new(),
            modifiers: Vec::new(),
            grants: Grants::default(),
            pickers: Vec::new(),
        }
    }

    /// Set the id (builder pattern).
    #[must_use]
    pub fn with_id(mut self, id: EffectId) -> Self {
        self.id = id;
        self
    }

    /// Set enabled (builder pattern).
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Mark as not toggleable (builder pattern).
    #[must_use]
    pub fn always_on(mut self) -> Self {
        self.toggleable = false;
        self
    }

    /// Mark as not removable (builder pattern).
    #[must_use]
    pub fn permanent(mut self) -> Self {
        self.removable = false;
        self
    }

    /// Set the description (builder pattern).
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a requirement (builder pattern).
    #[must_use]
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Add a modifier (builder pattern).
    #[must_use]
    pub fn with_modifier(mut self, modifier: SingleModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Add a picker (builder pattern).
    #[must_use]
    pub fn with_picker(mut self, picker: Picker) -> Self {
        self.pickers.push(picker);
        self
    }

    /// Set the granted sub-entities (builder pattern).
    #[must_use]
    pub fn with_grants(mut self, grants: Grants) -> Self {
        self.grants = grants;
        self
    }
}

/// A partial update for an effect. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectPatch {
    pub label: Option<String>,
    pub enabled: Option<bool>,
    pub toggleable: Option<bool>,
    pub removable: Option<bool>,
    pub description: Option<String>,
    pub requirements: Option<Vec<Requirement>>,
    pub modifiers: Option<Vec<SingleModifier>>,
    pub grants: Option<Grants>,
    pub pickers: Option<Vec<Picker>>,
}

impl EffectPatch {
    /// Apply the patch to an effect.
    pub fn apply(self, effect: &mut Effect) {
        if let Some(label) = self.label {
            effect.label = label;
        }
        if let Some(enabled) = self.enabled {
            effect.enabled = enabled;
        }
        if let Some(toggleable) = self.toggleable {
            effect.toggleable = toggleable;
        }
        if let Some(removable) = self.removable {
            effect.removable = removable;
        }
        if let Some(description) = self.description {
            effect.description = description;
        }
        if let Some(requirements) = self.requirements {
            effect.requirements = requirements;
        }
        if let Some(modifiers) = self.modifiers {
            effect.modifiers = modifiers;
        }
        if let Some(grants) = self.grants {
            effect.grants = grants;
        }
        if let Some(pickers) = self.pickers {
            effect.pickers = pickers;
        }
    }

    /// Build a new effect from the patch, defaulting unset fields.
    #[must_use]
    pub fn into_effect(self, id: EffectId) -> Effect {
        let mut effect = Effect::new(String::new()).with_id(id);
        self.apply(&mut effect);
        effect
    }
}
