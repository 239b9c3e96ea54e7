//! Named-formula registry.
//!
//! Formulas reference derived stats by name (`@{strength-mod}`,
//! `@{level}`, `@{fighter-level}`). Lookup is an explicit function over
//! a registry; sheets fill the registry from their own stores before
//! resolving.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Anything that can resolve a named attribute to a number.
pub trait FormulaLookup {
    /// Resolve a key, or `None` if the key is unknown.
    fn lookup(&self, key: &str) -> Option<f64>;
}

impl FormulaLookup for FxHashMap<String, f64> {
    fn lookup(&self, key: &str) -> Option<f64> {
        self.get(key).copied()
    }
}

/// The six ability scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    /// All abilities in sheet order.
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    /// Formula key of the score, e.g. `strength`.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Ability::Strength => "strength",
            Ability::Dexterity => "dexterity",
            Ability::Constitution => "constitution",
            Ability::Intelligence => "intelligence",
            Ability::Wisdom => "wisdom",
            Ability::Charisma => "charisma",
        }
    }

    /// Formula key of the modifier, e.g. `strength-mod`.
    #[must_use]
    pub const fn modifier_key(self) -> &'static str {
        match self {
            Ability::Strength => "strength-mod",
            Ability::Dexterity => "dexterity-mod",
            Ability::Constitution => "constitution-mod",
            Ability::Intelligence => "intelligence-mod",
            Ability::Wisdom => "wisdom-mod",
            Ability::Charisma => "charisma-mod",
        }
    }
}

/// Ability modifier for a score: `floor((score - 10) / 2)`.
///
/// ```
/// use sheet_effects::formula::ability_modifier;
///
/// assert_eq!(ability_modifier(12.0), 1.0);
/// assert_eq!(ability_modifier(9.0), -1.0);
/// ```
#[must_use]
pub fn ability_modifier(score: f64) -> f64 {
    ((score - 10.0) / 2.0).floor()
}

/// Registry of named values formulas can reference.
///
/// Per-class levels are looked up through `<class>-level`; a class the
/// character has no levels in resolves to `0`.
///
/// ## Example
///
/// ```
/// use sheet_effects::formula::{Ability, FormulaLookup, FormulaRegistry};
///
/// let registry = FormulaRegistry::new()
///     .with_ability(Ability::Dexterity, 14.0)
///     .with_level(5)
///     .with_class_level("Rogue", 3);
///
/// assert_eq!(registry.lookup("dexterity-mod"), Some(2.0));
/// assert_eq!(registry.lookup("rogue-level"), Some(3.0));
/// assert_eq!(registry.lookup("wizard-level"), Some(0.0));
/// assert_eq!(registry.lookup("luck"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaRegistry {
    values: FxHashMap<String, f64>,
    class_levels: FxHashMap<String, u32>,
}

impl FormulaRegistry {
    /// Key for overall character level.
    pub const LEVEL: &'static str = "level";
    /// Key for proficiency bonus.
    pub const PROFICIENCY_BONUS: &'static str = "proficiency-bonus";
    /// Key for the primary spellcasting save DC.
    pub const SPELL_SAVE_DC: &'static str = "spell-save-dc";

    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary named value.
    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// Set an ability score and its derived modifier.
    #[must_use]
    pub fn with_ability(mut self, ability: Ability, score: f64) -> Self {
        self.set(ability.key(), score);
        self.set(ability.modifier_key(), ability_modifier(score));
        self
    }

    /// Set overall level.
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.set(Self::LEVEL, f64::from(level));
        self
    }

    /// Set proficiency bonus.
    #[must_use]
    pub fn with_proficiency_bonus(mut self, bonus: f64) -> Self {
        self.set(Self::PROFICIENCY_BONUS, bonus);
        self
    }

    /// Set the level in one class. Class names are case-insensitive.
    #[must_use]
    pub fn with_class_level(mut self, class: &str, level: u32) -> Self {
        self.class_levels.insert(class.to_lowercase(), level);
        self
    }

    /// Set a named speed, looked up as `speed-<name>`.
    #[must_use]
    pub fn with_speed(mut self, name: &str, value: f64) -> Self {
        self.set(format!("speed-{name}"), value);
        self
    }

    /// Set the primary spellcasting save DC.
    #[must_use]
    pub fn with_spell_save_dc(mut self, dc: f64) -> Self {
        self.set(Self::SPELL_SAVE_DC, dc);
        self
    }

    /// Set an arbitrary named value (builder pattern).
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: f64) -> Self {
        self.set(key, value);
        self
    }
}

impl FormulaLookup for FormulaRegistry {
    fn lookup(&self, key: &str) -> Option<f64> {
        if let Some(value) = self.values.get(key) {
            return Some(*value);
        }
        let class = key.strip_suffix("-level")?;
        if class.is_empty() {
            return None;
        }
        let level = self.class_levels.get(&class.to_lowercase()).copied().unwrap_or(0);
        Some(f64::from(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier() {
        assert_eq!(ability_modifier(10.0), 0.0);
        assert_eq!(ability_modifier(11.0), 0.0);
        assert_eq!(ability_modifier(12.0), 1.0);
        assert_eq!(ability_modifier(8.0), -1.0);
        assert_eq!(ability_modifier(7.0), -2.0);
        assert_eq!(ability_modifier(20.0), 5.0);
    }

    #[test]
    fn test_values_shadow_class_levels() {
        let registry = FormulaRegistry::new()
            .with_level(7)
            .with_class_level("fighter", 4);

        assert_eq!(registry.lookup("level"), Some(7.0));
        assert_eq!(registry.lookup("fighter-level"), Some(4.0));
        assert_eq!(registry.lookup("-level"), None);
    }

    #[test]
    fn test_map_lookup() {
        let mut map = FxHashMap::default();
        map.insert("level".to_string(), 3.0);
        assert_eq!(map.lookup("level"), Some(3.0));
        assert_eq!(map.lookup("question"), None);
    }

    #[test]
    fn test_speed_and_dc() {
        let registry = FormulaRegistry::new()
            .with_speed("walk", 30.0)
            .with_spell_save_dc(15.0)
            .with_proficiency_bonus(3.0);

        assert_eq!(registry.lookup("speed-walk"), Some(30.0));
        assert_eq!(registry.lookup("spell-save-dc"), Some(15.0));
        assert_eq!(registry.lookup("proficiency-bonus"), Some(3.0));
    }
}
