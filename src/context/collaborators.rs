//! Collaborators the engine consumes.
//!
//! The engine reads equipment and progression state through these traits
//! instead of reaching into sheet stores, so one engine instance serves a
//! player character and an independently leveled creature alike.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::EffectId;
use crate::effects::OwnerState;
use crate::formula::{FormulaRegistry, HitDicePool};

/// Reports the state of the item an effect is attached to.
pub trait EquipmentState {
    /// `None` if the effect is not attached to any known item.
    fn owner_state(&self, effect: EffectId) -> Option<OwnerState>;
}

/// Character progression: levels, proficiency bonus, hit dice.
pub trait Progression {
    /// Overall character level.
    fn overall_level(&self) -> u32;

    /// Level in one class. Unknown classes are level 0.
    fn class_level(&self, class: &str) -> u32;

    /// Level in the class that owns `effect`, if any.
    fn class_level_for_effect(&self, _effect: EffectId) -> Option<u32> {
        None
    }

    /// Proficiency bonus, derived from overall level unless overridden.
    fn proficiency_bonus(&self) -> f64 {
        proficiency_bonus_for_level(self.overall_level())
    }

    /// Hit dice pools by size, with spent counts.
    fn hit_dice_pools(&self) -> Vec<HitDicePool>;

    /// Value of a progression-owned formula key: `level`,
    /// `proficiency-bonus` or `<class>-level`. `None` for any other key.
    fn formula_value(&self, key: &str) -> Option<f64> {
        match key {
            FormulaRegistry::LEVEL => Some(f64::from(self.overall_level())),
            FormulaRegistry::PROFICIENCY_BONUS => Some(self.proficiency_bonus()),
            _ => key
                .strip_suffix("-level")
                .filter(|class| !class.is_empty())
                .map(|class| f64::from(self.class_level(class))),
        }
    }
}

/// Releases tags owned by a removed effect.
pub trait TagRelease {
    fn release_tags_owned_by(&mut self, effect: EffectId);
}

/// Proficiency bonus at a level: +2 at 1-4, +3 at 5-8, up to +6 at 17-20.
///
/// ```
/// use sheet_effects::context::proficiency_bonus_for_level;
///
/// assert_eq!(proficiency_bonus_for_level(1), 2.0);
/// assert_eq!(proficiency_bonus_for_level(5), 3.0);
/// assert_eq!(proficiency_bonus_for_level(20), 6.0);
/// ```
#[must_use]
pub fn proficiency_bonus_for_level(level: u32) -> f64 {
    f64::from(2 + level.saturating_sub(1) / 4)
}

/// Equipment collaborator for subjects without items.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEquipment;

impl EquipmentState for NoEquipment {
    fn owner_state(&self, _effect: EffectId) -> Option<OwnerState> {
        None
    }
}

/// Tag collaborator for sheets without tags.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTags;

impl TagRelease for NoTags {
    fn release_tags_owned_by(&mut self, _effect: EffectId) {}
}

impl EquipmentState for FxHashMap<EffectId, OwnerState> {
    fn owner_state(&self, effect: EffectId) -> Option<OwnerState> {
        self.get(&effect).copied()
    }
}

/// A plain-data progression, for creatures and tests.
///
/// ## Example
///
/// ```
/// use sheet_effects::context::{Progression, ProgressionSnapshot};
/// use sheet_effects::formula::HitDicePool;
///
/// let wolf = ProgressionSnapshot::new(3).with_hit_dice(HitDicePool::new(8, 2, 0));
/// assert_eq!(wolf.overall_level(), 3);
/// assert_eq!(wolf.proficiency_bonus(), 2.0);
/// assert_eq!(wolf.hit_dice_pools().len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressionSnapshot {
    pub level: u32,
    pub class_levels: FxHashMap<String, u32>,
    /// Class owning each class-feature effect.
    pub effect_classes: FxHashMap<EffectId, String>,
    pub hit_dice: Vec<HitDicePool>,
    /// Overrides the level-derived proficiency bonus.
    pub proficiency_bonus: Option<f64>,
}

impl ProgressionSnapshot {
    /// Create a snapshot at `level` with no classes.
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Set the level in one class. Class names are case-insensitive.
    #[must_use]
    pub fn with_class(mut self, class: &str, level: u32) -> Self {
        self.class_levels.insert(class.to_lowercase(), level);
        self
    }

    /// Record that `effect` is a feature of `class`.
    #[must_use]
    pub fn with_effect_class(mut self, effect: EffectId, class: &str) -> Self {
        self.effect_classes.insert(effect, class.to_lowercase());
        self
    }

    /// Add a hit dice pool.
    #[must_use]
    pub fn with_hit_dice(mut self, pool: HitDicePool) -> Self {
        self.hit_dice.push(pool);
        self
    }

    /// Override the proficiency bonus.
    #[must_use]
    pub fn with_proficiency_bonus(mut self, bonus: f64) -> Self {
        self.proficiency_bonus = Some(bonus);
        self
    }
}

impl Progression for ProgressionSnapshot {
    fn overall_level(&self) -> u32 {
        self.level
    }

    fn class_level(&self, class: &str) -> u32 {
        self.class_levels
            .get(&class.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    fn class_level_for_effect(&self, effect: EffectId) -> Option<u32> {
        self.effect_classes
            .get(&effect)
            .map(|class| self.class_level(class))
    }

    fn proficiency_bonus(&self) -> f64 {
        self.proficiency_bonus
            .unwrap_or_else(|| proficiency_bonus_for_level(self.level))
    }

    fn hit_dice_pools(&self) -> Vec<HitDicePool> {
        self.hit_dice.clone()
    }
}
