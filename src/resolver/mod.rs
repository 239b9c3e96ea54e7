//! Modifier resolution.
//!
//! Given a base and a set of query keys, the resolver keeps the active
//! modifiers that target those keys and folds them into one of four
//! result shapes:
//! - `ModifiedValue`: a scalar with a breakdown
//! - `ModifiedDicePool`: a pool with pushed dice appended
//! - `ModifiedProficiency`: a discrete level
//! - `RollBonusComponent`s: pushed dice kept apart for rendering
//!
//! `EffectEngine` bundles these over a registry and a resolution context.

mod collect;
mod dice_pool;
mod engine;
mod modified;
mod proficiency;
mod value;

pub use collect::{collect_from_effects, FromEffect};
pub use dice_pool::{calculate_modified_dice_pool, roll_bonus_components};
pub use engine::EffectEngine;
pub use modified::{
    Breakdown, DicePoolBreakdown, ModifiedDicePool, ModifiedProficiency, ModifiedValue, PoolTerm,
    ProficiencyLevel, RollBonusComponent,
};
pub use proficiency::resolve_proficiency;
pub use value::{calculate_modified_value, get_valid_modifiers, snap_to, ValidModifier};
