//! Effects and the requirements that gate them.
//!
//! - `Effect`: a named, toggleable bundle of `SingleModifier`s
//! - `Requirement` / `RequirementEvaluator`: whether an effect is active
//! - `Grants`: actions, resources and spells an active effect contributes
//! - `EffectRegistry`: owns a sheet's effects
//! - `persist`: flattened stored form for save/load
//!
//! ## Activity
//!
//! Nothing here caches whether an effect is active. Equipment state,
//! levels and picker selections are read at evaluation time, so a change
//! to any of them shows up on the next query without invalidation.

mod effect;
mod grants;
pub mod persist;
mod registry;
mod requirement;

pub use effect::{
    Effect, EffectPatch, ModifierAmount, ModifierValue, Operation, Picker, PickerOption,
    SingleModifier,
};
pub use grants::{
    ActionKind, GrantedAction, GrantedKind, GrantedResource, GrantedSpell, GrantedSpellSource,
    Grants, Recharge,
};
pub use registry::EffectRegistry;
pub use requirement::{
    Comparison, LevelScope, OwnerState, Requirement, RequirementContext, RequirementEvaluator,
};
