//! Resolution context and the collaborators it draws on.
//!
//! - `EquipmentState`: is the effect's owning item equipped/attuned
//! - `Progression`: levels, proficiency bonus, hit dice
//! - `TagRelease`: cleanup when an effect is removed
//! - `ResolutionContext`: bundles the above with config and formulas

mod collaborators;
mod resolution;

pub use collaborators::{
    proficiency_bonus_for_level, EquipmentState, NoEquipment, NoTags, Progression,
    ProgressionSnapshot, TagRelease,
};
pub use resolution::ResolutionContext;
