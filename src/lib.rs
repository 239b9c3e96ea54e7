//! # sheet-effects
//!
//! An effect resolution engine for tabletop character sheets.
//!
//! Every derived stat on a sheet (armor class, attack bonus, skills,
//! speeds, damage dice) is a base value plus whatever the character's
//! active effects do to it. This crate owns that step.
//!
//! ## Design Principles
//!
//! 1. **Pure Resolution**: Resolving a stat reads effects, equipment and
//!    progression and returns a result with a breakdown. It never mutates
//!    anything and never caches whether an effect is active.
//!
//! 2. **Explicit Context**: Collaborators come in through
//!    `ResolutionContext`, so a player and a companion creature resolve
//!    through the same engine with different levels and hit dice.
//!
//! 3. **Contained Failure**: A malformed formula resolves to `0` on its
//!    own and logs why. Sibling modifiers are unaffected.
//!
//! ## Modules
//!
//! - `core`: IDs, attribute keys, configuration, errors, dice RNG
//! - `effects`: Effects, requirements, granted items, registry, persistence
//! - `formula`: Formula references, dice notation, arithmetic
//! - `context`: Collaborator traits and `ResolutionContext`
//! - `resolver`: Value, dice pool, proficiency and roll-bonus resolution
//!
//! ## Example
//!
//! ```
//! use sheet_effects::{
//!     Ability, EffectEngine, Effect, EffectRegistry, EngineConfig, FormulaRegistry,
//!     Operation, ProgressionSnapshot, ResolutionContext, SingleModifier,
//! };
//!
//! let mut registry = EffectRegistry::new();
//! registry.add(
//!     Effect::new("Mage Armor").with_modifier(SingleModifier::formula(
//!         "ac",
//!         Operation::SetBase,
//!         "13 + @{dexterity-mod}",
//!     )),
//! );
//!
//! let config = EngineConfig::default();
//! let formulas = FormulaRegistry::new().with_ability(Ability::Dexterity, 16.0);
//! let progression = ProgressionSnapshot::new(3);
//! let ctx = ResolutionContext::new(&config, &formulas, &progression);
//! let engine = EffectEngine::new(&registry, ctx);
//!
//! let ac = engine.get_modified_value(10.0, &["ac"], None);
//! assert_eq!(ac.final_value, 16.0);
//! assert_eq!(ac.modifiers[0].name, "Mage Armor");
//! ```

pub mod context;
pub mod core;
pub mod effects;
pub mod formula;
pub mod resolver;

// Re-export commonly used types
pub use crate::core::{
    AttributeKey, DiceRng, DiceRngState, DiceRollError, EffectId, EngineConfig, GrantedItemId,
    MissingOwnerPolicy,
};

pub use crate::effects::{
    Effect, EffectPatch, EffectRegistry, Grants, ModifierAmount, ModifierValue, Operation, Picker,
    Requirement, RequirementContext, RequirementEvaluator, SingleModifier,
};

pub use crate::formula::{
    ability_modifier, evaluate_dice_formula, parse_formula, parse_formula_and_evaluate, Ability,
    DiceExpression, FormulaContext, FormulaLookup, FormulaRegistry, HitDicePool,
};

pub use crate::context::{
    EquipmentState, NoEquipment, NoTags, Progression, ProgressionSnapshot, ResolutionContext,
    TagRelease,
};

pub use crate::resolver::{
    EffectEngine, FromEffect, ModifiedDicePool, ModifiedProficiency, ModifiedValue, PoolTerm,
    ProficiencyLevel, RollBonusComponent,
};
