//! Core engine types: identities, attribute keys, configuration, errors, RNG.
//!
//! Everything here is sheet-agnostic. Sheets configure the engine via
//! `EngineConfig` rather than changing the resolver.

pub mod attributes;
pub mod config;
pub mod entity;
pub mod error;
pub mod rng;

pub use attributes::{AttributeKey, AttributeKeys};
pub use config::{EngineConfig, MissingOwnerPolicy};
pub use entity::{EffectId, GrantedItemId};
pub use error::{
    DiceParseError, DiceRollError, FormulaError, OperationParseError, PersistError,
    RegistryError, RequirementParseError,
};
pub use rng::{DiceRng, DiceRngState};
