//! Engine configuration.
//!
//! Sheets configure the engine once and pass the config through the
//! `ResolutionContext`. Nothing here is game content; it only tunes
//! how resolution behaves:
//! - `proficiency_levels`: the discrete constrain set for proficiency snapping
//! - `missing_owner_policy`: what `equipped`/`attuned` do without an owning item
//! - `min_level`/`max_level`: accepted bounds for level requirements
//! - `zero_base_gating`: whether a zero base suppresses additive modifiers

use serde::{Deserialize, Serialize};

/// How `equipped`/`attuned` requirements behave when the effect is not
/// attached to any item the equipment collaborator knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingOwnerPolicy {
    /// Treat the requirement as satisfied (fail open).
    #[default]
    Satisfied,
    /// Treat the requirement as unsatisfied (fail closed).
    Unsatisfied,
}

impl MissingOwnerPolicy {
    /// The requirement outcome this policy yields.
    #[must_use]
    pub const fn outcome(self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// Configuration for the effect resolution engine.
///
/// ## Example
///
/// ```
/// use sheet_effects::core::{EngineConfig, MissingOwnerPolicy};
///
/// let config = EngineConfig::default()
///     .with_missing_owner_policy(MissingOwnerPolicy::Unsatisfied)
///     .with_level_bounds(1, 30);
///
/// assert_eq!(config.max_level, 30);
/// assert_eq!(config.proficiency_levels, vec![0.0, 0.5, 1.0, 2.0]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ordered discrete proficiency levels (untrained, half, proficient, expert).
    pub proficiency_levels: Vec<f64>,

    /// Outcome of `equipped`/`attuned` when no owning item is found.
    pub missing_owner_policy: MissingOwnerPolicy,

    /// Lowest level a level requirement may name.
    pub min_level: u8,

    /// Highest level a level requirement may name.
    pub max_level: u8,

    /// Suppress additive modifiers on a zero base with no baseline-setting modifier.
    pub zero_base_gating: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            proficiency_levels: vec![0.0, 0.5, 1.0, 2.0],
            missing_owner_policy: MissingOwnerPolicy::Satisfied,
            min_level: 1,
            max_level: 20,
            zero_base_gating: true,
        }
    }
}

impl EngineConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the proficiency constrain set.
    #[must_use]
    pub fn with_proficiency_levels(mut self, levels: impl IntoIterator<Item = f64>) -> Self {
        self.proficiency_levels = levels.into_iter().collect();
        self
    }

    /// Set the missing-owner policy.
    #[must_use]
    pub fn with_missing_owner_policy(mut self, policy: MissingOwnerPolicy) -> Self {
        self.missing_owner_policy = policy;
        self
    }

    /// Set the accepted level bounds for level requirements.
    #[must_use]
    pub fn with_level_bounds(mut self, min: u8, max: u8) -> Self {
        self.min_level = min;
        self.max_level = max;
        self
    }

    /// Enable or disable zero-base gating.
    #[must_use]
    pub fn with_zero_base_gating(mut self, enabled: bool) -> Self {
        self.zero_base_gating = enabled;
        self
    }

    /// Check whether a level lies within the configured bounds.
    #[must_use]
    pub fn level_in_bounds(&self, level: u8) -> bool {
        (self.min_level..=self.max_level).contains(&level)
    }
}
