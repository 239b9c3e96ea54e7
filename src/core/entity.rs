//! Identity types for effects and the sub-entities they grant.
//!
//! Identities are unique within their owning collection: an `EffectId`
//! within an `EffectRegistry`, a `GrantedItemId` within one effect's
//! granted list.
//!
//! ## Usage
//!
//! ```
//! use sheet_effects::core::EffectId;
//!
//! let id = EffectId::new(7);
//! assert_eq!(id.raw(), 7);
//! assert_eq!(id.to_string(), "Effect(7)");
//! assert!(EffectId::UNASSIGNED.is_unassigned());
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for an effect within its registry.
///
/// `EffectId(0)` is reserved as "unassigned"; the registry allocates
/// a fresh id when such an effect is added.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u32);

impl EffectId {
    /// Placeholder id for effects not yet added to a registry.
    pub const UNASSIGNED: Self = Self(0);

    /// Create a new effect ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check whether this is the unassigned placeholder.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// Identifier for an action, resource, spell or spell source granted by an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GrantedItemId(pub u32);

impl GrantedItemId {
    /// Placeholder id for items not yet attached to an effect.
    pub const UNASSIGNED: Self = Self(0);

    /// Create a new granted item ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for GrantedItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item({})", self.0)
    }
}
