//! Sub-entities an effect grants while active.
//!
//! Each kind is its own record type rather than a shared property bag:
//! an action is an `Attack`, a `Save` or a `Utility`, and the fields that
//! only make sense for one of those live on that variant.
//!
//! Granted items are owned by their effect. They are collected through
//! the `GrantedKind` trait and never stored independently.

use serde::{Deserialize, Serialize};

use crate::core::GrantedItemId;
use crate::formula::{parse_formula_and_evaluate, Ability, FormulaContext};

/// What a granted action does when used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Attack roll against a target.
    Attack {
        /// To-hit bonus formula.
        to_hit: String,
        /// Damage dice formulas, one per damage part.
        damage: Vec<String>,
        /// Damage type label.
        damage_type: String,
    },
    /// Target makes a saving throw.
    Save {
        /// Ability the target saves with.
        ability: Ability,
        /// Save DC formula.
        dc: String,
        /// Damage dice formula, empty if none.
        damage: String,
        /// Whether a successful save halves the damage.
        half_on_success: bool,
    },
    /// Anything else.
    Utility,
}

/// An action granted by an effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrantedAction {
    pub id: GrantedItemId,
    pub name: String,
    pub description: String,
    pub kind: ActionKind,
}

impl GrantedAction {
    /// Create a utility action.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GrantedItemId::UNASSIGNED,
            name: name.into(),
            description: String::new(),
            kind: ActionKind::Utility,
        }
    }

    /// Set the kind (builder pattern).
    #[must_use]
    pub fn with_kind(mut self, kind: ActionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the description (builder pattern).
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// When a granted resource refills.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recharge {
    ShortRest,
    #[default]
    LongRest,
    Dawn,
    Never,
}

/// A limited-use resource granted by an effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrantedResource {
    pub id: GrantedItemId,
    pub name: String,
    /// Maximum uses, as a formula (`"@{proficiency-bonus}"`, `"3"`).
    pub max: String,
    pub recharge: Recharge,
}

impl GrantedResource {
    /// Create a resource refilling on a long rest.
    pub fn new(name: impl Into<String>, max: impl Into<String>) -> Self {
        Self {
            id: GrantedItemId::UNASSIGNED,
            name: name.into(),
            max: max.into(),
            recharge: Recharge::default(),
        }
    }

    /// Set the recharge (builder pattern).
    #[must_use]
    pub fn with_recharge(mut self, recharge: Recharge) -> Self {
        self.recharge = recharge;
        self
    }

    /// Evaluate the maximum uses. Never negative.
    #[must_use]
    pub fn max_uses(&self, ctx: &FormulaContext) -> u32 {
        let value = parse_formula_and_evaluate(&self.max, ctx).floor();
        if value <= 0.0 {
            0
        } else {
            // Saturating float-to-int cast.
            value as u32
        }
    }
}

/// A spell granted by an effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedSpell {
    pub id: GrantedItemId,
    pub name: String,
    /// Spell level, `0` for cantrips.
    pub level: u8,
    /// Whether it is prepared without counting against the limit.
    pub always_prepared: bool,
}

impl GrantedSpell {
    /// Create an always-prepared spell.
    pub fn new(name: impl Into<String>, level: u8) -> Self {
        Self {
            id: GrantedItemId::UNASSIGNED,
            name: name.into(),
            level,
            always_prepared: true,
        }
    }
}

/// A spellcasting source (class or feature) granted by an effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedSpellSource {
    pub id: GrantedItemId,
    pub name: String,
    /// Spellcasting ability.
    pub ability: Ability,
}

impl GrantedSpellSource {
    pub fn new(name: impl Into<String>, ability: Ability) -> Self {
        Self {
            id: GrantedItemId::UNASSIGNED,
            name: name.into(),
            ability,
        }
    }
}

/// Everything one effect grants.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Grants {
    #[serde(default)]
    pub actions: Vec<GrantedAction>,
    #[serde(default)]
    pub resources: Vec<GrantedResource>,
    #[serde(default)]
    pub spells: Vec<GrantedSpell>,
    #[serde(default)]
    pub spell_sources: Vec<GrantedSpellSource>,
}

impl Grants {
    /// Check if nothing is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
            && self.resources.is_empty()
            && self.spells.is_empty()
            && self.spell_sources.is_empty()
    }

    /// Add an item of any kind, assigning it a fresh id if unassigned.
    pub fn push<T: GrantedKind>(&mut self, mut item: T) -> GrantedItemId {
        if item.id() == GrantedItemId::UNASSIGNED {
            item.set_id(self.next_id::<T>());
        }
        let id = item.id();
        T::list_mut(self).push(item);
        id
    }

    /// Add an item (builder pattern).
    #[must_use]
    pub fn with<T: GrantedKind>(mut self, item: T) -> Self {
        self.push(item);
        self
    }

    /// Next free id within the list for `T`.
    #[must_use]
    pub fn next_id<T: GrantedKind>(&self) -> GrantedItemId {
        let max = T::list(self).iter().map(|i| i.id().raw()).max().unwrap_or(0);
        GrantedItemId::new(max + 1)
    }
}

/// One kind of granted sub-entity.
///
/// Connects a record type to its list on `Grants` so collection and
/// editing can be written once for all kinds.
pub trait GrantedKind: Clone {
    /// Item key naming this kind (`actions`, `resources`, ...).
    const KEY: &'static str;

    /// The list of this kind on a grants bundle.
    fn list(grants: &Grants) -> &[Self];

    /// Mutable access to the list of this kind.
    fn list_mut(grants: &mut Grants) -> &mut Vec<Self>;

    /// Item identity.
    fn id(&self) -> GrantedItemId;

    /// Replace the item identity.
    fn set_id(&mut self, id: GrantedItemId);
}

macro_rules! granted_kind {
    ($ty:ty, $key:literal, $field:ident) => {
        impl GrantedKind for $ty {
            const KEY: &'static str = $key;

            fn list(grants: &Grants) -> &[Self] {
                &grants.$field
            }

            fn list_mut(grants: &mut Grants) -> &mut Vec<Self> {
                &mut grants.$field
            }

            fn id(&self) -> GrantedItemId {
                self.id
            }

            fn set_id(&mut self, id: GrantedItemId) {
                self.id = id;
            }
        }
    };
}

granted_kind!(GrantedAction, "actions", actions);
granted_kind!(GrantedResource, "resources", resources);
granted_kind!(GrantedSpell, "spells", spells);
granted_kind!(GrantedSpellSource, "spell-sources", spell_sources);
