//! Stored form of effects.
//!
//! Every nested list is flattened into a map keyed by position so a save
//! layer can address entries individually. Loading rebuilds the lists in
//! key order. A missing nested collection loads as empty, an unknown
//! operation code drops only its own modifier, and an unparseable
//! requirement is kept verbatim as `Requirement::Unrecognized`.
//!
//! The stored form encodes with serde to JSON or, via `encode_bincode`,
//! to a compact binary blob.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{attributes, EffectId, PersistError};

use super::effect::{
    Effect, ModifierAmount, ModifierValue, Operation, Picker, PickerOption, SingleModifier,
};
use super::grants::{GrantedAction, GrantedResource, GrantedSpell, GrantedSpellSource, Grants};
use super::registry::EffectRegistry;
use super::requirement::Requirement;

/// All effects of one registry, keyed by effect id.
pub type StoredEffects = BTreeMap<u32, StoredEffect>;

/// Literal modifier value in stored form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StoredValue {
    Number(f64),
    Text(String),
    List(BTreeMap<u32, String>),
}

impl Default for StoredValue {
    fn default() -> Self {
        StoredValue::Number(0.0)
    }
}

/// A single modifier in stored form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredModifier {
    pub keys: Vec<String>,
    /// Full operation code, `-formula` suffix included.
    pub operation: String,
    pub value: StoredValue,
    pub formula: String,
    pub requirements: BTreeMap<u32, String>,
}

/// A picker in stored form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredPicker {
    pub label: String,
    pub options: BTreeMap<u32, PickerOption>,
    pub selected: String,
}

/// An effect in stored form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredEffect {
    pub id: u32,
    pub label: String,
    pub enabled: bool,
    pub toggleable: bool,
    pub removable: bool,
    pub description: String,
    pub requirements: BTreeMap<u32, String>,
    pub modifiers: BTreeMap<u32, StoredModifier>,
    pub actions: BTreeMap<u32, GrantedAction>,
    pub resources: BTreeMap<u32, GrantedResource>,
    pub spells: BTreeMap<u32, GrantedSpell>,
    pub spell_sources: BTreeMap<u32, GrantedSpellSource>,
    pub pickers: BTreeMap<u32, StoredPicker>,
}

impl Default for StoredEffect {
    fn default() -> Self {
        Self {
            id: 0,
            label: String::new(),
            enabled: true,
            toggleable: true,
            removable: true,
            description: String::new(),
            requirements: BTreeMap::new(),
            modifiers: BTreeMap::new(),
            actions: BTreeMap::new(),
            resources: BTreeMap::new(),
            spells: BTreeMap::new(),
            spell_sources: BTreeMap::new(),
            pickers: BTreeMap::new(),
        }
    }
}

fn index_map<T, U>(items: &[T], f: impl Fn(&T) -> U) -> BTreeMap<u32, U> {
    (0u32..).zip(items.iter().map(f)).collect()
}

fn requirements_to_map(requirements: &[Requirement]) -> BTreeMap<u32, String> {
    index_map(requirements, ToString::to_string)
}

fn requirements_from_map(map: BTreeMap<u32, String>) -> Vec<Requirement> {
    map.into_values().map(Requirement::from).collect()
}

fn dehydrate_modifier(modifier: &SingleModifier) -> StoredModifier {
    let (value, formula) = match &modifier.amount {
        ModifierAmount::Formula(formula) => (StoredValue::default(), formula.clone()),
        ModifierAmount::Value(ModifierValue::Number(n)) => (StoredValue::Number(*n), String::new()),
        ModifierAmount::Value(ModifierValue::Text(t)) => {
            (StoredValue::Text(t.clone()), String::new())
        }
        ModifierAmount::Value(ModifierValue::List(items)) => {
            (StoredValue::List(index_map(items, Clone::clone)), String::new())
        }
    };
    StoredModifier {
        keys: modifier.keys.iter().map(|k| k.as_str().to_string()).collect(),
        operation: modifier.operation_code(),
        value,
        formula,
        requirements: requirements_to_map(&modifier.requirements),
    }
}

fn hydrate_modifier(effect: EffectId, stored: StoredModifier) -> Option<SingleModifier> {
    let (operation, is_formula) = match Operation::parse_code(&stored.operation) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(effect = %effect, error = %e, "dropping stored modifier");
            return None;
        }
    };
    let amount = if is_formula {
        ModifierAmount::Formula(stored.formula)
    } else {
        ModifierAmount::Value(match stored.value {
            StoredValue::Number(n) => ModifierValue::Number(n),
            StoredValue::Text(t) => ModifierValue::Text(t),
            StoredValue::List(items) => ModifierValue::List(items.into_values().collect()),
        })
    };
    Some(SingleModifier {
        keys: attributes::keys(stored.keys),
        operation,
        amount,
        requirements: requirements_from_map(stored.requirements),
    })
}

/// Flatten an effect into its stored form.
#[must_use]
pub fn dehydrate(effect: &Effect) -> StoredEffect {
    StoredEffect {
        id: effect.id.raw(),
        label: effect.label.clone(),
        enabled: effect.enabled,
        toggleable: effect.toggleable,
        removable: effect.removable,
        description: effect.description.clone(),
        requirements: requirements_to_map(&effect.requirements),
        modifiers: index_map(&effect.modifiers, dehydrate_modifier),
        actions: index_map(&effect.grants.actions, Clone::clone),
        resources: index_map(&effect.grants.resources, Clone::clone),
        spells: index_map(&effect.grants.spells, Clone::clone),
        spell_sources: index_map(&effect.grants.spell_sources, Clone::clone),
        pickers: index_map(&effect.pickers, |p| StoredPicker {
            label: p.label.clone(),
            options: index_map(&p.options, Clone::clone),
            selected: p.selected.clone(),
        }),
    }
}

/// Rebuild an effect from its stored form.
#[must_use]
pub fn hydrate(stored: StoredEffect) -> Effect {
    let id = EffectId::new(stored.id);
    let modifiers = stored
        .modifiers
        .into_values()
        .filter_map(|m| hydrate_modifier(id, m))
        .collect();
    let pickers = stored
        .pickers
        .into_values()
        .map(|p| Picker {
            label: p.label,
            options: p.options.into_values().collect(),
            selected: p.selected,
        })
        .collect();

    Effect {
        id,
        label: stored.label,
        enabled: stored.enabled,
        toggleable: stored.toggleable,
        removable: stored.removable,
        description: stored.description,
        requirements: requirements_from_map(stored.requirements),
        modifiers,
        grants: Grants {
            actions: stored.actions.into_values().collect(),
            resources: stored.resources.into_values().collect(),
            spells: stored.spells.into_values().collect(),
            spell_sources: stored.spell_sources.into_values().collect(),
        },
        pickers,
    }
}

/// Flatten every effect in a registry.
#[must_use]
pub fn dehydrate_registry(registry: &EffectRegistry) -> StoredEffects {
    registry.iter().map(|e| (e.id.raw(), dehydrate(e))).collect()
}

/// Rebuild a registry. Entries stored with id `0` get fresh ids.
#[must_use]
pub fn hydrate_registry(stored: StoredEffects) -> EffectRegistry {
    EffectRegistry::from_effects(stored.into_values().map(hydrate))
}

/// Encode stored effects with bincode.
pub fn encode_bincode(stored: &StoredEffects) -> Result<Vec<u8>, PersistError> {
    Ok(bincode::serialize(stored)?)
}

/// Decode stored effects written by `encode_bincode`.
pub fn decode_bincode(bytes: &[u8]) -> Result<StoredEffects, PersistError> {
    Ok(bincode::deserialize(bytes)?)
}
