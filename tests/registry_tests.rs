//! Effect registry and persistence tests.

use sheet_effects::context::{NoTags, TagRelease};
use sheet_effects::core::{EffectId, RegistryError};
use sheet_effects::effects::persist::{
    decode_bincode, dehydrate, dehydrate_registry, encode_bincode, hydrate, hydrate_registry,
    StoredEffect, StoredEffects,
};
use sheet_effects::effects::{
    ActionKind, Effect, EffectPatch, EffectRegistry, GrantedAction, GrantedResource, GrantedSpell,
    GrantedSpellSource, Grants, Operation, Picker, Recharge, Requirement, SingleModifier,
};
use sheet_effects::formula::Ability;

fn flame_blade() -> Effect {
    Effect::new("Flame Blade")
        .with_description("A fiery scimitar")
        .with_requirement(Requirement::Attuned)
        .with_requirement("cl>=3".parse().unwrap())
        .with_picker(Picker::new("Heat", ["3d6", "4d6"]))
        .with_modifier(
            SingleModifier::formula("melee-damage", Operation::Push, "$picker:0")
                .with_requirement(Requirement::picker(0, "4d6")),
        )
        .with_modifier(SingleModifier::formula("light-radius", Operation::SetMin, "10 + @{level}"))
        .with_grants(
            Grants::default()
                .with(GrantedAction::new("Flame Slash").with_kind(ActionKind::Attack {
                    to_hit: "@{spell-attack}".into(),
                    damage: vec!["3d6".into()],
                    damage_type: "fire".into(),
                }))
                .with(GrantedAction::new("Flare").with_kind(ActionKind::Save {
                    ability: Ability::Dexterity,
                    dc: "@{spell-save-dc}".into(),
                    damage: "2d6".into(),
                    half_on_success: true,
                }))
                .with(
                    GrantedResource::new("Rekindle", "@{proficiency-bonus}")
                        .with_recharge(Recharge::ShortRest),
                )
                .with(GrantedSpell::new("Produce Flame", 0))
                .with(GrantedSpellSource::new("Flame Blade", Ability::Wisdom)),
        )
}

#[derive(Default)]
struct TagStore {
    owners: Vec<EffectId>,
}

impl TagRelease for TagStore {
    fn release_tags_owned_by(&mut self, effect: EffectId) {
        self.owners.retain(|owner| *owner != effect);
    }
}

// =============================================================================
// CRUD
// =============================================================================

#[test]
fn test_remove_cascades_to_tags() {
    let mut registry = EffectRegistry::new();
    let a = registry.add(flame_blade());
    let b = registry.add(Effect::new("Bless"));
    let mut tags = TagStore { owners: vec![a, b, a] };

    registry.remove(a, &mut tags).unwrap();
    assert_eq!(tags.owners, vec![b]);
    assert!(registry.get(a).is_none());
}

#[test]
fn test_unknown_ids_error() {
    let mut registry = EffectRegistry::new();
    let missing = EffectId::new(77);
    assert_eq!(registry.toggle(missing), Err(RegistryError::NotFound(missing)));
    assert_eq!(registry.remove(missing, &mut NoTags), Err(RegistryError::NotFound(missing)));
    assert!(registry.update(missing, |e| e.enabled = false).is_err());
}

#[test]
fn test_patch_then_create() {
    let mut registry = EffectRegistry::new();
    let id = registry.add(flame_blade());
    registry.patch_or_create(
        id,
        EffectPatch {
            enabled: Some(false),
            ..Default::default()
        },
    );
    assert!(!registry.get(id).unwrap().enabled);
    assert_eq!(registry.get(id).unwrap().modifiers.len(), 2);
}

#[test]
fn test_update_keeps_id() {
    let mut registry = EffectRegistry::new();
    let id = registry.add(Effect::new("Bless"));
    registry
        .update(id, |e| {
            e.id = EffectId::new(99);
            e.label = "Greater Bless".into();
        })
        .unwrap();
    assert_eq!(registry.get(id).map(|e| e.label.as_str()), Some("Greater Bless"));
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_effect_round_trip() {
    let effect = flame_blade().with_id(EffectId::new(4));
    assert_eq!(hydrate(dehydrate(&effect)), effect);
}

#[test]
fn test_json_round_trip() {
    let effect = flame_blade().with_id(EffectId::new(4));
    let json = serde_json::to_string(&dehydrate(&effect)).unwrap();
    let stored: StoredEffect = serde_json::from_str(&json).unwrap();
    assert_eq!(hydrate(stored), effect);
}

#[test]
fn test_partial_json_loads() {
    let stored: StoredEffect = serde_json::from_str(r#"{"id": 3, "label": "Old Save"}"#).unwrap();
    let effect = hydrate(stored);

    assert_eq!(effect.id, EffectId::new(3));
    assert!(effect.enabled);
    assert!(effect.requirements.is_empty());
    assert!(effect.modifiers.is_empty());
    assert!(effect.grants.is_empty());
}

#[test]
fn test_partial_nested_json_loads() {
    let json = r#"{
        "id": 5,
        "label": "Sparse",
        "modifiers": {"0": {"keys": ["ac"], "operation": "add", "value": {"Number": 1.0}}},
        "pickers": {"0": {"label": "Empty"}}
    }"#;
    let effect = hydrate(serde_json::from_str(json).unwrap());

    assert_eq!(effect.modifiers.len(), 1);
    assert!(effect.modifiers[0].requirements.is_empty());
    assert!(effect.pickers[0].options.is_empty());
}

#[test]
fn test_registry_bincode_round_trip() {
    let mut registry = EffectRegistry::new();
    registry.add(flame_blade());
    let toggled = registry.add(Effect::new("Haste"));
    registry.toggle(toggled).unwrap();

    let bytes = encode_bincode(&dehydrate_registry(&registry)).unwrap();
    let stored: StoredEffects = decode_bincode(&bytes).unwrap();
    let restored = hydrate_registry(stored);

    assert_eq!(restored.len(), registry.len());
    for (a, b) in registry.iter().zip(restored.iter()) {
        assert_eq!(a, b);
    }
    assert!(!restored.get(toggled).unwrap().enabled);
}

#[test]
fn test_hydrated_registry_allocates_after_max_id() {
    let mut registry = EffectRegistry::new();
    registry.add(Effect::new("A").with_id(EffectId::new(10)));
    let mut restored = hydrate_registry(dehydrate_registry(&registry));
    assert_eq!(restored.add(Effect::new("B")), EffectId::new(11));
}

fn stored_effect(id: u32, label: &str) -> StoredEffect {
    StoredEffect {
        id,
        label: label.into(),
        ..Default::default()
    }
}

/// An entry stored without an id is numbered after every stored id, so
/// it cannot displace an effect that already owns the next free id.
#[test]
fn test_unassigned_entry_does_not_replace_stored_id() {
    let mut stored = StoredEffects::new();
    stored.insert(0, stored_effect(0, "Unsaved"));
    stored.insert(1, stored_effect(1, "Saved"));

    let registry = hydrate_registry(stored);

    assert_eq!(registry.len(), 2);
    let labels: Vec<_> = registry.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, ["Unsaved", "Saved"]);
    assert_eq!(registry.get(EffectId::new(1)).unwrap().label, "Saved");
    assert_eq!(registry.get(EffectId::new(2)).unwrap().label, "Unsaved");
}

/// Two entries claiming the same id are both kept; the later one is renumbered.
#[test]
fn test_duplicate_stored_id_is_renumbered() {
    let mut stored = StoredEffects::new();
    stored.insert(0, stored_effect(4, "First"));
    stored.insert(1, stored_effect(4, "Second"));

    let mut registry = hydrate_registry(stored);

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get(EffectId::new(4)).unwrap().label, "First");
    assert_eq!(registry.get(EffectId::new(5)).unwrap().label, "Second");
    assert_eq!(registry.add(Effect::new("Next")), EffectId::new(6));
}
