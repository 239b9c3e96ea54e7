//! Effect registry.
//!
//! The registry owns a sheet's effects. Sheets add effects when a feature,
//! item or spell comes into play, toggle them from the UI, and hand the
//! registry to the resolver when a derived stat is read.
//!
//! Effects are kept in a persistent vector so `snapshot` is O(1). Every
//! mutation bumps `revision`, which callers memoizing resolved values can
//! compare instead of tracking individual fields.

use im::Vector;
use tracing::{debug, warn};

use crate::context::TagRelease;
use crate::core::{EffectId, GrantedItemId, RegistryError};

use super::effect::{Effect, EffectPatch};
use super::grants::GrantedKind;

/// Registry for effects.
///
/// Iteration order is insertion order, which is also the order the
/// resolver sees modifiers in.
#[derive(Clone, Debug)]
pub struct EffectRegistry {
    /// All registered effects.
    effects: Vector<Effect>,

    /// Next effect ID to allocate.
    next_id: u32,

    /// Bumped on every mutation.
    revision: u64,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            effects: Vector::new(),
            next_id: 1,
            revision: 0,
        }
    }

    /// Build a registry from effects that already carry ids.
    ///
    /// Order is kept. Explicit ids are reserved before any unassigned
    /// effect is numbered, so a fresh id never collides with a stored one.
    /// A repeated id is renumbered rather than replacing the earlier effect.
    pub fn from_effects(effects: impl IntoIterator<Item = Effect>) -> Self {
        let effects: Vec<Effect> = effects.into_iter().collect();
        let mut registry = Self::new();
        let max_id = effects.iter().map(|e| e.id.raw()).max().unwrap_or(0);
        registry.next_id = max_id.saturating_add(1);

        for mut effect in effects {
            if !effect.id.is_unassigned() && registry.position(effect.id).is_some() {
                warn!(
                    effect = %effect.id,
                    label = %effect.label,
                    "duplicate effect id, renumbering"
                );
                effect.id = EffectId::UNASSIGNED;
            }
            if effect.id.is_unassigned() {
                effect.id = EffectId::new(registry.next_id);
                registry.next_id = registry.next_id.saturating_add(1);
            }
            registry.effects.push_back(effect);
        }
        registry
    }

    fn position(&self, id: EffectId) -> Option<usize> {
        self.effects.iter().position(|e| e.id == id)
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn effect_mut(&mut self, id: EffectId) -> Result<&mut Effect, RegistryError> {
        let index = self.position(id).ok_or(RegistryError::NotFound(id))?;
        self.effects
            .get_mut(index)
            .ok_or(RegistryError::NotFound(id))
    }

    /// Add an effect, returning its ID.
    ///
    /// An unassigned id is allocated; an explicit id replaces any effect
    /// already registered under it.
    pub fn add(&mut self, mut effect: Effect) -> EffectId {
        if effect.id.is_unassigned() {
            effect.id = EffectId::new(self.next_id);
        }
        let id = effect.id;
        if id.raw() >= self.next_id {
            self.next_id = id.raw() + 1;
        }

        match self.position(id) {
            Some(index) => {
                self.effects.set(index, effect);
            }
            None => self.effects.push_back(effect),
        }
        self.touch();
        debug!(effect = %id, "effect added");
        id
    }

    /// Get an effect by ID.
    #[must_use]
    pub fn get(&self, id: EffectId) -> Option<&Effect> {
        self.effects.iter().find(|e| e.id == id)
    }

    /// Mutate an effect in place.
    pub fn update(
        &mut self,
        id: EffectId,
        f: impl FnOnce(&mut Effect),
    ) -> Result<(), RegistryError> {
        let effect = self.effect_mut(id)?;
        f(effect);
        effect.id = id;
        self.touch();
        Ok(())
    }

    /// Apply a patch to an existing effect, or create one from it.
    pub fn patch_or_create(&mut self, id: EffectId, patch: EffectPatch) -> EffectId {
        if let Ok(effect) = self.effect_mut(id) {
            patch.apply(effect);
            self.touch();
            debug!(effect = %id, "effect patched");
            return id;
        }
        self.add(patch.into_effect(id))
    }

    /// Remove an effect, releasing any tags it owns.
    pub fn remove(
        &mut self,
        id: EffectId,
        tags: &mut dyn TagRelease,
    ) -> Result<Effect, RegistryError> {
        let index = self.position(id).ok_or(RegistryError::NotFound(id))?;
        if !self.effects[index].removable {
            return Err(RegistryError::NotRemovable(id));
        }
        let effect = self.effects.remove(index);
        tags.release_tags_owned_by(id);
        self.touch();
        debug!(effect = %id, "effect removed");
        Ok(effect)
    }

    /// Flip `enabled` on a toggleable effect, returning the new state.
    pub fn toggle(&mut self, id: EffectId) -> Result<bool, RegistryError> {
        let effect = self.effect_mut(id)?;
        if !effect.toggleable {
            return Err(RegistryError::NotToggleable(id));
        }
        effect.enabled = !effect.enabled;
        let enabled = effect.enabled;
        self.touch();
        debug!(effect = %id, enabled, "effect toggled");
        Ok(enabled)
    }

    /// Select a picker option. Returns `false` if `value` is not an option.
    pub fn select_picker(
        &mut self,
        id: EffectId,
        index: usize,
        value: &str,
    ) -> Result<bool, RegistryError> {
        let effect = self.effect_mut(id)?;
        let picker = effect
            .pickers
            .get_mut(index)
            .ok_or(RegistryError::NoSuchPicker { effect: id, index })?;
        let selected = picker.select(value);
        if selected {
            self.touch();
        }
        Ok(selected)
    }

    /// Insert or replace a granted item on its owning effect.
    ///
    /// Edits made to a collected item are routed here rather than to any
    /// independent record.
    pub fn update_granted<T: GrantedKind>(
        &mut self,
        id: EffectId,
        item: T,
    ) -> Result<GrantedItemId, RegistryError> {
        let effect = self.effect_mut(id)?;
        let item_id = item.id();
        let existing = if item_id == GrantedItemId::UNASSIGNED {
            None
        } else {
            T::list(&effect.grants).iter().position(|i| i.id() == item_id)
        };
        let item_id = match existing {
            Some(index) => {
                T::list_mut(&mut effect.grants)[index] = item;
                item_id
            }
            None => effect.grants.push(item),
        };
        self.touch();
        Ok(item_id)
    }

    /// Remove a granted item from its owning effect.
    pub fn remove_granted<T: GrantedKind>(
        &mut self,
        id: EffectId,
        item: GrantedItemId,
    ) -> Result<T, RegistryError> {
        let effect = self.effect_mut(id)?;
        let list = T::list_mut(&mut effect.grants);
        let index = list
            .iter()
            .position(|i| i.id() == item)
            .ok_or(RegistryError::NoSuchItem {
                effect: id,
                kind: T::KEY,
                item,
            })?;
        let removed = list.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Get total effect count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterate all effects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    /// Mutation counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Cheap copy of the current effects.
    #[must_use]
    pub fn snapshot(&self) -> Vector<Effect> {
        self.effects.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{GrantedAction, Operation, Picker, SingleModifier};

    #[derive(Default)]
    struct Released(Vec<EffectId>);

    impl TagRelease for Released {
        fn release_tags_owned_by(&mut self, effect: EffectId) {
            self.0.push(effect);
        }
    }

    fn bless() -> Effect {
        Effect::new("Bless").with_modifier(SingleModifier::value("attack", Operation::Add, 2))
    }

    #[test]
    fn test_add_allocates_ids() {
        let mut registry = EffectRegistry::new();
        let a = registry.add(bless());
        let b = registry.add(Effect::new("Haste"));

        assert_eq!(a, EffectId::new(1));
        assert_eq!(b, EffectId::new(2));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(a).map(|e| e.label.as_str()), Some("Bless"));
    }

    #[test]
    fn test_add_with_explicit_id() {
        let mut registry = EffectRegistry::new();
        registry.add(Effect::new("Old").with_id(EffectId::new(5)));
        registry.add(Effect::new("New").with_id(EffectId::new(5)));
        let next = registry.add(Effect::new("Next"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(EffectId::new(5)).map(|e| e.label.as_str()), Some("New"));
        assert_eq!(next, EffectId::new(6));
    }

    #[test]
    fn test_patch_or_create() {
        let mut registry = EffectRegistry::new();
        let id = registry.add(bless());

        let patch = EffectPatch {
            description: Some("+1d4 to attacks".into()),
            ..Default::default()
        };
        assert_eq!(registry.patch_or_create(id, patch), id);
        assert_eq!(registry.get(id).map(|e| e.description.as_str()), Some("+1d4 to attacks"));

        let created = registry.patch_or_create(
            EffectId::new(40),
            EffectPatch {
                label: Some("Rage".into()),
                ..Default::default()
            },
        );
        assert_eq!(created, EffectId::new(40));
        assert!(registry.get(created).is_some_and(|e| e.enabled));
    }

    #[test]
    fn test_remove_releases_tags() {
        let mut registry = EffectRegistry::new();
        let id = registry.add(bless());
        let mut tags = Released::default();

        let removed = registry.remove(id, &mut tags).unwrap();
        assert_eq!(removed.label, "Bless");
        assert_eq!(tags.0, vec![id]);
        assert!(registry.is_empty());
        assert_eq!(registry.remove(id, &mut tags), Err(RegistryError::NotFound(id)));
    }

    #[test]
    fn test_remove_permanent_effect_fails() {
        let mut registry = EffectRegistry::new();
        let id = registry.add(Effect::new("Racial Trait").permanent());
        let mut tags = Released::default();

        assert_eq!(registry.remove(id, &mut tags), Err(RegistryError::NotRemovable(id)));
        assert!(tags.0.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut registry = EffectRegistry::new();
        let id = registry.add(bless());
        let fixed = registry.add(Effect::new("Fixed").always_on());

        assert_eq!(registry.toggle(id), Ok(false));
        assert_eq!(registry.toggle(id), Ok(true));
        assert_eq!(registry.toggle(fixed), Err(RegistryError::NotToggleable(fixed)));
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let mut registry = EffectRegistry::new();
        let start = registry.revision();
        let id = registry.add(bless());
        let after_add = registry.revision();
        registry.toggle(id).unwrap();

        assert!(after_add > start);
        assert!(registry.revision() > after_add);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut registry = EffectRegistry::new();
        let id = registry.add(bless());
        let snapshot = registry.snapshot();
        registry.toggle(id).unwrap();

        assert!(snapshot[0].enabled);
        assert!(!registry.get(id).unwrap().enabled);
    }

    #[test]
    fn test_select_picker() {
        let mut registry = EffectRegistry::new();
        let id = registry.add(bless().with_picker(Picker::new("Die", ["1d4", "1d6"])));

        assert_eq!(registry.select_picker(id, 0, "1d6"), Ok(true));
        assert_eq!(registry.get(id).unwrap().pickers[0].selected, "1d6");
        assert_eq!(registry.select_picker(id, 0, "1d20"), Ok(false));
        assert_eq!(
            registry.select_picker(id, 3, "1d6"),
            Err(RegistryError::NoSuchPicker { effect: id, index: 3 })
        );
    }

    #[test]
    fn test_granted_item_edits_route_to_effect() {
        let mut registry = EffectRegistry::new();
        let id = registry.add(Effect::new("Fighter"));

        let item = registry
            .update_granted(id, GrantedAction::new("Second Wind"))
            .unwrap();
        let mut edited = registry.get(id).unwrap().grants.actions[0].clone();
        edited.description = "Regain 1d10 + level hit points".into();
        assert_eq!(registry.update_granted(id, edited), Ok(item));

        let effect = registry.get(id).unwrap();
        assert_eq!(effect.grants.actions.len(), 1);
        assert!(effect.grants.actions[0].description.starts_with("Regain"));

        let removed: GrantedAction = registry.remove_granted(id, item).unwrap();
        assert_eq!(removed.name, "Second Wind");
        assert!(registry.remove_granted::<GrantedAction>(id, item).is_err());
    }
}
