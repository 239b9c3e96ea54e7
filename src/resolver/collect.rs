//! Collection of granted sub-entities from active effects.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::core::EffectId;
use crate::effects::{Effect, GrantedKind};

/// A granted item stamped with the effect it came from.
///
/// Edits and removals of a collected item go through
/// `EffectRegistry::update_granted`/`remove_granted` on `effect`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FromEffect<T> {
    pub item: T,
    pub effect: EffectId,
    pub effect_label: String,
}

impl<T> FromEffect<T> {
    /// Always `true`: the item exists only through its effect.
    #[must_use]
    pub const fn is_from_effect(&self) -> bool {
        true
    }
}

impl<T> Deref for FromEffect<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

/// Gather items of kind `T` from every effect `is_active` accepts.
pub fn collect_from_effects<'e, T, I, F>(effects: I, is_active: F) -> Vec<FromEffect<T>>
where
    T: GrantedKind,
    I: IntoIterator<Item = &'e Effect>,
    F: Fn(&Effect) -> bool,
{
    effects
        .into_iter()
        .filter(|effect| is_active(effect))
        .flat_map(|effect| {
            T::list(&effect.grants).iter().map(move |item| FromEffect {
                item: item.clone(),
                effect: effect.id,
                effect_label: effect.label.clone(),
            })
        })
        .collect()
}
