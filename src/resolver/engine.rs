//! The engine facade domain stores call into.

use crate::context::ResolutionContext;
use crate::core::attributes;
use crate::effects::{Effect, EffectRegistry, GrantedKind, SingleModifier};

use super::collect::{collect_from_effects, FromEffect};
use super::dice_pool::{calculate_modified_dice_pool, roll_bonus_components};
use super::modified::{
    ModifiedDicePool, ModifiedProficiency, ModifiedValue, PoolTerm, ProficiencyLevel,
    RollBonusComponent,
};
use super::proficiency::resolve_proficiency;
use super::value::{calculate_modified_value, get_valid_modifiers, snap_to, ValidModifier};

/// Resolves derived stats for one subject against a registry.
///
/// The engine borrows its inputs and holds no state of its own, so
/// repeated calls with unchanged inputs return identical results and
/// nothing is ever cached across registry mutations.
///
/// ## Example
///
/// ```
/// use sheet_effects::context::{ProgressionSnapshot, ResolutionContext};
/// use sheet_effects::core::EngineConfig;
/// use sheet_effects::effects::{Effect, EffectRegistry, Operation, SingleModifier};
/// use sheet_effects::formula::FormulaRegistry;
/// use sheet_effects::resolver::EffectEngine;
///
/// let mut registry = EffectRegistry::new();
/// let fly = SingleModifier::value("speed-fly", Operation::SetBase, 60);
/// registry.add(Effect::new("Fly").with_modifier(fly));
/// let haste = SingleModifier::value("speed-fly", Operation::Add, 10);
/// registry.add(Effect::new("Haste").with_modifier(haste));
///
/// let config = EngineConfig::default();
/// let formulas = FormulaRegistry::new();
/// let progression = ProgressionSnapshot::new(5);
/// let ctx = ResolutionContext::new(&config, &formulas, &progression);
/// let engine = EffectEngine::new(&registry, ctx);
///
/// assert_eq!(engine.get_modified_value(0.0, &["speed-fly"], None).final_value, 70.0);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct EffectEngine<'a> {
    registry: &'a EffectRegistry,
    ctx: ResolutionContext<'a>,
}

impl<'a> EffectEngine<'a> {
    /// Create an engine over a registry.
    pub fn new(registry: &'a EffectRegistry, ctx: ResolutionContext<'a>) -> Self {
        Self { registry, ctx }
    }

    /// The resolution context in use.
    #[must_use]
    pub fn context(&self) -> &ResolutionContext<'a> {
        &self.ctx
    }

    fn valid_modifiers(&self, keys: &[&str]) -> Vec<ValidModifier<'a>> {
        let keys = attributes::keys(keys.iter().copied());
        let ctx = self.ctx;
        let registry: &'a EffectRegistry = self.registry;
        get_valid_modifiers(registry.iter(), &keys, move |effect, modifier| {
            ctx.is_single_modifier_active(effect, modifier)
        })
    }

    /// Resolve a scalar. With `constrain_to`, the result is snapped to
    /// the nearest allowed value.
    pub fn get_modified_value(
        &self,
        base: f64,
        keys: &[&str],
        constrain_to: Option<&[f64]>,
    ) -> ModifiedValue {
        let mut result = calculate_modified_value(base, &self.valid_modifiers(keys), &self.ctx);
        if let Some(allowed) = constrain_to {
            result.final_value = snap_to(result.final_value, allowed);
        }
        result
    }

    /// Resolve a dice pool.
    pub fn get_modified_dice_pool(&self, pool: &[PoolTerm], keys: &[&str]) -> ModifiedDicePool {
        calculate_modified_dice_pool(pool, &self.valid_modifiers(keys), &self.ctx)
    }

    /// Resolve a proficiency level.
    pub fn get_modified_proficiency(
        &self,
        keys: &[&str],
        base: ProficiencyLevel,
    ) -> ModifiedProficiency {
        resolve_proficiency(base, &self.valid_modifiers(keys), &self.ctx)
    }

    /// Pushed dice and flat bonuses as separate components.
    pub fn get_modified_roll_bonuses(&self, keys: &[&str]) -> Vec<RollBonusComponent> {
        roll_bonus_components(&self.valid_modifiers(keys), &self.ctx)
    }

    /// Whether an effect is active right now.
    pub fn is_effect_active(&self, effect: &Effect) -> bool {
        self.ctx.is_effect_active(effect)
    }

    /// Whether one modifier of an effect is active right now.
    pub fn is_single_modifier_active(&self, effect: &Effect, modifier: &SingleModifier) -> bool {
        self.ctx.is_single_modifier_active(effect, modifier)
    }

    /// Items of kind `T` granted by active effects.
    pub fn collect_from_effects<T: GrantedKind>(&self) -> Vec<FromEffect<T>> {
        let ctx = self.ctx;
        collect_from_effects(self.registry.iter(), move |effect| ctx.is_effect_active(effect))
    }
}
