//! The explicit dependency bundle passed into every resolution call.

use crate::core::EngineConfig;
use crate::effects::{Effect, Picker, RequirementContext, RequirementEvaluator, SingleModifier};
use crate::formula::{FormulaContext, FormulaLookup, HitDiceSource};

use super::collaborators::{EquipmentState, NoEquipment, Progression};

/// Context for resolving effects against one subject.
///
/// Sheets build one per subject: the player character reads its own
/// equipment and progression, a companion creature supplies its own
/// progression, variables and hit-dice resolver.
///
/// ## Example
///
/// ```
/// use sheet_effects::context::{ProgressionSnapshot, ResolutionContext};
/// use sheet_effects::core::EngineConfig;
/// use sheet_effects::effects::Effect;
/// use sheet_effects::formula::FormulaRegistry;
///
/// let config = EngineConfig::default();
/// let formulas = FormulaRegistry::new().with_level(3);
/// let progression = ProgressionSnapshot::new(3);
/// let ctx = ResolutionContext::new(&config, &formulas, &progression);
///
/// assert!(ctx.is_effect_active(&Effect::new("Bless")));
/// ```
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub config: &'a EngineConfig,
    pub equipment: &'a dyn EquipmentState,
    pub progression: &'a dyn Progression,
    pub formulas: &'a dyn FormulaLookup,
    /// Per-subject variables shadowing `formulas`.
    pub variables: Option<&'a dyn FormulaLookup>,
    /// Replaces progression hit dice for `@{hit-dice:N}`.
    pub hit_dice_resolver: Option<&'a dyn Fn(u32) -> Option<String>>,
}

impl<'a> ResolutionContext<'a> {
    /// Create a context with no equipment.
    pub fn new(
        config: &'a EngineConfig,
        formulas: &'a dyn FormulaLookup,
        progression: &'a dyn Progression,
    ) -> Self {
        Self {
            config,
            equipment: &NoEquipment,
            progression,
            formulas,
            variables: None,
            hit_dice_resolver: None,
        }
    }

    /// Set the equipment collaborator.
    #[must_use]
    pub fn with_equipment(mut self, equipment: &'a dyn EquipmentState) -> Self {
        self.equipment = equipment;
        self
    }

    /// Set per-subject variables.
    #[must_use]
    pub fn with_variables(mut self, variables: &'a dyn FormulaLookup) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Set a subject-specific hit-dice resolver.
    #[must_use]
    pub fn with_hit_dice_resolver(mut self, resolver: &'a dyn Fn(u32) -> Option<String>) -> Self {
        self.hit_dice_resolver = Some(resolver);
        self
    }

    /// Requirement context for one effect, read from current state.
    pub fn requirement_context<'b>(&self, effect: &'b Effect) -> RequirementContext<'b> {
        let mut ctx = RequirementContext::new(self.progression.overall_level())
            .with_pickers(&effect.pickers)
            .with_missing_owner(self.config.missing_owner_policy);
        if let Some(owner) = self.equipment.owner_state(effect.id) {
            ctx = ctx.with_owner(owner);
        }
        if let Some(level) = self.progression.class_level_for_effect(effect.id) {
            ctx = ctx.with_class_level(level);
        }
        ctx
    }

    /// Formula context for a formula owned by an effect with `pickers`.
    pub fn formula_context<'b>(&'b self, pickers: &'b [Picker]) -> FormulaContext<'b> {
        let hit_dice = match self.hit_dice_resolver {
            Some(resolver) => HitDiceSource::Resolver(resolver),
            None => HitDiceSource::Progression(self.progression),
        };
        let mut ctx = FormulaContext::new(self.formulas)
            .with_progression(self.progression)
            .with_hit_dice(hit_dice)
            .with_pickers(pickers);
        if let Some(variables) = self.variables {
            ctx = ctx.with_variables(variables);
        }
        ctx
    }

    /// Whether an effect is active right now.
    pub fn is_effect_active(&self, effect: &Effect) -> bool {
        RequirementEvaluator::is_effect_active(effect, &self.requirement_context(effect))
    }

    /// Whether one modifier of an effect is active right now.
    pub fn is_single_modifier_active(&self, effect: &Effect, modifier: &SingleModifier) -> bool {
        RequirementEvaluator::is_single_modifier_active(
            effect,
            modifier,
            &self.requirement_context(effect),
        )
    }
}

impl std::fmt::Debug for ResolutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("config", self.config)
            .field("overall_level", &self.progression.overall_level())
            .field("has_variables", &self.variables.is_some())
            .field("has_hit_dice_resolver", &self.hit_dice_resolver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProgressionSnapshot;
    use crate::core::{EffectId, MissingOwnerPolicy};
    use crate::effects::{OwnerState, Requirement};
    use crate::formula::{parse_formula, FormulaRegistry, HitDicePool};
    use rustc_hash::FxHashMap;

    #[test]
    fn test_equipment_read_each_time() {
        let config = EngineConfig::default();
        let formulas = FormulaRegistry::new();
        let progression = ProgressionSnapshot::new(5);
        let ring = Effect::new("Ring")
            .with_id(EffectId::new(1))
            .with_requirement(Requirement::Attuned);

        let mut items = FxHashMap::default();
        items.insert(ring.id, OwnerState { equipped: true, attuned: false });
        let ctx = ResolutionContext::new(&config, &formulas, &progression).with_equipment(&items);
        assert!(!ctx.is_effect_active(&ring));

        items.insert(ring.id, OwnerState { equipped: true, attuned: true });
        let ctx = ResolutionContext::new(&config, &formulas, &progression).with_equipment(&items);
        assert!(ctx.is_effect_active(&ring));
    }

    #[test]
    fn test_missing_owner_policy_from_config() {
        let formulas = FormulaRegistry::new();
        let progression = ProgressionSnapshot::new(1);
        let effect = Effect::new("Loose Gem").with_requirement(Requirement::Equipped);

        let open = EngineConfig::default();
        assert!(ResolutionContext::new(&open, &formulas, &progression).is_effect_active(&effect));

        let closed =
            EngineConfig::default().with_missing_owner_policy(MissingOwnerPolicy::Unsatisfied);
        let ctx = ResolutionContext::new(&closed, &formulas, &progression);
        assert!(!ctx.is_effect_active(&effect));
    }

    #[test]
    fn test_class_level_from_progression() {
        let config = EngineConfig::default();
        let formulas = FormulaRegistry::new();
        let id = EffectId::new(2);
        let progression = ProgressionSnapshot::new(10)
            .with_class("fighter", 3)
            .with_effect_class(id, "fighter");
        let extra_attack = Effect::new("Extra Attack")
            .with_id(id)
            .with_requirement("cl>=5".parse().unwrap());

        let ctx = ResolutionContext::new(&config, &formulas, &progression);
        assert!(!ctx.is_effect_active(&extra_attack));
    }

    #[test]
    fn test_formula_levels_follow_progression() {
        let config = EngineConfig::default();
        let formulas = FormulaRegistry::new().with_level(1).with_class_level("rogue", 1);
        let ol6 = Effect::new("Tier Two").with_requirement("ol>=6".parse().unwrap());

        let progression = ProgressionSnapshot::new(6).with_class("Rogue", 4);
        let ctx = ResolutionContext::new(&config, &formulas, &progression);
        let fctx = ctx.formula_context(&[]);
        assert!(ctx.is_effect_active(&ol6));
        assert_eq!(parse_formula("@{level}", &fctx), "6");
        assert_eq!(parse_formula("@{proficiency-bonus}", &fctx), "3");
        assert_eq!(parse_formula("@{rogue-level}", &fctx), "4");

        let progression = ProgressionSnapshot::new(9).with_class("Rogue", 7);
        let ctx = ResolutionContext::new(&config, &formulas, &progression);
        let fctx = ctx.formula_context(&[]);
        assert_eq!(parse_formula("@{level}", &fctx), "9");
        assert_eq!(parse_formula("@{proficiency-bonus}", &fctx), "4");
        assert_eq!(parse_formula("@{rogue-level}", &fctx), "7");
    }

    #[test]
    fn test_variables_shadow_progression() {
        let config = EngineConfig::default();
        let formulas = FormulaRegistry::new();
        let progression = ProgressionSnapshot::new(6);
        let mut beast = FxHashMap::default();
        beast.insert("level".to_string(), 2.0);

        let ctx = ResolutionContext::new(&config, &formulas, &progression).with_variables(&beast);
        let fctx = ctx.formula_context(&[]);
        assert_eq!(parse_formula("@{level}+@{proficiency-bonus}", &fctx), "2+3");
    }

    #[test]
    fn test_hit_dice_source_selection() {
        let config = EngineConfig::default();
        let formulas = FormulaRegistry::new();
        let progression = ProgressionSnapshot::new(4).with_hit_dice(HitDicePool::new(10, 4, 1));

        let ctx = ResolutionContext::new(&config, &formulas, &progression);
        assert_eq!(parse_formula("@{hit-dice:2}", &ctx.formula_context(&[])), "2d10");

        let beast = |count: u32| Some(format!("{count}d8"));
        let ctx = ctx.with_hit_dice_resolver(&beast);
        assert_eq!(parse_formula("@{hit-dice:2}", &ctx.formula_context(&[])), "2d8");
    }
}
