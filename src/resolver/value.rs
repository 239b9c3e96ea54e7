//! Scalar modifier resolution.
//!
//! Operations apply in a fixed precedence regardless of declaration order:
//!
//! 1. `set-base`, then `set`
//! 2. `add` / `subtract`
//! 3. `set-min`, then `set-max`
//! 4. `set-base-final`, then `set-final`
//!
//! Within one step, modifiers apply in effect order.

use tracing::debug;

use crate::context::ResolutionContext;
use crate::core::AttributeKey;
use crate::effects::{Effect, ModifierAmount, ModifierValue, Operation, SingleModifier};
use crate::formula::parse_formula_and_evaluate;

use super::modified::{Breakdown, ModifiedValue};

const PRECEDENCE: [&[Operation]; 7] = [
    &[Operation::SetBase],
    &[Operation::Set],
    &[Operation::Add, Operation::Subtract],
    &[Operation::SetMin],
    &[Operation::SetMax],
    &[Operation::SetBaseFinal],
    &[Operation::SetFinal],
];

/// Steps skipped on a gated zero base.
const GATED: [Operation; 4] = [
    Operation::Add,
    Operation::Subtract,
    Operation::SetMin,
    Operation::SetMax,
];

/// A modifier that targets the queried keys and is currently active.
#[derive(Clone, Copy, Debug)]
pub struct ValidModifier<'e> {
    pub effect: &'e Effect,
    pub modifier: &'e SingleModifier,
}

impl<'e> ValidModifier<'e> {
    /// Numeric value of this modifier, resolving formulas.
    ///
    /// `None` for values with no numeric reading (lists, non-numeric text).
    pub fn numeric_value(&self, ctx: &ResolutionContext) -> Option<f64> {
        match &self.modifier.amount {
            ModifierAmount::Formula(formula) => Some(parse_formula_and_evaluate(
                formula,
                &ctx.formula_context(&self.effect.pickers),
            )),
            ModifierAmount::Value(ModifierValue::Number(n)) => Some(*n),
            ModifierAmount::Value(ModifierValue::Text(text)) => text.trim().parse().ok(),
            ModifierAmount::Value(ModifierValue::List(_)) => None,
        }
    }
}

/// Every active modifier whose keys intersect `keys`, in effect order.
///
/// `is_active` decides activity so the same resolver serves any subject.
pub fn get_valid_modifiers<'e, I, F>(
    effects: I,
    keys: &[AttributeKey],
    is_active: F,
) -> Vec<ValidModifier<'e>>
where
    I: IntoIterator<Item = &'e Effect>,
    F: Fn(&Effect, &SingleModifier) -> bool,
{
    effects
        .into_iter()
        .flat_map(|effect| {
            effect
                .modifiers
                .iter()
                .map(move |modifier| ValidModifier { effect, modifier })
        })
        .filter(|v| v.modifier.targets_any(keys))
        .filter(|v| is_active(v.effect, v.modifier))
        .collect()
}

/// Fold `valid` onto `base`.
///
/// With zero-base gating on, a zero base with no `set`/`set-base`
/// modifier ignores adds, subtracts and clamps; final overrides still
/// apply.
///
/// ## Example
///
/// ```
/// use sheet_effects::context::{ProgressionSnapshot, ResolutionContext};
/// use sheet_effects::core::{AttributeKey, EngineConfig};
/// use sheet_effects::effects::{Effect, Operation, SingleModifier};
/// use sheet_effects::formula::FormulaRegistry;
/// use sheet_effects::resolver::{calculate_modified_value, get_valid_modifiers};
///
/// let config = EngineConfig::default();
/// let formulas = FormulaRegistry::new();
/// let progression = ProgressionSnapshot::new(1);
/// let ctx = ResolutionContext::new(&config, &formulas, &progression);
///
/// let effects = [
///     Effect::new("Cap").with_modifier(SingleModifier::value("ac", Operation::SetMax, 18)),
///     Effect::new("Shield").with_modifier(SingleModifier::value("ac", Operation::Add, 5)),
/// ];
/// let keys = [AttributeKey::from("ac")];
/// let valid = get_valid_modifiers(&effects, &keys, |e, m| ctx.is_single_modifier_active(e, m));
/// let result = calculate_modified_value(15.0, &valid, &ctx);
///
/// assert_eq!(result.final_value, 18.0);
/// assert_eq!(result.modifiers.len(), 2);
/// ```
pub fn calculate_modified_value(
    base: f64,
    valid: &[ValidModifier],
    ctx: &ResolutionContext,
) -> ModifiedValue {
    let gated = ctx.config.zero_base_gating
        && base == 0.0
        && !valid.iter().any(|v| v.modifier.operation.establishes_baseline());
    if gated && !valid.is_empty() {
        debug!(
            modifiers = valid.len(),
            "zero base without baseline, additive modifiers suppressed"
        );
    }

    let mut current = base;
    let mut modifiers = Vec::new();

    for step in PRECEDENCE {
        if gated && step.iter().any(|op| GATED.contains(op)) {
            continue;
        }
        for v in valid.iter().filter(|v| step.contains(&v.modifier.operation)) {
            let Some(value) = v.numeric_value(ctx) else {
                continue;
            };
            let contribution = match v.modifier.operation {
                Operation::SetBase
                | Operation::Set
                | Operation::SetBaseFinal
                | Operation::SetFinal => {
                    current = value;
                    value
                }
                Operation::Add => {
                    current += value;
                    value
                }
                Operation::Subtract => {
                    current -= value;
                    -value
                }
                Operation::SetMin => {
                    current = current.max(value);
                    value
                }
                Operation::SetMax => {
                    current = current.min(value);
                    value
                }
                Operation::Push => continue,
            };
            modifiers.push(Breakdown {
                name: v.effect.label.clone(),
                value: contribution,
            });
        }
    }

    ModifiedValue {
        final_value: current,
        modifiers,
    }
}

/// Snap `value` to the nearest entry of `allowed`. Ties go to the lower entry.
///
/// ```
/// use sheet_effects::resolver::snap_to;
///
/// let levels = [0.0, 0.5, 1.0, 2.0];
/// assert_eq!(snap_to(0.9, &levels), 1.0);
/// assert_eq!(snap_to(1.5, &levels), 1.0);
/// assert_eq!(snap_to(7.0, &levels), 2.0);
/// ```
#[must_use]
pub fn snap_to(value: f64, allowed: &[f64]) -> f64 {
    let mut best: Option<(f64, f64)> = None;
    for &candidate in allowed {
        let distance = (candidate - value).abs();
        best = match best {
            Some((b, d)) if d < distance || (d == distance && b <= candidate) => Some((b, d)),
            _ => Some((candidate, distance)),
        };
    }
    best.map_or(value, |(b, _)| b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProgressionSnapshot;
    use crate::core::EngineConfig;
    use crate::effects::Requirement;
    use crate::formula::{Ability, FormulaRegistry};

    struct Fixture {
        config: EngineConfig,
        formulas: FormulaRegistry,
        progression: ProgressionSnapshot,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: EngineConfig::default(),
                formulas: FormulaRegistry::new()
                    .with_ability(Ability::Dexterity, 16.0)
                    .with_level(5),
                progression: ProgressionSnapshot::new(5),
            }
        }

        fn ctx(&self) -> ResolutionContext<'_> {
            ResolutionContext::new(&self.config, &self.formulas, &self.progression)
        }

        fn resolve(&self, base: f64, key: &str, effects: &[Effect]) -> ModifiedValue {
            let ctx = self.ctx();
            let keys = [AttributeKey::from(key)];
            let valid =
                get_valid_modifiers(effects, &keys, |e, m| ctx.is_single_modifier_active(e, m));
            calculate_modified_value(base, &valid, &ctx)
        }
    }

    fn effect(label: &str, key: &str, op: Operation, value: f64) -> Effect {
        Effect::new(label).with_modifier(SingleModifier::value(key, op, value))
    }

    #[test]
    fn test_precedence_ignores_declaration_order() {
        let f = Fixture::new();
        let effects = [
            effect("Final", "ac", Operation::SetFinal, 21.0),
            effect("Add", "ac", Operation::Add, 2.0),
            effect("Base", "ac", Operation::SetBase, 12.0),
        ];
        let result = f.resolve(10.0, "ac", &effects);

        assert_eq!(result.final_value, 21.0);
        let names: Vec<_> = result.modifiers.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["Base", "Add", "Final"]);
    }

    #[test]
    fn test_subtract_shows_negative_contribution() {
        let f = Fixture::new();
        let effects = [effect("Curse", "speed-walk", Operation::Subtract, 10.0)];
        let result = f.resolve(30.0, "speed-walk", &effects);

        assert_eq!(result.final_value, 20.0);
        assert_eq!(result.modifiers[0].value, -10.0);
    }

    #[test]
    fn test_min_before_max() {
        let f = Fixture::new();
        let effects = [
            effect("Ceiling", "x", Operation::SetMax, 5.0),
            effect("Floor", "x", Operation::SetMin, 8.0),
        ];
        assert_eq!(f.resolve(3.0, "x", &effects).final_value, 5.0);
    }

    #[test]
    fn test_base_final_then_final() {
        let f = Fixture::new();
        let effects = [
            effect("Final", "x", Operation::SetFinal, 4.0),
            effect("Base Final", "x", Operation::SetBaseFinal, 9.0),
        ];
        assert_eq!(f.resolve(1.0, "x", &effects).final_value, 4.0);
    }

    #[test]
    fn test_zero_base_gating() {
        let f = Fixture::new();
        let bonus = effect("Wings", "speed-fly", Operation::Add, 10.0);
        let grant = effect("Fly", "speed-fly", Operation::SetBase, 60.0);

        let alone = f.resolve(0.0, "speed-fly", std::slice::from_ref(&bonus));
        assert_eq!(alone.final_value, 0.0);
        assert!(alone.modifiers.is_empty());

        let both = f.resolve(0.0, "speed-fly", &[bonus, grant]);
        assert_eq!(both.final_value, 70.0);
    }

    #[test]
    fn test_gating_can_be_disabled() {
        let mut f = Fixture::new();
        f.config = f.config.with_zero_base_gating(false);
        let effects = [effect("Bonus", "speed-fly", Operation::Add, 10.0)];
        assert_eq!(f.resolve(0.0, "speed-fly", &effects).final_value, 10.0);
    }

    #[test]
    fn test_formula_amounts() {
        let f = Fixture::new();
        let effects = [Effect::new("Dex")
            .with_modifier(SingleModifier::formula("ac", Operation::Add, "@{dexterity-mod}"))
            .with_modifier(SingleModifier::formula("ac", Operation::Add, "@{unknown}"))];
        let result = f.resolve(10.0, "ac", &effects);

        assert_eq!(result.final_value, 13.0);
        assert_eq!(result.modifiers.len(), 2);
    }

    #[test]
    fn test_inactive_and_untargeted_skipped() {
        let f = Fixture::new();
        let effects = [
            effect("Off", "ac", Operation::Add, 1.0).enabled(false),
            effect("Other", "speed", Operation::Add, 1.0),
            Effect::new("High Level")
                .with_modifier(
                    SingleModifier::value("ac", Operation::Add, 1)
                        .with_requirement("ol>=10".parse().unwrap()),
                ),
            effect("On", "ac", Operation::Add, 1.0).with_requirement(Requirement::Equipped),
        ];
        let result = f.resolve(10.0, "ac", &effects);

        assert_eq!(result.final_value, 11.0);
        assert_eq!(result.modifiers[0].name, "On");
    }

    #[test]
    fn test_list_values_are_not_numeric() {
        let f = Fixture::new();
        let effects = [Effect::new("Langs").with_modifier(SingleModifier::value(
            "x",
            Operation::Add,
            ModifierValue::List(vec!["elvish".into()]),
        ))];
        let result = f.resolve(1.0, "x", &effects);
        assert_eq!(result.final_value, 1.0);
        assert!(result.modifiers.is_empty());
    }

    #[test]
    fn test_snap_ties_go_lower() {
        assert_eq!(snap_to(0.75, &[0.5, 1.0]), 0.5);
        assert_eq!(snap_to(0.25, &[0.0, 0.5, 1.0]), 0.0);
        assert_eq!(snap_to(3.0, &[]), 3.0);
    }
}
