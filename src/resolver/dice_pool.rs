//! Dice pool resolution.
//!
//! Only `push` means anything against a dice pool: each active push
//! evaluates to dice notation or a flat number and is appended. Other
//! operations on a pool key are ignored.

use crate::context::ResolutionContext;
use crate::effects::{ModifierAmount, ModifierValue, Operation};
use crate::formula::{arith::format_number, evaluate_dice_formula, DiceExpression, DiceTerm};

use super::modified::{DicePoolBreakdown, ModifiedDicePool, PoolTerm, RollBonusComponent};
use super::value::ValidModifier;

/// Expressions a push modifier contributes. Zero results are dropped.
fn pushed(v: &ValidModifier, ctx: &ResolutionContext) -> Vec<DiceExpression> {
    if v.modifier.operation != Operation::Push {
        return Vec::new();
    }
    let fctx = ctx.formula_context(&v.effect.pickers);
    let texts: Vec<String> = match &v.modifier.amount {
        ModifierAmount::Formula(text) | ModifierAmount::Value(ModifierValue::Text(text)) => {
            vec![evaluate_dice_formula(text, &fctx)]
        }
        ModifierAmount::Value(ModifierValue::Number(n)) => vec![format_number(n.trunc())],
        ModifierAmount::Value(ModifierValue::List(items)) => items
            .iter()
            .map(|item| evaluate_dice_formula(item, &fctx))
            .collect(),
    };
    texts
        .iter()
        .filter_map(|text| text.parse::<DiceExpression>().ok())
        .filter(|expr| !expr.is_zero())
        .collect()
}

/// Append every active push to `pool`.
///
/// Each push is re-evaluated on every call, so a picker change shows up
/// on the next read.
pub fn calculate_modified_dice_pool(
    pool: &[PoolTerm],
    valid: &[ValidModifier],
    ctx: &ResolutionContext,
) -> ModifiedDicePool {
    let mut result = ModifiedDicePool {
        final_pool: pool.to_vec(),
        modifiers: Vec::new(),
    };

    for v in valid {
        for expr in pushed(v, ctx) {
            let text = expr.to_string();
            result.final_pool.push(match expr.as_constant() {
                Some(constant) => PoolTerm::Number(constant as f64),
                None => PoolTerm::Dice(text.clone()),
            });
            result.modifiers.push(DicePoolBreakdown {
                name: v.effect.label.clone(),
                value: text,
                terms: expr.terms().to_vec(),
            });
        }
    }
    result
}

/// Every active push as separate die groups and flat bonuses.
pub fn roll_bonus_components(
    valid: &[ValidModifier],
    ctx: &ResolutionContext,
) -> Vec<RollBonusComponent> {
    valid
        .iter()
        .flat_map(|v| {
            pushed(v, ctx).into_iter().flat_map(move |expr| {
                expr.terms()
                    .iter()
                    .filter(|term| !matches!(term, DiceTerm::Flat(0)))
                    .map(|term| RollBonusComponent {
                        label: v.effect.label.clone(),
                        effect: v.effect.id,
                        term: *term,
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect()
}
