//! Formula evaluation: named references, dice notation and arithmetic.
//!
//! - `DiceExpression`: parse and normalize dice notation
//! - `arith`: pure arithmetic over resolved text
//! - `FormulaRegistry`: named values formulas can reference
//! - `spend_hit_dice`: greedy hit-dice spending
//! - `parse_formula` / `evaluate_dice_formula` / `parse_formula_and_evaluate`
//!
//! Evaluation is pure. A formula that fails degrades to `0` on its own
//! and never affects sibling formulas.

pub mod arith;
mod dice;
mod evaluate;
mod hit_dice;
mod registry;

pub use dice::{DiceExpression, DiceRoll, DiceTerm, MAX_ROLLED_DICE};
pub use evaluate::{
    evaluate_dice_formula, parse_formula, parse_formula_and_evaluate, try_evaluate_dice_formula,
    try_parse_formula, try_parse_formula_and_evaluate, FormulaContext, FormulaInput,
    HitDiceSource,
};
pub use hit_dice::{spend_hit_dice, HitDicePool};
pub use registry::{ability_modifier, Ability, FormulaLookup, FormulaRegistry};
