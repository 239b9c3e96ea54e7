//! Hit-dice spending for `@{hit-dice:N}` tokens.

use serde::{Deserialize, Serialize};

use super::dice::{DiceExpression, DiceTerm};

/// Hit dice of one size, with how many are already spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitDicePool {
    /// Die size (6, 8, 10, 12).
    pub sides: u32,
    /// Dice of this size the character has.
    pub total: u32,
    /// Dice of this size already spent.
    pub used: u32,
}

impl HitDicePool {
    /// Create a pool.
    #[must_use]
    pub const fn new(sides: u32, total: u32, used: u32) -> Self {
        Self { sides, total, used }
    }

    /// Dice still available to spend.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.total.saturating_sub(self.used)
    }
}

/// Spend up to `count` hit dice, largest die size first.
///
/// Returns the additive dice expression for the dice spent, or `None`
/// if the available pools cannot fund the whole request. Spending zero
/// dice yields the constant `0`.
///
/// ```
/// use sheet_effects::formula::{spend_hit_dice, HitDicePool};
///
/// let pools = [HitDicePool::new(8, 3, 0), HitDicePool::new(10, 2, 0)];
/// assert_eq!(spend_hit_dice(&pools, 3).unwrap().to_string(), "2d10+1d8");
/// assert!(spend_hit_dice(&pools, 6).is_none());
/// ```
#[must_use]
pub fn spend_hit_dice(pools: &[HitDicePool], count: u32) -> Option<DiceExpression> {
    let mut by_size: Vec<&HitDicePool> = pools.iter().collect();
    by_size.sort_by(|a, b| b.sides.cmp(&a.sides));

    let mut remaining = count;
    let mut terms = Vec::new();

    for pool in by_size {
        if remaining == 0 {
            break;
        }
        let spend = pool.available().min(remaining);
        if spend > 0 {
            terms.push(DiceTerm::Dice {
                count: i64::from(spend),
                sides: pool.sides,
            });
            remaining -= spend;
        }
    }

    (remaining == 0).then(|| DiceExpression::from_terms(terms))
}
