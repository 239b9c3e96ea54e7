//! Dice notation parsing and serialization.
//!
//! Supports additive expressions of dice and integer constants like
//! `"2d10+1d8"`, `"d6"`, `"1d4-1"`, `"3"`. Parsing then printing an
//! expression normalizes it: like-sided dice merge, constants are summed
//! and printed last, and an empty result prints as `"0"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{DiceParseError, DiceRng, DiceRollError};

/// Most dice a single roll throws across all its terms.
pub const MAX_ROLLED_DICE: u32 = 1000;

/// One signed term of a dice expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiceTerm {
    /// `count` dice of `sides` faces. A negative count subtracts the roll.
    Dice { count: i64, sides: u32 },
    /// A flat integer.
    Flat(i64),
}

impl DiceTerm {
    /// The sign-aware text of this term without a leading `+`.
    fn body(&self) -> String {
        match self {
            DiceTerm::Dice { count, sides } => format!("{}d{}", count.unsigned_abs(), sides),
            DiceTerm::Flat(value) => value.unsigned_abs().to_string(),
        }
    }

    fn is_negative(&self) -> bool {
        match self {
            DiceTerm::Dice { count, .. } => *count < 0,
            DiceTerm::Flat(value) => *value < 0,
        }
    }
}

/// A parsed additive dice expression.
///
/// ## Example
///
/// ```
/// use sheet_effects::formula::DiceExpression;
///
/// let expr: DiceExpression = "1d8 + 2 + 1d8 - 1".parse().unwrap();
/// assert_eq!(expr.to_string(), "2d8+1");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiceExpression {
    terms: Vec<DiceTerm>,
}

impl DiceExpression {
    /// Create an expression from raw terms, normalized.
    pub fn from_terms(terms: impl IntoIterator<Item = DiceTerm>) -> Self {
        let mut expr = Self {
            terms: terms.into_iter().collect(),
        };
        expr.normalize();
        expr
    }

    /// Parse dice notation.
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let compact: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        if compact.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let mut terms = Vec::new();
        let mut rest = compact.as_str();
        let mut first = true;

        while !rest.is_empty() {
            let (negative, body_start) = match rest.as_bytes()[0] {
                b'+' if !first => (false, 1),
                b'-' => (true, 1),
                _ if first => (false, 0),
                _ => return Err(DiceParseError::InvalidTerm(rest.to_string())),
            };
            let body = &rest[body_start..];
            let end = body.find(&['+', '-'][..]).unwrap_or(body.len());
            let term = parse_term(&body[..end], negative)?;
            terms.push(term);
            rest = &body[end..];
            first = false;
        }

        Ok(Self::from_terms(terms))
    }

    /// The normalized terms.
    #[must_use]
    pub fn terms(&self) -> &[DiceTerm] {
        &self.terms
    }

    /// If the expression holds no dice, its constant value.
    #[must_use]
    pub fn as_constant(&self) -> Option<i64> {
        let mut total = 0i64;
        for term in &self.terms {
            match term {
                DiceTerm::Flat(value) => total = total.saturating_add(*value),
                DiceTerm::Dice { .. } => return None,
            }
        }
        Some(total)
    }

    /// Check whether the expression is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.as_constant() == Some(0)
    }

    /// Total number of dice the expression throws.
    #[must_use]
    pub fn dice_count(&self) -> u64 {
        self.terms
            .iter()
            .map(|term| match term {
                DiceTerm::Dice { count, .. } => count.unsigned_abs(),
                DiceTerm::Flat(_) => 0,
            })
            .fold(0, u64::saturating_add)
    }

    /// Roll the expression.
    ///
    /// Fails without touching `rng` when the expression throws more than
    /// `MAX_ROLLED_DICE` dice.
    pub fn roll(&self, rng: &mut DiceRng) -> Result<DiceRoll, DiceRollError> {
        let count = self.dice_count();
        if count > u64::from(MAX_ROLLED_DICE) {
            return Err(DiceRollError::TooManyDice {
                count,
                max: MAX_ROLLED_DICE,
            });
        }

        let mut rolls = Vec::new();
        let mut total = 0i64;
        for term in &self.terms {
            match *term {
                DiceTerm::Dice { count, sides } => {
                    let dice = u32::try_from(count.unsigned_abs()).map_err(|_| {
                        DiceRollError::TooManyDice {
                            count: count.unsigned_abs(),
                            max: MAX_ROLLED_DICE,
                        }
                    })?;
                    let results = rng.roll_dice(dice, sides);
                    let sum = results.iter().fold(0i64, |a, r| a.saturating_add(*r));
                    total = total.saturating_add(if count < 0 { -sum } else { sum });
                    rolls.push((sides, results));
                }
                DiceTerm::Flat(value) => total = total.saturating_add(value),
            }
        }

        Ok(DiceRoll { total, rolls })
    }

    /// Merge like-sided dice, sum constants, drop empty terms.
    fn normalize(&mut self) {
        let mut merged: Vec<DiceTerm> = Vec::with_capacity(self.terms.len());
        let mut flat = 0i64;

        for term in self.terms.drain(..) {
            match term {
                DiceTerm::Flat(value) => flat = flat.saturating_add(value),
                DiceTerm::Dice { count, sides } => {
                    let existing = merged.iter_mut().find_map(|t| match t {
                        DiceTerm::Dice { count: c, sides: s } if *s == sides => Some(c),
                        _ => None,
                    });
                    match existing {
                        Some(c) => *c = c.saturating_add(count),
                        None => merged.push(DiceTerm::Dice { count, sides }),
                    }
                }
            }
        }

        merged.retain(|t| !matches!(t, DiceTerm::Dice { count: 0, .. }));
        if flat != 0 || merged.is_empty() {
            merged.push(DiceTerm::Flat(flat));
        }
        self.terms = merged;
    }
}

fn parse_term(body: &str, negative: bool) -> Result<DiceTerm, DiceParseError> {
    if body.is_empty() {
        return Err(DiceParseError::InvalidTerm(body.to_string()));
    }
    let sign = if negative { -1 } else { 1 };

    match body.split_once('d') {
        Some((count_str, sides_str)) => {
            let count: i64 = if count_str.is_empty() {
                1
            } else {
                parse_digits(count_str)?
            };
            let sides = parse_digits(sides_str)?;
            if sides == 0 {
                return Err(DiceParseError::InvalidDieSize);
            }
            let sides =
                u32::try_from(sides).map_err(|_| DiceParseError::Overflow(body.to_string()))?;
            Ok(DiceTerm::Dice {
                count: sign * count,
                sides,
            })
        }
        None => Ok(DiceTerm::Flat(sign * parse_digits(body)?)),
    }
}

fn parse_digits(text: &str) -> Result<i64, DiceParseError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DiceParseError::InvalidTerm(text.to_string()));
    }
    text.parse()
        .map_err(|_| DiceParseError::Overflow(text.to_string()))
}

impl FromStr for DiceExpression {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if term.is_negative() {
                f.write_str("-")?;
            } else if i > 0 {
                f.write_str("+")?;
            }
            f.write_str(&term.body())?;
        }
        Ok(())
    }
}

/// Result of rolling a dice expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// Sum of all dice and constants.
    pub total: i64,
    /// Individual results per dice term, as `(sides, results)`.
    pub rolls: Vec<(u32, Vec<i64>)>,
}
