//! Formula text resolution.
//!
//! A formula is text with references substituted before evaluation:
//! - `@{key}`: a named attribute, optionally clamped with `|max:N` / `|min:N`
//! - `@{hit-dice:N}`: spend up to N hit dice, largest first
//! - `$picker:N`: the current selection of picker N on the owning effect
//!
//! Three entry points mirror how modifiers consume formulas:
//! - `parse_formula`: substitution only, text out
//! - `evaluate_dice_formula`: substitution, parenthesis folding, dice normalization
//! - `parse_formula_and_evaluate`: substitution then pure arithmetic
//!
//! All three degrade to `"0"`/`0` on any failure and log the cause.
//! The `try_*` variants expose the typed error instead.

use crate::context::Progression;
use crate::core::FormulaError;
use crate::effects::Picker;

use super::arith::{evaluate, format_number, MAX_DEPTH};
use super::dice::DiceExpression;
use super::hit_dice::{spend_hit_dice, HitDicePool};
use super::registry::FormulaLookup;

const HIT_DICE_PREFIX: &str = "hit-dice:";
const PICKER_PREFIX: &str = "$picker:";

/// Where `@{hit-dice:N}` gets its dice from.
#[derive(Clone, Copy)]
pub enum HitDiceSource<'a> {
    /// No hit dice known; every request is unfundable.
    None,
    /// A fixed set of pools.
    Pools(&'a [HitDicePool]),
    /// The subject's progression, read at evaluation time.
    Progression(&'a dyn Progression),
    /// A subject-specific resolver (companions with their own die size).
    /// Returns `None` when the request cannot be funded.
    Resolver(&'a dyn Fn(u32) -> Option<String>),
}

impl std::fmt::Debug for HitDiceSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HitDiceSource::None => f.write_str("None"),
            HitDiceSource::Pools(pools) => f.debug_tuple("Pools").field(pools).finish(),
            HitDiceSource::Progression(_) => f.write_str("Progression(..)"),
            HitDiceSource::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Everything a formula may reference.
///
/// Lookup order for `@{key}`: per-call `variables` first, then the
/// subject's `progression` for level and proficiency keys, then the
/// global `formulas` registry.
#[derive(Clone, Copy)]
pub struct FormulaContext<'a> {
    /// Global named-formula registry.
    pub formulas: &'a dyn FormulaLookup,
    /// Per-call variables for a non-default subject.
    pub variables: Option<&'a dyn FormulaLookup>,
    /// Owner of `level`, `proficiency-bonus` and `<class>-level`.
    pub progression: Option<&'a dyn Progression>,
    /// Source for `@{hit-dice:N}`.
    pub hit_dice: HitDiceSource<'a>,
    /// Pickers of the effect that owns the formula.
    pub pickers: &'a [Picker],
}

impl<'a> FormulaContext<'a> {
    /// Create a context over a registry, with no pickers or hit dice.
    pub fn new(formulas: &'a dyn FormulaLookup) -> Self {
        Self {
            formulas,
            variables: None,
            progression: None,
            hit_dice: HitDiceSource::None,
            pickers: &[],
        }
    }

    /// Add per-call variables that shadow the registry.
    #[must_use]
    pub fn with_variables(mut self, variables: &'a dyn FormulaLookup) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Read level and proficiency keys from a progression.
    #[must_use]
    pub fn with_progression(mut self, progression: &'a dyn Progression) -> Self {
        self.progression = Some(progression);
        self
    }

    /// Set the hit-dice source.
    #[must_use]
    pub fn with_hit_dice(mut self, source: HitDiceSource<'a>) -> Self {
        self.hit_dice = source;
        self
    }

    /// Set the owning effect's pickers.
    #[must_use]
    pub fn with_pickers(mut self, pickers: &'a [Picker]) -> Self {
        self.pickers = pickers;
        self
    }

    fn lookup(&self, key: &str) -> Option<f64> {
        self.variables
            .and_then(|vars| vars.lookup(key))
            .or_else(|| self.progression.and_then(|p| p.formula_value(key)))
            .or_else(|| self.formulas.lookup(key))
    }

    fn hit_dice(&self, count: u32) -> Option<String> {
        match self.hit_dice {
            HitDiceSource::None => None,
            HitDiceSource::Pools(pools) => spend_hit_dice(pools, count).map(|e| e.to_string()),
            HitDiceSource::Progression(progression) => {
                spend_hit_dice(&progression.hit_dice_pools(), count).map(|e| e.to_string())
            }
            HitDiceSource::Resolver(resolve) => resolve(count),
        }
    }
}

impl std::fmt::Debug for FormulaContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormulaContext")
            .field("has_variables", &self.variables.is_some())
            .field("has_progression", &self.progression.is_some())
            .field("hit_dice", &self.hit_dice)
            .field("pickers", &self.pickers.len())
            .finish()
    }
}

/// Either a formula or a number that needs no resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FormulaInput<'a> {
    /// Text to resolve.
    Text(&'a str),
    /// A literal that passes through unchanged.
    Number(f64),
}

impl<'a> From<&'a str> for FormulaInput<'a> {
    fn from(text: &'a str) -> Self {
        FormulaInput::Text(text)
    }
}

impl<'a> From<&'a String> for FormulaInput<'a> {
    fn from(text: &'a String) -> Self {
        FormulaInput::Text(text)
    }
}

impl From<f64> for FormulaInput<'_> {
    fn from(value: f64) -> Self {
        FormulaInput::Number(value)
    }
}

impl From<i32> for FormulaInput<'_> {
    fn from(value: i32) -> Self {
        FormulaInput::Number(f64::from(value))
    }
}

/// Substitute every reference in `text`.
///
/// Returns `"0"` if any reference cannot be resolved.
pub fn parse_formula(text: &str, ctx: &FormulaContext) -> String {
    match try_parse_formula(text, ctx) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(formula = %text, error = %e, "formula reference unresolved");
            "0".to_string()
        }
    }
}

/// Substitute every reference in `text`, reporting the first failure.
pub fn try_parse_formula(text: &str, ctx: &FormulaContext) -> Result<String, FormulaError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        let at = rest.find("@{");
        let picker = rest.find(PICKER_PREFIX);
        let next = match (at, picker) {
            (Some(a), Some(p)) => a.min(p),
            (Some(a), None) => a,
            (None, Some(p)) => p,
            (None, None) => break,
        };

        out.push_str(&rest[..next]);
        rest = &rest[next..];

        if rest.starts_with("@{") {
            let close = rest
                .find('}')
                .ok_or_else(|| FormulaError::MalformedToken(rest.to_string()))?;
            let token = &rest[2..close];
            out.push_str(&resolve_token(token, ctx)?);
            rest = &rest[close + 1..];
        } else {
            let digits_start = PICKER_PREFIX.len();
            let digits_len = rest[digits_start..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            let index_text = &rest[digits_start..digits_start + digits_len];
            let index: usize = index_text
                .parse()
                .map_err(|_| FormulaError::MalformedToken(rest.to_string()))?;
            let picker = ctx
                .pickers
                .get(index)
                .ok_or(FormulaError::UnknownPicker(index))?;
            out.push_str(&picker.selected);
            rest = &rest[digits_start + digits_len..];
        }
    }

    out.push_str(rest);
    Ok(out)
}

fn resolve_token(token: &str, ctx: &FormulaContext) -> Result<String, FormulaError> {
    let token = token.trim();

    if let Some(count) = token.strip_prefix(HIT_DICE_PREFIX) {
        let count: u32 = count
            .trim()
            .parse()
            .map_err(|_| FormulaError::MalformedToken(token.to_string()))?;
        return Ok(ctx.hit_dice(count).unwrap_or_else(|| "0".to_string()));
    }

    let mut parts = token.split('|');
    let key = parts.next().unwrap_or_default().trim();
    let mut value = ctx
        .lookup(key)
        .ok_or_else(|| FormulaError::UnresolvedReference(key.to_string()))?;

    for clamp in parts {
        let (kind, bound) = clamp
            .split_once(':')
            .ok_or_else(|| FormulaError::MalformedToken(token.to_string()))?;
        let bound: f64 = bound
            .trim()
            .parse()
            .map_err(|_| FormulaError::MalformedToken(token.to_string()))?;
        value = match kind.trim() {
            "max" => value.min(bound),
            "min" => value.max(bound),
            _ => return Err(FormulaError::MalformedToken(token.to_string())),
        };
    }

    Ok(format_number(value))
}

/// Resolve `text` into normalized dice notation.
///
/// ```
/// use sheet_effects::formula::{evaluate_dice_formula, FormulaContext, FormulaRegistry};
///
/// let registry = FormulaRegistry::new().with_value("proficiency-bonus", 3.0);
/// let ctx = FormulaContext::new(&registry);
/// assert_eq!(evaluate_dice_formula("(@{proficiency-bonus}+2)d6", &ctx), "5d6");
/// assert_eq!(evaluate_dice_formula("1d6+", &ctx), "0");
/// ```
pub fn evaluate_dice_formula(text: &str, ctx: &FormulaContext) -> String {
    match try_evaluate_dice_formula(text, ctx) {
        Ok(expr) => expr.to_string(),
        Err(e) => {
            tracing::warn!(formula = %text, error = %e, "dice formula failed to evaluate");
            "0".to_string()
        }
    }
}

/// Resolve `text` into a dice expression, reporting the failure.
pub fn try_evaluate_dice_formula(
    text: &str,
    ctx: &FormulaContext,
) -> Result<DiceExpression, FormulaError> {
    let parsed = try_parse_formula(text, ctx)?;
    let folded = fold_parentheses(&parsed);
    Ok(DiceExpression::parse(&collapse_signs(&folded))?)
}

/// Repeatedly evaluate innermost parenthesized arithmetic.
///
/// Stops at the first group that does not evaluate, leaving it as-is,
/// and after `MAX_DEPTH` folds.
fn fold_parentheses(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_DEPTH {
        let Some(close) = current.find(')') else {
            return current;
        };
        let Some(open) = current[..close].rfind('(') else {
            return current;
        };
        match evaluate(&current[open + 1..close]) {
            Ok(value) => {
                current.replace_range(open..=close, &format_number(value));
            }
            Err(_) => return current,
        }
    }
    current
}

/// Merge adjacent signs produced by substitution (`+-2` becomes `-2`).
fn collapse_signs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending: Option<bool> = None;

    for c in text.chars() {
        match c {
            '+' | '-' => {
                let negative = c == '-';
                pending = Some(pending.map_or(negative, |prev| prev != negative));
            }
            c if c.is_whitespace() => {}
            _ => {
                if let Some(negative) = pending.take() {
                    out.push(if negative { '-' } else { '+' });
                }
                out.push(c);
            }
        }
    }
    if let Some(negative) = pending {
        out.push(if negative { '-' } else { '+' });
    }
    out
}

/// Resolve `text` and evaluate it as arithmetic. Numbers pass through.
///
/// ```
/// use sheet_effects::formula::{
///     parse_formula_and_evaluate, Ability, FormulaContext, FormulaRegistry,
/// };
///
/// let registry = FormulaRegistry::new().with_ability(Ability::Strength, 16.0);
/// let ctx = FormulaContext::new(&registry);
/// assert_eq!(parse_formula_and_evaluate("10 + @{strength-mod}", &ctx), 13.0);
/// assert_eq!(parse_formula_and_evaluate(4.5, &ctx), 4.5);
/// assert_eq!(parse_formula_and_evaluate("@{luck} + 1", &ctx), 0.0);
/// ```
pub fn parse_formula_and_evaluate<'t>(
    input: impl Into<FormulaInput<'t>>,
    ctx: &FormulaContext,
) -> f64 {
    let input = input.into();
    match try_parse_formula_and_evaluate(input, ctx) {
        Ok(value) => value,
        Err(e) => {
            if let FormulaInput::Text(text) = input {
                tracing::debug!(formula = %text, error = %e, "formula evaluated to 0");
            }
            0.0
        }
    }
}

/// Resolve and evaluate, reporting the failure.
pub fn try_parse_formula_and_evaluate(
    input: FormulaInput<'_>,
    ctx: &FormulaContext,
) -> Result<f64, FormulaError> {
    match input {
        FormulaInput::Number(value) => Ok(value),
        FormulaInput::Text(text) => evaluate(&try_parse_formula(text, ctx)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Ability, FormulaRegistry};
    use rustc_hash::FxHashMap;

    fn registry() -> FormulaRegistry {
        FormulaRegistry::new()
            .with_ability(Ability::Strength, 14.0)
            .with_ability(Ability::Dexterity, 8.0)
            .with_level(6)
            .with_proficiency_bonus(3.0)
            .with_class_level("fighter", 6)
    }

    #[test]
    fn test_substitution() {
        let reg = registry();
        let ctx = FormulaContext::new(&reg);

        assert_eq!(parse_formula("@{strength-mod}+@{level}", &ctx), "2+6");
        assert_eq!(parse_formula("plain text", &ctx), "plain text");
        assert_eq!(parse_formula("@{fighter-level}", &ctx), "6");
    }

    #[test]
    fn test_clamps() {
        let reg = registry();
        let ctx = FormulaContext::new(&reg);

        assert_eq!(parse_formula("@{level|max:5}", &ctx), "5");
        assert_eq!(parse_formula("@{dexterity-mod|min:0}", &ctx), "0");
        assert_eq!(parse_formula("@{level|min:1|max:4}", &ctx), "4");
        assert_eq!(parse_formula("@{level|cap:5}", &ctx), "0");
    }

    #[test]
    fn test_unresolved_invalidates_whole_parse() {
        let reg = registry();
        let ctx = FormulaContext::new(&reg);

        assert_eq!(parse_formula("@{level} + @{nonsense}", &ctx), "0");
        assert!(matches!(
            try_parse_formula("@{nonsense}", &ctx),
            Err(FormulaError::UnresolvedReference(_))
        ));
        assert_eq!(parse_formula("@{level", &ctx), "0");
    }

    #[test]
    fn test_variables_shadow_registry() {
        let reg = registry();
        let mut vars = FxHashMap::default();
        vars.insert("level".to_string(), 2.0);
        let ctx = FormulaContext::new(&reg).with_variables(&vars);

        assert_eq!(parse_formula("@{level}+@{proficiency-bonus}", &ctx), "2+3");
    }

    #[test]
    fn test_hit_dice_pools() {
        let reg = registry();
        let pools = [HitDicePool::new(10, 2, 0), HitDicePool::new(8, 2, 1)];
        let ctx = FormulaContext::new(&reg).with_hit_dice(HitDiceSource::Pools(&pools));

        assert_eq!(parse_formula("@{hit-dice:3}", &ctx), "2d10+1d8");
        assert_eq!(parse_formula("@{hit-dice:4}", &ctx), "0");
    }

    #[test]
    fn test_hit_dice_resolver() {
        let reg = registry();
        let resolver = |n: u32| (n <= 2).then(|| format!("{n}d6"));
        let ctx = FormulaContext::new(&reg).with_hit_dice(HitDiceSource::Resolver(&resolver));

        assert_eq!(parse_formula("@{hit-dice:2}", &ctx), "2d6");
        assert_eq!(parse_formula("@{hit-dice:3}", &ctx), "0");
    }

    #[test]
    fn test_picker_reference() {
        let reg = registry();
        let pickers = vec![Picker::new("Damage", ["1d6", "3d4"]).with_selected("3d4")];
        let ctx = FormulaContext::new(&reg).with_pickers(&pickers);

        assert_eq!(parse_formula("$picker:0+1", &ctx), "3d4+1");
        assert_eq!(parse_formula("$picker:1", &ctx), "0");
        assert_eq!(parse_formula("$picker:x", &ctx), "0");
    }

    #[test]
    fn test_dice_formula() {
        let reg = registry();
        let ctx = FormulaContext::new(&reg);

        assert_eq!(evaluate_dice_formula("(2+3)d6", &ctx), "5d6");
        assert_eq!(evaluate_dice_formula("((1+1)*2)d8", &ctx), "4d8");
        assert_eq!(evaluate_dice_formula("1d20+@{dexterity-mod}", &ctx), "1d20-1");
        assert_eq!(evaluate_dice_formula("1d6 + 1d6 + @{strength-mod}", &ctx), "2d6+2");
        assert_eq!(evaluate_dice_formula("(1d6)d4", &ctx), "0");
        assert_eq!(evaluate_dice_formula("1d6+@{missing}", &ctx), "0");
        assert_eq!(evaluate_dice_formula("", &ctx), "0");
    }

    #[test]
    fn test_evaluate() {
        let reg = registry();
        let ctx = FormulaContext::new(&reg);

        assert_eq!(parse_formula_and_evaluate("@{level} / 2", &ctx), 3.0);
        assert_eq!(parse_formula_and_evaluate("floor(@{level} / 4)", &ctx), 1.0);
        assert_eq!(parse_formula_and_evaluate("1d6", &ctx), 0.0);
        assert_eq!(parse_formula_and_evaluate(7, &ctx), 7.0);
        assert_eq!(parse_formula_and_evaluate("", &ctx), 0.0);
    }

    #[test]
    fn test_deep_nesting_is_contained() {
        let reg = registry();
        let ctx = FormulaContext::new(&reg);
        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));

        assert_eq!(parse_formula_and_evaluate(deep.as_str(), &ctx), 0.0);
        assert_eq!(evaluate_dice_formula(&format!("{deep}d6"), &ctx), "0");
        assert_eq!(parse_formula_and_evaluate("@{level} + 1", &ctx), 7.0);
    }

    #[test]
    fn test_collapse_signs() {
        assert_eq!(collapse_signs("1d20+-1"), "1d20-1");
        assert_eq!(collapse_signs("3--2"), "3+2");
        assert_eq!(collapse_signs("-1d4"), "-1d4");
    }

    #[test]
    fn test_idempotent() {
        let reg = registry();
        let ctx = FormulaContext::new(&reg);
        let first = evaluate_dice_formula("(@{level}/2)d8", &ctx);
        let second = evaluate_dice_formula("(@{level}/2)d8", &ctx);
        assert_eq!(first, "3d8");
        assert_eq!(first, second);
    }
}
