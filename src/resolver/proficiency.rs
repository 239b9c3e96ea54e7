//! Proficiency level resolution.
//!
//! A manually set level is final: effects never change it. Only an
//! automatic level is resolved, starting from `0` and snapped to the
//! configured discrete levels.

use crate::context::ResolutionContext;

use super::modified::{ModifiedProficiency, ProficiencyLevel};
use super::value::{calculate_modified_value, snap_to, ValidModifier};

/// Resolve a proficiency level against the active modifiers.
pub fn resolve_proficiency(
    base: ProficiencyLevel,
    valid: &[ValidModifier],
    ctx: &ResolutionContext,
) -> ModifiedProficiency {
    match base {
        ProficiencyLevel::Fixed(level) => ModifiedProficiency {
            final_level: level,
            modifiers: Vec::new(),
        },
        ProficiencyLevel::Automatic => {
            let resolved = calculate_modified_value(0.0, valid, ctx);
            ModifiedProficiency {
                final_level: snap_to(resolved.final_value, &ctx.config.proficiency_levels),
                modifiers: resolved.modifiers,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProgressionSnapshot;
    use crate::core::{AttributeKey, EngineConfig};
    use crate::effects::{Effect, Operation, SingleModifier};
    use crate::formula::FormulaRegistry;
    use crate::resolver::get_valid_modifiers;

    fn resolve(base: ProficiencyLevel, effects: &[Effect]) -> ModifiedProficiency {
        let config = EngineConfig::default();
        let formulas = FormulaRegistry::new();
        let progression = ProgressionSnapshot::new(1);
        let ctx = ResolutionContext::new(&config, &formulas, &progression);
        let keys = [AttributeKey::from("stealth-proficiency")];
        let valid = get_valid_modifiers(effects, &keys, |e, m| ctx.is_single_modifier_active(e, m));
        resolve_proficiency(base, &valid, &ctx)
    }

    fn expertise() -> Effect {
        Effect::new("Expertise")
            .with_modifier(SingleModifier::value("stealth-proficiency", Operation::Set, 2))
    }

    #[test]
    fn test_automatic_resolves() {
        let result = resolve(ProficiencyLevel::Automatic, &[expertise()]);
        assert_eq!(result.final_level, 2.0);
        assert_eq!(result.modifiers.len(), 1);
    }

    #[test]
    fn test_fixed_is_never_altered() {
        let result = resolve(ProficiencyLevel::Fixed(0.5), &[expertise()]);
        assert_eq!(result.final_level, 0.5);
        assert!(result.modifiers.is_empty());
    }

    #[test]
    fn test_automatic_snaps() {
        let effect = Effect::new("Odd")
            .with_modifier(SingleModifier::value("stealth-proficiency", Operation::Set, 1.4));
        assert_eq!(resolve(ProficiencyLevel::Automatic, &[effect]).final_level, 1.0);
    }

    #[test]
    fn test_automatic_without_effects() {
        assert_eq!(resolve(ProficiencyLevel::Automatic, &[]).final_level, 0.0);
    }
}
