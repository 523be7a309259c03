//! Rule sets for common selections.

use crate::{ComplexityLimits, DesignPrinciples, ErrorHandling, FunctionalPurity};
use qgate_core::{RuleBox, RuleFamily};

/// Returns all available rules, one per family, in reporting order.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![
        Box::new(ComplexityLimits::new()),
        Box::new(DesignPrinciples::new()),
        Box::new(FunctionalPurity::new()),
        Box::new(ErrorHandling::new()),
    ]
}

/// Returns the rules belonging to any of `families`.
#[must_use]
pub fn rules_for(families: &[RuleFamily]) -> Vec<RuleBox> {
    all_rules()
        .into_iter()
        .filter(|rule| families.contains(&rule.family()))
        .collect()
}

/// Looks up a rule by name (`purity`), code (`QG003`) or family (`design`).
#[must_use]
pub fn find_rule(key: &str) -> Option<RuleBox> {
    all_rules().into_iter().find(|rule| {
        rule.name() == key || rule.code().eq_ignore_ascii_case(key) || rule.family().as_str() == key
    })
}
