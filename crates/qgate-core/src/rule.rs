//! Rule trait and rule families.

use crate::ast::SourceUnit;
use crate::context::FileContext;
use crate::types::Violation;
use serde::{Deserialize, Serialize};

/// The four rule families. Each family owns a context policy and a block of
/// violation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleFamily {
    /// Complexity and size metrics.
    Complexity,
    /// SOLID design principles.
    Design,
    /// Functional-core purity.
    Purity,
    /// Error-handling anti-patterns.
    ErrorHandling,
}

impl RuleFamily {
    /// All families in reporting order.
    pub const ALL: [Self; 4] = [
        Self::Complexity,
        Self::Design,
        Self::Purity,
        Self::ErrorHandling,
    ];

    /// Kebab-case name used in configuration keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complexity => "complexity",
            Self::Design => "design",
            Self::Purity => "purity",
            Self::ErrorHandling => "error-handling",
        }
    }

    /// Looks up a family by its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl std::fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-file rule operating on the generic syntax tree.
///
/// Rules are stateless between files: everything a check needs arrives in the
/// [`FileContext`] (thresholds, context tags) and the [`SourceUnit`].
///
/// # Example
///
/// ```ignore
/// use qgate_core::{FileContext, Rule, RuleFamily, SourceUnit, Violation};
///
/// pub struct NoGlobals;
///
/// impl Rule for NoGlobals {
///     fn name(&self) -> &'static str { "no-globals" }
///     fn code(&self) -> &'static str { "QG900" }
///     fn family(&self) -> RuleFamily { RuleFamily::Purity }
///
///     fn check(&self, ctx: &FileContext, unit: &SourceUnit) -> Vec<Violation> {
///         Vec::new()
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "complexity").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "QG001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the family whose context policy applies to this rule.
    fn family(&self) -> RuleFamily;

    /// Checks a single file and returns any violations found, in traversal order.
    fn check(&self, ctx: &FileContext, unit: &SourceUnit) -> Vec<Violation>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;
