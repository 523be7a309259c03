//! Core types for gate violations and results.

use crate::classify::ContextTag;
use crate::report;
use crate::rule::RuleFamily;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Severity level for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks only in strict mode.
    Warning,
    /// Always blocks.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// SOLID principle a design violation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Principle {
    /// Single responsibility.
    Srp,
    /// Open/closed.
    Ocp,
    /// Liskov substitution.
    Lsp,
    /// Interface segregation.
    Isp,
    /// Dependency inversion.
    Dip,
}

impl std::fmt::Display for Principle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Srp => "SRP",
            Self::Ocp => "OCP",
            Self::Lsp => "LSP",
            Self::Isp => "ISP",
            Self::Dip => "DIP",
        };
        f.write_str(s)
    }
}

/// Every kind of finding, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ViolationType {
    // complexity / size
    Complexity,
    Length,
    Parameters,
    Nesting,
    CognitiveComplexity,
    FileLength,
    // design principles
    SrpFileLength,
    SrpClassMethods,
    OcpIsinstanceCascade,
    LspNotImplemented,
    IspFatInterface,
    DipDirectInstantiation,
    // purity
    FileIo,
    Network,
    Database,
    Subprocess,
    GlobalState,
    NonlocalState,
    SideEffects,
    AsyncIo,
    // error handling
    BareExcept,
    ExceptPass,
    ExceptionSwallowed,
    NestedTryExcept,
}

impl ViolationType {
    /// All types in reporting order.
    pub const ALL: [Self; 24] = [
        Self::Complexity,
        Self::Length,
        Self::Parameters,
        Self::Nesting,
        Self::CognitiveComplexity,
        Self::FileLength,
        Self::SrpFileLength,
        Self::SrpClassMethods,
        Self::OcpIsinstanceCascade,
        Self::LspNotImplemented,
        Self::IspFatInterface,
        Self::DipDirectInstantiation,
        Self::FileIo,
        Self::Network,
        Self::Database,
        Self::Subprocess,
        Self::GlobalState,
        Self::NonlocalState,
        Self::SideEffects,
        Self::AsyncIo,
        Self::BareExcept,
        Self::ExceptPass,
        Self::ExceptionSwallowed,
        Self::NestedTryExcept,
    ];

    /// Wire name of the type (`cognitive_complexity`, `file_io`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complexity => "complexity",
            Self::Length => "length",
            Self::Parameters => "parameters",
            Self::Nesting => "nesting",
            Self::CognitiveComplexity => "cognitive_complexity",
            Self::FileLength => "file_length",
            Self::SrpFileLength => "srp_file_length",
            Self::SrpClassMethods => "srp_class_methods",
            Self::OcpIsinstanceCascade => "ocp_isinstance_cascade",
            Self::LspNotImplemented => "lsp_not_implemented",
            Self::IspFatInterface => "isp_fat_interface",
            Self::DipDirectInstantiation => "dip_direct_instantiation",
            Self::FileIo => "file_io",
            Self::Network => "network",
            Self::Database => "database",
            Self::Subprocess => "subprocess",
            Self::GlobalState => "global_state",
            Self::NonlocalState => "nonlocal_state",
            Self::SideEffects => "side_effects",
            Self::AsyncIo => "async_io",
            Self::BareExcept => "bare_except",
            Self::ExceptPass => "except_pass",
            Self::ExceptionSwallowed => "exception_swallowed",
            Self::NestedTryExcept => "nested_try_except",
        }
    }

    /// Family that produces this type.
    #[must_use]
    pub fn family(self) -> RuleFamily {
        match self {
            Self::Complexity
            | Self::Length
            | Self::Parameters
            | Self::Nesting
            | Self::CognitiveComplexity
            | Self::FileLength => RuleFamily::Complexity,
            Self::SrpFileLength
            | Self::SrpClassMethods
            | Self::OcpIsinstanceCascade
            | Self::LspNotImplemented
            | Self::IspFatInterface
            | Self::DipDirectInstantiation => RuleFamily::Design,
            Self::FileIo
            | Self::Network
            | Self::Database
            | Self::Subprocess
            | Self::GlobalState
            | Self::NonlocalState
            | Self::SideEffects
            | Self::AsyncIo => RuleFamily::Purity,
            Self::BareExcept
            | Self::ExceptPass
            | Self::ExceptionSwallowed
            | Self::NestedTryExcept => RuleFamily::ErrorHandling,
        }
    }

    /// SOLID principle for design-family types.
    #[must_use]
    pub fn principle(self) -> Option<Principle> {
        match self {
            Self::SrpFileLength | Self::SrpClassMethods => Some(Principle::Srp),
            Self::OcpIsinstanceCascade => Some(Principle::Ocp),
            Self::LspNotImplemented => Some(Principle::Lsp),
            Self::IspFatInterface => Some(Principle::Isp),
            Self::DipDirectInstantiation => Some(Principle::Dip),
            _ => None,
        }
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// File the finding is in.
    pub file: PathBuf,
    /// Enclosing function, if any.
    pub function: Option<String>,
    /// Line number (1-indexed).
    pub line: usize,
    /// Kind of finding.
    pub violation_type: ViolationType,
    /// Severity of this violation.
    pub severity: Severity,
    /// Measured value for metric findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<usize>,
    /// Limit the value was compared against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<usize>,
    /// Description for non-metric findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Free-form location label (`Class.method`, `<module>`, ...).
    #[serde(default)]
    pub context: String,
    /// Rule name that produced the finding.
    pub rule: String,
    /// Context tag of the file under the producing family's policy.
    pub scope: ContextTag,
}

impl Violation {
    /// Creates a new violation with no payload.
    #[must_use]
    pub fn new(
        rule: impl Into<String>,
        violation_type: ViolationType,
        severity: Severity,
        file: impl Into<PathBuf>,
        line: usize,
    ) -> Self {
        Self {
            file: file.into(),
            function: None,
            line,
            violation_type,
            severity,
            value: None,
            threshold: None,
            message: None,
            context: String::new(),
            rule: rule.into(),
            scope: ContextTag::Core,
        }
    }

    /// Sets the enclosing function.
    #[must_use]
    pub fn in_function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }

    /// Sets the measured value and its limit.
    #[must_use]
    pub fn with_measure(mut self, value: usize, threshold: usize) -> Self {
        self.value = Some(value);
        self.threshold = Some(threshold);
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the context label.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Sets the context tag.
    #[must_use]
    pub fn with_scope(mut self, scope: ContextTag) -> Self {
        self.scope = scope;
        self
    }

    /// Human-readable detail: the message, or `value > threshold`.
    #[must_use]
    pub fn detail(&self) -> String {
        match (&self.message, self.value, self.threshold) {
            (Some(message), _, _) => message.clone(),
            (None, Some(value), Some(threshold)) => format!("{value} > {threshold}"),
            (None, Some(value), None) => value.to_string(),
            _ => String::new(),
        }
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}",
            self.violation_type,
            self.rule,
            self.file.display(),
            self.line,
        );
        if let Some(function) = &self.function {
            let _ = write!(output, " in {function}()");
        }
        output.push('\n');
        let _ = writeln!(output, "  {}: {}", self.severity, self.detail());
        if !self.context.is_empty() {
            let _ = writeln!(output, "  = context: {} ({})", self.context, self.scope);
        }
        output
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file.display(),
            self.line,
            self.severity,
            self.violation_type,
            self.detail()
        )
    }
}

/// Counts and breakdowns for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Files parsed and analyzed.
    pub files_analyzed: usize,
    /// Files skipped because they could not be parsed.
    pub files_skipped: usize,
    /// Error count.
    pub errors: usize,
    /// Warning count.
    pub warnings: usize,
    /// Findings in files tagged Core.
    pub core_violations: usize,
    /// Findings in files tagged Shell.
    pub shell_warnings: usize,
    /// Whether the gate blocks.
    pub blocked: bool,
    /// Count per violation type.
    pub by_type: BTreeMap<ViolationType, usize>,
    /// Count per rule family.
    pub by_family: BTreeMap<RuleFamily, usize>,
    /// Count per SOLID principle.
    pub by_principle: BTreeMap<Principle, usize>,
}

/// Blocking decision: any error, or any warning in strict mode.
#[must_use]
pub fn is_blocking(errors: usize, warnings: usize, strict: bool) -> bool {
    errors > 0 || (strict && warnings > 0)
}

/// Outcome of a gate run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Inverse of `summary.blocked`.
    pub allowed: bool,
    /// All violations in deterministic order.
    pub violations: Vec<Violation>,
    /// Counts and breakdowns.
    pub summary: Summary,
    /// One line of advice per distinct finding kind.
    pub recommendations: Vec<String>,
    /// Standing advice on the functional core / imperative shell split.
    #[serde(default)]
    pub architecture_hint: String,
}

impl ValidationResult {
    /// Builds the result, summary and recommendations from the collected violations.
    #[must_use]
    pub fn new(
        violations: Vec<Violation>,
        files_analyzed: usize,
        files_skipped: usize,
        strict: bool,
    ) -> Self {
        let mut summary = Summary {
            files_analyzed,
            files_skipped,
            ..Summary::default()
        };
        for v in &violations {
            match v.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
            }
            match v.scope {
                ContextTag::Core => summary.core_violations += 1,
                ContextTag::Shell => summary.shell_warnings += 1,
            }
            *summary.by_type.entry(v.violation_type).or_default() += 1;
            *summary
                .by_family
                .entry(v.violation_type.family())
                .or_default() += 1;
            if let Some(principle) = v.violation_type.principle() {
                *summary.by_principle.entry(principle).or_default() += 1;
            }
        }
        summary.blocked = is_blocking(summary.errors, summary.warnings, strict);
        let recommendations = report::recommendations(&violations);

        Self {
            allowed: !summary.blocked,
            violations,
            summary,
            recommendations,
            architecture_hint: report::ARCHITECTURE_HINT.to_string(),
        }
    }

    /// Returns true if the gate blocks.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.summary.blocked
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Returns violations filtered by severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .collect()
    }

    /// Returns violations of one type.
    #[must_use]
    pub fn of_type(&self, violation_type: ViolationType) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.violation_type == violation_type)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(violation_type: ViolationType, severity: Severity) -> Violation {
        Violation::new("test", violation_type, severity, "pkg/mod.py", 42)
    }

    #[test]
    fn blocking_truth_table() {
        assert!(!is_blocking(0, 0, false));
        assert!(!is_blocking(0, 0, true));
        assert!(!is_blocking(0, 3, false));
        assert!(is_blocking(0, 3, true));
        assert!(is_blocking(1, 0, false));
        assert!(is_blocking(1, 0, true));
        assert!(is_blocking(1, 3, false));
    }

    #[test]
    fn summary_counts_breakdowns() {
        let result = ValidationResult::new(
            vec![
                make_violation(ViolationType::SrpFileLength, Severity::Warning),
                make_violation(ViolationType::SrpClassMethods, Severity::Warning),
                make_violation(ViolationType::LspNotImplemented, Severity::Error),
                make_violation(ViolationType::BareExcept, Severity::Error),
            ],
            3,
            1,
            false,
        );

        assert_eq!(result.summary.errors, 2);
        assert_eq!(result.summary.warnings, 2);
        assert_eq!(result.summary.files_analyzed, 3);
        assert_eq!(result.summary.files_skipped, 1);
        assert!(result.is_blocked());
        assert!(!result.allowed);
        assert_eq!(result.summary.by_principle.get(&Principle::Srp), Some(&2));
        assert_eq!(result.summary.by_family.get(&RuleFamily::Design), Some(&3));
        assert_eq!(
            result.summary.by_family.get(&RuleFamily::ErrorHandling),
            Some(&1)
        );
        assert_eq!(result.of_type(ViolationType::BareExcept).len(), 1);
    }

    #[test]
    fn summary_splits_core_and_shell() {
        let result = ValidationResult::new(
            vec![
                make_violation(ViolationType::FileIo, Severity::Error),
                make_violation(ViolationType::FileIo, Severity::Warning).with_scope(ContextTag::Shell),
                make_violation(ViolationType::AsyncIo, Severity::Warning).with_scope(ContextTag::Shell),
            ],
            2,
            0,
            false,
        );
        assert_eq!(result.summary.core_violations, 1);
        assert_eq!(result.summary.shell_warnings, 2);
        assert!(result.architecture_hint.starts_with("Consider 'Functional Core"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["core_violations"], 1);
        assert_eq!(json["summary"]["shell_warnings"], 2);
        assert_eq!(json["architecture_hint"], result.architecture_hint.as_str());
    }

    #[test]
    fn warnings_only_block_in_strict_mode() {
        let warnings = vec![make_violation(ViolationType::Parameters, Severity::Warning)];
        assert!(ValidationResult::new(warnings.clone(), 1, 0, false).allowed);
        assert!(!ValidationResult::new(warnings, 1, 0, true).allowed);
    }

    #[test]
    fn violation_detail_prefers_message() {
        let v = make_violation(ViolationType::Complexity, Severity::Error).with_measure(12, 10);
        assert_eq!(v.detail(), "12 > 10");
        let v = v.with_message("custom");
        assert_eq!(v.detail(), "custom");
    }

    #[test]
    fn violation_format_includes_function_and_context() {
        let v = make_violation(ViolationType::LspNotImplemented, Severity::Error)
            .in_function("area")
            .with_context("Shape.area")
            .with_message("raises NotImplementedError");
        let formatted = v.format();
        assert!(formatted.contains("in area()"));
        assert!(formatted.contains("= context: Shape.area (core)"));
        let display = format!("{v}");
        assert!(display.contains("[lsp_not_implemented]"));
    }

    #[test]
    fn json_wire_format() {
        let v = make_violation(ViolationType::CognitiveComplexity, Severity::Error)
            .in_function("run")
            .with_measure(20, 15)
            .with_scope(ContextTag::Shell);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["violation_type"], "cognitive_complexity");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["scope"], "shell");
        assert_eq!(json["function"], "run");
        assert!(json.get("message").is_none());

        let result = ValidationResult::new(vec![v], 1, 0, false);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["by_type"]["cognitive_complexity"], 1);
        assert_eq!(json["summary"]["by_family"]["complexity"], 1);
        assert_eq!(json["allowed"], false);
    }

    #[test]
    fn every_type_string_matches_serde() {
        for t in ViolationType::ALL {
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, t.as_str());
        }
    }

    #[test]
    fn all_is_sorted_and_complete() {
        let mut sorted = ViolationType::ALL;
        sorted.sort();
        assert_eq!(sorted, ViolationType::ALL);
        let mut names: Vec<&str> = ViolationType::ALL.iter().map(|t| t.as_str()).collect();
        names.dedup();
        assert_eq!(names.len(), 24);
    }
}
