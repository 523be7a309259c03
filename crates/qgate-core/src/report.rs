//! Remediation advice attached to a run's result.

use crate::classify::ContextTag;
use crate::rule::RuleFamily;
use crate::types::{Violation, ViolationType};
use std::collections::BTreeSet;

/// Closing advice printed with every result.
pub const ARCHITECTURE_HINT: &str = "Consider 'Functional Core, Imperative Shell' pattern: \
     Keep business logic pure, push I/O to edges (handlers, adapters).";

/// Advice for one kind of finding. Design-family types share one line per principle.
#[must_use]
pub fn recommendation(violation_type: ViolationType) -> &'static str {
    match violation_type {
        ViolationType::Complexity => {
            "COMPLEXITY: Extract helper functions, use early returns, \
             simplify conditional logic with guard clauses."
        }
        ViolationType::Length => {
            "LENGTH: Split function into smaller, single-purpose functions. \
             Apply Single Responsibility Principle."
        }
        ViolationType::Parameters => {
            "PARAMETERS: Group related parameters into a dataclass/dict. \
             Consider Builder pattern for complex construction."
        }
        ViolationType::Nesting => {
            "NESTING: Use early returns/guard clauses to reduce nesting. \
             Extract nested blocks into separate functions."
        }
        ViolationType::CognitiveComplexity => {
            "COGNITIVE COMPLEXITY: Flatten deeply nested branches and loops. \
             Name intermediate conditions and extract them into predicates."
        }
        ViolationType::FileLength => {
            "FILE LENGTH: Split the module along its responsibilities. \
             Long files hide unrelated concerns."
        }
        ViolationType::SrpFileLength | ViolationType::SrpClassMethods => {
            "SRP: Extract responsibilities into separate modules/classes. \
             Each class should have one reason to change."
        }
        ViolationType::OcpIsinstanceCascade => {
            "OCP: Use strategy pattern, registry, or polymorphism instead of \
             type-checking cascades. Extend, don't modify."
        }
        ViolationType::LspNotImplemented => {
            "LSP: Subclasses must honor base class contracts. If a method can't \
             be implemented, the inheritance hierarchy is wrong."
        }
        ViolationType::IspFatInterface => {
            "ISP: Split fat interfaces into smaller, focused ones. \
             Clients shouldn't depend on methods they don't use."
        }
        ViolationType::DipDirectInstantiation => {
            "DIP: Inject dependencies instead of instantiating them directly. \
             Business logic should depend on abstractions."
        }
        ViolationType::FileIo => {
            "FILE I/O: Move file operations to adapter layer. \
             Pass data as function arguments instead of reading inside logic."
        }
        ViolationType::Network => {
            "NETWORK: Extract HTTP calls to repository/adapter pattern. \
             Business logic should receive data, not fetch it."
        }
        ViolationType::Database => {
            "DATABASE: Use repository pattern. Business logic receives/returns data, \
             database operations happen in repository layer."
        }
        ViolationType::Subprocess => {
            "SUBPROCESS: Move shell commands to adapter/infrastructure layer. \
             Core logic should work with data, not execute processes."
        }
        ViolationType::GlobalState | ViolationType::NonlocalState => {
            "GLOBAL STATE: Pass state as explicit parameters. \
             Use dependency injection for shared state."
        }
        ViolationType::SideEffects => {
            "SIDE EFFECTS: Return values instead of printing. \
             Let calling code handle output/logging."
        }
        ViolationType::AsyncIo => {
            "ASYNC I/O: Move async functions to shell/adapter layer. \
             Core business logic should be synchronous and pure. \
             Pass data to core functions, await in shell."
        }
        ViolationType::BareExcept => {
            "BARE EXCEPT: Catch specific exceptions. Bare 'except:' catches \
             KeyboardInterrupt and SystemExit, making programs hard to stop."
        }
        ViolationType::ExceptPass => {
            "SILENT FAILURE: Remove 'except: pass' blocks. Either let errors crash \
             (preferred in core logic) or handle them meaningfully with logging."
        }
        ViolationType::ExceptionSwallowed => {
            "SWALLOWED EXCEPTION: In core logic, let exceptions propagate. \
             Handle them at boundaries (API, CLI, adapters) where you can respond appropriately."
        }
        ViolationType::NestedTryExcept => {
            "NESTED TRY/EXCEPT: Flatten error handling. Complex fallback cascades \
             are hard to debug. Fail fast and handle at a single boundary."
        }
    }
}

/// One recommendation per distinct finding kind present, in reporting order.
///
/// Purity findings in Shell files are expected there and get no advice.
#[must_use]
pub fn recommendations(violations: &[Violation]) -> Vec<String> {
    let present: BTreeSet<ViolationType> = violations
        .iter()
        .filter(|v| v.violation_type.family() != RuleFamily::Purity || v.scope == ContextTag::Core)
        .map(|v| v.violation_type)
        .collect();
    let mut out: Vec<String> = Vec::new();
    for violation_type in present {
        let text = recommendation(violation_type);
        if !out.iter().any(|r| r == text) {
            out.push(text.to_string());
        }
    }
    out
}
