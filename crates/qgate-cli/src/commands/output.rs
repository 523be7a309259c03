//! Shared output formatting for gate results.

use anyhow::Result;
use qgate_core::{RuleFamily, Severity, ValidationResult};

use crate::OutputFormat;

/// Print gate results in the specified format.
pub fn print(result: &ValidationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
    }
    Ok(())
}

fn print_text(result: &ValidationResult) {
    let summary = &result.summary;

    for violation in &result.violations {
        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
        };

        print!("{}", violation.file.display());
        print!(":{}", violation.line);
        if let Some(function) = &violation.function {
            print!(" in {function}()");
        }
        println!(" [{}]", violation.violation_type);
        println!("  {}: {}", severity_indicator, violation.detail());
        if !violation.context.is_empty() {
            println!("  = context: {} ({})", violation.context, violation.scope);
        }
        println!();
    }

    if !summary.by_principle.is_empty() {
        println!("By principle:");
        for (principle, count) in &summary.by_principle {
            println!("  {principle}: {count}");
        }
        println!();
    }

    if !result.recommendations.is_empty() {
        println!("Recommendations:");
        for rec in &result.recommendations {
            println!("  - {rec}");
        }
        println!();
    }

    let (verdict, color) = if summary.blocked {
        ("BLOCKED", "\x1b[31m")
    } else if summary.warnings > 0 {
        ("PASSED", "\x1b[33m")
    } else {
        ("PASSED", "\x1b[32m")
    };

    println!(
        "{color}Quality gate {verdict}: {} error(s), {} warning(s) in {} file(s)\x1b[0m",
        summary.errors, summary.warnings, summary.files_analyzed
    );
    println!(
        "Core findings: {}, Shell findings: {}",
        summary.core_violations, summary.shell_warnings
    );
    if summary.files_skipped > 0 {
        println!("Skipped {} unparsable file(s)", summary.files_skipped);
    }
    if summary.by_family.contains_key(&RuleFamily::Purity) {
        println!("\nHint: {}", result.architecture_hint);
    }
}

fn print_json(result: &ValidationResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &ValidationResult) {
    for violation in &result.violations {
        println!(
            "{}:{}: {} [{}] {}",
            violation.file.display(),
            violation.line,
            violation.severity,
            violation.violation_type,
            violation.detail(),
        );
    }
}
