//! List rules command implementation.

use qgate_core::ViolationType;
use qgate_rules::all_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<8} {:<20} {:<16} Description", "Code", "Name", "Family");
    println!("{}", "-".repeat(90));

    for rule in all_rules() {
        println!(
            "{:<8} {:<20} {:<16} {}",
            rule.code(),
            rule.name(),
            rule.family(),
            rule.description()
        );
    }

    println!("\nViolation types:");
    for rule in all_rules() {
        let types: Vec<&str> = ViolationType::ALL
            .iter()
            .filter(|t| t.family() == rule.family())
            .map(|t| t.as_str())
            .collect();
        println!("  {:<20} {}", rule.name(), types.join(", "));
    }

    println!("\nUse --rules to run a subset, e.g.:");
    println!("  qgate check --rules purity,error-handling");
    println!("  qgate check --rules QG001,QG002");
}
