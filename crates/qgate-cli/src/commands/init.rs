//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# qgate configuration
#
# Command-line flags override values set here.

[thresholds]
# max_complexity = 10            # cyclomatic complexity: error above this
# warning_complexity = 7         # cyclomatic complexity: warning above this
# max_function_lines = 50
# max_nesting_depth = 4
# max_parameters = 5
# max_cognitive_complexity = 15
# max_file_lines = 300
# max_class_public_methods = 5
# max_interface_methods = 7      # Protocol / ABC classes
# max_isinstance_chain = 2
# max_nested_try = 2

[analyzer]
# Glob patterns to exclude from analysis
exclude = [
    "**/.venv/**",
    "**/venv/**",
    "**/__pycache__/**",
    "**/node_modules/**",
]

# Block on warnings too
strict = false

# Analyze files in parallel
parallel = true

# Skip files classified as shell code (handlers, adapters, cli, ...)
core_only = false

# Rules can be switched off individually

[rules.complexity]
enabled = true

[rules.design-principles]
enabled = true

[rules.purity]
enabled = true

[rules.error-handling]
enabled = true

# Core/shell classification can be replaced per family
# (complexity, design, purity, error-handling).
#
# [classifier.purity]
# shell = ["*/handlers/*", "*/cli/*", "*_adapter.py"]
# core = ["*/domain/*", "*/services/*"]
"#;

const CONFIG_FILE: &str = "qgate.toml";

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new(CONFIG_FILE);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_FILE}");
    println!("\nNext steps:");
    println!("  1. Adjust thresholds and excludes in {CONFIG_FILE}");
    println!("  2. Run: qgate check --all");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qgate_core::{Config, Thresholds};

    #[test]
    fn template_parses_to_defaults() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.thresholds().unwrap(), Thresholds::default());
        assert!(!config.analyzer.strict);
        assert!(!config.analyzer.core_only);
        assert!(config.is_rule_enabled("purity"));
    }
}
