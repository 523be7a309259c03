//! Check command implementation.

use anyhow::{Context, Result};
use clap::Args;
use qgate_core::{Engine, RuleBox, ThresholdOverrides, Thresholds};
use qgate_python::PythonParser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::scope::{self, Excludes};
use crate::{config_resolver, OutputFormat, EXIT_BLOCKED};

/// Arguments of `qgate check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Scope root to analyze (default: current directory)
    pub path: Option<PathBuf>,

    /// Scope root (same as PATH)
    #[arg(long, conflicts_with = "path")]
    pub scope_root: Option<PathBuf>,

    /// Check every Python file instead of only changed ones
    #[arg(long)]
    pub all: bool,

    /// Block on warnings as well as errors
    #[arg(long)]
    pub strict: bool,

    /// Shorthand for `--format json`
    #[arg(long)]
    pub json: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Only run specific rules (comma-separated names, codes or families)
    #[arg(long)]
    pub rules: Option<String>,

    /// Exclude patterns (can be specified multiple times)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Analyze files one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Skip files a rule family classifies as shell code
    #[arg(long)]
    pub core_only: bool,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

/// One flag per threshold. Values are signed so negatives reach validation.
#[derive(Debug, Default, Args)]
#[allow(clippy::struct_field_names)]
pub struct ThresholdArgs {
    /// Cyclomatic complexity above which a function is an error
    #[arg(long, allow_negative_numbers = true)]
    pub max_complexity: Option<i64>,
    /// Cyclomatic complexity above which a function is a warning
    #[arg(long, allow_negative_numbers = true)]
    pub warning_complexity: Option<i64>,
    /// Maximum lines per function
    #[arg(long, allow_negative_numbers = true)]
    pub max_function_lines: Option<i64>,
    /// Maximum control-structure nesting
    #[arg(long, allow_negative_numbers = true)]
    pub max_nesting_depth: Option<i64>,
    /// Maximum parameters per function
    #[arg(long, allow_negative_numbers = true)]
    pub max_parameters: Option<i64>,
    /// Maximum cognitive complexity per function
    #[arg(long, allow_negative_numbers = true)]
    pub max_cognitive_complexity: Option<i64>,
    /// Maximum lines per file
    #[arg(long, allow_negative_numbers = true)]
    pub max_file_lines: Option<i64>,
    /// Maximum public methods per class
    #[arg(long, allow_negative_numbers = true)]
    pub max_class_public_methods: Option<i64>,
    /// Maximum public methods per Protocol/ABC
    #[arg(long, allow_negative_numbers = true)]
    pub max_interface_methods: Option<i64>,
    /// Maximum `if isinstance(...)` tests per function
    #[arg(long, allow_negative_numbers = true)]
    pub max_isinstance_chain: Option<i64>,
    /// Maximum try/except nesting
    #[arg(long, allow_negative_numbers = true)]
    pub max_nested_try: Option<i64>,
}

impl From<&ThresholdArgs> for ThresholdOverrides {
    fn from(args: &ThresholdArgs) -> Self {
        Self {
            max_complexity: args.max_complexity,
            warning_complexity: args.warning_complexity,
            max_function_lines: args.max_function_lines,
            max_nesting_depth: args.max_nesting_depth,
            max_parameters: args.max_parameters,
            max_cognitive_complexity: args.max_cognitive_complexity,
            max_file_lines: args.max_file_lines,
            max_class_public_methods: args.max_class_public_methods,
            max_interface_methods: args.max_interface_methods,
            max_isinstance_chain: args.max_isinstance_chain,
            max_nested_try: args.max_nested_try,
        }
    }
}

impl CheckArgs {
    fn root(&self) -> &Path {
        self.scope_root
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or(Path::new("."))
    }

    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

/// Runs the check command and returns the process exit code.
///
/// # Errors
///
/// Returns an error for a missing scope root, invalid configuration or
/// thresholds, or when a selected file cannot be read.
pub fn run(args: &CheckArgs, config_path: Option<&Path>) -> Result<ExitCode> {
    let root = args.root();
    if !root.is_dir() {
        anyhow::bail!("Scope root is not a readable directory: {}", root.display());
    }
    let config = config_resolver::resolve(root, config_path).load()?;
    config.validate()?;

    // CLI flags override the file
    let thresholds = config
        .thresholds
        .merged_with(ThresholdOverrides::from(&args.thresholds))
        .apply(Thresholds::default())?;

    let mut exclude = config.analyzer.exclude.clone();
    exclude.extend(args.exclude.iter().cloned());
    let excludes = Excludes::new(&exclude)?;

    let rules = match &args.rules {
        Some(filter) => select_rules(filter),
        None => qgate_rules::all_rules(),
    };

    let strict = args.strict || config.analyzer.strict;
    let parallel = !args.sequential && config.analyzer.parallel;
    let core_only = args.core_only || config.analyzer.core_only;
    let engine = Engine::builder()
        .root(root)
        .parser(PythonParser::new())
        .rules(rules)
        .config(config)
        .thresholds(thresholds)
        .strict(strict)
        .parallel(parallel)
        .core_only(core_only)
        .build()
        .context("Failed to build engine")?;

    let files = scope::collect(root, !args.all, &excludes);
    tracing::info!(
        "Checking {} with {} rule(s)",
        root.display(),
        engine.rule_count()
    );

    let result = engine.run(&files).context("Analysis failed")?;
    super::output::print(&result, args.output_format())?;

    Ok(if result.allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_BLOCKED)
    })
}

fn select_rules(filter: &str) -> Vec<RuleBox> {
    let mut rules: Vec<RuleBox> = Vec::new();
    for key in filter.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        match qgate_rules::find_rule(key) {
            Some(rule) if rules.iter().any(|r| r.name() == rule.name()) => {}
            Some(rule) => rules.push(rule),
            None => tracing::warn!("Unknown rule: {}", key),
        }
    }
    rules
}
