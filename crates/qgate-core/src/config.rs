//! Configuration types for qgate.

use crate::classify::ClassifierSet;
use crate::rule::RuleFamily;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Run-wide numeric limits. Immutable once a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Cyclomatic complexity above this is an error.
    pub max_complexity: usize,
    /// Cyclomatic complexity above this is at least a warning.
    pub warning_complexity: usize,
    /// Maximum function length in lines.
    pub max_function_lines: usize,
    /// Maximum nesting depth of control structures.
    pub max_nesting_depth: usize,
    /// Maximum parameter count.
    pub max_parameters: usize,
    /// Maximum cognitive complexity.
    pub max_cognitive_complexity: usize,
    /// Maximum file length in lines.
    pub max_file_lines: usize,
    /// Maximum public methods per class.
    pub max_class_public_methods: usize,
    /// Maximum public methods on a `Protocol`/`ABC`.
    pub max_interface_methods: usize,
    /// Maximum `isinstance` branches per function.
    pub max_isinstance_chain: usize,
    /// Maximum depth of nested `try` blocks.
    pub max_nested_try: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_complexity: 10,
            warning_complexity: 7,
            max_function_lines: 50,
            max_nesting_depth: 4,
            max_parameters: 5,
            max_cognitive_complexity: 15,
            max_file_lines: 300,
            max_class_public_methods: 5,
            max_interface_methods: 7,
            max_isinstance_chain: 2,
            max_nested_try: 2,
        }
    }
}

/// Threshold values as written by the user, before validation.
///
/// Values are signed so that a negative number reaches validation and is
/// reported instead of failing deserialization with an opaque message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ThresholdOverrides {
    pub max_complexity: Option<i64>,
    pub warning_complexity: Option<i64>,
    pub max_function_lines: Option<i64>,
    pub max_nesting_depth: Option<i64>,
    pub max_parameters: Option<i64>,
    pub max_cognitive_complexity: Option<i64>,
    pub max_file_lines: Option<i64>,
    pub max_class_public_methods: Option<i64>,
    pub max_interface_methods: Option<i64>,
    pub max_isinstance_chain: Option<i64>,
    pub max_nested_try: Option<i64>,
}

impl ThresholdOverrides {
    /// Layers `other` on top of `self`; values present in `other` win.
    #[must_use]
    pub fn merged_with(self, other: Self) -> Self {
        Self {
            max_complexity: other.max_complexity.or(self.max_complexity),
            warning_complexity: other.warning_complexity.or(self.warning_complexity),
            max_function_lines: other.max_function_lines.or(self.max_function_lines),
            max_nesting_depth: other.max_nesting_depth.or(self.max_nesting_depth),
            max_parameters: other.max_parameters.or(self.max_parameters),
            max_cognitive_complexity: other
                .max_cognitive_complexity
                .or(self.max_cognitive_complexity),
            max_file_lines: other.max_file_lines.or(self.max_file_lines),
            max_class_public_methods: other
                .max_class_public_methods
                .or(self.max_class_public_methods),
            max_interface_methods: other.max_interface_methods.or(self.max_interface_methods),
            max_isinstance_chain: other.max_isinstance_chain.or(self.max_isinstance_chain),
            max_nested_try: other.max_nested_try.or(self.max_nested_try),
        }
    }

    /// Applies the overrides to `base`, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreshold`] for the first negative value.
    pub fn apply(&self, base: Thresholds) -> Result<Thresholds, ConfigError> {
        Ok(Thresholds {
            max_complexity: pick("max_complexity", self.max_complexity, base.max_complexity)?,
            warning_complexity: pick(
                "warning_complexity",
                self.warning_complexity,
                base.warning_complexity,
            )?,
            max_function_lines: pick(
                "max_function_lines",
                self.max_function_lines,
                base.max_function_lines,
            )?,
            max_nesting_depth: pick(
                "max_nesting_depth",
                self.max_nesting_depth,
                base.max_nesting_depth,
            )?,
            max_parameters: pick("max_parameters", self.max_parameters, base.max_parameters)?,
            max_cognitive_complexity: pick(
                "max_cognitive_complexity",
                self.max_cognitive_complexity,
                base.max_cognitive_complexity,
            )?,
            max_file_lines: pick("max_file_lines", self.max_file_lines, base.max_file_lines)?,
            max_class_public_methods: pick(
                "max_class_public_methods",
                self.max_class_public_methods,
                base.max_class_public_methods,
            )?,
            max_interface_methods: pick(
                "max_interface_methods",
                self.max_interface_methods,
                base.max_interface_methods,
            )?,
            max_isinstance_chain: pick(
                "max_isinstance_chain",
                self.max_isinstance_chain,
                base.max_isinstance_chain,
            )?,
            max_nested_try: pick("max_nested_try", self.max_nested_try, base.max_nested_try)?,
        })
    }
}

fn pick(name: &'static str, value: Option<i64>, default: usize) -> Result<usize, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => usize::try_from(v).map_err(|_| ConfigError::InvalidThreshold { name, value: v }),
    }
}

/// Top-level configuration for qgate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Threshold overrides.
    #[serde(default)]
    pub thresholds: ThresholdOverrides,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Per-rule configurations, keyed by rule name.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,

    /// Per-family classifier tables, keyed by family name.
    #[serde(default)]
    pub classifier: BTreeMap<String, ClassifierConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a rule is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        self.rules
            .get(rule_name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Resolves the final thresholds: defaults overlaid with this file's values.
    ///
    /// # Errors
    ///
    /// Returns an error if any threshold is negative.
    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        self.thresholds.apply(Thresholds::default())
    }

    /// Builds the classifier tables, applying `[classifier.<family>]` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown family name or an invalid glob.
    pub fn classifiers(&self) -> Result<ClassifierSet, ConfigError> {
        let mut set = ClassifierSet::builtin().map_err(ConfigError::from)?;
        for (name, table) in &self.classifier {
            let family = RuleFamily::from_name(name)
                .ok_or_else(|| ConfigError::UnknownFamily { name: name.clone() })?;
            set = set.with_override(family, table.shell.as_deref(), table.core.as_deref())?;
        }
        Ok(set)
    }

    /// Validates every section without running anything.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds()?;
        self.classifiers()?;
        for pattern in &self.analyzer.exclude {
            glob::Pattern::new(pattern)?;
        }
        Ok(())
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Glob patterns to exclude from analysis.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Treat warnings as blocking.
    #[serde(default)]
    pub strict: bool,

    /// Analyze files on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Skip files a rule family tags as Shell.
    #[serde(default)]
    pub core_only: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                "**/.venv/**".to_string(),
                "**/venv/**".to_string(),
                "**/__pycache__/**".to_string(),
                "**/node_modules/**".to_string(),
            ],
            strict: false,
            parallel: true,
            core_only: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Replacement pattern lists for one family's classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Shell patterns, checked first.
    #[serde(default)]
    pub shell: Option<Vec<String>>,
    /// Core patterns.
    #[serde(default)]
    pub core: Option<Vec<String>>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(qgate::config::io))]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    #[diagnostic(code(qgate::config::parse))]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A threshold that is not a non-negative integer.
    #[error("Invalid threshold {name} = {value}")]
    #[diagnostic(
        code(qgate::config::invalid_threshold),
        help("thresholds must be non-negative integers")
    )]
    InvalidThreshold {
        /// Threshold name.
        name: &'static str,
        /// Rejected value.
        value: i64,
    },

    /// A `[classifier.<family>]` section naming no known family.
    #[error("Unknown rule family in [classifier.{name}]")]
    #[diagnostic(
        code(qgate::config::unknown_family),
        help("expected one of: complexity, design, purity, error-handling")
    )]
    UnknownFamily {
        /// Section name.
        name: String,
    },

    /// An invalid glob in exclude or classifier patterns.
    #[error("Invalid pattern: {0}")]
    #[diagnostic(code(qgate::config::pattern))]
    Pattern(#[from] glob::PatternError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ContextTag;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.analyzer.parallel);
        assert!(!config.analyzer.strict);
        assert!(config.rules.is_empty());
        assert_eq!(config.thresholds().unwrap(), Thresholds::default());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[thresholds]
max_complexity = 12
max_nested_try = 0

[analyzer]
exclude = ["**/migrations/**"]
strict = true

[rules.purity]
enabled = false

[classifier.purity]
shell = ["*/jobs/*"]
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        let thresholds = config.thresholds().unwrap();
        assert_eq!(thresholds.max_complexity, 12);
        assert_eq!(thresholds.max_nested_try, 0);
        assert_eq!(thresholds.warning_complexity, 7);
        assert!(config.analyzer.strict);
        assert!(config.analyzer.parallel);
        assert!(!config.is_rule_enabled("purity"));
        assert!(config.is_rule_enabled("complexity"));

        let classifiers = config.classifiers().unwrap();
        assert_eq!(
            classifiers
                .get(RuleFamily::Purity)
                .classify(Path::new("app/jobs/sync.py")),
            ContextTag::Shell
        );
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let config = Config::parse("[thresholds]\nmax_parameters = -1\n").unwrap();
        let err = config.thresholds().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidThreshold {
                name: "max_parameters",
                value: -1
            }
        ));
        assert!(config.validate().is_err());
    }

    #[test]
    fn classifier_section_overrides_family_table() {
        let path = Path::new("pkg/jobs/sync.py");
        let builtin = Config::default().classifiers().unwrap();
        assert_eq!(builtin.get(RuleFamily::Purity).classify(path), ContextTag::Core);

        let config = Config::parse("[classifier.purity]\nshell = [\"*/jobs/*\"]\n").unwrap();
        let set = config.classifiers().unwrap();
        assert_eq!(set.get(RuleFamily::Purity).classify(path), ContextTag::Shell);
        assert_eq!(set.get(RuleFamily::Design).classify(path), ContextTag::Core);
    }

    #[test]
    fn unknown_family_is_rejected() {
        let config = Config::parse("[classifier.style]\nshell = [\"x\"]\n").unwrap();
        assert!(matches!(
            config.classifiers(),
            Err(ConfigError::UnknownFamily { .. })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Config::parse("[thresholds\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn later_overrides_win() {
        let file = ThresholdOverrides {
            max_complexity: Some(20),
            max_parameters: Some(3),
            ..ThresholdOverrides::default()
        };
        let cli = ThresholdOverrides {
            max_complexity: Some(8),
            ..ThresholdOverrides::default()
        };
        let merged = file.merged_with(cli);
        assert_eq!(merged.max_complexity, Some(8));
        assert_eq!(merged.max_parameters, Some(3));
    }
}
