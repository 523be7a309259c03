//! Gate engine: runs every enabled rule over the selected files.

use crate::ast::SourceUnit;
use crate::classify::{ClassifierSet, ContextTag};
use crate::config::{Config, ConfigError, Thresholds};
use crate::context::FileContext;
use crate::frontend::SourceParser;
use crate::rule::{Rule, RuleBox};
use crate::types::{ValidationResult, Violation};

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// IO error reading a selected file.
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No front end was registered.
    #[error("No source parser configured")]
    MissingParser,
}

/// Builder for configuring an [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    root: Option<PathBuf>,
    rules: Vec<RuleBox>,
    parser: Option<Box<dyn SourceParser>>,
    thresholds: Option<Thresholds>,
    classifiers: Option<ClassifierSet>,
    config: Option<Config>,
    strict: Option<bool>,
    parallel: Option<bool>,
    core_only: Option<bool>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scope root that file paths are classified relative to.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a rule to the engine.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the engine.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several boxed rules.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = RuleBox>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Sets the front end.
    #[must_use]
    pub fn parser<P: SourceParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Sets explicit thresholds; otherwise they come from the configuration.
    #[must_use]
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Sets explicit classifier tables; otherwise they come from the configuration.
    #[must_use]
    pub fn classifiers(mut self, classifiers: ClassifierSet) -> Self {
        self.classifiers = Some(classifiers);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Treat warnings as blocking.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Analyze files on the rayon pool (default: from config, normally on).
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Only analyzes files tagged Core under each rule's family policy.
    #[must_use]
    pub fn core_only(mut self, core_only: bool) -> Self {
        self.core_only = Some(core_only);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if no parser was set or the configuration is invalid.
    pub fn build(self) -> Result<Engine, EngineError> {
        let parser = self.parser.ok_or(EngineError::MissingParser)?;
        let config = self.config.unwrap_or_default();

        let thresholds = match self.thresholds {
            Some(t) => t,
            None => config.thresholds()?,
        };
        let classifiers = match self.classifiers {
            Some(c) => c,
            None => config.classifiers()?,
        };

        let (enabled, disabled): (Vec<RuleBox>, Vec<RuleBox>) = self
            .rules
            .into_iter()
            .partition(|rule| config.is_rule_enabled(rule.name()));
        for rule in &disabled {
            debug!("Skipping disabled rule: {}", rule.name());
        }

        Ok(Engine {
            root: self.root.unwrap_or_else(|| PathBuf::from(".")),
            rules: enabled,
            parser,
            thresholds,
            classifiers,
            strict: self.strict.unwrap_or(config.analyzer.strict),
            parallel: self.parallel.unwrap_or(config.analyzer.parallel),
            core_only: self.core_only.unwrap_or(config.analyzer.core_only),
        })
    }
}

/// The gate engine.
///
/// Use [`Engine::builder()`] to construct an instance. All state is read-only
/// after construction, so one engine can analyze files concurrently.
pub struct Engine {
    root: PathBuf,
    rules: Vec<RuleBox>,
    parser: Box<dyn SourceParser>,
    thresholds: Thresholds,
    classifiers: ClassifierSet,
    strict: bool,
    parallel: bool,
    core_only: bool,
}

enum FileOutcome {
    Analyzed(Vec<Violation>),
    Skipped,
}

impl Engine {
    /// Creates a new builder for configuring an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Returns the scope root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the thresholds in effect.
    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Returns the number of enabled rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the front end.
    #[must_use]
    pub fn parser(&self) -> &dyn SourceParser {
        self.parser.as_ref()
    }

    /// Analyzes the given files and returns the gate result.
    ///
    /// Files the front end cannot parse are skipped. Violations are ordered
    /// by file, then line; findings on the same line keep rule order.
    ///
    /// # Errors
    ///
    /// Returns an error if a selected file cannot be read.
    pub fn run(&self, files: &[PathBuf]) -> Result<ValidationResult, EngineError> {
        info!(
            "Analyzing {} file(s) with {} rule(s)",
            files.len(),
            self.rules.len()
        );

        let outcomes: Vec<Result<FileOutcome, EngineError>> = if self.parallel {
            files.par_iter().map(|f| self.analyze_file(f)).collect()
        } else {
            files.iter().map(|f| self.analyze_file(f)).collect()
        };

        let mut violations = Vec::new();
        let mut analyzed = 0;
        let mut skipped = 0;
        for outcome in outcomes {
            match outcome? {
                FileOutcome::Analyzed(found) => {
                    analyzed += 1;
                    violations.extend(found);
                }
                FileOutcome::Skipped => skipped += 1,
            }
        }

        violations.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));

        let result = ValidationResult::new(violations, analyzed, skipped, self.strict);
        info!(
            "Analysis complete: {} error(s), {} warning(s) in {} file(s), {} skipped",
            result.summary.errors, result.summary.warnings, analyzed, skipped
        );
        Ok(result)
    }

    /// Runs every enabled rule over an already parsed unit.
    #[must_use]
    pub fn analyze_unit(&self, unit: &SourceUnit) -> Vec<Violation> {
        let ctx = FileContext::new(&unit.path, &self.root, &self.thresholds, &self.classifiers);
        let mut violations = Vec::new();
        for rule in &self.rules {
            let scope = ctx.context(rule.family());
            if self.core_only && scope == ContextTag::Shell {
                continue;
            }
            violations.extend(
                rule.check(&ctx, unit)
                    .into_iter()
                    .map(|v| v.with_scope(scope)),
            );
        }
        violations
    }

    fn analyze_file(&self, path: &Path) -> Result<FileOutcome, EngineError> {
        debug!("Analyzing: {}", path.display());

        let bytes = std::fs::read(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let Ok(source) = String::from_utf8(bytes) else {
            warn!("Skipping {}: not valid UTF-8", path.display());
            return Ok(FileOutcome::Skipped);
        };

        match self.parser.parse(path, &source) {
            Ok(unit) => Ok(FileOutcome::Analyzed(self.analyze_unit(&unit))),
            Err(e) => {
                warn!("Skipping {e}");
                Ok(FileOutcome::Skipped)
            }
        }
    }
}
