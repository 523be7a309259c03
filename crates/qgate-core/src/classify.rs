//! Context policy: deciding whether a file is functional core or imperative shell.
//!
//! Each rule family carries its own pattern table. The tables intentionally
//! disagree in places (the purity table knows about `views/` and `*_api.py`,
//! the design table does not), so one file can be `Shell` for one family and
//! `Core` for another.

use crate::rule::RuleFamily;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// Architectural role of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextTag {
    /// Functional core: business logic that should stay pure.
    Core,
    /// Imperative shell: I/O boundaries, entry points, tests.
    Shell,
}

impl std::fmt::Display for ContextTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => write!(f, "core"),
            Self::Shell => write!(f, "shell"),
        }
    }
}

/// A single path pattern.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Matches when any path component equals the name (`handlers`).
    Component(String),
    /// Shell-style glob (`*/handlers/*`, `*_service.py`). Also matches when
    /// the pattern's non-wildcard text occurs anywhere in the path.
    Glob {
        /// Compiled glob.
        pattern: glob::Pattern,
        /// Pattern text with `*` removed and `/` trimmed.
        fragment: String,
    },
}

impl PathPattern {
    /// Parses a pattern. Plain names become component patterns; anything with
    /// glob syntax, a separator or a dot becomes a glob.
    ///
    /// # Errors
    ///
    /// Returns an error if the glob syntax is invalid.
    pub fn parse(raw: &str) -> Result<Self, glob::PatternError> {
        if raw.contains(['*', '?', '[', '/', '.']) {
            let fragment = raw.replace('*', "").trim_matches('/').to_string();
            Ok(Self::Glob {
                pattern: glob::Pattern::new(raw)?,
                fragment,
            })
        } else {
            Ok(Self::Component(raw.to_string()))
        }
    }

    /// Tests the pattern against a `/`-separated path.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Self::Component(name) => path
                .components()
                .any(|c| matches!(c, Component::Normal(s) if s.to_str() == Some(name.as_str()))),
            Self::Glob { pattern, fragment } => {
                let text = normalized(path);
                pattern.matches(&text) || (!fragment.is_empty() && text.contains(fragment.as_str()))
            }
        }
    }
}

fn normalized(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Ordered shell/core pattern lists with a fallback tag.
#[derive(Debug, Clone)]
pub struct ContextClassifier {
    shell: Vec<PathPattern>,
    core: Vec<PathPattern>,
    fallback: ContextTag,
}

impl ContextClassifier {
    /// Builds a classifier from raw pattern strings.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob pattern is invalid.
    pub fn new<S: AsRef<str>>(shell: &[S], core: &[S]) -> Result<Self, glob::PatternError> {
        Ok(Self {
            shell: parse_all(shell)?,
            core: parse_all(core)?,
            fallback: ContextTag::Core,
        })
    }

    /// A classifier without patterns; every file is `Core`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            shell: Vec::new(),
            core: Vec::new(),
            fallback: ContextTag::Core,
        }
    }

    /// Classifies a path: shell patterns first, then core, then the fallback.
    #[must_use]
    pub fn classify(&self, path: &Path) -> ContextTag {
        if self.shell.iter().any(|p| p.matches(path)) {
            ContextTag::Shell
        } else if self.core.iter().any(|p| p.matches(path)) {
            ContextTag::Core
        } else {
            self.fallback
        }
    }
}

fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<PathPattern>, glob::PatternError> {
    raw.iter().map(|s| PathPattern::parse(s.as_ref())).collect()
}

/// Shell directories for the design-principle and error-handling families.
pub const LAYER_SHELL: &[&str] = &["handlers", "adapters", "api", "cli", "scripts", "tests"];

/// Core directories for the design-principle family.
pub const DESIGN_CORE: &[&str] = &["domain", "logic", "services", "utils", "core"];

/// Shell patterns for the purity family.
pub const PURITY_SHELL: &[&str] = &[
    "*/handlers/*",
    "*/views/*",
    "*/routes/*",
    "*/api/*",
    "*/cli/*",
    "*/adapters/*",
    "*/controllers/*",
    "*/endpoints/*",
    "*/scripts/*",
    "*/tests/*",
    "*/examples/*",
    "*/benchmarks/*",
    "*/archive/*",
    "*_handler.py",
    "*_view.py",
    "*_controller.py",
    "*_adapter.py",
    "*_endpoint.py",
    "*_api.py",
    "*_cli.py",
    "*__main__.py",
    "conftest.py",
    "setup.py",
];

/// Core patterns for the purity family.
pub const PURITY_CORE: &[&str] = &[
    "*/domain/*",
    "*/models/*",
    "*/services/*",
    "*/logic/*",
    "*/core/*",
    "*/business/*",
    "*/utils/*",
    "*/helpers/*",
    "*_service.py",
    "*_logic.py",
    "*_utils.py",
    "*_helpers.py",
    "*_domain.py",
];

/// One classifier per rule family.
#[derive(Debug, Clone)]
pub struct ClassifierSet {
    complexity: ContextClassifier,
    design: ContextClassifier,
    purity: ContextClassifier,
    error_handling: ContextClassifier,
}

impl ClassifierSet {
    /// Builds the built-in tables.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in patterns; the signature mirrors [`Self::with_override`].
    pub fn builtin() -> Result<Self, glob::PatternError> {
        let none: &[&str] = &[];
        Ok(Self {
            complexity: ContextClassifier::empty(),
            design: ContextClassifier::new(LAYER_SHELL, DESIGN_CORE)?,
            purity: ContextClassifier::new(PURITY_SHELL, PURITY_CORE)?,
            error_handling: ContextClassifier::new(LAYER_SHELL, none)?,
        })
    }

    /// Returns the classifier for a family.
    #[must_use]
    pub fn get(&self, family: RuleFamily) -> &ContextClassifier {
        match family {
            RuleFamily::Complexity => &self.complexity,
            RuleFamily::Design => &self.design,
            RuleFamily::Purity => &self.purity,
            RuleFamily::ErrorHandling => &self.error_handling,
        }
    }

    fn get_mut(&mut self, family: RuleFamily) -> &mut ContextClassifier {
        match family {
            RuleFamily::Complexity => &mut self.complexity,
            RuleFamily::Design => &mut self.design,
            RuleFamily::Purity => &mut self.purity,
            RuleFamily::ErrorHandling => &mut self.error_handling,
        }
    }

    /// Replaces a family's shell and/or core list.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob pattern is invalid.
    pub fn with_override(
        mut self,
        family: RuleFamily,
        shell: Option<&[String]>,
        core: Option<&[String]>,
    ) -> Result<Self, glob::PatternError> {
        let classifier = self.get_mut(family);
        if let Some(shell) = shell {
            classifier.shell = parse_all(shell)?;
        }
        if let Some(core) = core {
            classifier.core = parse_all(core)?;
        }
        Ok(self)
    }

    /// Classifies a path once for every family.
    #[must_use]
    pub fn classify_all(&self, path: &Path) -> ContextTags {
        ContextTags {
            complexity: self.complexity.classify(path),
            design: self.design.classify(path),
            purity: self.purity.classify(path),
            error_handling: self.error_handling.classify(path),
        }
    }
}

/// The tag of one file under every family's policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextTags {
    complexity: ContextTag,
    design: ContextTag,
    purity: ContextTag,
    error_handling: ContextTag,
}

impl ContextTags {
    /// Same tag for every family.
    #[must_use]
    pub fn uniform(tag: ContextTag) -> Self {
        Self {
            complexity: tag,
            design: tag,
            purity: tag,
            error_handling: tag,
        }
    }

    /// Returns the tag under a family's policy.
    #[must_use]
    pub fn get(&self, family: RuleFamily) -> ContextTag {
        match family {
            RuleFamily::Complexity => self.complexity,
            RuleFamily::Design => self.design,
            RuleFamily::Purity => self.purity,
            RuleFamily::ErrorHandling => self.error_handling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> ClassifierSet {
        ClassifierSet::builtin().unwrap()
    }

    #[test]
    fn component_patterns_match_directories() {
        let c = set();
        let design = c.get(RuleFamily::Design);
        assert_eq!(design.classify(Path::new("app/handlers/user.py")), ContextTag::Shell);
        assert_eq!(design.classify(Path::new("app/domain/user.py")), ContextTag::Core);
        assert_eq!(design.classify(Path::new("app/misc/user.py")), ContextTag::Core);
        assert_eq!(design.classify(Path::new("app/handlersx/user.py")), ContextTag::Core);
    }

    #[test]
    fn shell_wins_over_core() {
        let c = set();
        let path = Path::new("core/handlers/x.py");
        assert_eq!(c.get(RuleFamily::Design).classify(path), ContextTag::Shell);
        assert_eq!(c.get(RuleFamily::Purity).classify(path), ContextTag::Shell);
    }

    #[test]
    fn glob_patterns_match_suffixes_and_fragments() {
        let purity = set();
        let purity = purity.get(RuleFamily::Purity);
        assert_eq!(purity.classify(Path::new("pkg/user_handler.py")), ContextTag::Shell);
        assert_eq!(purity.classify(Path::new("conftest.py")), ContextTag::Shell);
        // leading component has no `*/` prefix to satisfy; the fragment still matches
        assert_eq!(purity.classify(Path::new("views/index.py")), ContextTag::Shell);
        assert_eq!(purity.classify(Path::new("pkg/pricing_service.py")), ContextTag::Core);
        assert_eq!(purity.classify(Path::new("pkg/plain.py")), ContextTag::Core);
    }

    #[test]
    fn families_diverge() {
        let tags = set().classify_all(Path::new("app/views/page.py"));
        assert_eq!(tags.get(RuleFamily::Purity), ContextTag::Shell);
        assert_eq!(tags.get(RuleFamily::Design), ContextTag::Core);
        assert_eq!(tags.get(RuleFamily::ErrorHandling), ContextTag::Core);
        assert_eq!(tags.get(RuleFamily::Complexity), ContextTag::Core);
    }

    #[test]
    fn override_replaces_table() {
        let c = set()
            .with_override(
                RuleFamily::ErrorHandling,
                Some(&["jobs".to_string()]),
                None,
            )
            .unwrap();
        let eh = c.get(RuleFamily::ErrorHandling);
        assert_eq!(eh.classify(Path::new("jobs/nightly.py")), ContextTag::Shell);
        assert_eq!(eh.classify(Path::new("handlers/x.py")), ContextTag::Core);
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let result = set().with_override(RuleFamily::Purity, Some(&["[oops".to_string()]), None);
        assert!(result.is_err());
    }
}
