//! Per-file context handed to rules.

use crate::classify::{ClassifierSet, ContextTag, ContextTags};
use crate::config::Thresholds;
use crate::rule::RuleFamily;
use std::path::{Path, PathBuf};

/// Context provided to per-file rules.
///
/// Built once per file by the engine. The file is classified under every
/// family's policy up front, so rules only read the tag they need.
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    /// Path to the file as selected.
    pub path: &'a Path,
    /// Path relative to the scope root; this is what classification sees.
    pub relative_path: PathBuf,
    /// Run-wide thresholds.
    pub thresholds: &'a Thresholds,
    tags: ContextTags,
}

impl<'a> FileContext<'a> {
    /// Creates a new file context, classifying the file with `classifiers`.
    #[must_use]
    pub fn new(
        path: &'a Path,
        root: &Path,
        thresholds: &'a Thresholds,
        classifiers: &ClassifierSet,
    ) -> Self {
        let relative_path = relative_to(path, root);
        let tags = classifiers.classify_all(&relative_path);
        Self {
            path,
            relative_path,
            thresholds,
            tags,
        }
    }

    /// Creates a context with precomputed tags.
    #[must_use]
    pub fn with_tags(
        path: &'a Path,
        root: &Path,
        thresholds: &'a Thresholds,
        tags: ContextTags,
    ) -> Self {
        Self {
            path,
            relative_path: relative_to(path, root),
            thresholds,
            tags,
        }
    }

    /// Returns the file's tag under a family's policy.
    #[must_use]
    pub fn context(&self, family: RuleFamily) -> ContextTag {
        self.tags.get(family)
    }

    /// Returns all tags of this file.
    #[must_use]
    pub fn tags(&self) -> ContextTags {
        self.tags
    }
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    let stripped = path
        .strip_prefix(root)
        .map_or_else(|_| path.to_path_buf(), Path::to_path_buf);
    // `./pkg/x.py` and `pkg/x.py` must classify the same way
    stripped
        .strip_prefix(".")
        .map_or(stripped.clone(), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_strips_root() {
        let thresholds = Thresholds::default();
        let classifiers = ClassifierSet::builtin().unwrap();
        let ctx = FileContext::new(
            Path::new("/repo/app/handlers/user.py"),
            Path::new("/repo"),
            &thresholds,
            &classifiers,
        );
        assert_eq!(ctx.relative_path, PathBuf::from("app/handlers/user.py"));
        assert_eq!(ctx.context(RuleFamily::Design), ContextTag::Shell);
        assert_eq!(ctx.context(RuleFamily::Complexity), ContextTag::Core);
    }

    #[test]
    fn root_outside_path_keeps_path() {
        let thresholds = Thresholds::default();
        let ctx = FileContext::with_tags(
            Path::new("./lib/x.py"),
            Path::new("/elsewhere"),
            &thresholds,
            ContextTags::uniform(ContextTag::Shell),
        );
        assert_eq!(ctx.relative_path, PathBuf::from("lib/x.py"));
        assert_eq!(ctx.context(RuleFamily::Purity), ContextTag::Shell);
    }

    #[test]
    fn root_ancestors_do_not_leak_into_classification() {
        let thresholds = Thresholds::default();
        let classifiers = ClassifierSet::builtin().unwrap();
        let ctx = FileContext::new(
            Path::new("/home/dev/api/project/pkg/model.py"),
            Path::new("/home/dev/api/project"),
            &thresholds,
            &classifiers,
        );
        assert_eq!(ctx.context(RuleFamily::Design), ContextTag::Core);
        assert_eq!(ctx.context(RuleFamily::Purity), ContextTag::Core);
    }
}
