//! Selection of the files a run analyzes.
//!
//! By default only Python files with working-tree or index changes (plus
//! untracked files) are checked. With `--all`, or when git cannot answer,
//! the whole tree under the scope root is walked, honoring `.gitignore`.

use anyhow::{Context, Result};
use git2::{Repository, Status, StatusOptions};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PYTHON_EXTENSION: &str = "py";

/// Compiled `--exclude` / `[analyzer] exclude` globs.
pub struct Excludes(Vec<glob::Pattern>);

impl Excludes {
    /// Compiles the patterns.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid glob.
    pub fn new(patterns: &[String]) -> Result<Self> {
        patterns
            .iter()
            .map(|p| glob::Pattern::new(p).with_context(|| format!("Invalid exclude pattern: {p}")))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Whether `path` (or its form relative to `root`) matches any pattern.
    #[must_use]
    pub fn is_excluded(&self, path: &Path, root: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.0
            .iter()
            .any(|p| p.matches_path(relative) || p.matches_path(path))
    }
}

/// Collects the Python files to analyze, sorted.
#[must_use]
pub fn collect(root: &Path, changed_only: bool, excludes: &Excludes) -> Vec<PathBuf> {
    let mut files = if changed_only {
        match changed_files(root) {
            Ok(changed) if !changed.is_empty() => {
                info!("Checking {} changed file(s)", changed.len());
                changed
            }
            Ok(_) => {
                info!("No changed Python files, scanning full tree");
                walk(root)
            }
            Err(e) => {
                warn!("Cannot read git status ({}), scanning full tree", e.message());
                walk(root)
            }
        }
    } else {
        walk(root)
    };

    files.retain(|f| !excludes.is_excluded(f, root));
    files.sort();
    files.dedup();
    files
}

/// Every `.py` file under `root`, honoring ignore files.
fn walk(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && is_python(path) {
                    files.push(path.to_path_buf());
                }
            }
            Err(e) => debug!("Skipping unreadable entry: {e}"),
        }
    }
    files
}

/// Modified, staged and untracked `.py` files under `root`.
///
/// Returned paths are `root` joined with the path relative to it, so they
/// classify the same way as paths from a full walk.
fn changed_files(root: &Path) -> Result<Vec<PathBuf>, git2::Error> {
    let repo = Repository::discover(root)?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| git2::Error::from_str("repository has no working directory"))?;
    let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
    let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    debug!("Reading git status in {}", workdir.display());

    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);
    let statuses = repo.statuses(Some(&mut options))?;

    let mut files = Vec::new();
    for entry in statuses.iter() {
        if entry
            .status()
            .intersects(Status::WT_DELETED | Status::INDEX_DELETED)
        {
            continue;
        }
        let Some(rel) = entry.path() else {
            continue;
        };
        let absolute = workdir.join(rel);
        if !is_python(&absolute) || !absolute.is_file() {
            continue;
        }
        if let Ok(under_root) = absolute.strip_prefix(&canonical_root) {
            files.push(root.join(under_root));
        }
    }
    Ok(files)
}

fn is_python(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(PYTHON_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tempdir() -> TempDir {
        tempfile::Builder::new().prefix("qgate").tempdir().unwrap()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x = 1\n").unwrap();
    }

    fn no_excludes() -> Excludes {
        Excludes::new(&[]).unwrap()
    }

    #[test]
    fn full_walk_finds_python_files_sorted() {
        let tmp = tempdir();
        touch(tmp.path(), "pkg/b.py");
        touch(tmp.path(), "pkg/a.py");
        touch(tmp.path(), "README.md");
        touch(tmp.path(), ".hidden/c.py");

        let files = collect(tmp.path(), false, &no_excludes());
        assert_eq!(
            files,
            vec![tmp.path().join("pkg/a.py"), tmp.path().join("pkg/b.py")]
        );
    }

    #[test]
    fn excludes_match_relative_paths() {
        let tmp = tempdir();
        touch(tmp.path(), "venv/lib/site.py");
        touch(tmp.path(), "app/main.py");

        let excludes = Excludes::new(&["**/venv/**".to_string()]).unwrap();
        let files = collect(tmp.path(), false, &excludes);
        assert_eq!(files, vec![tmp.path().join("app/main.py")]);
    }

    #[test]
    fn invalid_exclude_is_rejected() {
        assert!(Excludes::new(&["[".to_string()]).is_err());
    }

    #[test]
    fn changed_only_falls_back_outside_git() {
        let tmp = tempdir();
        touch(tmp.path(), "a.py");

        // May sit inside some outer repository on a dev machine; a full scan
        // and a status read both report a.py as new.
        let files = collect(tmp.path(), true, &no_excludes());
        assert_eq!(files, vec![tmp.path().join("a.py")]);
    }

    #[test]
    fn changed_only_reports_untracked_files() {
        let tmp = tempdir();
        Repository::init(tmp.path()).unwrap();
        touch(tmp.path(), "pkg/new.py");
        touch(tmp.path(), "notes.txt");

        let changed = changed_files(tmp.path()).unwrap();
        assert_eq!(changed, vec![tmp.path().join("pkg/new.py")]);
    }
}
