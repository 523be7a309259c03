//! End-to-end runs: Python front end, built-in rules and the engine together.

use qgate_core::{Config, ContextTag, Engine, Severity, ValidationResult, ViolationType};
use qgate_python::PythonParser;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, content).expect("write");
    path
}

fn run(root: &Path, files: &[PathBuf], config: Config) -> ValidationResult {
    Engine::builder()
        .root(root)
        .parser(PythonParser::new())
        .rules(qgate_rules::all_rules())
        .config(config)
        .build()
        .expect("engine")
        .run(files)
        .expect("run")
}

const FETCH: &str = "\
async def fetch(client):
    return await client.get()
";

#[test]
fn clean_tree_is_allowed() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(
        dir.path(),
        "domain/pricing.py",
        "def total(items):\n    return sum(i.price for i in items)\n",
    );

    let result = run(dir.path(), &[file], Config::default());
    assert!(result.allowed);
    assert!(result.violations.is_empty());
    assert_eq!(result.summary.files_analyzed, 1);
    assert!(result.recommendations.is_empty());
}

#[test]
fn parse_failure_is_isolated() {
    let dir = TempDir::new().expect("tempdir");
    let broken = write(dir.path(), "domain/broken.py", "def f(:\n    pass\n");
    let good = write(
        dir.path(),
        "domain/good.py",
        "def f():\n    try:\n        g()\n    except:\n        raise\n",
    );
    let binary = dir.path().join("domain/blob.py");
    fs::write(&binary, [0xff, 0xfe, 0x00]).expect("write");

    let result = run(dir.path(), &[broken, good.clone(), binary], Config::default());
    assert_eq!(result.summary.files_analyzed, 1);
    assert_eq!(result.summary.files_skipped, 2);
    assert!(result.violations.iter().all(|v| v.file == good));
    assert_eq!(
        result.of_type(ViolationType::BareExcept).len(),
        1,
        "{:#?}",
        result.violations
    );
}

#[test]
fn deeply_nested_file_is_skipped() {
    let dir = TempDir::new().expect("tempdir");
    let deep = write(
        dir.path(),
        "domain/generated.py",
        &format!("def f():\n    return 1{}\n", " + 1".repeat(3000)),
    );
    let good = write(
        dir.path(),
        "domain/good.py",
        "def f():\n    try:\n        g()\n    except:\n        raise\n",
    );

    for parallel in ["true", "false"] {
        let config = Config::parse(&format!("[analyzer]\nparallel = {parallel}\n")).expect("config");
        let result = run(dir.path(), &[deep.clone(), good.clone()], config);
        assert_eq!(result.summary.files_analyzed, 1);
        assert_eq!(result.summary.files_skipped, 1);
        assert!(result.violations.iter().all(|v| v.file == good));
    }
}

#[test]
fn trailing_comments_do_not_count_toward_length() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(
        dir.path(),
        "domain/short.py",
        "def f():\n    a = 1\n    return a\n    # c1\n    # c2\n",
    );

    let at_limit = Config::parse("[thresholds]\nmax_function_lines = 3\n").expect("config");
    let result = run(dir.path(), &[file.clone()], at_limit);
    assert!(result.of_type(ViolationType::Length).is_empty(), "{:#?}", result.violations);

    let below = Config::parse("[thresholds]\nmax_function_lines = 2\n").expect("config");
    let result = run(dir.path(), &[file], below);
    let length = result.of_type(ViolationType::Length);
    assert_eq!(length.len(), 1);
    assert_eq!(length[0].value, Some(3));
}

#[test]
fn core_only_drops_shell_findings() {
    let dir = TempDir::new().expect("tempdir");
    let core = write(dir.path(), "services/sync.py", FETCH);
    let shell = write(dir.path(), "handlers/sync.py", FETCH);
    let files = [core.clone(), shell];

    let all = run(dir.path(), &files, Config::default());
    assert_eq!(all.summary.core_violations, 2);
    assert_eq!(all.summary.shell_warnings, 2);

    let config = Config::parse("[analyzer]\ncore_only = true\n").expect("config");
    let result = run(dir.path(), &files, config);
    assert!(result.violations.iter().all(|v| v.file == core));
    assert_eq!(result.summary.core_violations, 2);
    assert_eq!(result.summary.shell_warnings, 0);
    assert_eq!(result.summary.files_analyzed, 2);
}

#[test]
fn shell_purity_gets_no_recommendation() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(dir.path(), "handlers/sync.py", FETCH);

    let result = run(dir.path(), &[file], Config::default());
    assert_eq!(result.of_type(ViolationType::AsyncIo).len(), 2);
    assert!(result.recommendations.is_empty(), "{:?}", result.recommendations);
    assert!(result.architecture_hint.contains("Imperative Shell"));
}

#[test]
fn async_severity_follows_file_context() {
    let dir = TempDir::new().expect("tempdir");
    let core = write(dir.path(), "services/sync.py", FETCH);
    let shell = write(dir.path(), "handlers/sync.py", FETCH);

    let result = run(dir.path(), &[core.clone(), shell.clone()], Config::default());
    let async_io = result.of_type(ViolationType::AsyncIo);
    assert_eq!(async_io.len(), 4);
    for v in async_io {
        if v.file == core {
            assert_eq!(v.severity, Severity::Error);
            assert_eq!(v.scope, ContextTag::Core);
        } else {
            assert_eq!(v.file, shell);
            assert_eq!(v.severity, Severity::Warning);
            assert_eq!(v.scope, ContextTag::Shell);
        }
    }
    assert!(result.is_blocked());
}

#[test]
fn bare_except_blocks_even_in_shell() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(
        dir.path(),
        "cli/main.py",
        "def main():\n    try:\n        run_app()\n    except:\n        pass\n",
    );

    let result = run(dir.path(), &[file], Config::default());
    let bare = result.of_type(ViolationType::BareExcept);
    assert_eq!(bare.len(), 1);
    assert_eq!(bare[0].severity, Severity::Error);
    assert!(result.of_type(ViolationType::ExceptPass).is_empty());
    assert!(!result.allowed);
}

#[test]
fn strict_mode_blocks_on_warnings() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(
        dir.path(),
        "domain/shapes.py",
        "def f(a, b, c, d, e, g):\n    return a\n",
    );

    let lenient = run(dir.path(), &[file.clone()], Config::default());
    assert_eq!(lenient.summary.warnings, 1);
    assert!(lenient.allowed);

    let strict = Config::parse("[analyzer]\nstrict = true\n").expect("config");
    let result = run(dir.path(), &[file], strict);
    assert!(!result.allowed);
    assert!(result.summary.blocked);
}

#[test]
fn disabled_rule_produces_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(dir.path(), "services/sync.py", FETCH);

    let config = Config::parse("[rules.purity]\nenabled = false\n").expect("config");
    let result = run(dir.path(), &[file], config);
    assert!(result.of_type(ViolationType::AsyncIo).is_empty());
}

#[test]
fn runs_are_idempotent_and_ordered() {
    let dir = TempDir::new().expect("tempdir");
    let mut files = Vec::new();
    for name in ["b", "a", "c"] {
        files.push(write(
            dir.path(),
            &format!("services/{name}_service.py"),
            "def f():\n    print('x')\n    global state\n",
        ));
    }

    let first = run(dir.path(), &files, Config::default());
    let second = run(dir.path(), &files, Config::default());
    assert_eq!(first, second);

    let sequential = Config::parse("[analyzer]\nparallel = false\n").expect("config");
    assert_eq!(first.violations, run(dir.path(), &files, sequential).violations);

    let order: Vec<(&Path, usize)> = first
        .violations
        .iter()
        .map(|v| (v.file.as_path(), v.line))
        .collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
}

#[test]
fn summary_breakdowns() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(
        dir.path(),
        "domain/base.py",
        "\
class Base:
    def run(self):
        raise NotImplementedError

def load():
    return open('x')
",
    );

    let result = run(dir.path(), &[file], Config::default());
    assert_eq!(result.summary.errors, 2);
    assert_eq!(result.summary.by_type.get(&ViolationType::LspNotImplemented), Some(&1));
    assert_eq!(result.summary.by_type.get(&ViolationType::FileIo), Some(&1));
    assert_eq!(result.summary.by_principle.len(), 1);
    assert_eq!(result.recommendations.len(), 2);
    assert!(result.recommendations[0].starts_with("LSP:"));
    assert!(result.recommendations[1].starts_with("FILE I/O:"));
}
