use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn obo_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("obo");
    path
}

/// Temp workspace with a config and a store holding `docs` as
/// `(file name, content)`.
fn setup_test_env(docs: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let store_dir = root.join("ontology");
    fs::create_dir_all(&store_dir).unwrap();
    for (name, content) in docs {
        fs::write(store_dir.join(name), content).unwrap();
    }

    let config_content = format!(
        r#"[store]
root = "{root}/ontology"

[cache]
root = "{root}/cache"

[github]
token_env = "OBO_CURATION_TEST_NO_SUCH_TOKEN"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("obo.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_obo(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = obo_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run obo binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

const ABC: &str = "---\nid: abc\ntitle: Alpha\n---\n";

#[test]
fn test_check_passes_on_consistent_store() {
    let (_tmp, config_path) = setup_test_env(&[
        ("abc.md", ABC),
        ("xyz.md", "---\nid: xyz\ndependencies:\n- id: abc\n---\n"),
    ]);

    let (stdout, stderr, success) = run_obo(&config_path, &["check"]);
    assert!(success, "check failed: stdout={} stderr={}", stdout, stderr);
    assert!(stdout.contains("PASS  dependencies"));
    assert!(!stdout.contains("FAIL"));
}

#[test]
fn test_check_fails_on_unknown_dependency() {
    let (_tmp, config_path) = setup_test_env(&[
        ("abc.md", ABC),
        ("xyz.md", "---\nid: xyz\ndependencies:\n- id: missing\n---\n"),
    ]);

    let (stdout, stderr, success) = run_obo(&config_path, &["check"]);
    assert!(!success, "check should fail: stdout={}", stdout);
    assert!(stdout.contains("FAIL  dependencies (1)"));
    let line = stdout
        .lines()
        .find(|l| l.contains("unknown dependency"))
        .unwrap_or_else(|| panic!("no dependency failure in: {}", stdout));
    assert!(line.contains("xyz"));
    assert!(line.contains("missing"));
    assert!(stderr.contains("1 integrity check failure(s)"));
}

#[test]
fn test_bad_field_shape_fails_only_that_record() {
    let (_tmp, config_path) = setup_test_env(&[
        ("abc.md", ABC),
        ("xyz.md", "---\nid: xyz\ndependencies:\n- id: missing\n---\n"),
        (
            "bad.md",
            "---\nid: bad\ndependencies:\n- type: BridgeOntology\n---\n",
        ),
    ]);

    let (stdout, stderr, success) = run_obo(&config_path, &["check"]);
    assert!(!success, "check should fail: stdout={}", stdout);
    assert!(stdout.contains("FAIL  field_shape (1)"), "stdout: {}", stdout);
    assert!(stdout.contains("FAIL  dependencies (1)"), "stdout: {}", stdout);
    assert!(stdout
        .lines()
        .any(|l| l.contains("xyz") && l.contains("missing")));
    assert!(stderr.contains("2 integrity check failure(s)"), "stderr: {}", stderr);
}

#[test]
fn test_malformed_document_is_reported() {
    let (_tmp, config_path) = setup_test_env(&[("bad.md", "id: bad\n---\n")]);

    let (_stdout, stderr, success) = run_obo(&config_path, &["records"]);
    assert!(!success);
    assert!(stderr.contains("first line must be '---'"), "stderr: {}", stderr);
}

#[test]
fn test_records_lists_ids_in_order() {
    let (_tmp, config_path) = setup_test_env(&[
        (
            "zfa.md",
            "---\nid: zfa\nactivity_status: active\nrepository: https://github.com/cerivs/zebrafish-anatomical-ontology\n---\n",
        ),
        ("abc.md", ABC),
    ]);

    let (stdout, stderr, success) = run_obo(&config_path, &["records"]);
    assert!(success, "records failed: {}", stderr);
    let ids: Vec<&str> = stdout
        .lines()
        .skip(1)
        .filter_map(|l| l.split_whitespace().next())
        .collect();
    assert_eq!(ids, vec!["abc", "zfa"]);
    assert!(stdout.contains("active"));
    assert!(stderr.contains("2 records"));
}

#[test]
fn test_prefixes_emit_shacl() {
    let (_tmp, config_path) = setup_test_env(&[
        ("abc.md", ABC),
        ("go.md", "---\nid: go\npreferredPrefix: GO\n---\n"),
        ("old.md", "---\nid: old\nis_obsolete: true\n---\n"),
    ]);

    let (stdout, stderr, success) = run_obo(&config_path, &["prefixes"]);
    assert!(success, "prefixes failed: {}", stderr);
    assert!(stdout.starts_with("@prefix sh:\t<http://www.w3.org/ns/shacl#> ."));
    assert!(stdout.contains("[ sh:prefix \"ABC\" ; sh:namespace \"http://purl.obolibrary.org/obo/ABC_\" ],"));
    assert!(stdout.contains("sh:prefix \"GO\""));
    assert!(!stdout.contains("OLD"));
}

#[test]
fn test_standardize_check_then_rewrite() {
    let (tmp, config_path) =
        setup_test_env(&[("abc.md", "---\nid:    abc\ntitle:   Alpha\n---\nBody.\n")]);

    let (stdout, _stderr, success) = run_obo(&config_path, &["standardize", "--check"]);
    assert!(!success);
    assert!(stdout.contains("not canonical: abc"));

    let (_stdout, stderr, success) = run_obo(&config_path, &["standardize"]);
    assert!(success, "standardize failed: {}", stderr);
    let text = fs::read_to_string(tmp.path().join("ontology/abc.md")).unwrap();
    assert_eq!(text, "---\nid: abc\ntitle: Alpha\n---\nBody.\n");

    let (_stdout, _stderr, success) = run_obo(&config_path, &["standardize", "--check"]);
    assert!(success);
}

#[test]
fn test_contributors_without_token_is_configuration_error() {
    let (_tmp, config_path) = setup_test_env(&[(
        "abc.md",
        "---\nid: abc\nrepository: https://github.com/org/abc\n---\n",
    )]);

    let (_stdout, stderr, success) = run_obo(&config_path, &["contributors"]);
    assert!(!success);
    assert!(stderr.contains("GitHub token missing"), "stderr: {}", stderr);
}

#[test]
fn test_warm_cache_needs_no_token() {
    let (tmp, config_path) = setup_test_env(&[(
        "abc.md",
        "---\nid: abc\nrepository: https://github.com/org/abc\n---\n",
    )]);
    let snapshots = tmp.path().join("cache").join("contributors");
    fs::create_dir_all(&snapshots).unwrap();
    fs::write(
        snapshots.join("abc_contributors.json"),
        r#"{"alice": {"contributions": 3, "name": "Alice"}}"#,
    )
    .unwrap();

    let (stdout, stderr, success) = run_obo(&config_path, &["discover", "--query-only"]);
    assert!(success, "discover failed: stderr={}", stderr);
    assert!(stdout.contains(r#"("alice" "Alice" "abc")"#), "stdout: {}", stdout);

    let (stdout, stderr, success) = run_obo(&config_path, &["contributors"]);
    assert!(success, "contributors failed: stderr={}", stderr);
    assert!(stdout.contains("\"alice\""));
}

#[test]
fn test_status_reports_components() {
    let (_tmp, config_path) = setup_test_env(&[("abc.md", ABC)]);

    let (stdout, stderr, success) = run_obo(&config_path, &["status"]);
    assert!(success, "status failed: {}", stderr);
    assert!(stdout.contains("store"));
    assert!(stdout.contains("OK (1 documents)"));
    assert!(stdout.contains("NO TOKEN"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_stdout, stderr, success) = run_obo(&tmp.path().join("nope.toml"), &["records"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
