use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

fn setup_project() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(
        root.join("src/api.ts"),
        "export function fetchAll() {\n  return [];\n}\n",
    )
    .unwrap();
    fs::write(
        root.join("src/app.ts"),
        "import { fetchAll } from './api';\n\nexport function main() {\n  return fetchAll();\n}\n",
    )
    .unwrap();
    temp
}

#[allow(deprecated)]
fn cli(workdir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("context-map").expect("binary");
    cmd.current_dir(workdir).arg("--quiet");
    cmd
}

#[test]
fn parse_prints_json_extraction() {
    let temp = setup_project();
    let output = cli(temp.path())
        .args(["parse", "src/app.ts", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["filePath"], "src/app.ts");
    assert_eq!(body["language"], "typescript");
    let names: Vec<&str> = body["components"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert!(names.contains(&"main"), "{names:?}");
}

#[test]
fn parse_text_lists_components() {
    let temp = setup_project();
    cli(temp.path())
        .args(["parse", "src/api.ts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("src/api.ts (typescript)"))
        .stdout(predicate::str::contains("function fetchAll [1-3]"));
}

#[test]
fn context_renders_markdown_for_a_directory() {
    let temp = setup_project();
    cli(temp.path())
        .args(["context", ".", "--entity", "main", "--depth", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Context: main"))
        .stdout(predicate::str::contains("fetchAll"));
}

#[test]
fn small_budget_switches_to_compact_unless_bypassed() {
    let temp = setup_project();
    cli(temp.path())
        .args(["context", "src", "--entity", "main", "--budget", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("```").not());

    cli(temp.path())
        .args(["context", "src", "--entity", "main", "--budget", "500", "--verbose-format"])
        .assert()
        .success()
        .stdout(predicate::str::contains("```typescript"));
}

#[test]
fn aiccl_output_expands_back() {
    let temp = setup_project();
    let output = cli(temp.path())
        .args(["context", "src", "--entity", "main", "--format", "aiccl"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let encoded = String::from_utf8(output.stdout).unwrap();
    assert!(encoded.starts_with("# FILE_PATHS\n"), "{encoded}");
    fs::write(temp.path().join("context.aiccl"), &encoded).unwrap();

    cli(temp.path())
        .args(["expand", "context.aiccl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main --CALLS--> fetchAll"));

    let output = cli(temp.path())
        .args(["expand", "context.aiccl", "--json"])
        .output()
        .expect("run");
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["warnings"].as_array().map(Vec::len), Some(0));
}

#[test]
fn config_supplies_rules_and_default_format() {
    let temp = setup_project();
    fs::write(
        temp.path().join("context-map.toml"),
        r#"
[format]
default_format = "text"

[[rules]]
type = "errors"
guidance = "return empty lists"

[[flows]]
name = "startup"
steps = ["main", "fetchAll"]
"#,
    )
    .unwrap();

    cli(temp.path())
        .args(["context", "src", "--entity", "main"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("CONTEXT main"))
        .stdout(predicate::str::contains("errors: return empty lists"))
        .stdout(predicate::str::contains("startup: main -> fetchAll"));
}

#[test]
fn unknown_entity_and_format_fail() {
    let temp = setup_project();
    cli(temp.path())
        .args(["context", "src", "--entity", "nothing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing"));

    cli(temp.path())
        .args(["context", "src", "--entity", "main", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format: yaml"));
}

#[test]
fn formats_lists_every_adapter() {
    let temp = tempdir().unwrap();
    let output = cli(temp.path()).arg("formats").output().expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for name in [
        "aiccl",
        "aiccl-expand",
        "json",
        "json-compact",
        "markdown",
        "markdown-compact",
        "text",
    ] {
        assert!(stdout.lines().any(|l| l.starts_with(name)), "{name}: {stdout}");
    }
}
