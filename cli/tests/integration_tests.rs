use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

const TREE: &str = r#"
commands:
  - name: give
    description: hand out items
    usages:
      - "<player> [amount:integer=1]"
  - name: ban
    aliases: [b]
    usages:
      - "<player> [-silent|s] <duration:duration> <reason...>"
    flags:
      - name: ip
  - name: warp
    usages:
      - "<target:{alpha,beta}>"
  - name: admin
    permission: admin.use
    usages:
      - reload
"#;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_tree(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("commands.yaml");
    fs::write(&path, contents).expect("failed to write tree");
    path
}

fn grammar(tree: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grammar"))
        .arg("--tree")
        .arg(tree)
        .args(args)
        .output()
        .expect("failed to run grammar")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// check / usages
// ---------------------------------------------------------------------------

#[test]
fn check_lists_registered_commands() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir, TREE);

    let output = grammar(&tree, &["check"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let names: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(names, vec!["give\thand out items", "ban", "warp", "admin"]);
}

#[test]
fn check_rejects_ambiguous_usages() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(
        &dir,
        r#"
commands:
  - name: kick
    usages:
      - "<player>"
      - "<reason>"
"#,
    );

    let output = grammar(&tree, &["check"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("error:"));
}

#[test]
fn missing_tree_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = grammar(&dir.path().join("absent.yaml"), &["check"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to load tree"));
}

#[test]
fn usages_prints_syntax_lines() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir, TREE);

    let output = grammar(&tree, &["usages", "b"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("ban <player>"));

    let unknown = grammar(&tree, &["usages", "nope"]);
    assert!(!unknown.status.success());
    assert!(stderr(&unknown).contains("unknown command 'nope'"));
}

// ---------------------------------------------------------------------------
// dispatch
// ---------------------------------------------------------------------------

#[test]
fn dispatch_prints_resolved_arguments() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir, TREE);

    let output = grammar(&tree, &["dispatch", "give", "mqzen"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let executed: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(executed["path"], serde_json::json!(["give"]));
    assert_eq!(executed["arguments"]["player"], "mqzen");
    assert_eq!(executed["arguments"]["amount"], 1);
}

#[test]
fn dispatch_accepts_flag_shaped_tokens() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir, TREE);

    let output = grammar(
        &tree,
        &["dispatch", "ban", "mqzen", "1h", "-s", "griefing", "spawn", "-ip"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let executed: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(executed["arguments"]["silent"], true);
    assert_eq!(executed["arguments"]["ip"], true);
    assert_eq!(executed["arguments"]["reason"], "griefing spawn");
}

#[test]
fn dispatch_failure_prints_usages() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir, TREE);

    let output = grammar(&tree, &["dispatch", "warp", "gamma"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("usage:"));
    assert!(err.contains("warp <target:{alpha,beta}>"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn dispatch_respects_permissions() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir, TREE);

    let denied = grammar(&tree, &["--permission", "other", "dispatch", "admin", "reload"]);
    assert!(!denied.status.success());
    assert!(stdout(&denied).is_empty());

    let allowed = grammar(&tree, &["--permission", "admin.use", "dispatch", "admin", "reload"]);
    assert!(allowed.status.success(), "stderr: {}", stderr(&allowed));
}

// ---------------------------------------------------------------------------
// suggest
// ---------------------------------------------------------------------------

#[test]
fn suggest_lists_candidates() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir, TREE);

    let output = grammar(&tree, &["suggest", "warp", "a"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "alpha\n");
}

#[test]
fn suggest_json_output() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir, TREE);

    let output = grammar(&tree, &["suggest", "--json", "ban", "mqzen", "-"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let candidates: Vec<String> = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert!(candidates.contains(&"-silent".to_string()));
    assert!(candidates.contains(&"-ip".to_string()));
}

#[test]
fn suggest_honours_config_limit() {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(&dir, TREE);
    let config = dir.path().join("engine.yaml");
    fs::write(&config, "max_suggestions: 1\n").unwrap();

    let output = grammar(
        &tree,
        &["--config", config.to_str().unwrap(), "suggest", "warp", ""],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "alpha\n");
}
