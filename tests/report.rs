use std::fs;
use std::path::Path;
use std::process::Command;

use git2::{Repository, Signature};

fn commit(repo: &Repository, rel: &str, content: &str, message: &str) {
    let full = repo.workdir().unwrap().join(rel);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(&full, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(rel)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("alice", "alice@example.com").unwrap();
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

fn ruby_source(value: u32) -> String {
    format!("class Foo\n  def bar\n    {value}\n  end\n\n  def baz\n    0\n  end\nend\n")
}

fn churned_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    for i in 1..=4 {
        commit(&repo, "lib/foo.rb", &ruby_source(i), &format!("change {i}"));
    }
    commit(&repo, "README", "hello\n", "docs");
    dir
}

fn churnlens(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_churnlens"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn json_report_lists_touched_method() {
    let dir = churned_repo();
    // Uncommitted edit inside Foo#bar.
    fs::write(dir.path().join("lib/foo.rb"), ruby_source(42)).unwrap();

    let output = churnlens(
        dir.path(),
        &["--format", "json", "report", "--min-churn", "3"],
    );
    assert!(
        output.status.success(),
        "churnlens report failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let changes = json["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["filePath"], "lib/foo.rb");
    assert_eq!(changes[0]["timesChanged"], 4);
    assert_eq!(changes[0]["changedClasses"][0], "Foo");
    assert_eq!(changes[0]["changedMethods"], serde_json::json!(["Foo#bar"]));
    assert_eq!(json["changedFiles"][0]["path"], "lib/foo.rb");
}

#[test]
fn config_file_sets_threshold() {
    let dir = churned_repo();
    fs::write(
        dir.path().join(".churnlens.toml"),
        "[churn]\nminimum_churn_count = 1\n",
    )
    .unwrap();

    let output = churnlens(dir.path(), &["--format", "json"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files: Vec<&str> = json["changes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["filePath"].as_str().unwrap())
        .collect();
    assert_eq!(files, vec!["lib/foo.rb", "README"]);
}

#[test]
fn text_report_on_clean_tree() {
    let dir = churned_repo();
    let output = churnlens(dir.path(), &["report", "--min-churn", "4"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lib/foo.rb"));
    assert!(!stdout.contains("methods:"));
}

#[test]
fn invalid_start_date_fails() {
    let dir = churned_repo();
    let output = churnlens(dir.path(), &["report", "--start-date", "someday"]);
    assert!(!output.status.success());
}
