use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_churnlens"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "churnlens init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join(".churnlens.toml");
    assert!(config_path.exists(), ".churnlens.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[churn]"));
    assert!(content.contains("[output]"));

    // Verify it's valid TOML that churnlens-core can parse
    let config: churnlens_core::ChurnConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.churn.minimum_churn_count, 5);
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".churnlens.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_churnlens"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".churnlens.toml")).unwrap();
    assert_eq!(content, "# existing");
}
