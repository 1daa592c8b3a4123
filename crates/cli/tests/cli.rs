use assert_cmd::Command;

fn shelf(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.env("SHELF_CONFIG_DIR", config_dir)
        .env("SHELF_ENV", "local")
        .env_remove("SHELF_SERVER__PORT");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = shelf(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("settings"));
}

#[test]
fn settings_prints_layered_configuration() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("base.toml"), "[server]\nport = 4321\n").unwrap();

    let output = shelf(dir.path()).arg("settings").output().unwrap();
    assert!(output.status.success());

    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["server"]["port"], 4321);
    assert_eq!(settings["environment"], "local");
    assert_eq!(settings["database"]["endpoint"], "memory://");
}

#[test]
fn unknown_environment_fails() {
    let dir = tempfile::tempdir().unwrap();
    shelf(dir.path())
        .env("SHELF_ENV", "qa")
        .arg("settings")
        .assert()
        .failure();
}
