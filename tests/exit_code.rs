use std::process::{Command, Output};

const VARS: &[&str] = &[
    "GITHUB_TOKEN",
    "OPENROUTER_API_KEY",
    "TOGETHER_API_KEY",
    "GITHUB_REPOSITORY",
    "PR_NUMBER",
    "DEFAULT_BRANCH",
    "SENTINEL_ENV",
    "NODE_ENV",
];

fn sentinel(dir: &std::path::Path, args: &[&str], vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sentinel"));
    cmd.args(args).current_dir(dir);
    for name in VARS {
        cmd.env_remove(name);
    }
    for (name, value) in vars {
        cmd.env(name, value);
    }
    cmd.output().unwrap()
}

#[test]
fn missing_primary_key_exits_1_naming_it() {
    let dir = tempfile::tempdir().unwrap();
    let output = sentinel(dir.path(), &["review"], &[("GITHUB_TOKEN", "t")]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OPENROUTER_API_KEY"), "stderr: {stderr}");
}

#[test]
fn missing_token_is_reported_before_network() {
    let dir = tempfile::tempdir().unwrap();
    let output = sentinel(dir.path(), &["explain"], &[("OPENROUTER_API_KEY", "k")]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("GITHUB_TOKEN"));
}

#[test]
fn unsafe_branch_name_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let output = sentinel(
        dir.path(),
        &["review"],
        &[
            ("GITHUB_TOKEN", "t"),
            ("OPENROUTER_API_KEY", "k"),
            ("DEFAULT_BRANCH", "main;touch pwned"),
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid branch name"));
    assert!(!dir.path().join("pwned").exists());
}

#[test]
fn production_mode_prints_only_the_message() {
    let dir = tempfile::tempdir().unwrap();
    let output = sentinel(
        dir.path(),
        &["review"],
        &[("GITHUB_TOKEN", "t"), ("SENTINEL_ENV", "production")],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required environment variable: OPENROUTER_API_KEY"));
    assert!(!stderr.contains("sentinel::config::missing_env"), "stderr: {stderr}");
}

#[test]
fn node_env_production_also_hides_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let output = sentinel(
        dir.path(),
        &["review"],
        &[("GITHUB_TOKEN", "t"), ("NODE_ENV", "production")],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OPENROUTER_API_KEY"));
    assert!(!stderr.contains("sentinel::config::missing_env"), "stderr: {stderr}");
}

#[test]
fn init_then_doctor_loads_generated_config() {
    let dir = tempfile::tempdir().unwrap();
    assert!(sentinel(dir.path(), &["init"], &[]).status.success());

    let output = sentinel(dir.path(), &["doctor", "--format", "json"], &[]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let config = json["checks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "config_file")
        .unwrap();
    assert_eq!(config["status"], "pass", "{config}");
}

#[test]
fn doctor_json_lists_checks() {
    let dir = tempfile::tempdir().unwrap();
    let output = sentinel(dir.path(), &["doctor", "--format", "json"], &[]);

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = json["checks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"github_token"));
    assert!(names.contains(&"primary_provider"));
    assert!(names.contains(&"pr_template"));
}
