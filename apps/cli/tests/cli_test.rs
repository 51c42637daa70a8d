//! End-to-end tests for the rover binary using mock models.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MOCK_CONFIG: &str = r#"
orchestrator_model = "mock-planner"
codewriter_model = "mock-writer"
temperatures = [0.3, 0.8]
"#;

const ENV_OVERRIDES: [&str; 8] = [
    "GEMINI_API_KEY",
    "OPENAI_API_KEY",
    "GROQ_API_KEY",
    "ORCHESTRATOR_MODEL",
    "CODEWRITER_MODEL",
    "LLM_TIMEOUT",
    "LLM_MAX_RETRIES",
    "CODE_WRITER_MAX_TOKENS",
];

/// A `rover` command isolated from the caller's home, cwd and environment.
fn rover(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rover").unwrap();
    cmd.current_dir(dir.path()).env("HOME", dir.path()).env("NO_COLOR", "1");
    for key in ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}

fn mock_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("rover.toml");
    std::fs::write(&path, MOCK_CONFIG).unwrap();
    path
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    rover(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("code"))
        .stdout(predicate::str::contains("agent"))
        .stdout(predicate::str::contains("models"));
}

#[test]
fn test_models_lists_configured_models() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);

    rover(&dir)
        .args(["models", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("mock-planner"))
        .stdout(predicate::str::contains("mock-writer"))
        .stdout(predicate::str::contains("not required"));
}

#[test]
fn test_models_json() {
    let dir = TempDir::new().unwrap();

    let output = rover(&dir).args(["models", "--json"]).output().unwrap();

    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries[0]["model_id"], "gemini-2.0-flash");
    assert_eq!(entries[0]["provider"], "gemini");
    assert_eq!(entries[0]["credential_status"], "missing");
    assert_eq!(entries[1]["provider"], "groq");
}

#[test]
fn test_env_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);

    rover(&dir)
        .args(["models", "--config"])
        .arg(&config)
        .env("CODEWRITER_MODEL", "gpt-4o")
        .env("OPENAI_API_KEY", "sk-test")
        .assert()
        .success()
        .stdout(predicate::str::contains("gpt-4o"))
        .stdout(predicate::str::contains("available"));
}

#[test]
fn test_local_rc_file_is_read() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".roverrc"), "orchestrator_model = \"mock-local\"\n").unwrap();

    rover(&dir)
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("mock-local"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    rover(&dir)
        .args(["models", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_code_requires_api_keys() {
    let dir = TempDir::new().unwrap();
    rover(&dir)
        .arg("code")
        .write_stdin("quit\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"))
        .stderr(predicate::str::contains("GROQ_API_KEY"));
}

#[test]
fn test_code_session_with_mock_models() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);

    rover(&dir)
        .args(["code", "--config"])
        .arg(&config)
        .write_stdin("write a fibonacci function\n\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan:"))
        .stdout(predicate::str::contains("Best code (temperature=0.3"))
        .stdout(predicate::str::contains("All candidates (2):"))
        .stdout(predicate::str::contains("Please enter a request."))
        .stdout(predicate::str::contains("Goodbye!"));
}

#[test]
fn test_agent_with_mock_model() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);

    rover(&dir)
        .args(["agent", "say hello", "--workspace", "."])
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("mock-planner received: say hello"))
        .stdout(predicate::str::contains("1 generation call(s), 0 tool call(s)"));
}

#[test]
fn test_agent_rejects_missing_workspace() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);

    rover(&dir)
        .args(["agent", "hi", "--workspace", "does-not-exist", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Workspace not found"));
}
