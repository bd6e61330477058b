//! End-to-end tests running the `trackstar` binary against a temp store.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn trackstar_binary() -> String {
    env!("CARGO_BIN_EXE_trackstar").to_string()
}

/// Writes a config file pointing storage into `temp`.
fn write_config(temp: &Path) -> PathBuf {
    let config_path = temp.join("config.toml");
    let storage_path = temp.join("data").join("trackstar.db");
    std::fs::write(
        &config_path,
        format!("storage_path = {:?}\n", storage_path.display().to_string()),
    )
    .unwrap();
    config_path
}

fn command(temp: &Path, config: &Path) -> Command {
    let mut command = Command::new(trackstar_binary());
    command
        .env("HOME", temp)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("TRACKSTAR_API_KEY")
        .env_remove("TRACKSTAR_STORAGE_PATH")
        .arg("--config")
        .arg(config);
    command
}

fn run(temp: &Path, config: &Path, args: &[&str]) -> Output {
    let output = command(temp, config).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "trackstar {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_first_run_seeds_default_categories() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = run(temp.path(), &config, &["categories", "list", "--json"]);
    let categories: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<&str> = categories
        .as_array()
        .unwrap()
        .iter()
        .map(|category| category["name"].as_str().unwrap())
        .collect();

    assert_eq!(
        names,
        [
            "Python Development",
            "Crypto Trading",
            "Codeforces Problems",
            "Binge Watching",
            "Client Meeting"
        ]
    );
    assert!(temp.path().join("data").join("trackstar.db").exists());
}

#[test]
fn test_category_edits_persist_between_runs() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    run(temp.path(), &config, &["categories", "add", "Reading"]);
    run(temp.path(), &config, &["categories", "delete", "Crypto Trading"]);
    run(
        temp.path(),
        &config,
        &["categories", "rename", "reading", "Deep Reading"],
    );

    let output = run(temp.path(), &config, &["categories", "list"]);
    let listing = stdout(&output);
    assert!(listing.contains("Deep Reading"));
    assert!(!listing.contains("Crypto Trading"));
}

#[test]
fn test_log_and_summary_start_empty() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let log = run(temp.path(), &config, &["log"]);
    assert_eq!(stdout(&log), "No time logged yet.\n");

    let summary = run(temp.path(), &config, &["summary", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&summary)).unwrap();
    assert_eq!(parsed["totalSeconds"], 0);
}

#[test]
fn test_suggest_without_api_key_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = command(temp.path(), &config)
        .args(["suggest", "--duration", "90"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing Claude API key"));
}

#[test]
fn test_track_session_reads_commands_from_stdin() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let mut child = command(temp.path(), &config)
        .arg("track")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"category client meeting\ndescribe standup\nlog\nsuggest\nstatus\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let transcript = stdout(&output);
    assert!(transcript.contains("Selected category Client Meeting."));
    assert!(transcript.contains("Error: timer is empty"));
    assert!(transcript.contains("suggestions need a Claude API key"));
    assert!(transcript.contains("Description: standup"));
    assert!(transcript.ends_with("Bye.\n"));

    let log = run(temp.path(), &config, &["log", "--json"]);
    assert_eq!(stdout(&log).trim(), "[]");
}
