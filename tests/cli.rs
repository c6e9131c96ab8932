// ABOUTME: Integration tests for the imagedash CLI commands.
// ABOUTME: Validates --help output, init behavior and failures without a runtime.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn imagedash_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("imagedash"));
    for var in [
        "CONTAINER_RUNTIME",
        "IMAGEDASH_BIND",
        "IMAGEDASH_REGISTRY_FILE",
        "NODE_ENV",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_shows_commands() {
    imagedash_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("images"))
        .stdout(predicate::str::contains("rmi"))
        .stdout(predicate::str::contains("save"))
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("imagedash.yml");

    imagedash_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--runtime", "nerdctl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created imagedash.yml"));

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("runtime: nerdctl"));
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("imagedash.yml"), "environment: mine\n").unwrap();

    imagedash_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_unknown_runtime() {
    let temp_dir = tempfile::tempdir().unwrap();

    imagedash_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--runtime", "podman"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown container runtime"));
}

#[test]
fn images_without_any_runtime_fails_cleanly() {
    let temp_dir = tempfile::tempdir().unwrap();

    imagedash_cmd()
        .current_dir(temp_dir.path())
        .env("PATH", temp_dir.path())
        .arg("images")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no container runtime found"));
}

#[test]
fn runtime_command_reports_missing_pinned_runtime() {
    let temp_dir = tempfile::tempdir().unwrap();

    imagedash_cmd()
        .current_dir(temp_dir.path())
        .env("PATH", temp_dir.path())
        .env("CONTAINER_RUNTIME", "crictl")
        .arg("runtime")
        .assert()
        .failure()
        .stderr(predicate::str::contains("crictl is not available"));
}

#[test]
fn invalid_config_file_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("imagedash.yml"), "runtime: podman\n").unwrap();

    imagedash_cmd()
        .current_dir(temp_dir.path())
        .arg("images")
        .assert()
        .failure()
        .stderr(predicate::str::contains("podman"));
}

#[test]
fn load_of_missing_archive_fails_before_runtime_lookup() {
    let temp_dir = tempfile::tempdir().unwrap();

    imagedash_cmd()
        .current_dir(temp_dir.path())
        .args(["load", "-i", "absent.tar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("archive not found"));
}

#[test]
fn json_output_reports_errors_as_events() {
    let temp_dir = tempfile::tempdir().unwrap();

    imagedash_cmd()
        .current_dir(temp_dir.path())
        .env("PATH", temp_dir.path())
        .args(["--json", "images"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"event\":\"error\""));
}
