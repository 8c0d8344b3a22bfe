//! CLI integration tests for the catchpoint binary
//!
//! These tests run the compiled binary and inspect the JSON report it prints.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

/// Get a Command instance for the catchpoint binary
#[allow(deprecated)]
fn catchpoint_cmd() -> Command {
    let mut cmd = Command::cargo_bin("catchpoint").expect("Failed to find catchpoint binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn report(args: &[&str]) -> Value {
    let output = catchpoint_cmd()
        .args(args)
        .output()
        .expect("Failed to run catchpoint");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_version_flag() {
    catchpoint_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    catchpoint_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("probe"));
}

#[test]
fn test_classify_plain_failure() {
    let json = report(&["classify", "--message", "Could not load chats"]);

    assert_eq!(json["category"]["kind"], "surfaced");
    assert_eq!(json["outcome"]["kind"], "published");
    assert_eq!(json["published"], "Could not load chats");
    assert!(json["navigated_to"].is_null());
}

#[test]
fn test_classify_forbidden_navigates_to_sign_in() {
    let json = report(&["classify", "--status", "403"]);

    assert_eq!(json["status"], 403);
    assert_eq!(json["outcome"], serde_json::json!({"kind": "redirected", "value": "sign-in"}));
    assert_eq!(json["navigated_to"], "/sign-in");
    assert!(json["published"].is_null());
}

#[test]
fn test_classify_unauthorized_on_sign_up() {
    let json = report(&["classify", "--status", "401", "--current-path", "/sign-up"]);
    assert_eq!(json["navigated_to"], "/sign-up");
}

#[test]
fn test_classify_bad_request_returns_body() {
    let json = report(&[
        "classify",
        "--status",
        "400",
        "--body",
        r#"{"success":false,"message":"x","field":"email"}"#,
    ]);

    assert_eq!(json["category"]["kind"], "structured");
    assert_eq!(
        json["outcome"]["value"],
        serde_json::json!({"success": false, "message": "x", "field": "email"})
    );
    assert!(json["published"].is_null());
}

#[test]
fn test_classify_bad_request_plain_text_body() {
    let json = report(&["classify", "--status", "400", "--body", "Name too short"]);
    assert_eq!(json["outcome"]["value"], "Name too short");
}

#[test]
fn test_classify_timeout() {
    let json = report(&["classify", "--no-response", "--message", "raw"]);

    assert_eq!(json["category"]["kind"], "timeout");
    assert_eq!(
        json["published"],
        "There were problems with the database or the response wait time exceeded 15 seconds"
    );
}

#[test]
fn test_classify_uses_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catchpoint.toml");
    std::fs::write(&path, "[routes]\nprofile = \"/me\"\n").unwrap();

    let json = report(&[
        "--config",
        path.to_str().unwrap(),
        "classify",
        "--status",
        "308",
    ]);
    assert_eq!(json["navigated_to"], "/me");
}

#[test]
fn test_classify_missing_config_fails() {
    catchpoint_cmd()
        .args(["--config", "does/not/exist.toml", "classify"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn test_classify_rejects_conflicting_transport_modes() {
    catchpoint_cmd()
        .args(["classify", "--status", "500", "--no-response"])
        .assert()
        .failure();
}

#[test]
fn test_probe_unreachable_host_is_timeout() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{}/", addr);
    let json = report(&["probe", &url, "--timeout-secs", "2"]);
    assert_eq!(json["category"]["kind"], "timeout");
    assert_eq!(json["outcome"]["kind"], "published");
}
