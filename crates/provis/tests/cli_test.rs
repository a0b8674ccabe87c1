//! Integration tests for the `provis` CLI binary.
//!
//! Argument parsing, help output, completions, and error exits run without
//! a backend. The remaining tests point `--api-url` at a wiremock server
//! and keep the session in a temp file.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `provis` binary with env isolation.
///
/// Clears all `PROVIS_*` env vars and points config and data directories
/// into `home` so tests never touch the user's real configuration.
fn provis_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("provis");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("PROVIS_COLOR", "never")
        .env("NO_COLOR", "1")
        .env_remove("PROVIS_PROFILE")
        .env_remove("PROVIS_API_URL")
        .env_remove("PROVIS_IDENTITY_TOKEN")
        .env_remove("PROVIS_SESSION_FILE")
        .env_remove("PROVIS_OUTPUT")
        .env_remove("PROVIS_INSECURE")
        .env_remove("PROVIS_TIMEOUT")
        .env_remove("PROVIS_LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A temp home plus the session file path the backend tests pass in.
struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn session_file(&self) -> PathBuf {
        self.home.path().join("session.json")
    }

    /// Pretend a previous run signed in.
    fn with_session(self, token: &str) -> Self {
        let body = json!({
            "authToken": token,
            "user": { "id": "u1", "email": "ops@example.com", "name": "Ops" }
        });
        std::fs::write(self.session_file(), body.to_string()).unwrap();
        self
    }

    fn stored_session(&self) -> Option<serde_json::Value> {
        let raw = std::fs::read_to_string(self.session_file()).ok()?;
        Some(serde_json::from_str(&raw).unwrap())
    }

    /// Command wired to `server` with this sandbox's session file.
    fn cmd(&self, server: &MockServer) -> assert_cmd::Command {
        let mut cmd = provis_cmd(self.home.path());
        cmd.arg("--api-url")
            .arg(format!("{}/api", server.uri()))
            .arg("--session-file")
            .arg(self.session_file());
        cmd
    }
}

/// The binary blocks, so run it off the async test thread.
async fn run(mut cmd: assert_cmd::Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

/// Accept any restored session token.
async fn accept_restored_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/validate"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

fn customers_json() -> serde_json::Value {
    json!([
        { "id": "c1", "name": "Acme Corp", "shortCode": "ACME", "counterNb": 11 },
        { "id": "c2", "name": "Globex", "shortCode": "GLX" }
    ])
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = provis_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    provis_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("customers")
            .and(predicate::str::contains("jobs"))
            .and(predicate::str::contains("bundles")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    provis_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("provis"));
}

#[test]
fn test_completions() {
    let home = tempfile::tempdir().unwrap();
    provis_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
    for shell in ["bash", "fish"] {
        provis_cmd(home.path())
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::is_empty().not());
    }
}

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    let output = provis_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

// ── Error exits without a backend ───────────────────────────────────

#[test]
fn test_no_backend_configured() {
    let home = tempfile::tempdir().unwrap();
    let output = provis_cmd(home.path())
        .args(["customers", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("No backend configured"), "{text}");
}

#[test]
fn test_not_signed_in_exits_with_auth_code() {
    let sandbox = Sandbox::new();
    let output = provis_cmd(sandbox.home.path())
        .args(["--api-url", "http://127.0.0.1:9/api", "--session-file"])
        .arg(sandbox.session_file())
        .args(["jobs", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Not signed in"));
}

#[test]
fn test_config_set_and_show_round_trip() {
    let home = tempfile::tempdir().unwrap();
    provis_cmd(home.path())
        .args(["config", "set", "api_url", "https://staging.example.com/api"])
        .assert()
        .success();
    provis_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "api_url = \"https://staging.example.com/api\"",
        ));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test]
async fn test_identity_token_signs_in_and_persists_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/sso/entraId/login"))
        .and(header("authorization", "Bearer entra-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "session-1", "id": "u1", "email": "ops@example.com", "name": "Ops"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .and(header("authorization", "Bearer session-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customers_json()))
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["--identity-token", "entra-token", "-o", "json", "customers", "list"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["shortCode"], "ACME");
    assert_eq!(sandbox.stored_session().unwrap()["authToken"], "session-1");
}

#[tokio::test]
async fn test_expired_session_is_refreshed_before_the_command() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/validate"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/validate"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "fresh", "id": "u1", "email": "ops@example.com", "name": "Ops"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customers_json()))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new().with_session("stale");
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["-o", "plain", "customers", "list"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "c1\nc2");
    assert_eq!(sandbox.stored_session().unwrap()["authToken"], "fresh");
}

#[tokio::test]
async fn test_delete_by_short_code_notifies() {
    let server = MockServer::start().await;
    accept_restored_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customers_json()))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/customers/c2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new().with_session("persisted");
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["--yes", "customers", "delete", "glx"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("✓ Customer deleted"));
}

#[tokio::test]
async fn test_invalid_customer_form_makes_no_request() {
    let server = MockServer::start().await;
    accept_restored_session(&server).await;

    let sandbox = Sandbox::new().with_session("persisted");
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["customers", "create", "--name", "Acme", "--short-code", "A"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("short_code"));
    let requests = server.received_requests().await.unwrap();
    assert!(
        requests.iter().all(|r| r.url.path() == "/api/auth/validate"),
        "unexpected requests: {requests:?}"
    );
}

#[tokio::test]
async fn test_bundle_move_sends_full_order() {
    let server = MockServer::start().await;
    accept_restored_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/bundles/b1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "b1",
            "name": "Workstation",
            "tasks": [
                { "id": "t1", "name": "Join domain" },
                { "id": "t2", "name": "Install Office" },
                { "id": "t3", "name": "Cleanup" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/bundles/b1/tasks"))
        .and(body_json(json!({ "taskIds": ["t2", "t3", "t1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new().with_session("persisted");
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["-o", "plain", "bundles", "order", "b1", "--move", "1:3"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "t2\nt3\nt1");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Task order saved"));
}

#[tokio::test]
async fn test_job_status_uses_query_parameter() {
    let server = MockServer::start().await;
    accept_restored_session(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/jobs/j1/status"))
        .and(query_param("jobStatus", "IMAGING"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "j1", "status": "IMAGING", "createdAt": "2026-03-01T08:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new().with_session("persisted");
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["-o", "json", "jobs", "status", "j1", "imaging"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let job: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(job["status"], "IMAGING");
}

#[tokio::test]
async fn test_server_error_shows_one_generic_notification() {
    let server = MockServer::start().await;
    accept_restored_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let sandbox = Sandbox::new().with_session("persisted");
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["jobs", "list"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Something went wrong").count(), 1, "{stderr}");
}

#[tokio::test]
async fn test_structured_rejection_exits_with_conflict() {
    let server = MockServer::start().await;
    accept_restored_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/customers"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "errorCode": "DUPLICATE_SHORT_CODE",
            "message": "Short code already in use"
        })))
        .mount(&server)
        .await;

    let sandbox = Sandbox::new().with_session("persisted");
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["customers", "create", "--name", "Acme", "--short-code", "ACME"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(6));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Short code already in use"), "{stderr}");
    assert!(!stderr.contains("Something went wrong"), "{stderr}");
}

#[tokio::test]
async fn test_logout_removes_session_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let sandbox = Sandbox::new().with_session("persisted");
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["auth", "logout"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(sandbox.stored_session().is_none());
}

#[tokio::test]
async fn test_rejected_session_without_identity_token_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/validate"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new().with_session("revoked");
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["jobs", "list"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Session expired"));
    assert!(sandbox.stored_session().is_none());
}

#[tokio::test]
async fn test_bad_move_is_a_usage_error() {
    let server = MockServer::start().await;
    accept_restored_session(&server).await;

    let sandbox = Sandbox::new().with_session("persisted");
    let mut cmd = sandbox.cmd(&server);
    cmd.args(["bundles", "order", "b1", "--move", "first:last"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("FROM:TO"));
}
