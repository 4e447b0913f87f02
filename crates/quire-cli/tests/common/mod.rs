#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Isolated session file for one test.
pub struct TestStore {
    _dir: TempDir,
    path: PathBuf,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("session.json");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored entries, or an empty object if nothing was written.
    pub fn entries(&self) -> Value {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).expect("Invalid session file"),
            Err(_) => json!({}),
        }
    }

    /// Write entries directly, as if a previous run had stored them.
    pub fn seed(&self, access: &str, refresh: &str) {
        let entries = json!({"accessToken": access, "refreshToken": refresh});
        std::fs::write(&self.path, entries.to_string()).expect("Failed to seed session file");
    }
}

/// Run the CLI binary against `api_url` with an isolated session file.
pub async fn run_cli(args: &[&str], store: &TestStore, api_url: &str) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_quire"))
        .args(args)
        .arg("--api-url")
        .arg(api_url)
        .arg("--store")
        .arg(store.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .await
        .expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub async fn run_cli_success(args: &[&str], store: &TestStore, api_url: &str) -> String {
    let output = run_cli(args, store, api_url).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure.
pub async fn run_cli_failure(args: &[&str], store: &TestStore, api_url: &str) -> String {
    let output = run_cli(args, store, api_url).await;
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn token(subject: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({"sub": subject, "exp": exp}).to_string());
    format!("{}.{}.signature", header, payload)
}

pub fn fresh_token(subject: &str) -> String {
    token(subject, chrono::Utc::now().timestamp() + 3600)
}

pub fn expired_token(subject: &str) -> String {
    token(subject, chrono::Utc::now().timestamp() - 60)
}

pub fn user_json(username: &str) -> Value {
    json!({
        "id": format!("id-{}", username),
        "username": username,
        "email": format!("{}@example.com", username),
        "avatarId": "av-1",
        "role": "User",
        "createdOn": "2024-01-01T00:00:00Z",
        "modifiedOn": "2024-01-01T00:00:00Z"
    })
}

pub fn auth_body(access: &str, refresh: &str, username: &str) -> Value {
    json!({
        "accessToken": access,
        "refreshToken": refresh,
        "user": user_json(username)
    })
}
