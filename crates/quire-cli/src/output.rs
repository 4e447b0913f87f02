//! Terminal rendering of sessions and responses.
//!
//! Results go to stdout; progress and status lines go to stderr so that
//! `quire fetch ... | jq` keeps working.

use anyhow::Result;
use colored::Colorize;
use reqwest::StatusCode;
use serde::Serialize;

use quire_core::{ApiUrl, User};

pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn progress(msg: &str) {
    eprintln!("{}", msg.dimmed());
}

/// Print the profile of the signed-in user. The avatar is shown as a URL
/// on `api` since the record only carries its id.
pub fn user(api: &ApiUrl, user: &User) {
    let role = if user.is_admin() {
        user.role.yellow().to_string()
    } else {
        user.role.clone()
    };

    profile_line("Username", &user.username);
    profile_line("Email", &user.email);
    profile_line("Role", &role);
    if let Some(avatar_id) = &user.avatar_id {
        profile_line("Avatar", &api.avatar_url(avatar_id));
    }
    profile_line("Member since", &user.created_on.format("%Y-%m-%d").to_string());
}

fn profile_line(label: &str, value: &str) {
    println!("{:>12} {}", label.dimmed(), value);
}

/// Status line of a fetched response, colored by class.
pub fn status(status: StatusCode) {
    let line = format!("HTTP {}", status);
    let line = if status.is_success() {
        line.green()
    } else if status.is_client_error() {
        line.yellow()
    } else {
        line.red()
    };
    eprintln!("{}", line);
}

/// Print a response body: pretty JSON when it parses, raw text otherwise.
pub fn body(text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => json_pretty(&json),
        Err(_) => {
            println!("{}", text);
            Ok(())
        }
    }
}

pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
