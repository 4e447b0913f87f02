//! Fetch command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use reqwest::Method;

use quire_http::FetchOptions;

use crate::output;
use crate::session::CliContext;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Path on the backend (e.g. /api/posts) or an absolute URL
    pub target: String,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET")]
    pub method: String,

    /// JSON request body
    #[arg(long, short)]
    pub data: Option<String>,

    /// Extra header as NAME:VALUE (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", raw))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

pub async fn run(ctx: &CliContext, args: FetchArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method '{}'", args.method))?;

    let mut options = FetchOptions::new();
    for (name, value) in &args.headers {
        options = options.header(name, value)?;
    }
    if let Some(data) = &args.data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("Request body is not valid JSON")?;
        options = options.json(&body)?;
    }

    let response = ctx
        .client
        .fetch(method, &args.target, options)
        .await
        .context("Request failed")?;

    let status = response.status();
    output::status(status);

    let text = response.text().await.context("Failed to read response body")?;
    output::body(&text)?;

    if !status.is_success() {
        bail!("Backend answered {}", status);
    }

    Ok(())
}
