//! Refresh token command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::CliContext;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(ctx: &CliContext, _args: RefreshTokenArgs) -> Result<()> {
    output::progress("Refreshing session...");

    let user = ctx
        .session
        .refresh_token()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed successfully");
    output::user(&ctx.api_url, &user);

    Ok(())
}
