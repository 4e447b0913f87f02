//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use quire_core::Credentials;

use crate::output;
use crate::session::CliContext;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username or email address
    #[arg(long)]
    pub identifier: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(ctx: &CliContext, args: LoginArgs) -> Result<()> {
    let credentials = Credentials::new(args.identifier, args.password);

    output::progress("Logging in...");

    let user = ctx
        .session
        .login(&credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::user(&ctx.api_url, &user);

    Ok(())
}
