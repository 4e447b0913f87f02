//! Register command implementation.

use anyhow::{Context, Result};
use clap::Args;

use quire_core::Registration;

use crate::output;
use crate::session::CliContext;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

pub async fn run(ctx: &CliContext, args: RegisterArgs) -> Result<()> {
    let registration = Registration::new(args.username, args.email, args.password);

    output::progress("Creating account...");

    let user = ctx
        .session
        .register(&registration)
        .await
        .context("Failed to register")?;

    output::success("Account created");
    println!();
    output::user(&ctx.api_url, &user);

    Ok(())
}
