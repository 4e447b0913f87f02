//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::output;
use crate::session::CliContext;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(ctx: &CliContext, _args: LogoutArgs) -> Result<()> {
    if ctx.session.token_store().is_empty() {
        output::progress("No stored session");
        return Ok(());
    }

    ctx.session.logout().await;
    output::success("Logged out");

    Ok(())
}
