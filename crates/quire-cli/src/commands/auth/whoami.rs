//! Whoami command implementation.

use anyhow::{Result, bail};
use clap::Args;

use quire_core::SessionState;

use crate::output;
use crate::session::CliContext;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the user record as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(ctx: &CliContext, args: WhoamiArgs) -> Result<()> {
    let SessionState::Authenticated(user) = ctx.session.check_auth().await else {
        bail!("No active session. Run 'quire auth login' first.");
    };

    if args.json {
        output::json_pretty(&user)?;
    } else {
        output::user(&ctx.api_url, &user);
    }

    Ok(())
}
