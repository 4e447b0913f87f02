//! Auth subcommand implementations.

mod login;
mod logout;
mod refresh_token;
mod register;
mod whoami;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::session::CliContext;

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Sign in with a username or email
    Login(login::LoginArgs),

    /// Create an account and sign in
    Register(register::RegisterArgs),

    /// Sign out and forget the stored session
    Logout(logout::LogoutArgs),

    /// Display the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Renew the stored credential pair
    RefreshToken(refresh_token::RefreshTokenArgs),
}

pub async fn handle(ctx: &CliContext, cmd: AuthCommand) -> Result<()> {
    match cmd.command {
        AuthSubcommand::Login(args) => login::run(ctx, args).await,
        AuthSubcommand::Register(args) => register::run(ctx, args).await,
        AuthSubcommand::Logout(args) => logout::run(ctx, args).await,
        AuthSubcommand::Whoami(args) => whoami::run(ctx, args).await,
        AuthSubcommand::RefreshToken(args) => refresh_token::run(ctx, args).await,
    }
}
