//! Wiring of the session stack for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use quire_core::{ApiUrl, SessionManager, TokenStore};
use quire_file::FileStorage;
use quire_http::{AuthorizedClient, ClientConfig};

/// Everything a command needs to talk to the backend.
pub struct CliContext {
    pub api_url: ApiUrl,
    pub session: SessionManager,
    pub client: AuthorizedClient,
}

/// Build the session stack over the session file at `store`, or the
/// default one.
pub fn open(api_url: &str, store: Option<&Path>) -> Result<CliContext> {
    let api_url = ApiUrl::new(api_url).context("Invalid API URL")?;
    let path = match store {
        Some(path) => path.to_path_buf(),
        None => default_store_path()?,
    };
    tracing::debug!(path = %path.display(), "Using session file");

    let store = TokenStore::new(Arc::new(FileStorage::new(path)));
    let (session, client) = quire_http::connect(&ClientConfig::new(api_url.clone()), store)
        .context("Failed to set up HTTP client")?;

    Ok(CliContext {
        api_url,
        session,
        client,
    })
}

fn default_store_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "quire").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("session.json"))
}
