//! Runs the lfb backend over HTTP with an in-memory record store.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use lfb::core::logging::setup_logging;
use lfb::core::settings_loader::{from_env, from_toml_file_with_env};
use lfb::core::{LfbError, LfbResult};
use lfb::db::InMemoryStore;
use lfb::server::{router, AppState};

/// Environment variable holding the bootstrap admin's password.
const ADMIN_PASSWORD_ENV: &str = "LFB_ADMIN_PASSWORD";

#[derive(Debug, Parser)]
#[command(name = "lfb-server", about = "Runs the lfb backend")]
struct Args {
    /// TOML settings file. Without one, defaults and `LFB_*` variables apply.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind to.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Creates this user at startup, with the password from `LFB_ADMIN_PASSWORD`.
    #[arg(long)]
    admin: Option<String>,
}

#[tokio::main]
async fn main() -> LfbResult<()> {
    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => from_toml_file_with_env(path)?,
        None => from_env(),
    };
    setup_logging(&settings)?;

    let store = InMemoryStore::new();
    if let Some(admin) = &args.admin {
        let password = std::env::var(ADMIN_PASSWORD_ENV).map_err(|_| {
            LfbError::Configuration(format!("{ADMIN_PASSWORD_ENV} must be set with --admin"))
        })?;
        lfb::account::create_user(&store, admin, &password, admin).await?;
        tracing::info!(username = %admin, "admin user ready");
    }

    let app = router(AppState::new(Arc::new(store), settings)?);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Serving lfb backend at http://{addr}/");
    axum::serve(listener, app).await?;
    Ok(())
}
