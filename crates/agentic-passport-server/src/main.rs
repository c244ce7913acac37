//! passportd: HTTP server for AgenticPassport.
//!
//! Requires `PASSPORT_SECRET_KEY` (or `PASSPORT_SECRET_KEY_B64`) in the
//! environment. Logs go to stderr; set `RUST_LOG` to adjust verbosity.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use agentic_passport::{AuditLedger, FileLedger, MemoryLedger, PassportConfig};
use agentic_passport_server::{app, AppState};
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "passportd",
    about = "Agent passport issuance, authorization and audit over HTTP",
    version
)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "PASSPORTD_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Directory for the file-backed ledger. In-memory when omitted.
    #[arg(long, env = "PASSPORTD_LEDGER_DIR")]
    ledger_dir: Option<PathBuf>,

    /// Comma-separated agent ids forming the membership allowlist.
    #[arg(long, env = "PASSPORTD_ALLOWLIST", value_delimiter = ',')]
    allowlist: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Arc::new(PassportConfig::from_env().context("loading configuration")?);

    let ledger: Arc<dyn AuditLedger> = match &args.ledger_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "using file ledger");
            Arc::new(FileLedger::open(dir).context("opening ledger directory")?)
        }
        None => {
            tracing::warn!("no --ledger-dir given; records will not survive a restart");
            Arc::new(MemoryLedger::new())
        }
    };

    let allowlist: Vec<String> = args
        .allowlist
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let state = AppState::with_transparent_backend(config, ledger, &allowlist)
        .context("building allowlist")?;
    if let Some(tree) = &state.allowlist {
        tracing::info!(leaves = tree.len(), root = %tree.root_hex(), "allowlist loaded");
    }

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    tracing::info!(addr = %args.bind, "passportd listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("passportd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
