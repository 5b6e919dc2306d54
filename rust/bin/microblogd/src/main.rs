//! `microblogd`: the microblog server binary.
//!
//! Usage:
//!   microblogd [-c <context-name-or-path>] [--listen <addr>]
//!
//! The context name resolves to `/etc/microblog/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly. Without `-c`
//! the built-in defaults apply.

mod bootstrap;
mod config;
mod routes;

use clap::Parser;
use microblog_core::Module;
use tokio::signal;
use tracing::info;

use config::ServerConfig;

/// Microblog server.
#[derive(Parser, Debug)]
#[command(name = "microblogd", about = "Microblog server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Listen address (overrides the configured one).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let mut server_config = match &cli.config {
        Some(name) => {
            let config_path = ServerConfig::resolve_path(name);
            info!("Loading configuration from {}", config_path.display());
            ServerConfig::load(&config_path)?
        }
        None => {
            info!("No configuration given, using defaults");
            ServerConfig::default()
        }
    };
    if let Some(listen) = cli.listen {
        server_config.server.listen = listen;
    }

    bootstrap::verify_config(&server_config)?;

    let module = bootstrap::open_module(&server_config)?;
    info!("{} module initialized", module.name());

    let app = routes::build_router(&server_config, module.routes());

    let listener = tokio::net::TcpListener::bind(&server_config.server.listen).await?;
    info!(
        "Microblog server listening on {} (api at {})",
        server_config.server.listen, server_config.server.api_prefix
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
