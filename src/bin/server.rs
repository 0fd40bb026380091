//! execbox server - HTTP front end for the sandboxed execution service

use clap::Parser;
use execbox::api::{build_router, AppState};
use execbox::config::{apply_env_overrides, load_config, load_config_from_path, validate_config};
use execbox::sandbox;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "execbox-server", about = "Sandboxed code execution service", version)]
struct Args {
    /// Bind address (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides config)
    #[arg(long, short)]
    port: Option<u16>,

    /// Path to a config file
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let mut config = load_config_from_path(path)?;
            apply_env_overrides(&mut config);
            config
        }
        None => load_config()?,
    };

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!("Config warning [{}]: {}", warning.path, warning.message);
    }
    if !report.valid {
        for error in &report.errors {
            eprintln!("Config error [{}]: {}", error.path, error.message);
            if let Some(suggestion) = &error.suggestion {
                eprintln!("  hint: {}", suggestion);
            }
        }
        anyhow::bail!("Invalid configuration");
    }

    let service = sandbox::connect(&config.executor).await?;
    info!(
        "Execution service ready (image {}, timeout {} ms)",
        config.executor.image, config.executor.timeout_ms
    );

    let app = build_router(AppState { service });

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    info!("execbox server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
