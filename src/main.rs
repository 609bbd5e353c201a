//! Storefront application entry point.
//!
//! # Startup
//!
//! ```text
//!   storefront --config storefront.toml
//!        │
//!        ▼
//!   ┌─────────────────────────── Bootstrap ───────────────────────────┐
//!   │ Phase 1: Config ─▶ Cache?                                       │
//!   │ Phase 2: Database ─▶ Logger                                     │
//!   │ Phase 3: Security? ─▶ Session                                   │
//!   └─────────────────────────────────────────────────────────────────┘
//!        │ ok                                  │ failure
//!        ▼                                     ▼
//!   metrics exporter + admin diagnostics   fault channel report, exit 1
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use storefront::admin::{self, AdminState};
use storefront::bootstrap::{Bootstrap, ExecutionMode};
use storefront::components::{standard_components, AppContext, ConfigSource};
use storefront::observability::metrics;

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Storefront web application", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "storefront.toml", env = "STOREFRONT_CONFIG")]
    config: PathBuf,

    /// Execution mode (production, cli, test). Defaults to STOREFRONT_MODE.
    #[arg(short, long)]
    mode: Option<ExecutionMode>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // One mode for both the sequencer and config validation.
    let mode = args.mode.unwrap_or_else(ExecutionMode::from_env);
    let ctx = AppContext::new_in_mode(ConfigSource::File(args.config), mode);
    let bootstrap = Arc::new(
        Bootstrap::builder(standard_components(&ctx))
            .mode(mode)
            .build(),
    );

    if let Err(err) = bootstrap.init() {
        let mut source = std::error::Error::source(&err);
        eprintln!("storefront failed to start: {err}");
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        return ExitCode::FAILURE;
    }

    match run(&ctx, bootstrap).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Storefront terminated with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(ctx: &AppContext, bootstrap: Arc<Bootstrap>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ctx.config().ok_or("configuration missing after bootstrap")?;

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    if !config.admin.enabled {
        tracing::info!("Admin diagnostics disabled; waiting for shutdown signal");
        shutdown_signal().await;
        return Ok(());
    }

    let listener = TcpListener::bind(&config.admin.bind_address).await?;
    let state = AdminState::new(bootstrap, config.admin.api_key.as_str());
    admin::serve(listener, state, shutdown_signal()).await?;
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
    }
    tracing::info!("Shutdown signal received");
}
