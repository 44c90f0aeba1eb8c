//! Player Sync Harness - drives the sync client against a headless world
//!
//! This is the entry point for the harness binary. It:
//! - Builds a headless world with vehicles and scripted remote players
//! - Runs a loopback authority that grants entry/exit requests
//! - Pulses the player manager on a fixed interval until Ctrl+C

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use player_sync_client::app::Harness;
use player_sync_client::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Player Sync Harness");
    info!(
        tick_rate = config.tick_rate,
        run_ticks = config.run_ticks,
        "Harness configuration"
    );

    let (mut harness, link) = Harness::new(config);

    // Spawn loopback authority
    tokio::spawn(async move {
        link.authority.run(link.frames, link.replies).await;
    });

    tokio::select! {
        _ = harness.run() => {}
        _ = shutdown_signal() => {}
    }

    let summary = harness.summary();
    info!(
        ticks = summary.tick,
        seated = summary.seated,
        spawned = summary.spawned,
        "Harness shutdown complete"
    );
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
