//! Long-running mode: keeps the expiry sweeper alive until Ctrl-C.

use crate::application::expiry_sweeper::ExpirySweeper;
use crate::config::Config;
use crate::state::AppState;

use anyhow::{Context, Result};

/// Runs the background expiry sweeper with the given configuration.
///
/// Initializes:
/// - JSON link store
/// - Link service
/// - Expiry sweeper
///
/// Blocks until Ctrl-C, then lets the current sweep finish before returning.
///
/// # Errors
///
/// Returns an error if:
/// - The storage directory cannot be created
/// - The sweep interval is zero
/// - The signal handler cannot be installed
/// - The sweeper task panics
pub async fn run(config: Config) -> Result<()> {
    let interval = config.sweep_interval();
    let state = AppState::new(config)?;
    tracing::info!(
        path = %state.config.links_path().display(),
        "Link store opened"
    );

    let sweeper = ExpirySweeper::new(state.link_service.clone(), interval)?.spawn();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    sweeper.stop().await?;
    Ok(())
}
