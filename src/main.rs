use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use roombook::compactor;
use roombook::config::Config;
use roombook::engine::InMemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    roombook::observability::init(config.metrics_port)?;

    // Ensure data directory exists
    std::fs::create_dir_all(&config.data_dir)?;

    let journal = config.journal_path();
    let store = Arc::new(InMemoryStore::open(&journal)?);
    info!("roombook started");
    info!("  journal: {}", journal.display());
    info!("  rooms: {}, sessions: {}", store.room_count(), store.session_count());
    info!(
        "  compaction: every {:?} past {} appends",
        config.compact_interval, config.compact_threshold
    );
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let compactor_task = tokio::spawn(compactor::run_compactor(
        store.clone(),
        config.compact_threshold,
        config.compact_interval,
    ));

    // Graceful shutdown on SIGTERM/ctrl-c
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await?;
    }

    info!("shutdown signal received");
    compactor_task.abort();
    // Leave a minimal journal behind for the next start.
    store.compact()?;
    info!("roombook stopped");
    Ok(())
}
