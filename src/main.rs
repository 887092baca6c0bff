use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use innkeep::api::{AppState, build_router};
use innkeep::config::Config;
use innkeep::engine::Engine;
use innkeep::sweeper;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    innkeep::observability::init_tracing();
    let config = Config::from_env();
    innkeep::observability::init_metrics(config.metrics_port)?;

    // Ensure data directory exists
    std::fs::create_dir_all(&config.data_dir)?;

    let engine = Arc::new(Engine::new(config.wal_path())?);
    if config.seed {
        engine.seed_sample_data().await?;
    }

    tokio::spawn(sweeper::run_compactor(engine.clone(), config.compact_threshold));
    if let Some(period) = config.reconcile_interval {
        tokio::spawn(sweeper::run_reconciler(engine.clone(), period));
    }

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("innkeep listening on {addr}");
    info!("  data_dir: {}", config.data_dir.display());
    info!(
        "  reconcile: {}",
        config
            .reconcile_interval
            .map_or("on write only".to_string(), |p| format!("every {}s", p.as_secs()))
    );
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let app = build_router(AppState {
        engine: engine.clone(),
    });
    // Stop accepting on SIGTERM/ctrl-c; in-flight requests finish first.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Compact on the way out.
    if let Err(e) = engine.compact_wal().await {
        tracing::warn!("final compaction failed: {e}");
    }
    info!("innkeep stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::error!("failed to register SIGTERM handler: {e}");
                ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
    info!("shutdown signal received, draining requests");
}
