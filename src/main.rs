use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ppg_ctf::{api, config::GameConfig, state::AppState, store::LocalStorage};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ppg_ctf=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PPG CTF...");

    let config = GameConfig::from_env();

    let storage = match LocalStorage::open(&config.data_file).await {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            tracing::error!(
                "Failed to open storage at {}: {}",
                config.data_file.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let addr = config.bind_addr;
    let static_dir = config.static_dir.clone();
    let state = Arc::new(AppState::new(config, storage.clone(), storage));

    // Pick up the team from the last visit, resuming its countdown
    match state.restore().await {
        Some(session) => tracing::info!(
            "Restored team {} ({} points, {} left)",
            session.team.as_deref().unwrap_or_default(),
            session.total_score,
            session.clock
        ),
        None => tracing::info!("No active team, waiting for registration"),
    }

    let app = api::router(state.clone())
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    state.shutdown().await;
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutting down");
}
