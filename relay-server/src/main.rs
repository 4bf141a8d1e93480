use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use relay_server::{
    config::Config,
    create_routes,
    rooms::RoomRegistry,
    websocket::{ConnectionManager, sweep_inactive},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    info!("Starting relay server...");

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let connection_manager = Arc::new(ConnectionManager::new());
    let rooms = Arc::new(RoomRegistry::new());

    let routes = create_routes(connection_manager.clone(), rooms.clone(), config.clone());

    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_rooms = rooms.clone();
    let connection_timeout = config.connection_timeout();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            let removed =
                sweep_inactive(&cleanup_connection_manager, &cleanup_rooms, connection_timeout)
                    .await;
            if removed > 0 {
                info!(
                    "Removed {} inactive connections, {} rooms open",
                    removed,
                    cleanup_rooms.room_count().await
                );
            }
        }
    });

    info!("Server starting on {}", addr);

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, shutdown_signal());

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        let (mut sigint, mut sigterm) =
            match (
                unix_signal(SignalKind::interrupt()),
                unix_signal(SignalKind::terminate()),
            ) {
                (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                _ => {
                    error!("Failed to install signal handlers, falling back to Ctrl+C");
                    let _ = signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", e);
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
