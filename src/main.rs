//! Capture agent daemon.
//!
//! Runs the host bridge and a notification logger around a shared
//! settings store and relay.

use capture_agent::{BridgeConfig, HostBridge, NotificationRelay, SettingsStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Arc::new(SettingsStore::open(SettingsStore::default_path())?);
    let relay = NotificationRelay::new();

    // user-facing notification per successful capture
    let mut notices = relay.subscribe();
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => info!("Saved to {}", notice.result.topic),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let bridge = HostBridge::new(BridgeConfig::default(), settings, relay);

    println!("Starting capture agent...");
    println!("Socket: {:?}", bridge.socket_path());
    println!("Press Ctrl+C to stop");

    // Handle shutdown gracefully
    tokio::select! {
        result = bridge.run() => {
            if let Err(e) = result {
                error!("Bridge error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    // Clean up socket file
    if bridge.socket_path().exists() {
        std::fs::remove_file(bridge.socket_path())?;
    }

    Ok(())
}
