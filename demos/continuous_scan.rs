//! Continuous scanning: a new session starts every time one finishes
//!
//! Run with: cargo run --example continuous_scan

use bluescan::{DiscoveryManager, Result, ScanConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bluescan=info".parse().unwrap()),
        )
        .init();

    let config = ScanConfig::new()
        .session_duration(Duration::from_secs(8))
        .continuous(true);

    let manager = DiscoveryManager::with_config(config).await?;

    let _devices_handle = manager.on_devices_changed(|devices| {
        println!("\n{} device(s):", devices.len());
        for device in &devices {
            println!("  {} [{}]", device.display_name(), device.address);
        }
    });

    let _status_handle = manager.on_status_changed(|status| {
        println!("Status: {:?}", status);
    });

    manager.toggle_discovery().await?;
    println!("Scanning continuously. Press Ctrl+C to exit.\n");

    tokio::signal::ctrl_c().await.ok();
    println!("\nInterrupted!");

    manager.shutdown().await?;
    Ok(())
}
