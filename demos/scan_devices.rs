//! Basic example: scan for nearby Bluetooth devices
//!
//! Run with: cargo run --example scan_devices

use bluescan::{DiscoveryAction, DiscoveryManager, DiscoveryStatus, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bluescan=debug".parse().unwrap()),
        )
        .init();

    println!("Starting Bluetooth device discovery...\n");

    let manager = DiscoveryManager::new().await?;

    // Print the list as it grows (progressive during the first session)
    let _devices_handle = manager.on_devices_changed(|devices| {
        println!("\nDevices so far:");
        for device in &devices {
            println!("  {} [{}]", device.display_name(), device.address);
        }
    });

    let _status_handle = manager.on_status_changed(|status| {
        println!("Discovery status: {:?}", status);
    });

    match manager.toggle_discovery().await? {
        DiscoveryAction::Started => println!("Discovery started"),
        DiscoveryAction::Cancelled => println!("Discovery cancelled"),
    }

    // Wait for the session to finish, or Ctrl+C
    let mut status = manager.status();
    tokio::select! {
        _ = async {
            while status.changed().await.is_ok() {
                if *status.borrow() == Some(DiscoveryStatus::Finished) {
                    break;
                }
            }
        } => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted!");
        }
    }

    println!("\n--- Scan Complete ---");
    println!("Total devices found: {}", manager.device_count());

    let devices = manager.devices();
    for device in devices.borrow().iter() {
        println!("  {} [{}]", device.display_name(), device.address);
    }

    manager.shutdown().await?;
    println!("\nDone!");

    Ok(())
}
