//! Bluetooth adapter access.
//!
//! The scanner that runs discovery sessions and the raw event vocabulary
//! it relays.

pub mod events;
pub mod scanner;

pub use events::ScanEvent;
pub use scanner::{BleScanner, DiscoveryControl};
