//! Platform services gating discovery.
//!
//! Discovery needs more than an adapter: mobile platforms gate it behind
//! runtime location permissions and, on newer versions, an enabled
//! location service. Those facilities live behind one trait so the
//! trigger logic stays identical across hosts.

use async_trait::async_trait;

/// A runtime permission discovery may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Approximate location access.
    CoarseLocation,
    /// Precise location access.
    FineLocation,
}

/// The permissions required before a discovery session may start.
pub const REQUIRED_PERMISSIONS: [Permission; 2] =
    [Permission::CoarseLocation, Permission::FineLocation];

/// Access to the host's permission, location, and settings facilities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SystemServices: Send + Sync {
    /// Whether the given permission is currently granted.
    fn has_permission(&self, permission: Permission) -> bool;

    /// Ask the user to grant the given permissions.
    ///
    /// Resolves once the user has answered; returns whether the request
    /// was granted.
    async fn request_permissions(&self, permissions: &[Permission]) -> bool;

    /// Whether this platform requires an enabled location service before
    /// discovery may run.
    fn requires_location_service(&self) -> bool;

    /// Whether a location service is currently enabled.
    fn location_enabled(&self) -> bool;

    /// Send the user to the location settings screen.
    ///
    /// Resolves when the user returns. Callers re-check
    /// [`location_enabled`](Self::location_enabled) afterwards.
    async fn request_enable_location(&self) -> bool;

    /// Prompt the user to enable Bluetooth.
    ///
    /// Returns whether the adapter ended up enabled.
    async fn request_enable_bluetooth(&self) -> bool;
}

/// Platform services for desktop hosts.
///
/// Desktop OSes grant Bluetooth access at the process level and do not
/// couple discovery to a location service, so every check passes. There
/// is no enable prompt to show for the adapter; the Bluetooth prompt
/// reports it still disabled and enabling is left to the user.
#[derive(Debug, Default, Clone)]
pub struct HostServices;

#[async_trait]
impl SystemServices for HostServices {
    fn has_permission(&self, _permission: Permission) -> bool {
        true
    }

    async fn request_permissions(&self, _permissions: &[Permission]) -> bool {
        true
    }

    fn requires_location_service(&self) -> bool {
        false
    }

    fn location_enabled(&self) -> bool {
        true
    }

    async fn request_enable_location(&self) -> bool {
        true
    }

    async fn request_enable_bluetooth(&self) -> bool {
        false
    }
}
