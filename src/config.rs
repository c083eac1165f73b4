//! Discovery session configuration.

use std::time::Duration;

/// Default length of one discovery session.
///
/// Classic Bluetooth discovery is a bounded inquiry of roughly this
/// length before the platform reports it finished.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(12);

/// Configuration for discovery sessions.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// How long one discovery session runs before it finishes.
    pub session_duration: Duration,

    /// Start a new session automatically whenever one finishes.
    pub continuous: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            session_duration: DEFAULT_SESSION_DURATION,
            continuous: false,
        }
    }
}

impl ScanConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session duration.
    pub fn session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = duration;
        self
    }

    /// Enable or disable continuous rescanning.
    pub fn continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.session_duration, DEFAULT_SESSION_DURATION);
        assert!(!config.continuous);
    }

    #[test]
    fn test_builder_setters() {
        let config = ScanConfig::new()
            .session_duration(Duration::from_secs(5))
            .continuous(true);

        assert_eq!(config.session_duration, Duration::from_secs(5));
        assert!(config.continuous);
    }
}
