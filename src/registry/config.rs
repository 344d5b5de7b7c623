//! Registry configuration

use std::time::Duration;

/// Configuration for the stream registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Capacity of each stream's broadcast channel (packets buffered per viewer)
    pub broadcast_capacity: usize,

    /// How long `wait_codecs` waits for the first codec set
    pub codec_wait_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 100,
            codec_wait_timeout: Duration::from_secs(5),
        }
    }
}

impl RegistryConfig {
    /// Set the broadcast capacity (minimum 1)
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }

    /// Set the codec wait timeout
    pub fn codec_wait_timeout(mut self, timeout: Duration) -> Self {
        self.codec_wait_timeout = timeout;
        self
    }
}
