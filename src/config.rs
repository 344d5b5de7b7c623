//! Relay configuration
//!
//! Plain structs with defaults and chained builder methods. Loading them
//! from a file is left to the embedding application.

use std::collections::HashMap;
use std::time::Duration;

use crate::registry::RegistryConfig;

/// Viewer-check interval used when a stream does not configure one
pub const DEFAULT_VIEWER_CHECK_INTERVAL: Duration = Duration::from_secs(20);

/// Per-stream source configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamConfig {
    /// Source address (e.g. `rtsp://camera.local/stream1`)
    pub url: String,

    /// Connect only while at least one viewer exists
    pub on_demand: bool,

    /// Ask the transport not to set up audio tracks
    pub disable_audio: bool,

    /// Passed through to the transport client
    pub debug: bool,

    /// Viewer-check interval in seconds (<= 0 selects the default)
    pub viewer_check_interval_secs: i64,
}

impl StreamConfig {
    /// Create an always-on stream config for the given source
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Make the stream on-demand
    pub fn on_demand(mut self, on_demand: bool) -> Self {
        self.on_demand = on_demand;
        self
    }

    /// Disable audio tracks
    pub fn disable_audio(mut self, disable: bool) -> Self {
        self.disable_audio = disable;
        self
    }

    /// Enable transport debug output
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the viewer-check interval in seconds
    pub fn viewer_check_interval_secs(mut self, secs: i64) -> Self {
        self.viewer_check_interval_secs = secs;
        self
    }

    /// Effective viewer-check interval
    pub fn viewer_check_interval(&self) -> Duration {
        if self.viewer_check_interval_secs <= 0 {
            DEFAULT_VIEWER_CHECK_INTERVAL
        } else {
            Duration::from_secs(self.viewer_check_interval_secs.max(1) as u64)
        }
    }
}

/// Timings shared by all supervisors
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Session ends if no qualifying packet arrives within this window
    pub keyframe_timeout: Duration,

    /// Pause between a session ending and the next dial
    pub retry_backoff: Duration,

    /// Connect timeout handed to the transport
    pub dial_timeout: Duration,

    /// Read/write timeout handed to the transport
    pub read_write_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            keyframe_timeout: Duration::from_secs(20),
            retry_backoff: Duration::from_secs(1),
            dial_timeout: Duration::from_secs(10),
            read_write_timeout: Duration::from_secs(10),
        }
    }
}

impl SupervisorConfig {
    /// Set the keyframe timeout
    pub fn keyframe_timeout(mut self, timeout: Duration) -> Self {
        self.keyframe_timeout = timeout;
        self
    }

    /// Set the retry backoff
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// Top-level relay configuration
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    /// Configured streams keyed by name
    pub streams: HashMap<String, StreamConfig>,

    /// Supervisor timings
    pub supervisor: SupervisorConfig,

    /// Registry settings
    pub registry: RegistryConfig,
}

impl RelayConfig {
    /// Add a stream
    pub fn stream(mut self, name: impl Into<String>, config: StreamConfig) -> Self {
        self.streams.insert(name.into(), config);
        self
    }

    /// Set supervisor timings
    pub fn supervisor(mut self, config: SupervisorConfig) -> Self {
        self.supervisor = config;
        self
    }

    /// Set registry settings
    pub fn registry(mut self, config: RegistryConfig) -> Self {
        self.registry = config;
        self
    }
}
