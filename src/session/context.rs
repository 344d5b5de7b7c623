//! Session context
//!
//! Everything a running session needs to know about itself, fixed at
//! connect time.

use std::time::Duration;

use crate::config::{StreamConfig, SupervisorConfig};
use crate::media::{self, CodecData};

/// Per-session settings derived from configuration and negotiated codecs
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Stream name
    pub stream: String,

    /// Source address
    pub url: String,

    /// Stop when nobody is watching
    pub on_demand: bool,

    /// Every packet counts as a keyframe for liveness purposes
    ///
    /// Computed once from the codecs negotiated at dial time.
    pub audio_only: bool,

    /// Maximum gap between qualifying packets
    pub keyframe_timeout: Duration,

    /// Interval between viewer checks (on-demand only)
    pub viewer_check_interval: Duration,
}

impl SessionContext {
    /// Create a new context
    pub fn new(
        stream: impl Into<String>,
        config: &StreamConfig,
        timings: &SupervisorConfig,
        codecs: &[CodecData],
    ) -> Self {
        Self {
            stream: stream.into(),
            url: config.url.clone(),
            on_demand: config.on_demand,
            audio_only: media::is_audio_only(codecs),
            keyframe_timeout: timings.keyframe_timeout,
            viewer_check_interval: config.viewer_check_interval(),
        }
    }

    /// Whether a packet resets the keyframe timer
    pub fn is_liveness_packet(&self, is_keyframe: bool) -> bool {
        self.audio_only || is_keyframe
    }
}
