//! Transport client seam
//!
//! The relay does not speak RTSP itself. A [`Transport`] dials a source and
//! hands back a [`Connection`] carrying the negotiated codecs plus two
//! inbound queues: media packets and transport [`Signal`]s.

pub mod connection;

use std::future::Future;
use std::time::Duration;

pub use connection::{Connection, ConnectionClosed, ConnectionFeed};

use crate::config::{StreamConfig, SupervisorConfig};
use crate::error::TransportError;
use crate::media::CodecData;

/// Options passed to [`Transport::dial`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialOptions {
    /// Source address
    pub url: String,
    /// Skip audio tracks during setup
    pub disable_audio: bool,
    /// Connect timeout
    pub dial_timeout: Duration,
    /// Read/write timeout once connected
    pub read_write_timeout: Duration,
    /// Verbose transport logging
    pub debug: bool,
}

impl DialOptions {
    /// Build dial options for a stream
    pub fn new(stream: &StreamConfig, timings: &SupervisorConfig) -> Self {
        Self {
            url: stream.url.clone(),
            disable_audio: stream.disable_audio,
            dial_timeout: timings.dial_timeout,
            read_write_timeout: timings.read_write_timeout,
            debug: stream.debug,
        }
    }
}

/// Out-of-band notification from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Codec set changed mid-stream (e.g. new SPS/PPS)
    CodecUpdate(Vec<CodecData>),
    /// Remote stream stopped
    StreamStop,
    /// Anything else; ignored by the session
    Other(String),
}

/// Client capable of opening connections to media sources
///
/// Implementations may use `async fn dial` directly; the returned future
/// must be `Send` so supervisors can run on the multi-threaded runtime.
pub trait Transport: Send + Sync + 'static {
    /// Open a connection to `options.url`
    fn dial(
        &self,
        options: DialOptions,
    ) -> impl Future<Output = Result<Connection, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_options_from_config() {
        let stream = StreamConfig::new("rtsp://cam/1")
            .disable_audio(true)
            .debug(true);
        let options = DialOptions::new(&stream, &SupervisorConfig::default());

        assert_eq!(options.url, "rtsp://cam/1");
        assert!(options.disable_audio);
        assert!(options.debug);
        assert_eq!(options.dial_timeout, Duration::from_secs(10));
        assert_eq!(options.read_write_timeout, Duration::from_secs(10));
    }
}
