//! Stream entry, viewer and run-claim types
//!
//! This module defines the per-stream state stored in the registry and the
//! RAII handles given out to viewers and supervisors.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::config::StreamConfig;
use crate::error::Error;
use crate::media::{CodecData, Packet};

use super::config::RegistryConfig;

/// Entry for a single configured stream
pub struct StreamEntry {
    /// Source configuration, read at each session start
    pub config: StreamConfig,

    /// Latest negotiated codec set (empty until the first session publishes)
    pub(super) codecs: watch::Sender<Vec<CodecData>>,

    /// Broadcast sender for fan-out to viewers
    pub(super) tx: broadcast::Sender<Packet>,

    /// Number of live viewers, shared with every [`Viewer`]
    pub(super) viewers: Arc<AtomicU32>,

    /// Set while a supervisor holds the run claim
    pub(super) running: Arc<AtomicBool>,

    /// Reason the most recent session ended
    pub last_error: Option<Error>,

    /// Sessions started (dial attempts)
    pub(super) sessions_started: AtomicU64,

    /// Packets handed to the broadcast channel
    pub(super) packets_forwarded: AtomicU64,

    /// Keyframes among the forwarded packets
    pub(super) keyframes_forwarded: AtomicU64,

    /// Codec sets published (on connect and on codec updates)
    pub(super) codec_updates: AtomicU64,
}

impl StreamEntry {
    /// Create a new stream entry
    pub(super) fn new(config: StreamConfig, registry_config: &RegistryConfig) -> Self {
        let (tx, _) = broadcast::channel(registry_config.broadcast_capacity);
        let (codecs, _) = watch::channel(Vec::new());

        Self {
            config,
            codecs,
            tx,
            viewers: Arc::new(AtomicU32::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            last_error: None,
            sessions_started: AtomicU64::new(0),
            packets_forwarded: AtomicU64::new(0),
            keyframes_forwarded: AtomicU64::new(0),
            codec_updates: AtomicU64::new(0),
        }
    }

    /// Get the number of viewers
    pub fn viewer_count(&self) -> u32 {
        self.viewers.load(Ordering::Relaxed)
    }

    /// Check if a supervisor currently runs this stream
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Snapshot of the current codec set
    pub fn codecs(&self) -> Vec<CodecData> {
        self.codecs.borrow().clone()
    }

    /// Send a packet to all viewers
    ///
    /// Returns the number of viewers that received it (0 if nobody is watching).
    pub(super) fn send(&self, packet: Packet) -> usize {
        self.packets_forwarded.fetch_add(1, Ordering::Relaxed);
        if packet.is_keyframe {
            self.keyframes_forwarded.fetch_add(1, Ordering::Relaxed);
        }
        self.tx.send(packet).unwrap_or(0)
    }

    /// Add a viewer
    pub(super) fn add_viewer(&self, name: &str) -> Viewer {
        let rx = self.tx.subscribe();
        self.viewers.fetch_add(1, Ordering::Relaxed);

        Viewer {
            stream: name.to_string(),
            rx,
            viewers: Arc::clone(&self.viewers),
        }
    }

    /// Take the run claim if nobody holds it
    pub(super) fn try_claim(&self, name: &str) -> Option<RunClaim> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunClaim {
                stream: name.to_string(),
                running: Arc::clone(&self.running),
            })
    }

    /// Build a stats snapshot
    pub(super) fn stats(&self) -> StreamStats {
        StreamStats {
            viewer_count: self.viewer_count(),
            running: self.is_running(),
            on_demand: self.config.on_demand,
            codecs: self.codecs(),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            packets_forwarded: self.packets_forwarded.load(Ordering::Relaxed),
            keyframes_forwarded: self.keyframes_forwarded.load(Ordering::Relaxed),
            codec_updates: self.codec_updates.load(Ordering::Relaxed),
            last_error: self.last_error.clone(),
        }
    }
}

/// Statistics for a stream
#[derive(Debug, Clone)]
pub struct StreamStats {
    /// Number of live viewers
    pub viewer_count: u32,
    /// Whether a supervisor is running the stream
    pub running: bool,
    /// Whether the stream is on-demand
    pub on_demand: bool,
    /// Latest codec set
    pub codecs: Vec<CodecData>,
    /// Sessions started since registration
    pub sessions_started: u64,
    /// Packets forwarded to viewers
    pub packets_forwarded: u64,
    /// Keyframes forwarded to viewers
    pub keyframes_forwarded: u64,
    /// Codec sets published
    pub codec_updates: u64,
    /// Reason the most recent session ended
    pub last_error: Option<Error>,
}

/// A consumer of one stream's packets
///
/// Counts as a viewer until dropped.
#[derive(Debug)]
pub struct Viewer {
    stream: String,
    rx: broadcast::Receiver<Packet>,
    viewers: Arc<AtomicU32>,
}

impl Viewer {
    /// Name of the stream being watched
    pub fn stream_name(&self) -> &str {
        &self.stream
    }

    /// Receive the next packet
    ///
    /// A viewer that falls behind skips the packets it missed. Returns `None`
    /// once the stream is removed from the registry.
    pub async fn recv(&mut self) -> Option<Packet> {
        loop {
            match self.rx.recv().await {
                Ok(packet) => return Some(packet),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        stream = %self.stream,
                        skipped = skipped,
                        "Viewer lagging, packets skipped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        let prev = self.viewers.fetch_sub(1, Ordering::Relaxed);

        tracing::debug!(
            stream = %self.stream,
            viewers = prev.saturating_sub(1),
            "Viewer removed"
        );
    }
}

/// Exclusive right to run a stream's supervisor
///
/// Released when dropped, including when the owning task is aborted.
#[derive(Debug)]
pub struct RunClaim {
    stream: String,
    running: Arc<AtomicBool>,
}

impl RunClaim {
    /// Name of the claimed stream
    pub fn stream_name(&self) -> &str {
        &self.stream
    }
}

impl Drop for RunClaim {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        tracing::debug!(stream = %self.stream, "Run claim released");
    }
}
