//! Stream registry implementation
//!
//! The central registry shared by supervisors, sessions and viewers. It owns
//! stream configuration, codec state, last errors, viewer counts and the
//! broadcast channels packets are fanned out on.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::media::{CodecData, Packet};

use super::config::RegistryConfig;
use super::entry::{RunClaim, StreamEntry, StreamStats, Viewer};

/// Central registry for all configured streams
///
/// Thread-safe via `RwLock`. The outer map is only write-locked to add or
/// remove streams; everything else takes a read lock on the map plus the
/// lock of a single entry, so unrelated streams never contend.
pub struct StreamRegistry {
    /// Map of stream name to stream entry
    streams: RwLock<HashMap<String, Arc<RwLock<StreamEntry>>>>,

    /// Configuration
    config: RegistryConfig,
}

impl StreamRegistry {
    /// Create a new stream registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new stream registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    async fn entry(&self, name: &str) -> Option<Arc<RwLock<StreamEntry>>> {
        self.streams.read().await.get(name).cloned()
    }

    /// Register a stream, or replace the configuration of an existing one
    ///
    /// Runtime state (viewers, codecs, run claim) survives a config update.
    pub async fn register_stream(&self, name: impl Into<String>, config: StreamConfig) {
        let name = name.into();
        let mut streams = self.streams.write().await;

        if let Some(entry_arc) = streams.get(&name) {
            entry_arc.write().await.config = config;
            tracing::info!(stream = %name, "Stream config updated");
        } else {
            tracing::info!(
                stream = %name,
                on_demand = config.on_demand,
                "Stream registered"
            );
            let entry = StreamEntry::new(config, &self.config);
            streams.insert(name, Arc::new(RwLock::new(entry)));
        }
    }

    /// Remove a stream
    ///
    /// Viewers of the stream see the end of their packet feed.
    pub async fn remove_stream(&self, name: &str) -> bool {
        let removed = self.streams.write().await.remove(name).is_some();
        if removed {
            tracing::info!(stream = %name, "Stream removed");
        }
        removed
    }

    /// Get the configuration of a stream
    pub async fn stream_config(&self, name: &str) -> Option<StreamConfig> {
        let entry_arc = self.entry(name).await?;
        let entry = entry_arc.read().await;
        Some(entry.config.clone())
    }

    /// Names of all registered streams, sorted
    pub async fn stream_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.streams.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get total number of streams
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    /// Publish the latest codec set of a stream
    pub async fn publish_codecs(&self, name: &str, codecs: Vec<CodecData>) {
        if let Some(entry_arc) = self.entry(name).await {
            let entry = entry_arc.read().await;
            tracing::debug!(stream = %name, tracks = codecs.len(), "Codecs published");
            entry.codec_updates.fetch_add(1, Ordering::Relaxed);
            entry.codecs.send_replace(codecs);
        }
    }

    /// Get the latest codec set of a stream
    pub async fn codecs(&self, name: &str) -> Option<Vec<CodecData>> {
        let entry_arc = self.entry(name).await?;
        let entry = entry_arc.read().await;
        Some(entry.codecs())
    }

    /// Wait for a stream's first codec set
    ///
    /// Returns immediately if codecs are already known. Returns `None` if the
    /// stream does not exist or no codecs arrive within
    /// `codec_wait_timeout`.
    pub async fn wait_codecs(&self, name: &str) -> Option<Vec<CodecData>> {
        let mut rx = {
            let entry_arc = self.entry(name).await?;
            let entry = entry_arc.read().await;
            entry.codecs.subscribe()
        };

        let wait = rx.wait_for(|codecs| !codecs.is_empty());
        let codecs = match tokio::time::timeout(self.config.codec_wait_timeout, wait).await {
            Ok(Ok(codecs)) => Some(codecs.clone()),
            Ok(Err(_)) => None,
            Err(_) => {
                tracing::debug!(stream = %name, "Timed out waiting for codecs");
                None
            }
        };
        codecs
    }

    /// Record the reason a session of this stream ended
    pub async fn record_error(&self, name: &str, error: Error) {
        if let Some(entry_arc) = self.entry(name).await {
            entry_arc.write().await.last_error = Some(error);
        }
    }

    /// Get the reason the most recent session of this stream ended
    pub async fn last_error(&self, name: &str) -> Option<Error> {
        let entry_arc = self.entry(name).await?;
        let entry = entry_arc.read().await;
        entry.last_error.clone()
    }

    /// Count a new session attempt
    pub async fn record_session_start(&self, name: &str) {
        if let Some(entry_arc) = self.entry(name).await {
            let entry = entry_arc.read().await;
            entry.sessions_started.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Check if anyone is watching a stream
    pub async fn has_viewer(&self, name: &str) -> bool {
        self.viewer_count(name).await > 0
    }

    /// Number of viewers of a stream (0 if it does not exist)
    pub async fn viewer_count(&self, name: &str) -> u32 {
        match self.entry(name).await {
            Some(entry_arc) => entry_arc.read().await.viewer_count(),
            None => 0,
        }
    }

    /// Add a viewer to a stream
    pub async fn add_viewer(&self, name: &str) -> Result<Viewer> {
        let entry_arc = self
            .entry(name)
            .await
            .ok_or_else(|| Error::StreamNotFound(name.to_string()))?;
        let entry = entry_arc.read().await;

        let viewer = entry.add_viewer(name);

        tracing::info!(
            stream = %name,
            viewers = entry.viewer_count(),
            "Viewer added"
        );

        Ok(viewer)
    }

    /// Forward a packet to all viewers of a stream
    ///
    /// Never waits on viewers: a slow viewer lags and skips packets instead.
    /// Returns the number of viewers the packet was delivered to.
    pub async fn forward(&self, name: &str, packet: Packet) -> usize {
        match self.entry(name).await {
            Some(entry_arc) => entry_arc.read().await.send(packet),
            None => 0,
        }
    }

    /// Take the per-stream run claim
    ///
    /// Returns `None` if the stream does not exist or a supervisor already
    /// holds the claim.
    pub async fn try_claim(&self, name: &str) -> Option<RunClaim> {
        let entry_arc = self.entry(name).await?;
        let entry = entry_arc.read().await;
        entry.try_claim(name)
    }

    /// Check if a supervisor currently runs a stream
    pub async fn is_running(&self, name: &str) -> bool {
        match self.entry(name).await {
            Some(entry_arc) => entry_arc.read().await.is_running(),
            None => false,
        }
    }

    /// Get stream statistics
    pub async fn stream_stats(&self, name: &str) -> Option<StreamStats> {
        let entry_arc = self.entry(name).await?;
        let entry = entry_arc.read().await;
        Some(entry.stats())
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
