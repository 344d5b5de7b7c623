//! Relay server
//!
//! Starts one supervisor per always-on stream, starts on-demand supervisors
//! lazily when someone subscribes, and tears everything down on shutdown.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::{RelayConfig, SupervisorConfig};
use crate::error::{Error, Result};
use crate::registry::{RunClaim, StreamRegistry, Viewer};
use crate::transport::Transport;

use super::supervisor::Supervisor;

/// Relay for a set of configured streams
pub struct Relay<T: Transport> {
    config: SupervisorConfig,
    transport: Arc<T>,
    registry: Arc<StreamRegistry>,
    supervisors: Mutex<HashMap<String, JoinHandle<Error>>>,
}

impl<T: Transport> Relay<T> {
    /// Create a relay over an existing registry
    pub fn new(config: SupervisorConfig, transport: T, registry: Arc<StreamRegistry>) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            registry,
            supervisors: Mutex::new(HashMap::new()),
        }
    }

    /// Create a relay and register every configured stream
    pub async fn from_config(config: RelayConfig, transport: T) -> Self {
        let registry = Arc::new(StreamRegistry::with_config(config.registry));
        for (name, stream) in config.streams {
            registry.register_stream(name, stream).await;
        }

        Self::new(config.supervisor, transport, registry)
    }

    /// Get a reference to the stream registry
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Start supervisors for all always-on streams
    ///
    /// Returns the number of supervisors started.
    pub async fn serve_streams(&self) -> usize {
        let mut started = 0;

        for name in self.registry.stream_names().await {
            let Some(config) = self.registry.stream_config(&name).await else {
                continue;
            };
            if !config.on_demand && self.spawn_supervisor(&name).await {
                started += 1;
            }
        }

        tracing::info!(supervisors = started, "Always-on streams started");
        started
    }

    /// Start an on-demand stream's supervisor unless one is already running
    ///
    /// Returns true if a supervisor was started. Always-on streams are left
    /// alone; `serve_streams` owns them.
    pub async fn run_if_not_run(&self, name: &str) -> bool {
        match self.registry.stream_config(name).await {
            Some(config) if config.on_demand => self.spawn_supervisor(name).await,
            _ => false,
        }
    }

    /// Start watching a stream
    ///
    /// The viewer is registered before the on-demand supervisor starts, so
    /// the first viewer check already sees it.
    pub async fn subscribe(&self, name: &str) -> Result<Viewer> {
        let viewer = self.registry.add_viewer(name).await?;
        self.run_if_not_run(name).await;
        Ok(viewer)
    }

    async fn spawn_supervisor(&self, name: &str) -> bool {
        let Some(claim) = self.registry.try_claim(name).await else {
            return false;
        };

        tracing::debug!(stream = %name, "Supervisor started");

        let handle = tokio::spawn(supervise(
            claim,
            Arc::clone(&self.transport),
            Arc::clone(&self.registry),
            self.config.clone(),
        ));
        // A finished handle for the same stream may still be here; replace it
        self.supervisors.lock().await.insert(name.to_string(), handle);
        true
    }

    /// Number of supervisors still running
    pub async fn active_supervisors(&self) -> usize {
        self.supervisors
            .lock()
            .await
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Stop all supervisors
    ///
    /// Aborting a supervisor drops its session, which releases the transport
    /// connection and the stream's run claim.
    pub async fn shutdown(&self) {
        let handles: Vec<(String, JoinHandle<Error>)> =
            self.supervisors.lock().await.drain().collect();

        for (_, handle) in &handles {
            handle.abort();
        }

        for (name, handle) in handles {
            match handle.await {
                Ok(reason) => {
                    tracing::debug!(stream = %name, reason = %reason, "Supervisor exited");
                }
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(stream = %name, "Supervisor stopped");
                }
                Err(e) => {
                    tracing::error!(stream = %name, error = %e, "Supervisor panicked");
                }
            }
        }
    }

    /// Serve all streams until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.serve_streams().await;

        shutdown.await;
        tracing::info!("Shutdown signal received");

        self.shutdown().await;
    }
}

/// Run supervisors for one stream until it stops with nobody watching
///
/// A viewer can subscribe after an on-demand supervisor saw no viewers but
/// before it released its claim. That subscribe fails to start a supervisor,
/// so once the claim is released the viewers are checked again here.
async fn supervise<T: Transport>(
    claim: RunClaim,
    transport: Arc<T>,
    registry: Arc<StreamRegistry>,
    config: SupervisorConfig,
) -> Error {
    let name = claim.stream_name().to_string();
    let mut claim = claim;

    loop {
        let supervisor = Supervisor::new(
            claim,
            Arc::clone(&transport),
            Arc::clone(&registry),
            config.clone(),
        );
        let reason = supervisor.run().await;
        if reason != Error::NoViewer {
            return reason;
        }

        match reclaim_if_watched(&registry, &name).await {
            Some(next) => {
                tracing::debug!(stream = %name, "Viewer arrived while stopping, restarting");
                claim = next;
            }
            None => return reason,
        }
    }
}

/// Take the run claim again if a viewer is waiting on the stream
async fn reclaim_if_watched(registry: &StreamRegistry, name: &str) -> Option<RunClaim> {
    if !registry.has_viewer(name).await {
        return None;
    }
    registry.try_claim(name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamConfig;

    async fn on_demand_registry() -> StreamRegistry {
        let registry = StreamRegistry::new();
        let config = StreamConfig::new("rtsp://cam").on_demand(true);
        registry.register_stream("cam", config).await;
        registry
    }

    #[tokio::test]
    async fn test_viewer_arriving_while_stopping_is_picked_up() {
        let registry = on_demand_registry().await;

        // The stopping supervisor still holds the claim when the viewer subscribes
        let stopping = registry.try_claim("cam").await.unwrap();
        let _viewer = registry.add_viewer("cam").await.unwrap();
        assert!(registry.try_claim("cam").await.is_none());

        drop(stopping);

        let claim = reclaim_if_watched(&registry, "cam").await;
        assert!(claim.is_some());
        assert!(registry.is_running("cam").await);
    }

    #[tokio::test]
    async fn test_no_reclaim_without_viewer() {
        let registry = on_demand_registry().await;

        assert!(reclaim_if_watched(&registry, "cam").await.is_none());
        assert!(!registry.is_running("cam").await);
    }

    #[tokio::test]
    async fn test_no_reclaim_when_already_restarted() {
        let registry = on_demand_registry().await;
        let _viewer = registry.add_viewer("cam").await.unwrap();

        // The viewer's own subscribe already started a new supervisor
        let _running = registry.try_claim("cam").await.unwrap();
        assert!(reclaim_if_watched(&registry, "cam").await.is_none());
    }
}
