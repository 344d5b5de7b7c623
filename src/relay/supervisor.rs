//! Per-stream retry loop
//!
//! ```text
//!              ┌────────────┐  dial ok   ┌─────────┐
//!   start ───► │ Connecting │ ─────────► │ Running │
//!              └────────────┘            └─────────┘
//!                 ▲      │ dial failed        │ session ended
//!                 │      ▼                    ▼
//!                 │   ┌──────────────────────────┐  on-demand and
//!                 └── │         Backoff          │ ─ no viewer ──► Stopped
//!                     └──────────────────────────┘
//! ```
//!
//! Sessions run strictly one after another, and the supervisor holds the
//! stream's [`RunClaim`] for its whole life, so at most one session per
//! stream name is ever active.

use std::sync::Arc;

use crate::config::SupervisorConfig;
use crate::error::Error;
use crate::registry::{RunClaim, StreamRegistry};
use crate::session::Session;
use crate::transport::Transport;

/// Supervisor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Dialing the source
    Connecting,
    /// A session is running
    Running,
    /// Waiting before the next dial
    Backoff,
    /// Loop has exited
    Stopped,
}

impl SupervisorState {
    /// State to enter once a session has ended
    pub fn after_session(on_demand: bool, has_viewer: bool) -> Self {
        if on_demand && !has_viewer {
            SupervisorState::Stopped
        } else {
            SupervisorState::Backoff
        }
    }
}

/// Retry loop for one stream
pub struct Supervisor<T: Transport> {
    name: String,
    _claim: RunClaim,
    transport: Arc<T>,
    registry: Arc<StreamRegistry>,
    config: SupervisorConfig,
    state: SupervisorState,
}

impl<T: Transport> Supervisor<T> {
    /// Create a supervisor for the stream named by `claim`
    pub fn new(
        claim: RunClaim,
        transport: Arc<T>,
        registry: Arc<StreamRegistry>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            name: claim.stream_name().to_string(),
            _claim: claim,
            transport,
            registry,
            config,
            state: SupervisorState::Connecting,
        }
    }

    /// Name of the supervised stream
    pub fn stream_name(&self) -> &str {
        &self.name
    }

    /// Current state
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    fn transition(&mut self, next: SupervisorState) {
        tracing::trace!(
            stream = %self.name,
            from = ?self.state,
            to = ?next,
            "Supervisor state change"
        );
        self.state = next;
    }

    /// Run sessions until the stream should stop
    ///
    /// Always-on streams never return on their own. On-demand streams return
    /// `Error::NoViewer` once a session ends with nobody watching. Returns
    /// `Error::StreamNotFound` if the stream is removed from the registry.
    /// The run claim is released when this returns or the future is dropped.
    pub async fn run(mut self) -> Error {
        loop {
            self.transition(SupervisorState::Connecting);

            let Some(stream) = self.registry.stream_config(&self.name).await else {
                self.transition(SupervisorState::Stopped);
                tracing::warn!(stream = %self.name, "Stream no longer configured");
                return Error::StreamNotFound(self.name.clone());
            };

            tracing::info!(stream = %self.name, url = %stream.url, "Stream try connect");
            self.registry.record_session_start(&self.name).await;

            let reason = match Session::connect(
                &self.name,
                &stream,
                &self.config,
                self.transport.as_ref(),
                Arc::clone(&self.registry),
            )
            .await
            {
                Ok(session) => {
                    self.transition(SupervisorState::Running);
                    session.run().await
                }
                Err(e) => e,
            };

            tracing::warn!(stream = %self.name, error = %reason, "Stream session failed");
            self.registry.record_error(&self.name, reason.clone()).await;

            let has_viewer = self.registry.has_viewer(&self.name).await;
            match SupervisorState::after_session(stream.on_demand, has_viewer) {
                SupervisorState::Stopped => {
                    self.transition(SupervisorState::Stopped);
                    tracing::info!(stream = %self.name, "{}", Error::NoViewer);
                    return Error::NoViewer;
                }
                next => self.transition(next),
            }

            tokio::time::sleep(self.config.retry_backoff).await;
        }
    }
}
