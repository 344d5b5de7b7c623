//! Single connection lifecycle
//!
//! A [`Session`] owns one open transport connection and runs an event loop
//! over four sources until one of them ends it:
//!
//! | Source              | Effect                                              |
//! |---------------------|-----------------------------------------------------|
//! | transport signal    | codec update republishes; stream stop ends session  |
//! | keyframe timer      | ends session with `NoVideoOnStream`                 |
//! | viewer-check timer  | on-demand only: no viewer ends with `NoViewer`      |
//! | packet              | keyframe (or any audio-only packet) resets timer;   |
//! |                     | packet is forwarded to viewers                      |
//!
//! The select is biased in table order. A stop signal always wins, and a
//! deadline that has already elapsed wins over a packet that became ready
//! at the same instant. Timers are checked before packets on every
//! iteration, so a packet flood cannot starve them.

use std::sync::Arc;

use tokio::time::{sleep, Instant};

use crate::config::{StreamConfig, SupervisorConfig};
use crate::error::{Error, Result, TransportError};
use crate::registry::StreamRegistry;
use crate::stats::SessionStats;
use crate::transport::{Connection, DialOptions, Signal, Transport};

use super::context::SessionContext;

/// One live connection to a stream's source
pub struct Session {
    ctx: SessionContext,
    connection: Connection,
    registry: Arc<StreamRegistry>,
}

impl Session {
    /// Dial the source and set up a session
    ///
    /// A dial failure is returned as `Error::Dial` carrying the transport
    /// error unchanged.
    pub async fn connect<T: Transport>(
        name: &str,
        config: &StreamConfig,
        timings: &SupervisorConfig,
        transport: &T,
        registry: Arc<StreamRegistry>,
    ) -> Result<Self> {
        let options = DialOptions::new(config, timings);

        let dial = tokio::time::timeout(timings.dial_timeout, transport.dial(options));
        let connection = match dial.await {
            Ok(result) => result?,
            Err(_) => return Err(TransportError::Timeout(timings.dial_timeout).into()),
        };

        Ok(Self::attach(name, config, timings, connection, registry).await)
    }

    /// Set up a session on an already open connection
    pub async fn attach(
        name: &str,
        config: &StreamConfig,
        timings: &SupervisorConfig,
        connection: Connection,
        registry: Arc<StreamRegistry>,
    ) -> Self {
        let codecs = connection.codecs().to_vec();
        if !codecs.is_empty() {
            registry.publish_codecs(name, codecs.clone()).await;
        }

        let ctx = SessionContext::new(name, config, timings, &codecs);

        tracing::info!(
            stream = %ctx.stream,
            url = %ctx.url,
            tracks = codecs.len(),
            audio_only = ctx.audio_only,
            "Stream connected"
        );

        Self {
            ctx,
            connection,
            registry,
        }
    }

    /// Get the session context
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Run the event loop until the session ends
    ///
    /// Every exit is one of `NoVideoOnStream`, `RtspDisconnect` or
    /// `NoViewer`. The connection is released when this returns, or when
    /// the future is dropped.
    pub async fn run(self) -> Error {
        let Session {
            ctx,
            mut connection,
            registry,
        } = self;

        let mut stats = SessionStats::new();

        let keyframe_timer = sleep(ctx.keyframe_timeout);
        let viewer_timer = sleep(ctx.viewer_check_interval);
        tokio::pin!(keyframe_timer);
        tokio::pin!(viewer_timer);

        let reason = loop {
            tokio::select! {
                biased;

                signal = connection.signals.recv() => match signal {
                    Some(Signal::CodecUpdate(codecs)) => {
                        stats.codec_updates += 1;
                        tracing::debug!(
                            stream = %ctx.stream,
                            tracks = codecs.len(),
                            "Codec update"
                        );
                        registry.publish_codecs(&ctx.stream, codecs).await;
                    }
                    Some(Signal::StreamStop) => break Error::RtspDisconnect,
                    Some(Signal::Other(kind)) => {
                        stats.ignored_signals += 1;
                        tracing::trace!(stream = %ctx.stream, signal = %kind, "Ignoring signal");
                    }
                    // Transport went away without saying goodbye
                    None => break Error::RtspDisconnect,
                },

                _ = &mut keyframe_timer => break Error::NoVideoOnStream,

                _ = &mut viewer_timer, if ctx.on_demand => {
                    if !registry.has_viewer(&ctx.stream).await {
                        break Error::NoViewer;
                    }
                    viewer_timer
                        .as_mut()
                        .reset(Instant::now() + ctx.viewer_check_interval);
                }

                packet = connection.packets.recv() => match packet {
                    Some(packet) => {
                        if ctx.is_liveness_packet(packet.is_keyframe) {
                            keyframe_timer
                                .as_mut()
                                .reset(Instant::now() + ctx.keyframe_timeout);
                        }
                        stats.on_packet(&packet);
                        registry.forward(&ctx.stream, packet).await;
                    }
                    None => break Error::RtspDisconnect,
                },
            }
        };

        tracing::info!(
            stream = %ctx.stream,
            reason = %reason,
            packets = stats.packets(),
            keyframes = stats.keyframes,
            codec_updates = stats.codec_updates,
            ignored_signals = stats.ignored_signals,
            duration_secs = stats.duration().as_secs(),
            bitrate = stats.bitrate(),
            "Stream session ended"
        );

        reason
    }
}
