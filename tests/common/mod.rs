//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use rtsp_relay::error::TransportError;
use rtsp_relay::media::{CodecData, CodecType, Packet};
use rtsp_relay::transport::{Connection, ConnectionFeed, DialOptions, Transport};

enum Outcome {
    Connect(Connection),
    Fail(TransportError),
}

/// Transport that replays a scripted list of dial outcomes
///
/// Once the script runs out, every dial fails with a connect error.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Outcome>>>,
    dials: Arc<Mutex<Vec<(Instant, DialOptions)>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful dial; returns the feed driving that connection
    pub fn push_connection(&self, codecs: Vec<CodecData>) -> ConnectionFeed {
        let (connection, feed) = Connection::channel(codecs, 256);
        self.script
            .lock()
            .unwrap()
            .push_back(Outcome::Connect(connection));
        feed
    }

    /// Queue a failed dial
    pub fn push_failure(&self, error: TransportError) {
        self.script.lock().unwrap().push_back(Outcome::Fail(error));
    }

    pub fn dial_count(&self) -> usize {
        self.dials.lock().unwrap().len()
    }

    pub fn dial_times(&self) -> Vec<Instant> {
        self.dials.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub fn last_options(&self) -> Option<DialOptions> {
        self.dials.lock().unwrap().last().map(|(_, opts)| opts.clone())
    }
}

impl Transport for ScriptedTransport {
    async fn dial(&self, options: DialOptions) -> Result<Connection, TransportError> {
        self.dials.lock().unwrap().push((Instant::now(), options));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Outcome::Connect(connection)) => Ok(connection),
            Some(Outcome::Fail(error)) => Err(error),
            None => Err(TransportError::Connect("connection refused".into())),
        }
    }
}

pub fn video_codecs() -> Vec<CodecData> {
    vec![
        CodecData::video(CodecType::H264, 0, 1920, 1080),
        CodecData::audio(CodecType::Aac, 1, 48000, 2),
    ]
}

pub fn keyframe() -> Packet {
    Packet::video(0, Duration::ZERO, Bytes::from_static(&[0x00, 0x00, 0x01, 0x65]), true)
}

/// Send a keyframe every `period` until the session releases the connection
pub async fn feed_keyframes(feed: ConnectionFeed, period: Duration) {
    while feed.send_packet(keyframe()).await.is_ok() {
        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = feed.closed() => break,
        }
    }
}
