//! Connection handle shared between a transport client and a session
//!
//! A transport implementation creates a pair with [`Connection::channel`],
//! returns the [`Connection`] from `dial` and keeps the [`ConnectionFeed`]
//! in its reader task:
//!
//! ```text
//!   transport reader task                      Session
//!   ┌──────────────────┐   packets (bounded)  ┌────────────┐
//!   │ ConnectionFeed   │ ───────────────────► │ Connection │
//!   │                  │   signals (bounded)  │            │
//!   │   closed().await │ ───────────────────► │  drop()    │
//!   └──────────────────┘ ◄─────────────────── └────────────┘
//! ```
//!
//! Dropping (or closing) the `Connection` closes both channels, which is how
//! the reader task learns that it should tear the remote session down.

use tokio::sync::mpsc;

use crate::media::{CodecData, Packet};

use super::Signal;

/// Returned by feed operations once the session side is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionClosed;

impl std::fmt::Display for ConnectionClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connection closed")
    }
}

impl std::error::Error for ConnectionClosed {}

/// Session-side handle to an open transport connection
#[derive(Debug)]
pub struct Connection {
    /// Codecs negotiated during setup
    codecs: Vec<CodecData>,

    /// Inbound media packets
    pub(crate) packets: mpsc::Receiver<Packet>,

    /// Inbound transport signals
    pub(crate) signals: mpsc::Receiver<Signal>,
}

impl Connection {
    /// Create a connection and the feed the transport pushes into
    ///
    /// `capacity` bounds both the packet and the signal queue.
    pub fn channel(codecs: Vec<CodecData>, capacity: usize) -> (Self, ConnectionFeed) {
        let capacity = capacity.max(1);
        let (packet_tx, packet_rx) = mpsc::channel(capacity);
        let (signal_tx, signal_rx) = mpsc::channel(capacity);

        let connection = Self {
            codecs,
            packets: packet_rx,
            signals: signal_rx,
        };
        let feed = ConnectionFeed {
            packets: packet_tx,
            signals: signal_tx,
        };

        (connection, feed)
    }

    /// Codecs negotiated at dial time
    pub fn codecs(&self) -> &[CodecData] {
        &self.codecs
    }

    /// Release the connection
    ///
    /// Equivalent to dropping it.
    pub fn close(self) {}
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.packets.close();
        self.signals.close();
        tracing::trace!("Transport connection released");
    }
}

/// Transport-side half of a [`Connection`]
#[derive(Debug, Clone)]
pub struct ConnectionFeed {
    packets: mpsc::Sender<Packet>,
    signals: mpsc::Sender<Signal>,
}

impl ConnectionFeed {
    /// Push a packet, waiting if the session is behind
    pub async fn send_packet(&self, packet: Packet) -> Result<(), ConnectionClosed> {
        self.packets.send(packet).await.map_err(|_| ConnectionClosed)
    }

    /// Push a packet without waiting
    ///
    /// Returns `Ok(false)` if the queue is full and the packet was dropped.
    pub fn try_send_packet(&self, packet: Packet) -> Result<bool, ConnectionClosed> {
        match self.packets.try_send(packet) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => Ok(false),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ConnectionClosed),
        }
    }

    /// Push a transport signal
    pub async fn send_signal(&self, signal: Signal) -> Result<(), ConnectionClosed> {
        self.signals.send(signal).await.map_err(|_| ConnectionClosed)
    }

    /// Wait until the session side releases the connection
    pub async fn closed(&self) {
        self.packets.closed().await;
    }

    /// Check if the session side has released the connection
    pub fn is_closed(&self) -> bool {
        self.packets.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::media::CodecType;

    #[tokio::test]
    async fn test_packets_flow_in_order() {
        let (mut conn, feed) = Connection::channel(Vec::new(), 8);

        for i in 0..3u8 {
            let timestamp = Duration::from_millis(i as u64 * 40);
            let packet = Packet::video(0, timestamp, Bytes::from(vec![i]), i == 0);
            feed.send_packet(packet).await.unwrap();
        }

        for i in 0..3u8 {
            let packet = conn.packets.recv().await.unwrap();
            assert_eq!(packet.data[0], i);
        }
    }

    #[tokio::test]
    async fn test_drop_closes_feed() {
        let codecs = vec![CodecData::video(CodecType::H264, 0, 640, 480)];
        let (conn, feed) = Connection::channel(codecs, 4);
        assert_eq!(conn.codecs().len(), 1);
        assert!(!feed.is_closed());

        conn.close();

        feed.closed().await;
        assert!(feed.is_closed());
        assert_eq!(feed.send_signal(Signal::StreamStop).await, Err(ConnectionClosed));
        let packet = Packet::audio(1, Duration::ZERO, Bytes::new());
        assert_eq!(feed.try_send_packet(packet), Err(ConnectionClosed));
    }

    #[tokio::test]
    async fn test_try_send_full() {
        let (_conn, feed) = Connection::channel(Vec::new(), 1);

        let packet = Packet::audio(0, Duration::ZERO, Bytes::new());
        assert_eq!(feed.try_send_packet(packet.clone()), Ok(true));
        assert_eq!(feed.try_send_packet(packet), Ok(false));
    }
}
