//! Statistics for relay sessions

use std::time::Duration;

use tokio::time::Instant;

use crate::media::Packet;

/// Session-level statistics
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// When the session connected
    pub started_at: Instant,
    /// Total payload bytes forwarded
    pub bytes_forwarded: u64,
    /// Video packets forwarded
    pub video_packets: u64,
    /// Audio packets forwarded
    pub audio_packets: u64,
    /// Keyframes forwarded
    pub keyframes: u64,
    /// Codec updates received from the transport
    pub codec_updates: u64,
    /// Signals the session did not act on
    pub ignored_signals: u64,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            bytes_forwarded: 0,
            video_packets: 0,
            audio_packets: 0,
            keyframes: 0,
            codec_updates: 0,
            ignored_signals: 0,
        }
    }

    /// Account for a forwarded packet
    pub fn on_packet(&mut self, packet: &Packet) {
        self.bytes_forwarded += packet.size() as u64;
        if packet.is_audio() {
            self.audio_packets += 1;
        } else {
            self.video_packets += 1;
        }
        if packet.is_keyframe {
            self.keyframes += 1;
        }
    }

    /// Total packets forwarded
    pub fn packets(&self) -> u64 {
        self.video_packets + self.audio_packets
    }

    /// Time since the session connected
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Average bitrate in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.bytes_forwarded * 8) / secs
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn test_session_stats_new() {
        let stats = SessionStats::new();
        assert_eq!(stats.bytes_forwarded, 0);
        assert_eq!(stats.packets(), 0);
        assert_eq!(stats.keyframes, 0);
        assert_eq!(stats.codec_updates, 0);
    }

    #[test]
    fn test_on_packet() {
        let mut stats = SessionStats::new();

        stats.on_packet(&Packet::video(0, Duration::ZERO, Bytes::from_static(&[0; 100]), true));
        stats.on_packet(&Packet::video(0, Duration::ZERO, Bytes::from_static(&[0; 50]), false));
        stats.on_packet(&Packet::audio(1, Duration::ZERO, Bytes::from_static(&[0; 10])));

        assert_eq!(stats.video_packets, 2);
        assert_eq!(stats.audio_packets, 1);
        assert_eq!(stats.keyframes, 1);
        assert_eq!(stats.bytes_forwarded, 160);
        assert_eq!(stats.packets(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bitrate() {
        let mut stats = SessionStats::new();
        assert_eq!(stats.bitrate(), 0);

        stats.bytes_forwarded = 1_000_000;
        tokio::time::advance(Duration::from_secs(10)).await;

        // 1,000,000 bytes * 8 bits / 10 seconds
        assert_eq!(stats.bitrate(), 800_000);
    }
}
