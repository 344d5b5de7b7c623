//! Media packets relayed from a source to its viewers
//!
//! Packets are designed to be cheap to clone: the payload is a
//! reference-counted `Bytes`, so every viewer shares one allocation.

use std::time::Duration;

use bytes::Bytes;

use super::codec::MediaType;

/// One demuxed media packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Track index the packet belongs to
    pub track: u8,
    /// Media type of the track
    pub media_type: MediaType,
    /// Presentation time relative to stream start
    pub timestamp: Duration,
    /// Packet duration, if known
    pub duration: Duration,
    /// Whether the packet can be decoded on its own
    pub is_keyframe: bool,
    /// Payload (zero-copy via reference counting)
    pub data: Bytes,
}

impl Packet {
    /// Create a video packet
    pub fn video(track: u8, timestamp: Duration, data: Bytes, is_keyframe: bool) -> Self {
        Self {
            track,
            media_type: MediaType::Video,
            timestamp,
            duration: Duration::ZERO,
            is_keyframe,
            data,
        }
    }

    /// Create an audio packet
    pub fn audio(track: u8, timestamp: Duration, data: Bytes) -> Self {
        Self {
            track,
            media_type: MediaType::Audio,
            timestamp,
            duration: Duration::ZERO,
            is_keyframe: false,
            data,
        }
    }

    /// Set the packet duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Check if this is an audio packet
    pub fn is_audio(&self) -> bool {
        self.media_type == MediaType::Audio
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let video = Packet::video(0, Duration::from_millis(40), Bytes::from_static(&[0x65]), true);
        assert!(video.is_keyframe);
        assert!(!video.is_audio());
        assert_eq!(video.size(), 1);

        let audio = Packet::audio(1, Duration::ZERO, Bytes::from_static(&[1, 2, 3]))
            .with_duration(Duration::from_millis(20));
        assert!(audio.is_audio());
        assert!(!audio.is_keyframe);
        assert_eq!(audio.duration, Duration::from_millis(20));
    }
}
