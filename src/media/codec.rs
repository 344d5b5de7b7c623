//! Negotiated codec descriptions
//!
//! The transport reports one [`CodecData`] per track it set up. The relay
//! never decodes media; it only needs to know what each track carries.

/// Kind of media carried by a track or packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Video track
    Video,
    /// Audio track
    Audio,
}

/// Codec of a negotiated track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecType {
    /// H.264/AVC
    H264,
    /// H.265/HEVC
    H265,
    /// Motion JPEG
    Mjpeg,
    /// AAC (MPEG-4 audio)
    Aac,
    /// Opus
    Opus,
    /// G.711 mu-law
    Pcmu,
    /// G.711 A-law
    Pcma,
}

impl CodecType {
    /// Media type carried by this codec
    pub fn media_type(&self) -> MediaType {
        match self {
            CodecType::H264 | CodecType::H265 | CodecType::Mjpeg => MediaType::Video,
            CodecType::Aac | CodecType::Opus | CodecType::Pcmu | CodecType::Pcma => {
                MediaType::Audio
            }
        }
    }

    /// Check if this is an audio codec
    pub fn is_audio(&self) -> bool {
        self.media_type() == MediaType::Audio
    }

    /// Check if this is a video codec
    pub fn is_video(&self) -> bool {
        self.media_type() == MediaType::Video
    }

    /// Short codec name as used in SDP
    pub fn name(&self) -> &'static str {
        match self {
            CodecType::H264 => "H264",
            CodecType::H265 => "H265",
            CodecType::Mjpeg => "JPEG",
            CodecType::Aac => "MPEG4-GENERIC",
            CodecType::Opus => "OPUS",
            CodecType::Pcmu => "PCMU",
            CodecType::Pcma => "PCMA",
        }
    }
}

/// Description of one negotiated track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecData {
    /// Codec of the track
    pub codec: CodecType,

    /// Track index, matches [`Packet::track`](super::Packet::track)
    pub track: u8,

    /// Video width in pixels
    pub width: Option<u32>,

    /// Video height in pixels
    pub height: Option<u32>,

    /// Audio sample rate in Hz
    pub sample_rate: Option<u32>,

    /// Audio channel count
    pub channels: Option<u8>,
}

impl CodecData {
    /// Create a video track description
    pub fn video(codec: CodecType, track: u8, width: u32, height: u32) -> Self {
        Self {
            codec,
            track,
            width: Some(width),
            height: Some(height),
            sample_rate: None,
            channels: None,
        }
    }

    /// Create an audio track description
    pub fn audio(codec: CodecType, track: u8, sample_rate: u32, channels: u8) -> Self {
        Self {
            codec,
            track,
            width: None,
            height: None,
            sample_rate: Some(sample_rate),
            channels: Some(channels),
        }
    }

    /// Media type of the track
    pub fn media_type(&self) -> MediaType {
        self.codec.media_type()
    }
}

/// True iff there is exactly one track and it is audio
pub fn is_audio_only(codecs: &[CodecData]) -> bool {
    matches!(codecs, [only] if only.codec.is_audio())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_types() {
        assert!(CodecType::H264.is_video());
        assert!(CodecType::Mjpeg.is_video());
        assert!(CodecType::Aac.is_audio());
        assert!(CodecType::Pcma.is_audio());
        assert!(!CodecType::Opus.is_video());
    }

    #[test]
    fn test_audio_only() {
        let aac = CodecData::audio(CodecType::Aac, 0, 44100, 2);
        let h264 = CodecData::video(CodecType::H264, 0, 1920, 1080);

        assert!(is_audio_only(&[aac.clone()]));
        assert!(!is_audio_only(&[h264.clone()]));
        assert!(!is_audio_only(&[h264, aac.clone()]));
        // Two audio tracks is not "exactly one"
        assert!(!is_audio_only(&[aac.clone(), aac]));
        assert!(!is_audio_only(&[]));
    }
}
