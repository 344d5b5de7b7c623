//! Media model
//!
//! This module provides:
//! - Codec descriptions for negotiated tracks
//! - The packet type relayed from sources to viewers

pub mod codec;
pub mod packet;

pub use codec::{is_audio_only, CodecData, CodecType, MediaType};
pub use packet::Packet;
