//! Codec Interface
//!
//! The harness drives a codec only through the traits in this module. A codec state is
//! allocated once per pipeline run and released when its box is dropped.

pub mod adpcm;

pub use adpcm::{AdpcmCodec, AdpcmDecoder, AdpcmEncoder};

use serde::{Deserialize, Serialize};
use crate::error::{HarnessError, Result};

/// Largest frame, in samples, of any supported variant
pub const MAX_FRAME_SIZE: usize = 80;

/// Largest coded frame, in bits, of any supported variant
pub const MAX_BITS_PER_FRAME: usize = 160;

/// Supported codec variants, one per bit rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodecVariant {
    Bv16,
    Bv32,
}

impl CodecVariant {
    pub fn from_bit_rate(bit_rate: u32) -> Result<Self> {
        match bit_rate {
            16000 => Ok(Self::Bv16),
            32000 => Ok(Self::Bv32),
            other => Err(HarnessError::config(format!(
                "Bit rate must be 16000 or 32000, got {}", other
            ))),
        }
    }

    pub fn bit_rate(&self) -> u32 {
        match self {
            Self::Bv16 => 16000,
            Self::Bv32 => 32000,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::Bv16 => 8000,
            Self::Bv32 => 16000,
        }
    }

    /// 5ms of audio at the variant's sample rate
    pub fn frame_size(&self) -> usize {
        match self.sample_rate() {
            8000 => MAX_FRAME_SIZE >> 1,
            _ => MAX_FRAME_SIZE,
        }
    }

    pub fn bits_per_frame(&self) -> usize {
        (self.bit_rate() / 200) as usize
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Bv16 => "BroadVoice16, 3.4kHz bandwidth",
            Self::Bv32 => "BroadVoice32, 7.1kHz bandwidth",
        }
    }
}

/// Encoder state for one variant
pub trait FrameEncoder {
    /// Encode one full frame of PCM into `code` (bits_per_frame / 8 bytes)
    fn encode(&mut self, pcm: &[i16], code: &mut [u8]);
}

/// Decoder state for one variant
pub trait FrameDecoder {
    /// Decode one coded frame into a full frame of PCM
    fn decode(&mut self, code: &[u8], pcm: &mut [i16]);

    /// Synthesize a replacement frame for a lost one from the decoder's history
    fn conceal(&mut self, pcm: &mut [i16]);
}

/// Allocates codec state matching a variant
pub trait CodecFactory {
    fn allocate_encoder(&self, variant: CodecVariant) -> Result<Box<dyn FrameEncoder>>;
    fn allocate_decoder(&self, variant: CodecVariant) -> Result<Box<dyn FrameDecoder>>;
}
