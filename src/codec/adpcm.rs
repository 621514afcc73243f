//! Reference two-bit adaptive differential codec
//!
//! Each sample is coded as a sign bit and a magnitude bit against an adaptive step, so a frame of
//! N samples packs into exactly 2N bits. That matches the bits-per-frame of both variants
//! (40 samples -> 80 bits, 80 samples -> 160 bits).

use log::debug;
use super::{CodecFactory, CodecVariant, FrameDecoder, FrameEncoder, MAX_FRAME_SIZE};
use crate::error::Result;

const MIN_STEP: i32 = 16;
const MAX_STEP: i32 = 8192;
const INITIAL_STEP: i32 = 64;

const SIGN_BIT: u8 = 0b10;
const MAGNITUDE_BIT: u8 = 0b01;

/// Predictor shared by the encoder and decoder; both sides run identical reconstruction.
#[derive(Debug, Clone)]
struct Predictor {
    predicted: i32,
    step: i32,
}

impl Predictor {
    fn new() -> Self {
        Self { predicted: 0, step: INITIAL_STEP }
    }

    fn quantize(&self, sample: i16) -> u8 {
        let diff = sample as i32 - self.predicted;
        let sign = if diff < 0 { SIGN_BIT } else { 0 };
        let magnitude = if diff.abs() >= self.step { MAGNITUDE_BIT } else { 0 };
        sign | magnitude
    }

    fn reconstruct(&mut self, code: u8) -> i16 {
        let large = code & MAGNITUDE_BIT != 0;
        let magnitude = if large { self.step + self.step / 2 } else { self.step / 2 };
        let delta = if code & SIGN_BIT != 0 { -magnitude } else { magnitude };

        self.predicted = (self.predicted + delta).clamp(i16::MIN as i32, i16::MAX as i32);
        let step = if large { self.step * 3 / 2 } else { self.step * 7 / 8 };
        self.step = step.clamp(MIN_STEP, MAX_STEP);

        self.predicted as i16
    }
}

fn pack_code(code: &mut [u8], index: usize, value: u8) {
    let shift = 6 - 2 * (index % 4);
    code[index / 4] = (code[index / 4] & !(0b11 << shift)) | ((value & 0b11) << shift);
}

fn unpack_code(code: &[u8], index: usize) -> u8 {
    let shift = 6 - 2 * (index % 4);
    (code[index / 4] >> shift) & 0b11
}

pub struct AdpcmEncoder {
    variant: CodecVariant,
    predictor: Predictor,
}

impl AdpcmEncoder {
    pub fn new(variant: CodecVariant) -> Self {
        Self { variant, predictor: Predictor::new() }
    }
}

impl FrameEncoder for AdpcmEncoder {
    fn encode(&mut self, pcm: &[i16], code: &mut [u8]) {
        for (i, &sample) in pcm.iter().enumerate() {
            let value = self.predictor.quantize(sample);
            self.predictor.reconstruct(value);
            pack_code(code, i, value);
        }
    }
}

impl Drop for AdpcmEncoder {
    fn drop(&mut self) {
        debug!("Released {:?} encoder state", self.variant);
    }
}

pub struct AdpcmDecoder {
    variant: CodecVariant,
    predictor: Predictor,
    history: [i16; MAX_FRAME_SIZE],
    consecutive_erasures: u32,
}

impl AdpcmDecoder {
    pub fn new(variant: CodecVariant) -> Self {
        Self {
            variant,
            predictor: Predictor::new(),
            history: [0; MAX_FRAME_SIZE],
            consecutive_erasures: 0,
        }
    }
}

impl FrameDecoder for AdpcmDecoder {
    fn decode(&mut self, code: &[u8], pcm: &mut [i16]) {
        for (i, sample) in pcm.iter_mut().enumerate() {
            *sample = self.predictor.reconstruct(unpack_code(code, i));
        }
        self.history[..pcm.len()].copy_from_slice(pcm);
        self.consecutive_erasures = 0;
    }

    fn conceal(&mut self, pcm: &mut [i16]) {
        // 6 dB down per consecutive lost frame
        self.consecutive_erasures = (self.consecutive_erasures + 1).min(15);
        for (sample, &previous) in pcm.iter_mut().zip(self.history.iter()) {
            *sample = previous >> self.consecutive_erasures;
        }
        if let Some(&last) = pcm.last() {
            self.predictor.predicted = last as i32;
        }
    }
}

impl Drop for AdpcmDecoder {
    fn drop(&mut self) {
        debug!("Released {:?} decoder state", self.variant);
    }
}

/// Factory for the reference codec
#[derive(Debug, Clone, Copy, Default)]
pub struct AdpcmCodec;

impl CodecFactory for AdpcmCodec {
    fn allocate_encoder(&self, variant: CodecVariant) -> Result<Box<dyn FrameEncoder>> {
        debug!("Allocated {:?} encoder state", variant);
        Ok(Box::new(AdpcmEncoder::new(variant)))
    }

    fn allocate_decoder(&self, variant: CodecVariant) -> Result<Box<dyn FrameDecoder>> {
        debug!("Allocated {:?} decoder state", variant);
        Ok(Box::new(AdpcmDecoder::new(variant)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<i16> {
        (0..len).map(|i| ((i as i32 * 400) % 8000 - 4000) as i16).collect()
    }

    #[test]
    fn test_pack_unpack_positions() {
        let mut code = [0u8; 2];
        for (i, v) in [3u8, 0, 2, 1, 1, 1, 0, 3].iter().enumerate() {
            pack_code(&mut code, i, *v);
        }
        assert_eq!(code, [0b11_00_10_01, 0b01_01_00_11]);
        assert_eq!(unpack_code(&code, 2), 2);
        assert_eq!(unpack_code(&code, 7), 3);
    }

    #[test]
    fn test_decoder_tracks_encoder() {
        let variant = CodecVariant::Bv32;
        let mut encoder = AdpcmEncoder::new(variant);
        let mut decoder = AdpcmDecoder::new(variant);
        let pcm = ramp(variant.frame_size());
        let mut code = vec![0u8; variant.bits_per_frame() / 8];
        let mut out = vec![0i16; variant.frame_size()];

        // Both sides reconstruct from the same codes, so the decoder must reproduce the
        // encoder's own reconstruction.
        let mut reference = Predictor::new();
        for _ in 0..4 {
            encoder.encode(&pcm, &mut code);
            decoder.decode(&code, &mut out);
            for (i, &sample) in out.iter().enumerate() {
                assert_eq!(sample, reference.reconstruct(unpack_code(&code, i)));
            }
        }
    }

    #[test]
    fn test_step_adapts_towards_signal() {
        let variant = CodecVariant::Bv16;
        let mut encoder = AdpcmEncoder::new(variant);
        let mut decoder = AdpcmDecoder::new(variant);
        let pcm = vec![6000i16; variant.frame_size()];
        let mut code = vec![0u8; variant.bits_per_frame() / 8];
        let mut out = vec![0i16; variant.frame_size()];

        for _ in 0..3 {
            encoder.encode(&pcm, &mut code);
            decoder.decode(&code, &mut out);
        }
        let last = *out.last().unwrap() as i32;
        assert!((last - 6000).abs() < 1000, "decoded {} too far from 6000", last);
    }

    #[test]
    fn test_conceal_attenuates_history() {
        let variant = CodecVariant::Bv16;
        let mut decoder = AdpcmDecoder::new(variant);
        decoder.history[..variant.frame_size()].fill(1024);

        let mut out = vec![0i16; variant.frame_size()];
        decoder.conceal(&mut out);
        assert!(out.iter().all(|&s| s == 512));
        decoder.conceal(&mut out);
        assert!(out.iter().all(|&s| s == 256));
    }

    #[test]
    fn test_good_frame_resets_attenuation() {
        let variant = CodecVariant::Bv16;
        let mut decoder = AdpcmDecoder::new(variant);
        let mut out = vec![0i16; variant.frame_size()];
        decoder.conceal(&mut out);
        decoder.conceal(&mut out);
        assert_eq!(decoder.consecutive_erasures, 2);

        let code = vec![0u8; variant.bits_per_frame() / 8];
        decoder.decode(&code, &mut out);
        assert_eq!(decoder.consecutive_erasures, 0);
    }

    #[test]
    fn test_factory_allocates_both_variants() {
        let factory = AdpcmCodec;
        for variant in [CodecVariant::Bv16, CodecVariant::Bv32] {
            assert!(factory.allocate_encoder(variant).is_ok());
            assert!(factory.allocate_decoder(variant).is_ok());
        }
    }
}
