//! ITU G.192 soft-bit framing
//!
//! Every frame is a run of 16-bit little-endian words: sync, length, then one word per bit.

use std::io::{self, Read};
use super::{read_full, FrameRead};
use crate::error::{HarnessError, Result};

pub const FRAME_ERASURE: u16 = 0x6B20;
pub const FRAME_SYNC: u16 = 0x6B21;
const FRAME_SYNC_LAST: u16 = 0x6B2F;

pub const BIT_0: u16 = 0x007F;
pub const BIT_1: u16 = 0x0081;
const BIT_ERASED: u16 = 0x0000;
const SOFT_ONE_THRESHOLD: u16 = 0x0080;

const WORD_BYTES: usize = 2;
const HEADER_BYTES: usize = 2 * WORD_BYTES;

/// Bytes one frame of `bits_per_frame` occupies on disk
pub fn frame_len_bytes(bits_per_frame: usize) -> usize {
    HEADER_BYTES + bits_per_frame * WORD_BYTES
}

/// Serialize one frame into `out`, replacing its contents.
pub fn encode_frame(code: &[u8], bits_per_frame: usize, erased: bool, out: &mut Vec<u8>) {
    out.clear();
    let sync = if erased { FRAME_ERASURE } else { FRAME_SYNC };
    out.extend_from_slice(&sync.to_le_bytes());
    out.extend_from_slice(&(bits_per_frame as u16).to_le_bytes());

    for i in 0..bits_per_frame {
        let word = if erased {
            BIT_ERASED
        } else if code[i / 8] & (0x80 >> (i % 8)) != 0 {
            BIT_1
        } else {
            BIT_0
        };
        out.extend_from_slice(&word.to_le_bytes());
    }
}

/// Read one frame. `words` is scratch space of at least `frame_len_bytes(bits_per_frame)`.
pub fn read_frame<R: Read>(
    reader: &mut R,
    bits_per_frame: usize,
    words: &mut [u8],
    code: &mut [u8],
) -> Result<FrameRead> {
    let mut header = [0u8; HEADER_BYTES];
    if read_full(reader, &mut header)? < HEADER_BYTES {
        return Ok(FrameRead { bytes: 0, erased: false });
    }
    let sync = u16::from_le_bytes([header[0], header[1]]);
    let length = u16::from_le_bytes([header[2], header[3]]) as usize;

    let mut erased = match sync {
        FRAME_ERASURE => true,
        FRAME_SYNC..=FRAME_SYNC_LAST => false,
        other => {
            return Err(HarnessError::bitstream(format!(
                "Lost G.192 frame sync, found 0x{:04X}", other
            )));
        }
    };

    if erased {
        // Payload of a lost frame carries nothing usable
        let skipped = io::copy(&mut reader.by_ref().take((length * WORD_BYTES) as u64), &mut io::sink())?;
        return Ok(FrameRead { bytes: skipped as usize / WORD_BYTES / 8, erased });
    }

    if length != bits_per_frame {
        return Err(HarnessError::bitstream(format!(
            "G.192 frame holds {} bits, expected {}", length, bits_per_frame
        )));
    }

    let payload = &mut words[..bits_per_frame * WORD_BYTES];
    let bits = read_full(reader, payload)? / WORD_BYTES;

    code.fill(0);
    for i in 0..bits {
        let word = u16::from_le_bytes([payload[2 * i], payload[2 * i + 1]]);
        if word == BIT_ERASED {
            erased = true;
        } else if word >= SOFT_ONE_THRESHOLD {
            code[i / 8] |= 0x80 >> (i % 8);
        }
    }

    Ok(FrameRead { bytes: bits / 8, erased })
}
