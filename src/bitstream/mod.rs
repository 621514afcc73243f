//! Bitstream Container Formats
//!
//! Coded frames are stored either packed (raw octets, no erasure marker) or in the ITU G.192
//! soft-bit format, which carries a per-frame sync word that can flag the frame as erased.

pub mod g192;

use std::io::{ErrorKind, Read, Write};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerFormat {
    Packed,
    SoftbitG192,
}

impl ContainerFormat {
    pub fn description(&self) -> &'static str {
        match self {
            ContainerFormat::Packed => "packed bitstream",
            ContainerFormat::SoftbitG192 => "ITU G.192 format bitstream",
        }
    }

    /// Whether the format can mark a frame as lost
    pub fn carries_erasures(&self) -> bool {
        matches!(self, ContainerFormat::SoftbitG192)
    }
}

impl FromStr for ContainerFormat {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("p") {
            Ok(ContainerFormat::Packed)
        } else if s.eq_ignore_ascii_case("i") {
            Ok(ContainerFormat::SoftbitG192)
        } else {
            Err(HarnessError::config(
                "Encoded format must be P for packed, or I for ITU format",
            ))
        }
    }
}

/// Result of reading one coded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRead {
    /// Whole octets of coded data obtained
    pub bytes: usize,
    /// The container marked this frame as lost
    pub erased: bool,
}

/// Read until `buf` is full or the input ends; returns the number of bytes read.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub struct BitstreamWriter<W: Write> {
    inner: W,
    format: ContainerFormat,
    bits_per_frame: usize,
    words: Vec<u8>,
}

impl<W: Write> BitstreamWriter<W> {
    pub fn new(inner: W, format: ContainerFormat, bits_per_frame: usize) -> Self {
        let capacity = match format {
            ContainerFormat::Packed => 0,
            ContainerFormat::SoftbitG192 => g192::frame_len_bytes(bits_per_frame),
        };
        Self { inner, format, bits_per_frame, words: Vec::with_capacity(capacity) }
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Write one coded frame. `erased` is only representable in G.192.
    pub fn write_frame(&mut self, code: &[u8], erased: bool) -> Result<()> {
        let code = &code[..self.bits_per_frame / 8];
        match self.format {
            ContainerFormat::Packed => {
                if erased {
                    return Err(HarnessError::config(
                        "Packed bitstreams cannot carry frame erasures",
                    ));
                }
                self.inner.write_all(code)?;
            }
            ContainerFormat::SoftbitG192 => {
                g192::encode_frame(code, self.bits_per_frame, erased, &mut self.words);
                self.inner.write_all(&self.words)?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

pub struct BitstreamReader<R: Read> {
    inner: R,
    format: ContainerFormat,
    bits_per_frame: usize,
    words: Vec<u8>,
}

impl<R: Read> BitstreamReader<R> {
    pub fn new(inner: R, format: ContainerFormat, bits_per_frame: usize) -> Self {
        let capacity = match format {
            ContainerFormat::Packed => 0,
            ContainerFormat::SoftbitG192 => g192::frame_len_bytes(bits_per_frame),
        };
        Self { inner, format, bits_per_frame, words: vec![0; capacity] }
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Read one coded frame into `code`. Running out of input is reported as a short read.
    pub fn read_frame(&mut self, code: &mut [u8]) -> Result<FrameRead> {
        let code = &mut code[..self.bits_per_frame / 8];
        match self.format {
            ContainerFormat::Packed => {
                let bytes = read_full(&mut self.inner, code)?;
                Ok(FrameRead { bytes, erased: false })
            }
            ContainerFormat::SoftbitG192 => {
                g192::read_frame(&mut self.inner, self.bits_per_frame, &mut self.words, code)
            }
        }
    }
}
