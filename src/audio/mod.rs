//! Audio Sample I/O Module
//!
//! Opens PCM sources and sinks by path. Paths ending in `.wav` go through a WAV container,
//! everything else is treated as raw headerless 16-bit samples.

pub mod pcm;

pub use pcm::{PcmSink, PcmSource, RawPcmReader, RawPcmWriter, WavPcmReader, WavPcmWriter};

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use crate::error::{HarnessError, Result};

pub fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

pub fn open_source(path: &Path, sample_rate: u32) -> Result<Box<dyn PcmSource>> {
    let file = File::open(path).map_err(|e| HarnessError::open(path, e))?;
    if is_wav(path) {
        Ok(Box::new(WavPcmReader::new(file, sample_rate)?))
    } else {
        Ok(Box::new(RawPcmReader::new(BufReader::new(file))))
    }
}

pub fn create_sink(path: &Path, sample_rate: u32) -> Result<Box<dyn PcmSink>> {
    let file = File::create(path).map_err(|e| HarnessError::open(path, e))?;
    if is_wav(path) {
        Ok(Box::new(WavPcmWriter::new(file, sample_rate)?))
    } else {
        Ok(Box::new(RawPcmWriter::new(BufWriter::new(file))))
    }
}
