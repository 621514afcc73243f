//! Raw PCM and WAV sample streams
//!
//! Raw files are headerless 16-bit signed little-endian mono.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use crate::bitstream::read_full;
use crate::codec::MAX_FRAME_SIZE;
use crate::error::{HarnessError, Result};

const SAMPLE_BYTES: usize = 2;

/// A source of PCM frames
pub trait PcmSource {
    /// Fill as much of `buf` as the input allows; 0 means end of input.
    fn read_frame(&mut self, buf: &mut [i16]) -> Result<usize>;
}

/// A destination for PCM frames
pub trait PcmSink {
    fn write_frame(&mut self, samples: &[i16]) -> Result<()>;

    /// Flush buffered output and finalize any container header
    fn finish(&mut self) -> Result<()>;
}

impl<T: PcmSource + ?Sized> PcmSource for Box<T> {
    fn read_frame(&mut self, buf: &mut [i16]) -> Result<usize> {
        (**self).read_frame(buf)
    }
}

impl<T: PcmSink + ?Sized> PcmSink for Box<T> {
    fn write_frame(&mut self, samples: &[i16]) -> Result<()> {
        (**self).write_frame(samples)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

pub struct RawPcmReader<R: Read> {
    inner: R,
    bytes: [u8; MAX_FRAME_SIZE * SAMPLE_BYTES],
}

impl<R: Read> RawPcmReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, bytes: [0; MAX_FRAME_SIZE * SAMPLE_BYTES] }
    }
}

impl<R: Read> PcmSource for RawPcmReader<R> {
    fn read_frame(&mut self, buf: &mut [i16]) -> Result<usize> {
        let wanted = buf.len().min(MAX_FRAME_SIZE) * SAMPLE_BYTES;
        // An odd trailing byte is not a sample and is dropped
        let samples = read_full(&mut self.inner, &mut self.bytes[..wanted])? / SAMPLE_BYTES;
        for (i, sample) in buf[..samples].iter_mut().enumerate() {
            *sample = i16::from_le_bytes([self.bytes[2 * i], self.bytes[2 * i + 1]]);
        }
        Ok(samples)
    }
}

pub struct RawPcmWriter<W: Write> {
    inner: W,
    bytes: [u8; MAX_FRAME_SIZE * SAMPLE_BYTES],
}

impl<W: Write> RawPcmWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, bytes: [0; MAX_FRAME_SIZE * SAMPLE_BYTES] }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> PcmSink for RawPcmWriter<W> {
    fn write_frame(&mut self, samples: &[i16]) -> Result<()> {
        for chunk in samples.chunks(MAX_FRAME_SIZE) {
            for (i, sample) in chunk.iter().enumerate() {
                self.bytes[2 * i..2 * i + 2].copy_from_slice(&sample.to_le_bytes());
            }
            self.inner.write_all(&self.bytes[..chunk.len() * SAMPLE_BYTES])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

fn mono_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

pub struct WavPcmReader {
    reader: WavReader<BufReader<File>>,
}

impl WavPcmReader {
    /// Wrap an opened WAV file, insisting on mono 16-bit at `sample_rate`.
    pub fn new(file: File, sample_rate: u32) -> Result<Self> {
        let reader = WavReader::new(BufReader::new(file))?;
        let spec = reader.spec();
        if spec != mono_spec(sample_rate) {
            return Err(HarnessError::audio(format!(
                "WAV input must be mono 16-bit PCM at {} Hz, found {} ch, {}-bit, {} Hz",
                sample_rate, spec.channels, spec.bits_per_sample, spec.sample_rate
            )));
        }
        Ok(Self { reader })
    }
}

impl PcmSource for WavPcmReader {
    fn read_frame(&mut self, buf: &mut [i16]) -> Result<usize> {
        let mut count = 0;
        for (slot, sample) in buf.iter_mut().zip(self.reader.samples::<i16>()) {
            *slot = sample?;
            count += 1;
        }
        Ok(count)
    }
}

pub struct WavPcmWriter {
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl WavPcmWriter {
    pub fn new(file: File, sample_rate: u32) -> Result<Self> {
        let writer = WavWriter::new(BufWriter::new(file), mono_spec(sample_rate))?;
        Ok(Self { writer: Some(writer) })
    }
}

impl PcmSink for WavPcmWriter {
    fn write_frame(&mut self, samples: &[i16]) -> Result<()> {
        let writer = self.writer.as_mut()
            .ok_or_else(|| HarnessError::audio("WAV output already finalized"))?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}
