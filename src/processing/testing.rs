//! Test doubles for the pipelines: tracked streams, a scripted codec and a stepping counter.

use std::cell::Cell;
use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use crate::codec::{CodecFactory, CodecVariant, FrameDecoder, FrameEncoder};
use crate::error::{HarnessError, Result};
use super::CycleCounter;

/// Counts live stream handles
#[derive(Debug, Clone, Default)]
pub struct HandleTracker(Arc<AtomicIsize>);

impl HandleTracker {
    pub fn open_handles(&self) -> isize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reader(&self, data: Vec<u8>) -> TrackedReader {
        self.0.fetch_add(1, Ordering::SeqCst);
        TrackedReader { inner: Cursor::new(data), tracker: self.clone() }
    }

    pub fn writer(&self) -> (TrackedWriter, Arc<Mutex<Vec<u8>>>) {
        self.0.fetch_add(1, Ordering::SeqCst);
        let data = Arc::new(Mutex::new(Vec::new()));
        (TrackedWriter { data: data.clone(), tracker: self.clone() }, data)
    }
}

pub struct TrackedReader {
    inner: Cursor<Vec<u8>>,
    tracker: HandleTracker,
}

impl Read for TrackedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.tracker.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct TrackedWriter {
    data: Arc<Mutex<Vec<u8>>>,
    tracker: HandleTracker,
}

impl Write for TrackedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.data.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for TrackedWriter {
    fn drop(&mut self) {
        self.tracker.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Codec whose output is trivially predictable.
///
/// Encoding writes the first sample's low byte into every code byte; decoding fills the frame
/// with the first code byte; concealment fills it with -1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCodec {
    pub fail_allocation: bool,
    pub allocations: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
    pub encoded_frames: Arc<Mutex<Vec<Vec<i16>>>>,
}

impl ScriptedCodec {
    pub fn failing() -> Self {
        Self { fail_allocation: true, ..Default::default() }
    }

    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

struct ScriptedState {
    releases: Arc<AtomicUsize>,
    encoded_frames: Arc<Mutex<Vec<Vec<i16>>>>,
}

impl FrameEncoder for ScriptedState {
    fn encode(&mut self, pcm: &[i16], code: &mut [u8]) {
        self.encoded_frames.lock().unwrap().push(pcm.to_vec());
        code.fill(pcm[0] as u8);
    }
}

impl FrameDecoder for ScriptedState {
    fn decode(&mut self, code: &[u8], pcm: &mut [i16]) {
        pcm.fill(code[0] as i16);
    }

    fn conceal(&mut self, pcm: &mut [i16]) {
        pcm.fill(-1);
    }
}

impl Drop for ScriptedState {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

impl ScriptedCodec {
    fn allocate(&self, role: &'static str) -> Result<ScriptedState> {
        if self.fail_allocation {
            return Err(HarnessError::Allocation { role });
        }
        self.allocations.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedState {
            releases: self.releases.clone(),
            encoded_frames: self.encoded_frames.clone(),
        })
    }
}

impl CodecFactory for ScriptedCodec {
    fn allocate_encoder(&self, _variant: CodecVariant) -> Result<Box<dyn FrameEncoder>> {
        Ok(Box::new(self.allocate("encoder")?))
    }

    fn allocate_decoder(&self, _variant: CodecVariant) -> Result<Box<dyn FrameDecoder>> {
        Ok(Box::new(self.allocate("decoder")?))
    }
}

/// Advances by `step` on every sample, so each timed call costs exactly `step`
pub struct StepCounter {
    next: Cell<u64>,
    step: u64,
}

impl StepCounter {
    pub fn new(step: u64) -> Self {
        Self { next: Cell::new(0), step }
    }
}

impl CycleCounter for StepCounter {
    fn now(&self) -> u64 {
        let value = self.next.get();
        self.next.set(value + self.step);
        value
    }
}

pub fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

pub fn pcm_samples(bytes: &[u8]) -> Vec<i16> {
    bytes.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect()
}
