//! Encode pipeline: PCM frames in, coded frames out

use std::fs::File;
use std::io::{BufWriter, Write};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::audio::{self, PcmSource};
use crate::bitstream::BitstreamWriter;
use crate::codec::{CodecFactory, MAX_BITS_PER_FRAME, MAX_FRAME_SIZE};
use crate::config::{Direction, RunConfig, RunOptions};
use crate::error::{HarnessError, Result};
use super::{CycleCounter, RunReport, TimingAccumulator};

/// Marks written frames as lost at a fixed probability
#[derive(Debug, Clone)]
pub struct ErasureSimulator {
    rng: StdRng,
    rate: f64,
}

impl ErasureSimulator {
    /// `rate` must lie in [0, 1]
    pub fn new(rate: f64, seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), rate }
    }

    pub fn next_erased(&mut self) -> bool {
        self.rate > 0.0 && self.rng.gen_bool(self.rate)
    }
}

/// Run the encode loop over already-open streams.
///
/// The codec state is allocated after both streams exist and released before returning, on
/// success and on error alike.
pub fn encode_stream<S, W, F, C>(
    config: &RunConfig,
    mut source: S,
    mut writer: BitstreamWriter<W>,
    factory: &F,
    counter: &C,
    mut erasures: Option<ErasureSimulator>,
) -> Result<RunReport>
where
    S: PcmSource,
    W: Write,
    F: CodecFactory + ?Sized,
    C: CycleCounter + ?Sized,
{
    let mut encoder = factory.allocate_encoder(config.variant())?;
    debug!("Encoding {} with {:?}", config.source_path().display(), config.variant());

    let frame_size = config.frame_size();
    let bytes_per_frame = config.bytes_per_frame();
    let mut amp = [0i16; MAX_FRAME_SIZE];
    let mut code = [0u8; MAX_BITS_PER_FRAME / 8];
    let mut timing = TimingAccumulator::new();
    let mut padded_samples = 0u64;
    let mut erased_frames = 0u64;

    loop {
        let samples = source.read_frame(&mut amp[..frame_size])?;
        if samples == 0 {
            break;
        }
        if samples % frame_size != 0 {
            let padded = samples - samples % frame_size + frame_size;
            amp[samples..padded].fill(0);
            padded_samples += (padded - samples) as u64;
            warn!("Padded final partial frame with {} samples of silence", padded - samples);
        }

        let start = counter.now();
        encoder.encode(&amp[..frame_size], &mut code[..bytes_per_frame]);
        let end = counter.now();
        timing.record(start, end);

        let erased = erasures.as_mut().is_some_and(|e| e.next_erased());
        if erased {
            erased_frames += 1;
        }
        writer.write_frame(&code, erased)?;
    }

    writer.flush()?;
    drop(writer);
    drop(source);
    drop(encoder);

    if erased_frames > 0 {
        info!("Marked {} of {} frames as erased", erased_frames, timing.frame_count());
    }

    let mut report = timing.report(Direction::Encode);
    report.padded_samples = padded_samples;
    info!("Encoded {} frames", report.frames_processed);
    Ok(report)
}

/// Open the configured files and run the encode loop.
pub fn run_encode<F: CodecFactory + ?Sized>(
    config: &RunConfig,
    options: &RunOptions,
    factory: &F,
) -> Result<RunReport> {
    let source = audio::open_source(config.source_path(), config.sample_rate())?;
    let dest = File::create(config.dest_path())
        .map_err(|e| HarnessError::open(config.dest_path(), e))?;
    let writer = BitstreamWriter::new(BufWriter::new(dest), config.format(), config.bits_per_frame());

    let counter = options.counter.create();
    let erasures = (options.erasure_rate > 0.0)
        .then(|| ErasureSimulator::new(options.erasure_rate, options.seed));

    encode_stream(config, source, writer, factory, &*counter, erasures)
}
