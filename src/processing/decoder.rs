//! Decode pipeline: coded frames (or erasure marks) in, PCM frames out

use std::fs::File;
use std::io::{BufReader, Read};
use log::{debug, info, warn};
use crate::audio::{self, PcmSink};
use crate::bitstream::BitstreamReader;
use crate::codec::{CodecFactory, MAX_BITS_PER_FRAME, MAX_FRAME_SIZE};
use crate::config::{Direction, RunConfig, RunOptions};
use crate::error::{HarnessError, Result};
use super::{CycleCounter, RunReport, TimingAccumulator};

/// Run the decode loop over already-open streams.
///
/// Each iteration ends in one of three ways: an erased frame is concealed, a complete frame is
/// decoded, or a short read without an erasure mark ends the stream. Concealed and decoded
/// frames both emit exactly one frame of PCM; only decoded frames are timed.
pub fn decode_stream<R, K, F, C>(
    config: &RunConfig,
    mut reader: BitstreamReader<R>,
    mut sink: K,
    factory: &F,
    counter: &C,
) -> Result<RunReport>
where
    R: Read,
    K: PcmSink,
    F: CodecFactory + ?Sized,
    C: CycleCounter + ?Sized,
{
    let mut decoder = factory.allocate_decoder(config.variant())?;
    debug!("Decoding {} with {:?}", config.source_path().display(), config.variant());

    let frame_size = config.frame_size();
    let bytes_per_frame = config.bytes_per_frame();
    let mut amp = [0i16; MAX_FRAME_SIZE];
    let mut code = [0u8; MAX_BITS_PER_FRAME / 8];
    let mut timing = TimingAccumulator::new();

    loop {
        let frame = reader.read_frame(&mut code)?;

        if !frame.erased && frame.bytes != bytes_per_frame {
            if frame.bytes > 0 {
                debug!("Dropped trailing partial frame of {} bytes", frame.bytes);
            }
            break;
        }

        if frame.erased {
            decoder.conceal(&mut amp[..frame_size]);
            timing.record_untimed();
        } else {
            let start = counter.now();
            decoder.decode(&code[..bytes_per_frame], &mut amp[..frame_size]);
            let end = counter.now();
            timing.record(start, end);
        }

        sink.write_frame(&amp[..frame_size])?;
    }

    sink.finish()?;
    drop(sink);
    drop(reader);
    drop(decoder);

    let report = timing.report(Direction::Decode);
    if report.concealed_frames > 0 {
        warn!("Concealed {} erased frames", report.concealed_frames);
    }
    info!("Decoded {} frames", report.frames_processed);
    Ok(report)
}

/// Open the configured files and run the decode loop.
pub fn run_decode<F: CodecFactory + ?Sized>(
    config: &RunConfig,
    options: &RunOptions,
    factory: &F,
) -> Result<RunReport> {
    let source = File::open(config.source_path())
        .map_err(|e| HarnessError::open(config.source_path(), e))?;
    let reader = BitstreamReader::new(BufReader::new(source), config.format(), config.bits_per_frame());
    let sink = audio::create_sink(config.dest_path(), config.sample_rate())?;

    let counter = options.counter.create();
    decode_stream(config, reader, sink, factory, &*counter)
}
