//! Frame-oriented test-drive pipelines

pub mod timing;
pub mod encoder;
pub mod decoder;

#[cfg(test)]
pub(crate) mod testing;

pub use timing::{ClockCounter, CounterKind, CycleCounter, RunReport, TimingAccumulator, TscCounter};
pub use encoder::{encode_stream, run_encode, ErasureSimulator};
pub use decoder::{decode_stream, run_decode};

use crate::codec::CodecFactory;
use crate::config::{Direction, RunConfig, RunOptions};
use crate::error::Result;

/// Run the pipeline selected by the configuration's direction
pub fn run<F: CodecFactory + ?Sized>(
    config: &RunConfig,
    options: &RunOptions,
    factory: &F,
) -> Result<RunReport> {
    match config.direction() {
        Direction::Encode => run_encode(config, options, factory),
        Direction::Decode => run_decode(config, options, factory),
    }
}
