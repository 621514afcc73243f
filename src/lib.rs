//! BroadVoice harness - frame-oriented encode/decode test driver
//!
//! Drives a speech codec across a file of audio frames, reads and writes packed or ITU G.192
//! bitstreams, conceals erased frames and counts cycles spent in each codec call.

pub mod audio;
pub mod bitstream;
pub mod codec;
pub mod config;
pub mod error;
pub mod processing;

pub use config::{Args, Direction, RunConfig, RunOptions};
pub use error::{HarnessError, Result};
pub use processing::{run, RunReport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

pub fn init_logging(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .parse_default_env()
        .try_init()
        .ok();
}

/// Build details and the codec/bitstream combinations this build can drive
pub fn harness_info() -> HarnessInfo {
    HarnessInfo {
        name: NAME,
        version: VERSION,
        variants: vec![codec::CodecVariant::Bv16, codec::CodecVariant::Bv32],
        formats: vec![bitstream::ContainerFormat::Packed, bitstream::ContainerFormat::SoftbitG192],
    }
}

#[derive(Debug, Clone)]
pub struct HarnessInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub variants: Vec<codec::CodecVariant>,
    pub formats: Vec<bitstream::ContainerFormat>,
}

impl std::fmt::Display for HarnessInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} v{}", self.name, self.version)?;
        for variant in &self.variants {
            writeln!(
                f,
                "  {} bps: {} Hz, {} samples / {} bits per frame ({})",
                variant.bit_rate(),
                variant.sample_rate(),
                variant.frame_size(),
                variant.bits_per_frame(),
                variant.description(),
            )?;
        }
        let formats: Vec<&str> = self.formats.iter().map(|format| format.description()).collect();
        write!(f, "  formats: {}", formats.join(", "))
    }
}
