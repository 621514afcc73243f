//! Run configuration resolution

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use clap::Parser;
use serde::{Deserialize, Serialize};
use crate::bitstream::ContainerFormat;
use crate::codec::CodecVariant;
use crate::error::{HarnessError, Result};
use crate::processing::CounterKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Encode,
    Decode,
}

impl FromStr for Direction {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("e") {
            Ok(Direction::Encode)
        } else if s.eq_ignore_ascii_case("d") {
            Ok(Direction::Decode)
        } else {
            Err(HarnessError::config("Direction must be E for encode, or D for decode"))
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encode => write!(f, "encode"),
            Direction::Decode => write!(f, "decode"),
        }
    }
}

/// Fully resolved, immutable run configuration.
///
/// Sample rate, frame size and bits per frame are always derived from the bit rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    direction: Direction,
    format: ContainerFormat,
    variant: CodecVariant,
    bit_rate: u32,
    sample_rate: u32,
    frame_size: usize,
    bits_per_frame: usize,
    source_path: PathBuf,
    dest_path: PathBuf,
}

impl RunConfig {
    /// Resolve operator tokens into a run configuration. Touches no files.
    pub fn resolve<S: Into<PathBuf>, D: Into<PathBuf>>(
        direction: &str,
        format: &str,
        bit_rate: u32,
        source: S,
        dest: D,
    ) -> Result<Self> {
        let direction = direction.parse::<Direction>()?;
        let format = format.parse::<ContainerFormat>()?;
        let variant = CodecVariant::from_bit_rate(bit_rate)?;

        Ok(Self {
            direction,
            format,
            variant,
            bit_rate: variant.bit_rate(),
            sample_rate: variant.sample_rate(),
            frame_size: variant.frame_size(),
            bits_per_frame: variant.bits_per_frame(),
            source_path: source.into(),
            dest_path: dest.into(),
        })
    }

    pub fn from_args(args: &Args) -> Result<Self> {
        let bit_rate = args.bit_rate.trim().parse::<u32>().map_err(|_| {
            HarnessError::config(format!("Bit rate must be 16000 or 32000, got {}", args.bit_rate))
        })?;
        Self::resolve(&args.direction, &args.format, bit_rate, &args.source, &args.dest)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    pub fn variant(&self) -> CodecVariant {
        self.variant
    }

    pub fn bit_rate(&self) -> u32 {
        self.bit_rate
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn bits_per_frame(&self) -> usize {
        self.bits_per_frame
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bits_per_frame / 8
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn dest_path(&self) -> &Path {
        &self.dest_path
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode = {}", self.direction)?;
        writeln!(f, "Encoding format = {}", self.format.description())?;
        writeln!(f, "Sample rate = {} ({})", self.sample_rate, self.variant.description())?;
        writeln!(f, "Bit rate = {}", self.bit_rate)?;
        writeln!(f, "Framesize = {} samples", self.frame_size)?;
        write!(f, "Number of bits per frame = {} bits", self.bits_per_frame)
    }
}

/// Optional behaviour layered on top of the resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOptions {
    /// Probability of marking an encoded frame as erased (G.192 only)
    pub erasure_rate: f64,
    pub seed: u64,
    pub counter: CounterKind,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            erasure_rate: 0.0,
            seed: 1,
            counter: CounterKind::Tsc,
        }
    }
}

impl RunOptions {
    pub fn from_args(args: &Args, config: &RunConfig) -> Result<Self> {
        let options = Self {
            erasure_rate: args.erasure_rate,
            seed: args.seed,
            counter: args.counter,
        };
        options.validate(config)?;
        Ok(options)
    }

    pub fn validate(&self, config: &RunConfig) -> Result<()> {
        if !(0.0..=1.0).contains(&self.erasure_rate) {
            return Err(HarnessError::config("Erasure rate must be in range [0.0, 1.0]"));
        }
        if self.erasure_rate > 0.0 {
            if config.direction() != Direction::Encode {
                return Err(HarnessError::config("Erasure simulation only applies when encoding"));
            }
            if !config.format().carries_erasures() {
                return Err(HarnessError::config(
                    "Erasure simulation needs the ITU (I) format; packed bitstreams cannot mark lost frames",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "bvharness", about = "BroadVoice 16/32 encode and decode test driver", version, author)]
pub struct Args {
    #[arg(value_name = "E|D", help = "E to encode PCM, D to decode a bitstream")]
    pub direction: String,

    #[arg(value_name = "P|I", help = "Bitstream format: P (packed) or I (ITU G.192)")]
    pub format: String,

    #[arg(value_name = "BIT_RATE", help = "16000 (BroadVoice16, 8kHz) or 32000 (BroadVoice32, 16kHz)")]
    pub bit_rate: String,

    #[arg(value_name = "INPUT", help = "Input file (PCM when encoding, bitstream when decoding)")]
    pub source: PathBuf,

    #[arg(value_name = "OUTPUT", help = "Output file (bitstream when encoding, PCM when decoding)")]
    pub dest: PathBuf,

    #[arg(short = 'v', long = "verbose", help = "Enable verbose output mode")]
    pub verbose: bool,

    #[arg(long = "report", value_name = "PATH", help = "Write the run report to a TOML file")]
    pub report: Option<PathBuf>,

    #[arg(long = "erasure-rate", default_value = "0.0", help = "Probability of marking an encoded frame as erased (ITU format only)")]
    pub erasure_rate: f64,

    #[arg(long = "seed", default_value = "1", help = "Seed for the frame erasure simulator")]
    pub seed: u64,

    #[arg(long = "counter", value_enum, default_value_t = CounterKind::Tsc, help = "Cycle counter used for timing")]
    pub counter: CounterKind,
}
