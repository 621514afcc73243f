//! Cycle accounting for the codec transform calls

use std::fmt;
use std::path::Path;
use std::time::Instant;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use crate::config::{Direction, RunConfig, RunOptions};
use crate::error::{HarnessError, Result};

/// Monotonic, low-overhead counter sampled around each transform call
pub trait CycleCounter {
    fn now(&self) -> u64;
}

impl<T: CycleCounter + ?Sized> CycleCounter for &T {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

impl<T: CycleCounter + ?Sized> CycleCounter for Box<T> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    /// CPU timestamp counter
    Tsc,
    /// Monotonic clock in nanoseconds
    Clock,
}

impl CounterKind {
    pub fn create(self) -> Box<dyn CycleCounter> {
        match self {
            CounterKind::Tsc => Box::new(TscCounter::new()),
            CounterKind::Clock => Box::new(ClockCounter::new()),
        }
    }
}

/// Nanoseconds elapsed since the counter was created
#[derive(Debug, Clone)]
pub struct ClockCounter {
    origin: Instant,
}

impl ClockCounter {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for ClockCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleCounter for ClockCounter {
    fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Timestamp counter on x86_64; the monotonic clock elsewhere
#[derive(Debug, Clone, Default)]
pub struct TscCounter {
    #[cfg(not(target_arch = "x86_64"))]
    fallback: ClockCounter,
}

impl TscCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CycleCounter for TscCounter {
    #[cfg(target_arch = "x86_64")]
    #[allow(unused_unsafe)]
    fn now(&self) -> u64 {
        // SAFETY: rdtsc has no preconditions on x86_64
        unsafe { std::arch::x86_64::_rdtsc() }
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn now(&self) -> u64 {
        self.fallback.now()
    }
}

/// Running totals for one pipeline instance
#[derive(Debug, Clone, Default)]
pub struct TimingAccumulator {
    total_cycles: u64,
    frame_count: u64,
    untimed_frames: u64,
}

impl TimingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one transform call sampled at `start` and `end`
    pub fn record(&mut self, start: u64, end: u64) {
        self.total_cycles = self.total_cycles.saturating_add(end.saturating_sub(start));
        self.frame_count += 1;
    }

    /// Count a processed frame that did not run the timed transform
    pub fn record_untimed(&mut self) {
        self.frame_count += 1;
        self.untimed_frames += 1;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn report(&self, direction: Direction) -> RunReport {
        RunReport {
            direction,
            frames_processed: self.frame_count,
            concealed_frames: self.untimed_frames,
            padded_samples: 0,
            total_cycles: self.total_cycles,
            average_cycles_per_frame: self.total_cycles / self.frame_count.max(1),
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub direction: Direction,
    pub frames_processed: u64,
    pub concealed_frames: u64,
    pub padded_samples: u64,
    pub total_cycles: u64,
    pub average_cycles_per_frame: u64,
}

#[derive(Serialize)]
struct ReportFile<'a> {
    config: &'a RunConfig,
    options: &'a RunOptions,
    report: &'a RunReport,
}

impl RunReport {
    /// Save the report, with the configuration that produced it, as TOML
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, config: &RunConfig, options: &RunOptions) -> Result<()> {
        let content = toml::to_string_pretty(&ReportFile { config, options, report: self })
            .map_err(|e| HarnessError::config(format!("Failed to serialize report: {}", e)))?;

        let path = path.as_ref();
        std::fs::write(path, content).map_err(|e| HarnessError::open(path, e))
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.direction {
            Direction::Encode => "encoded",
            Direction::Decode => "decoded",
        };
        writeln!(f, "{} frames {}", self.frames_processed, verb)?;
        write!(f, "{} cycles. {} per frame", self.total_cycles, self.average_cycles_per_frame)
    }
}
