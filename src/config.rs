use std::path::PathBuf;

use crate::scheduler::Policy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkloadSource {
    /// Built-in three-process set.
    #[default]
    Demo,
    File(PathBuf),
    Random { count: usize, seed: u64 },
}

/// Everything the binary needs to set up and drive one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub policy: Policy,
    /// Raw value as given; validated against the policy when the run is built.
    pub quantum: Option<i64>,
    pub workload: WorkloadSource,
    pub format: OutputFormat,
    pub fast_forward: bool,
    pub max_ticks: Option<u64>,
    pub verbose: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Fifo,
            quantum: None,
            workload: WorkloadSource::Demo,
            format: OutputFormat::Text,
            fast_forward: false,
            max_ticks: None,
            verbose: 0,
        }
    }
}

impl SimConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
