pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use crate::core::{SchedEvent, TickSnapshot};
pub use error::{ConfigError, SimError, ValidationError};
pub use scheduler::{Policy, Scheduler};
pub use sim::{ProcessDescriptor, Reporter, Run, RunOutcome, RunSummary, StopToken, new_run};
