pub mod driver;
pub mod job;
pub mod report;
pub mod summary;
pub mod workload;

pub use driver::{Run, RunOutcome, StopToken, new_run};
pub use job::{Job, ProcessDescriptor, validate_all};
pub use report::{ConsoleReporter, JsonLinesReporter, NullReporter, Reporter, TickLimit, TraceRecorder};
pub use summary::{ProcessStats, RunSummary};
pub use workload::{RandomWorkload, demo_workload, load_workload, random_workload};
