pub mod driver;
pub mod event;
pub mod observer;
pub mod queue;
pub mod snapshot;
pub mod state;

pub use driver::SchedCore;
pub use event::{PreemptReason, SchedEvent};
pub use queue::{QueueOrder, ReadyQueue};
pub use snapshot::{BlockedView, RunningView, TickSnapshot};
pub use state::{KernelCtx, Pid, ProcState, ProcessRuntime, Ticks};
