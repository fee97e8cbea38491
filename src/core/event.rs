use serde::Serialize;

use crate::core::Ticks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreemptReason {
    ShorterJob,
    QuantumExpired,
}

/// A state transition observed during one tick, in phase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchedEvent {
    IoCompleted {
        id: String,
        next_burst: usize,
        duration: Ticks,
    },
    Arrived {
        id: String,
        duration: Ticks,
    },
    Preempted {
        id: String,
        remaining_time: Ticks,
        reason: PreemptReason,
    },
    Dispatched {
        id: String,
        burst_index: usize,
        remaining_time: Ticks,
    },
    Blocked {
        id: String,
        io_duration: Ticks,
        io_end_time: Ticks,
    },
    Finished {
        id: String,
    },
    // No process to run even after dispatch
    CpuIdle,
}
