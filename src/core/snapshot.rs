use serde::Serialize;

use super::event::SchedEvent;
use super::state::Ticks;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunningView {
    pub id: String,
    pub burst_index: usize,
    pub remaining_time: Ticks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedView {
    pub id: String,
    pub io_end_time: Ticks,
}

/// Owned copy of the system state for one tick.
///
/// Taken right after the execution phase: `running.remaining_time` is the
/// value after this tick's decrement and `completed_count` does not yet
/// include a process finishing on this tick. `events` covers the whole tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickSnapshot {
    pub time: Ticks,
    pub running: Option<RunningView>,
    pub ready_ids: Vec<String>,
    pub blocked: Vec<BlockedView>,
    pub completed_count: usize,
    pub total: usize,
    pub events: Vec<SchedEvent>,
}

impl TickSnapshot {
    pub fn is_idle(&self) -> bool {
        self.running.is_none()
    }

    /// Single-line rendering, stable across releases.
    pub fn compact(&self) -> String {
        let running = match &self.running {
            Some(r) => format!("{}#{}:{}", r.id, r.burst_index, r.remaining_time),
            None => "idle".to_owned(),
        };
        let blocked: Vec<String> = self
            .blocked
            .iter()
            .map(|b| format!("{}@{}", b.id, b.io_end_time))
            .collect();
        format!(
            "t={} run={} ready=[{}] blocked=[{}] done={}/{}",
            self.time,
            running,
            self.ready_ids.join(","),
            blocked.join(","),
            self.completed_count,
            self.total
        )
    }
}
