use average::{Estimate, Mean};
use serde::Serialize;

use crate::core::{KernelCtx, Ticks};
use crate::scheduler::Policy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessStats {
    pub id: String,
    pub arrival_time: Ticks,
    pub finish_time: Option<Ticks>,
    /// Finish minus arrival.
    pub turnaround: Option<Ticks>,
    /// First dispatch minus arrival.
    pub response: Option<Ticks>,
    pub cpu_time: Ticks,
    pub blocked_time: Ticks,
    /// Ticks spent in the ready queue.
    pub waiting_time: Ticks,
    pub dispatches: u64,
    pub preemptions: u64,
}

/// In-memory result of a run, complete or cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub policy: Policy,
    pub quantum: Option<Ticks>,
    pub total_ticks: Ticks,
    pub idle_ticks: Ticks,
    pub completed: usize,
    pub total: usize,
    pub processes: Vec<ProcessStats>,
}

impl RunSummary {
    pub fn from_ctx(ctx: &KernelCtx, policy: Policy, quantum: Option<Ticks>) -> Self {
        let processes = ctx
            .procs
            .values()
            .map(|p| ProcessStats {
                id: p.id.clone(),
                arrival_time: p.arrival_time,
                finish_time: p.finish_time,
                turnaround: p.finish_time.map(|f| f - p.arrival_time),
                response: p.first_dispatch.map(|d| d - p.arrival_time),
                cpu_time: p.cpu_ticks,
                blocked_time: p.blocked_ticks,
                waiting_time: p.ready_ticks,
                dispatches: p.dispatches,
                preemptions: p.preemptions,
            })
            .collect();

        Self {
            policy,
            quantum,
            total_ticks: ctx.now,
            idle_ticks: ctx.idle_ticks,
            completed: ctx.completed,
            total: ctx.total(),
            processes,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn busy_ticks(&self) -> Ticks {
        self.total_ticks - self.idle_ticks
    }

    pub fn cpu_utilization(&self) -> f64 {
        if self.total_ticks == 0 {
            return 0.0;
        }
        self.busy_ticks() as f64 / self.total_ticks as f64
    }

    pub fn dispatches(&self) -> u64 {
        self.processes.iter().map(|p| p.dispatches).sum()
    }

    pub fn preemptions(&self) -> u64 {
        self.processes.iter().map(|p| p.preemptions).sum()
    }

    pub fn max_finish_time(&self) -> Option<Ticks> {
        self.processes.iter().filter_map(|p| p.finish_time).max()
    }

    pub fn finish_time(&self, id: &str) -> Option<Ticks> {
        self.processes
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| p.finish_time)
    }

    pub fn avg_turnaround(&self) -> f64 {
        avg(self.processes.iter().filter_map(|p| p.turnaround))
    }

    pub fn avg_response(&self) -> f64 {
        avg(self.processes.iter().filter_map(|p| p.response))
    }

    pub fn avg_waiting(&self) -> f64 {
        avg(self.processes.iter().map(|p| p.waiting_time))
    }
}

fn avg(iter: impl Iterator<Item = Ticks>) -> f64 {
    iter.map(|t| t as f64).collect::<Mean>().estimate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QueueOrder;

    #[test]
    fn derives_per_process_times() {
        let mut ctx = KernelCtx::new(QueueOrder::Fifo, 1);
        let pid = ctx.create_process("A", 2, vec![3], vec![]);
        ctx.advance_time(2);
        ctx.admit(pid);
        ctx.advance_time(1);
        ctx.set_running(pid);
        ctx.process_mut(pid).cpu_ticks = 3;
        ctx.process_mut(pid).ready_ticks = 1;
        ctx.clear_cpu();
        ctx.mark_finished(pid, 6);
        ctx.advance_time(3);
        ctx.idle_ticks = 2;

        let summary = RunSummary::from_ctx(&ctx, Policy::Fifo, None);
        let stats = &summary.processes[0];
        assert_eq!(stats.turnaround, Some(4));
        assert_eq!(stats.response, Some(1));
        assert_eq!(stats.waiting_time, 1);
        assert_eq!(summary.total_ticks, 6);
        assert_eq!(summary.busy_ticks(), 4);
        assert!(summary.is_complete());
        assert!((summary.avg_turnaround() - 4.0).abs() < f64::EPSILON);
    }
}
