use rustc_hash::FxHashMap;

use super::state::{KernelCtx, Pid, ProcState};

/// Checks the process table against the ready queue at every tick boundary.
#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn observe(&mut self, ctx: &KernelCtx) {
        self.step += 1;
        if !cfg!(debug_assertions) {
            return;
        }

        if let Some(pid) = ctx.running {
            let process = ctx.process(pid);
            debug_assert_eq!(
                process.state,
                ProcState::Running,
                "running process {} must be Running",
                process.id
            );
            debug_assert!(
                !process.in_queue,
                "Running process {} must not appear in the ready queue",
                process.id
            );
        }

        let mut members: FxHashMap<Pid, usize> = FxHashMap::default();
        for pid in ctx.ready.pids() {
            *members.entry(pid).or_default() += 1;
        }

        let mut finished = 0;
        for (pid, process) in &ctx.procs {
            let occurrences = members.get(&pid).copied().unwrap_or(0);
            debug_assert!(
                occurrences <= 1,
                "Process {} appears {occurrences} times in the ready queue",
                process.id
            );
            debug_assert_eq!(
                process.in_queue,
                occurrences == 1,
                "in_queue flag of {} disagrees with queue membership",
                process.id
            );
            if process.in_queue {
                debug_assert_eq!(
                    process.state,
                    ProcState::Ready,
                    "Queued process {} must be Ready",
                    process.id
                );
            }
            if process.state == ProcState::Running {
                debug_assert_eq!(
                    ctx.running,
                    Some(pid),
                    "Process {} is Running but does not hold the CPU",
                    process.id
                );
            }
            debug_assert_eq!(
                process.io_end_time.is_some(),
                process.state == ProcState::Blocked,
                "io_end_time of {} set outside Blocked",
                process.id
            );
            if process.is_finished() {
                finished += 1;
            }
        }

        debug_assert_eq!(finished, ctx.completed, "completed count drifted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::QueueOrder;

    fn queued_ctx(count: usize) -> KernelCtx {
        let mut ctx = KernelCtx::new(QueueOrder::Fifo, count);
        for i in 0..count {
            let pid = ctx.create_process(&format!("P{i}"), 0, vec![1], vec![]);
            ctx.admit(pid);
            ctx.enqueue(pid);
        }
        ctx
    }

    #[test]
    fn accepts_consistent_state_with_long_queue() {
        let ctx = queued_ctx(2048);
        let mut observer = Observer::new();
        observer.observe(&ctx);
        observer.observe(&ctx);
        assert_eq!(observer.steps(), 2);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "disagrees with queue membership")]
    fn catches_flag_without_membership() {
        let mut ctx = queued_ctx(2);
        let pid = ctx.dequeue().unwrap();
        ctx.process_mut(pid).in_queue = true;
        Observer::new().observe(&ctx);
    }
}
