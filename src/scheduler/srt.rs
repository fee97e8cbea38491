use super::{KernelCtx, Pid, Policy, QueueOrder, Scheduler};

/// Shortest job first. Selection by remaining time, never preempts.
#[derive(Debug, Default)]
pub struct SjfScheduler;

impl Scheduler for SjfScheduler {
    fn policy(&self) -> Policy {
        Policy::Sjf
    }

    fn queue_order(&self) -> QueueOrder {
        QueueOrder::ShortestRemaining
    }
}

/// Shortest time to completion first.
///
/// Same selection rule as [`SjfScheduler`], but the running process is
/// preempted as soon as a ready process needs strictly less time. Ties keep
/// the running process on the CPU.
#[derive(Debug, Default)]
pub struct StcfScheduler;

impl Scheduler for StcfScheduler {
    fn policy(&self) -> Policy {
        Policy::Stcf
    }

    fn queue_order(&self) -> QueueOrder {
        QueueOrder::ShortestRemaining
    }

    fn should_preempt(&self, ctx: &KernelCtx, running: Pid) -> bool {
        let current = ctx.process(running).remaining_time;
        ctx.peek_ready()
            .is_some_and(|shortest| shortest.remaining_time < current)
    }
}
