use super::{KernelCtx, Pid, Policy, QueueOrder, Scheduler, TickDecision, Ticks};

/// Round-robin with a fixed quantum. Expired processes rejoin at the back.
#[derive(Debug)]
pub struct RoundRobinScheduler {
    quantum: Ticks,
    // Consecutive ticks used by the current holder of the CPU
    used: Ticks,
}

impl RoundRobinScheduler {
    pub fn new(quantum: Ticks) -> Self {
        debug_assert!(quantum > 0, "Quantum must be positive");
        Self { quantum, used: 0 }
    }

    pub fn used(&self) -> Ticks {
        self.used
    }
}

impl Scheduler for RoundRobinScheduler {
    fn policy(&self) -> Policy {
        Policy::RoundRobin
    }

    fn queue_order(&self) -> QueueOrder {
        QueueOrder::Rotating
    }

    fn quantum(&self) -> Option<Ticks> {
        Some(self.quantum)
    }

    fn running(&mut self, _ctx: &KernelCtx, _pid: Pid) {
        self.used = 0;
    }

    fn tick(&mut self, _ctx: &KernelCtx, _pid: Pid) -> TickDecision {
        self.used += 1;
        if self.used >= self.quantum {
            self.used = 0;
            TickDecision::SliceExpired
        } else {
            TickDecision::Continue
        }
    }

    fn stopping(&mut self, _ctx: &KernelCtx, _pid: Pid) {
        self.used = 0;
    }
}
