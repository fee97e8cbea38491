use super::{Policy, QueueOrder, Scheduler};

/// Run to completion in arrival order.
#[derive(Debug, Default)]
pub struct FifoScheduler;

impl Scheduler for FifoScheduler {
    fn policy(&self) -> Policy {
        Policy::Fifo
    }

    fn queue_order(&self) -> QueueOrder {
        QueueOrder::Fifo
    }
}
