pub mod fifo;
pub mod rr;
pub mod srt;

use serde::Serialize;
use std::{fmt, str::FromStr};

use crate::core::{
    Ticks,
    queue::QueueOrder,
    state::{KernelCtx, Pid},
};
use crate::error::ConfigError;
pub use fifo::FifoScheduler;
pub use rr::RoundRobinScheduler;
pub use srt::{SjfScheduler, StcfScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Policy {
    Fifo,
    Sjf,
    Stcf,
    RoundRobin,
}

impl Policy {
    pub const ALL: [Policy; 4] = [Self::Fifo, Self::Sjf, Self::Stcf, Self::RoundRobin];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fifo => "FIFO",
            Self::Sjf => "SJF",
            Self::Stcf => "STCF",
            Self::RoundRobin => "RR",
        }
    }

    pub const fn uses_quantum(&self) -> bool {
        matches!(self, Self::RoundRobin)
    }
}

impl FromStr for Policy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FIFO" => Ok(Self::Fifo),
            "SJF" => Ok(Self::Sjf),
            "STCF" => Ok(Self::Stcf),
            "RR" => Ok(Self::RoundRobin),
            _ => Err(ConfigError::UnknownPolicy(s.to_owned())),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    Continue,
    SliceExpired,
}

/// Selection and preemption rules plugged into the tick driver.
///
/// Selection is expressed through [`Scheduler::queue_order`]; the driver owns
/// the queue itself. Hooks run in phase order: `should_preempt` (phase 3),
/// `running` on dispatch (phase 4), `tick` after a tick that did not end the
/// burst (phase 6), `stopping` whenever the process leaves the CPU.
pub trait Scheduler: fmt::Debug {
    fn policy(&self) -> Policy;

    fn queue_order(&self) -> QueueOrder;

    fn quantum(&self) -> Option<Ticks> {
        None
    }

    fn should_preempt(&self, _ctx: &KernelCtx, _running: Pid) -> bool {
        false
    }

    fn running(&mut self, _ctx: &KernelCtx, _pid: Pid) {}

    fn tick(&mut self, _ctx: &KernelCtx, _pid: Pid) -> TickDecision {
        TickDecision::Continue
    }

    fn stopping(&mut self, _ctx: &KernelCtx, _pid: Pid) {}
}

/// Build the scheduler for `policy`. A quantum is mandatory for
/// round-robin and ignored by every other policy.
pub fn build_scheduler(
    policy: Policy,
    quantum: Option<i64>,
) -> Result<Box<dyn Scheduler>, ConfigError> {
    let scheduler: Box<dyn Scheduler> = match policy {
        Policy::Fifo => Box::new(FifoScheduler),
        Policy::Sjf => Box::new(SjfScheduler),
        Policy::Stcf => Box::new(StcfScheduler),
        Policy::RoundRobin => {
            let quantum = quantum.ok_or(ConfigError::MissingQuantum)?;
            if quantum <= 0 {
                return Err(ConfigError::InvalidQuantum(quantum));
            }
            Box::new(RoundRobinScheduler::new(quantum as Ticks))
        }
    };

    if !policy.uses_quantum() {
        if let Some(quantum) = quantum {
            tracing::warn!(%policy, quantum, "quantum is ignored by this policy");
        }
    }

    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_names() {
        assert_eq!("FIFO".parse::<Policy>(), Ok(Policy::Fifo));
        assert_eq!("sjf".parse::<Policy>(), Ok(Policy::Sjf));
        assert_eq!("STCF".parse::<Policy>(), Ok(Policy::Stcf));
        assert_eq!("RR".parse::<Policy>(), Ok(Policy::RoundRobin));
        for alias in ["FCFS", "SRTF", "ROUND_ROBIN"] {
            assert_eq!(
                alias.parse::<Policy>(),
                Err(ConfigError::UnknownPolicy(alias.into()))
            );
        }
        assert_eq!(
            "LOTTERY".parse::<Policy>(),
            Err(ConfigError::UnknownPolicy("LOTTERY".into()))
        );
    }

    #[test]
    fn names_round_trip_through_display() {
        for policy in Policy::ALL {
            assert_eq!(policy.to_string().parse::<Policy>(), Ok(policy));
        }
    }

    #[test]
    fn round_robin_needs_positive_quantum() {
        assert_eq!(
            build_scheduler(Policy::RoundRobin, None).unwrap_err(),
            ConfigError::MissingQuantum
        );
        assert_eq!(
            build_scheduler(Policy::RoundRobin, Some(0)).unwrap_err(),
            ConfigError::InvalidQuantum(0)
        );
        assert_eq!(
            build_scheduler(Policy::RoundRobin, Some(-3)).unwrap_err(),
            ConfigError::InvalidQuantum(-3)
        );
        let rr = build_scheduler(Policy::RoundRobin, Some(4)).unwrap();
        assert_eq!(rr.quantum(), Some(4));
        assert_eq!(rr.queue_order(), QueueOrder::Rotating);
    }

    #[test]
    fn quantum_is_ignored_outside_round_robin() {
        let fifo = build_scheduler(Policy::Fifo, Some(3)).unwrap();
        assert_eq!(fifo.policy(), Policy::Fifo);
        assert_eq!(fifo.quantum(), None);
    }

    #[test]
    fn selection_rules_map_to_queue_orders() {
        let order = |p| build_scheduler(p, Some(1)).unwrap().queue_order();
        assert_eq!(order(Policy::Fifo), QueueOrder::Fifo);
        assert_eq!(order(Policy::Sjf), QueueOrder::ShortestRemaining);
        assert_eq!(order(Policy::Stcf), QueueOrder::ShortestRemaining);
        assert_eq!(order(Policy::RoundRobin), QueueOrder::Rotating);
    }
}
