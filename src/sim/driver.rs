use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::info;

use super::{
    job::{ProcessDescriptor, validate_all},
    report::Reporter,
    summary::RunSummary,
};
use crate::{
    core::{driver::SchedCore, ProcState, Pid, TickSnapshot, Ticks},
    error::SimError,
    scheduler::{Policy, build_scheduler},
};

/// External stop signal, checked between ticks only.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    Cancelled(RunSummary),
}

impl RunOutcome {
    pub fn summary(&self) -> &RunSummary {
        match self {
            Self::Completed(summary) | Self::Cancelled(summary) => summary,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// One simulation run. Owns the process table and ready queue until dropped.
#[derive(Debug)]
pub struct Run {
    core: SchedCore,
    // Pids ordered by arrival time, descriptor order within a tick
    arrivals: Vec<Pid>,
    arrival_cursor: usize,
    fast_forward: bool,
}

/// Validate `descriptors` and the policy configuration, then build a run
/// positioned before tick 0.
pub fn new_run(
    descriptors: &[ProcessDescriptor],
    policy: Policy,
    quantum: Option<i64>,
) -> Result<Run, SimError> {
    Run::new(descriptors, policy, quantum)
}

impl Run {
    pub fn new(
        descriptors: &[ProcessDescriptor],
        policy: Policy,
        quantum: Option<i64>,
    ) -> Result<Self, SimError> {
        let jobs = validate_all(descriptors)?;
        let scheduler = build_scheduler(policy, quantum)?;

        let mut core = SchedCore::new(scheduler, jobs.len());
        let mut arrivals: Vec<(Ticks, Pid)> = jobs
            .into_iter()
            .map(|job| {
                let pid = core.ctx.create_process(
                    &job.id,
                    job.arrival_time,
                    job.cpu_bursts,
                    job.io_times,
                );
                (job.arrival_time, pid)
            })
            .collect();
        // Stable: equal arrivals keep descriptor order
        arrivals.sort_by_key(|&(arrival, _)| arrival);

        info!(
            %policy,
            quantum = core.scheduler().quantum(),
            processes = arrivals.len(),
            "run created"
        );

        Ok(Self {
            core,
            arrivals: arrivals.into_iter().map(|(_, pid)| pid).collect(),
            arrival_cursor: 0,
            fast_forward: false,
        })
    }

    /// Jump over idle stretches in the run loops. Snapshots are identical to
    /// single stepping.
    pub fn with_fast_forward(mut self, enabled: bool) -> Self {
        self.fast_forward = enabled;
        self
    }

    /// Advance exactly one tick. Once every process has finished the clock
    /// stays put and the terminal state is returned instead.
    pub fn step(&mut self) -> TickSnapshot {
        if self.is_complete() {
            return self.core.current_snapshot();
        }
        self.core.complete_io();
        self.handle_arrivals();
        self.core.tick()
    }

    fn handle_arrivals(&mut self) {
        let now = self.core.now();
        while let Some(&pid) = self.arrivals.get(self.arrival_cursor) {
            let arrival = self.core.ctx.process(pid).arrival_time;
            debug_assert!(arrival >= now, "Missed arrival of {pid:?} at t={arrival}");
            if arrival != now {
                break;
            }
            self.core.admit(pid);
            self.arrival_cursor += 1;
        }
    }

    /// Next tick at which something can happen, if the CPU is idle with an
    /// empty queue and that tick lies in the future.
    fn idle_horizon(&self) -> Option<Ticks> {
        let ctx = &self.core.ctx;
        if ctx.running.is_some() || !ctx.ready.is_empty() {
            return None;
        }

        let next_arrival = self
            .arrivals
            .get(self.arrival_cursor)
            .map(|&pid| ctx.process(pid).arrival_time);
        let next_io = ctx.blocked().filter_map(|(_, p)| p.io_end_time).min();
        let horizon = match (next_arrival, next_io) {
            (Some(a), Some(b)) => a.min(b),
            (a, b) => a.or(b)?,
        };
        (horizon > ctx.now).then_some(horizon)
    }

    pub fn run_to_completion<R: Reporter + ?Sized>(&mut self, reporter: &mut R) -> RunSummary {
        self.drive(reporter, None);
        let summary = self.summary();
        reporter.on_finish(&summary);
        summary
    }

    pub fn run_until_stopped<R: Reporter + ?Sized>(
        &mut self,
        reporter: &mut R,
        stop: &StopToken,
    ) -> RunOutcome {
        let completed = self.drive(reporter, Some(stop));
        let summary = self.summary();
        reporter.on_finish(&summary);
        if completed {
            RunOutcome::Completed(summary)
        } else {
            info!(time = self.now(), "run cancelled");
            RunOutcome::Cancelled(summary)
        }
    }

    // Returns false if stopped before every process finished
    fn drive<R: Reporter + ?Sized>(&mut self, reporter: &mut R, stop: Option<&StopToken>) -> bool {
        let stopped = || stop.is_some_and(StopToken::is_stopped);

        while !self.is_complete() {
            if stopped() {
                return false;
            }

            if self.fast_forward {
                if let Some(horizon) = self.idle_horizon() {
                    while self.core.now() < horizon {
                        let snapshot = self.core.idle_tick();
                        reporter.on_tick(&snapshot);
                        if stopped() {
                            return false;
                        }
                    }
                    continue;
                }
            }

            let snapshot = self.step();
            reporter.on_tick(&snapshot);
        }

        info!(
            time = self.now(),
            idle = self.core.ctx.idle_ticks,
            "all processes finished"
        );
        true
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_ctx(&self.core.ctx, self.policy(), self.core.scheduler().quantum())
    }

    pub fn is_complete(&self) -> bool {
        self.core.ctx.all_completed()
    }

    pub fn now(&self) -> Ticks {
        self.core.now()
    }

    pub fn policy(&self) -> Policy {
        self.core.scheduler().policy()
    }

    pub fn total(&self) -> usize {
        self.core.ctx.total()
    }

    pub fn completed(&self) -> usize {
        self.core.ctx.completed
    }

    pub fn state_of(&self, id: &str) -> Option<ProcState> {
        let pid = self.core.ctx.lookup(id)?;
        Some(self.core.ctx.process(pid).state)
    }

    /// Read access to the engine, for hosts that inspect state between ticks.
    pub fn core(&self) -> &SchedCore {
        &self.core
    }
}
