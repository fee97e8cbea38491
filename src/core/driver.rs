use tracing::{debug, trace};

use super::{
    event::{PreemptReason, SchedEvent},
    observer::Observer,
    snapshot::{BlockedView, RunningView, TickSnapshot},
    state::{KernelCtx, Pid, ProcState, Ticks},
};
use crate::scheduler::{Scheduler, TickDecision};

pub struct SchedCore {
    pub ctx: KernelCtx,
    scheduler: Box<dyn Scheduler>,
    observer: Observer,
    // Transitions of the tick in progress
    events: Vec<SchedEvent>,
}

impl SchedCore {
    pub fn new(scheduler: Box<dyn Scheduler>, capacity: usize) -> Self {
        let ctx = KernelCtx::new(scheduler.queue_order(), capacity);
        Self {
            ctx,
            scheduler,
            observer: Observer::new(),
            events: Vec::new(),
        }
    }

    /// Phase 1: blocked processes whose I/O ends now move to their next burst.
    pub fn complete_io(&mut self) {
        let now = self.ctx.now;
        let due: Vec<Pid> = self
            .ctx
            .blocked()
            .filter(|(_, p)| p.io_end_time == Some(now))
            .map(|(pid, _)| pid)
            .collect();

        for pid in due {
            self.ctx.mark_ready(pid);
            let process = self.ctx.process_mut(pid);
            process.current_burst += 1;

            if process.current_burst < process.num_bursts() {
                process.remaining_time = process.cpu_bursts[process.current_burst];
                let event = SchedEvent::IoCompleted {
                    id: process.id.clone(),
                    next_burst: process.current_burst,
                    duration: process.remaining_time,
                };
                debug!(time = now, id = %process.id, burst = process.current_burst, "io completed");
                self.events.push(event);
                self.ctx.enqueue(pid);
            } else {
                // Only reachable if a process blocks after its final burst
                let id = process.id.clone();
                self.ctx.mark_finished(pid, now);
                debug!(time = now, %id, "finished after io");
                self.events.push(SchedEvent::Finished { id });
            }
        }
    }

    /// Phase 2, for one process: load the first burst and queue it.
    pub fn admit(&mut self, pid: Pid) {
        if self.ctx.process(pid).is_finished() {
            return;
        }
        self.ctx.admit(pid);
        self.ctx.enqueue(pid);

        let process = self.ctx.process(pid);
        debug!(time = self.ctx.now, id = %process.id, burst = process.remaining_time, "arrived");
        self.events.push(SchedEvent::Arrived {
            id: process.id.clone(),
            duration: process.remaining_time,
        });
    }

    /// Phases 3-7. Returns the snapshot taken after execution, carrying every
    /// event of the tick, including those recorded by [`Self::complete_io`]
    /// and [`Self::admit`].
    pub fn tick(&mut self) -> TickSnapshot {
        self.check_preemption();
        self.try_dispatch();
        let snapshot = self.execute();
        self.finish_tick();

        self.ctx.advance_time(1);
        self.observer.observe(&self.ctx);
        self.seal(snapshot)
    }

    /// An idle tick without running the phases. Only valid while nothing is
    /// due: CPU free, queue empty, no I/O completing and no arrival at `now`.
    pub fn idle_tick(&mut self) -> TickSnapshot {
        debug_assert!(self.ctx.running.is_none() && self.ctx.ready.is_empty());
        debug_assert!(
            self.ctx.blocked().all(|(_, p)| p.io_end_time != Some(self.ctx.now)),
            "Skipped over an I/O completion at t={}",
            self.ctx.now
        );
        let snapshot = self.execute();
        self.ctx.advance_time(1);
        self.observer.observe(&self.ctx);
        self.seal(snapshot)
    }

    fn seal(&mut self, mut snapshot: TickSnapshot) -> TickSnapshot {
        snapshot.events = std::mem::take(&mut self.events);
        snapshot
    }

    fn check_preemption(&mut self) {
        let Some(pid) = self.ctx.running else {
            return;
        };
        if !self.scheduler.should_preempt(&self.ctx, pid) {
            return;
        }
        self.preempt(pid, PreemptReason::ShorterJob);
    }

    fn preempt(&mut self, pid: Pid, reason: PreemptReason) {
        self.scheduler.stopping(&self.ctx, pid);
        self.ctx.clear_cpu();
        self.ctx.mark_ready(pid);
        self.ctx.enqueue(pid);

        let now = self.ctx.now;
        let process = self.ctx.process_mut(pid);
        process.preemptions += 1;
        debug!(
            time = now,
            id = %process.id,
            remaining = process.remaining_time,
            ?reason,
            "preempted"
        );
        self.events.push(SchedEvent::Preempted {
            id: process.id.clone(),
            remaining_time: process.remaining_time,
            reason,
        });
    }

    fn try_dispatch(&mut self) {
        if self.ctx.running.is_some() {
            return;
        }
        let Some(pid) = self.ctx.dequeue() else {
            return;
        };

        self.ctx.set_running(pid);
        self.scheduler.running(&self.ctx, pid);

        let process = self.ctx.process(pid);
        debug!(
            time = self.ctx.now,
            id = %process.id,
            burst = process.current_burst,
            remaining = process.remaining_time,
            "dispatched"
        );
        self.events.push(SchedEvent::Dispatched {
            id: process.id.clone(),
            burst_index: process.current_burst,
            remaining_time: process.remaining_time,
        });
    }

    // Phase 5: the only phase that consumes CPU time
    fn execute(&mut self) -> TickSnapshot {
        let running = match self.ctx.running {
            Some(pid) => {
                let process = self.ctx.process_mut(pid);
                debug_assert!(process.remaining_time > 0, "Running process with no work left");
                process.remaining_time -= 1;
                process.cpu_ticks += 1;
                Some(RunningView {
                    id: process.id.clone(),
                    burst_index: process.current_burst,
                    remaining_time: process.remaining_time,
                })
            }
            None => {
                self.ctx.idle_ticks += 1;
                self.events.push(SchedEvent::CpuIdle);
                None
            }
        };

        let ready = self.ctx.ready.pids();
        for &pid in &ready {
            self.ctx.process_mut(pid).ready_ticks += 1;
        }
        for process in self.ctx.procs.values_mut() {
            if process.state == ProcState::Blocked {
                process.blocked_ticks += 1;
            }
        }

        let snapshot = self.capture(running, &ready);
        trace!(snapshot = %snapshot.compact(), "tick");
        snapshot
    }

    /// State at `now` without running a tick. Once every process has
    /// finished this is the terminal view: nothing running or queued.
    pub fn current_snapshot(&self) -> TickSnapshot {
        let running = self.ctx.running_process().map(|process| RunningView {
            id: process.id.clone(),
            burst_index: process.current_burst,
            remaining_time: process.remaining_time,
        });
        self.capture(running, &self.ctx.ready.pids())
    }

    fn capture(&self, running: Option<RunningView>, ready: &[Pid]) -> TickSnapshot {
        TickSnapshot {
            time: self.ctx.now,
            running,
            ready_ids: ready
                .iter()
                .map(|&pid| self.ctx.process(pid).id.clone())
                .collect(),
            blocked: self
                .ctx
                .blocked()
                .filter_map(|(_, p)| {
                    Some(BlockedView {
                        id: p.id.clone(),
                        io_end_time: p.io_end_time?,
                    })
                })
                .collect(),
            completed_count: self.ctx.completed,
            total: self.ctx.total(),
            events: Vec::new(),
        }
    }

    // Phase 6: burst end, I/O handoff, or quantum expiry
    fn finish_tick(&mut self) {
        let Some(pid) = self.ctx.running else {
            return;
        };
        let now = self.ctx.now;
        let process = self.ctx.process(pid);

        if process.remaining_time > 0 {
            if self.scheduler.tick(&self.ctx, pid) == TickDecision::SliceExpired {
                self.preempt(pid, PreemptReason::QuantumExpired);
            }
            return;
        }

        self.scheduler.stopping(&self.ctx, pid);
        self.ctx.clear_cpu();

        match self.ctx.process(pid).current_io() {
            Some(io_duration) => {
                // Burst done at the end of `now`; I/O starts one tick after that
                let io_end_time = now + io_duration + 1;
                self.ctx.mark_blocked(pid, io_end_time);
                let id = self.ctx.process(pid).id.clone();
                debug!(time = now, %id, io_end_time, "blocked on io");
                self.events.push(SchedEvent::Blocked {
                    id,
                    io_duration,
                    io_end_time,
                });
            }
            None => {
                self.ctx.mark_finished(pid, now + 1);
                let id = self.ctx.process(pid).id.clone();
                debug!(time = now, %id, "finished");
                self.events.push(SchedEvent::Finished { id });
            }
        }
    }

    pub fn now(&self) -> Ticks {
        self.ctx.now
    }

    pub fn scheduler(&self) -> &dyn Scheduler {
        self.scheduler.as_ref()
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}

impl std::fmt::Debug for SchedCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedCore")
            .field("now", &self.ctx.now)
            .field("scheduler", &self.scheduler)
            .field("completed", &self.ctx.completed)
            .finish()
    }
}
