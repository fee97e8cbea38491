use rustc_hash::FxHashMap;
use serde::Serialize;
use slotmap::{SlotMap, new_key_type};

use super::queue::{QueueOrder, ReadyQueue};

pub type Ticks = u64;
new_key_type! {
    pub struct Pid;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcState {
    Ready,
    Running,
    Blocked,
    Finished,
}

#[derive(Debug)]
pub struct ProcessRuntime {
    pub id: String,
    pub arrival_time: Ticks,
    pub cpu_bursts: Vec<Ticks>,
    pub io_times: Vec<Ticks>,
    pub current_burst: usize,
    pub remaining_time: Ticks,
    pub state: ProcState,
    // Only meaningful while Blocked
    pub io_end_time: Option<Ticks>,
    pub in_queue: bool,
    // Set once the arrival phase has admitted the process
    pub admitted: bool,

    pub first_dispatch: Option<Ticks>,
    pub finish_time: Option<Ticks>,
    pub cpu_ticks: Ticks,
    pub ready_ticks: Ticks,
    pub blocked_ticks: Ticks,
    pub dispatches: u64,
    pub preemptions: u64,
}

impl ProcessRuntime {
    pub fn num_bursts(&self) -> usize {
        self.cpu_bursts.len()
    }

    /// I/O duration that follows the current burst, if any.
    pub fn current_io(&self) -> Option<Ticks> {
        self.io_times.get(self.current_burst).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.state == ProcState::Finished
    }
}

#[derive(Debug)]
pub struct KernelCtx {
    pub now: Ticks,
    pub completed: usize,
    pub running: Option<Pid>,
    pub ready: ReadyQueue,
    pub procs: SlotMap<Pid, ProcessRuntime>,
    pub idle_ticks: Ticks,
    ids: FxHashMap<String, Pid>,
}

impl KernelCtx {
    pub fn new(order: QueueOrder, capacity: usize) -> Self {
        Self {
            now: 0,
            completed: 0,
            running: None,
            ready: ReadyQueue::new(order),
            procs: SlotMap::with_capacity_and_key(capacity),
            idle_ticks: 0,
            ids: FxHashMap::default(),
        }
    }

    pub fn create_process(
        &mut self,
        id: &str,
        arrival_time: Ticks,
        cpu_bursts: Vec<Ticks>,
        io_times: Vec<Ticks>,
    ) -> Pid {
        debug_assert!(!cpu_bursts.is_empty(), "Process {id} has no CPU bursts");
        debug_assert!(
            !self.ids.contains_key(id),
            "Process id {id} already present in process table"
        );

        let process = ProcessRuntime {
            id: id.to_owned(),
            arrival_time,
            remaining_time: cpu_bursts[0],
            cpu_bursts,
            io_times,
            current_burst: 0,
            state: ProcState::Ready,
            io_end_time: None,
            in_queue: false,
            admitted: false,
            first_dispatch: None,
            finish_time: None,
            cpu_ticks: 0,
            ready_ticks: 0,
            blocked_ticks: 0,
            dispatches: 0,
            preemptions: 0,
        };

        let pid = self.procs.insert(process);
        self.ids.insert(id.to_owned(), pid);
        pid
    }

    pub fn total(&self) -> usize {
        self.procs.len()
    }

    pub fn all_completed(&self) -> bool {
        self.completed == self.procs.len()
    }

    pub fn lookup(&self, id: &str) -> Option<Pid> {
        self.ids.get(id).copied()
    }

    pub fn process(&self, pid: Pid) -> &ProcessRuntime {
        &self.procs[pid]
    }

    pub fn process_mut(&mut self, pid: Pid) -> &mut ProcessRuntime {
        &mut self.procs[pid]
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    // Returns false if the process was already queued
    pub fn enqueue(&mut self, pid: Pid) -> bool {
        let process = &mut self.procs[pid];
        debug_assert!(
            process.state == ProcState::Ready,
            "Process {} must be Ready when enqueued, was {:?}",
            process.id,
            process.state
        );
        self.ready.push(pid, process)
    }

    pub fn dequeue(&mut self) -> Option<Pid> {
        self.ready.pop(&mut self.procs)
    }

    pub fn peek_ready(&self) -> Option<&ProcessRuntime> {
        self.ready.peek().map(|pid| &self.procs[pid])
    }

    pub fn running_process(&self) -> Option<&ProcessRuntime> {
        self.running.map(|pid| &self.procs[pid])
    }

    /// Admit a process on arrival: first burst loaded, state Ready.
    pub fn admit(&mut self, pid: Pid) {
        let process = &mut self.procs[pid];
        debug_assert!(!process.admitted, "Process {} admitted twice", process.id);
        process.admitted = true;
        process.current_burst = 0;
        process.remaining_time = process.cpu_bursts[0];
        process.state = ProcState::Ready;
    }

    pub fn mark_ready(&mut self, pid: Pid) {
        let process = &mut self.procs[pid];
        debug_assert!(
            process.state != ProcState::Finished,
            "Finished process {} cannot become Ready",
            process.id
        );
        process.state = ProcState::Ready;
        process.io_end_time = None;
    }

    pub fn set_running(&mut self, pid: Pid) {
        debug_assert!(self.running.is_none(), "CPU already running a process");
        let now = self.now;
        let process = &mut self.procs[pid];
        debug_assert!(
            !process.in_queue,
            "Running process {} must not be enqueued",
            process.id
        );
        process.state = ProcState::Running;
        process.dispatches += 1;
        process.first_dispatch.get_or_insert(now);
        self.running = Some(pid);
    }

    pub fn clear_cpu(&mut self) {
        self.running = None;
    }

    pub fn mark_blocked(&mut self, pid: Pid, io_end_time: Ticks) {
        let process = &mut self.procs[pid];
        debug_assert!(
            !process.in_queue,
            "Blocking process {} that is still enqueued",
            process.id
        );
        process.state = ProcState::Blocked;
        process.io_end_time = Some(io_end_time);
    }

    pub fn mark_finished(&mut self, pid: Pid, finish_time: Ticks) {
        let process = &mut self.procs[pid];
        debug_assert!(
            !process.in_queue,
            "Finishing process {} that is still enqueued",
            process.id
        );
        debug_assert!(
            process.state != ProcState::Finished,
            "Process {} finished twice",
            process.id
        );
        process.state = ProcState::Finished;
        process.io_end_time = None;
        process.finish_time = Some(finish_time);
        self.completed += 1;
        debug_assert!(self.completed <= self.procs.len());
    }

    pub fn blocked(&self) -> impl Iterator<Item = (Pid, &ProcessRuntime)> {
        self.procs
            .iter()
            .filter(|(_, p)| p.state == ProcState::Blocked)
    }
}
