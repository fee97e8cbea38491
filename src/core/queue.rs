use keyed_priority_queue::KeyedPriorityQueue;
use serde::Serialize;
use slotmap::SlotMap;
use std::{cmp::Ordering, collections::VecDeque};

use super::state::{Pid, ProcessRuntime, Ticks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOrder {
    Fifo,
    ShortestRemaining,
    Rotating,
}

/// Priority of a process in a shortest-remaining-time queue.
///
/// A queued process never executes, so its remaining time is fixed for as
/// long as it is a member and can be captured at push time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrtKey {
    pub remaining: Ticks,
    pub arrival: Ticks,
    pub seq: u64,
}

// KeyedPriorityQueue is a max-heap, so the smallest key has to compare greatest
impl Ord for SrtKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.remaining, other.arrival, other.seq).cmp(&(self.remaining, self.arrival, self.seq))
    }
}

impl PartialOrd for SrtKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ready queue holding handles into the process table.
///
/// Membership is mirrored in [`ProcessRuntime::in_queue`]; pushing a member
/// twice is a no-op. There is no capacity limit.
#[derive(Debug)]
pub enum ReadyQueue {
    Fifo {
        pids: VecDeque<Pid>,
    },
    Rotating {
        pids: VecDeque<Pid>,
    },
    ShortestRemaining {
        pids: KeyedPriorityQueue<Pid, SrtKey>,
        next_seq: u64,
    },
}

impl ReadyQueue {
    pub fn new(order: QueueOrder) -> Self {
        match order {
            QueueOrder::Fifo => Self::Fifo {
                pids: VecDeque::new(),
            },
            QueueOrder::Rotating => Self::Rotating {
                pids: VecDeque::new(),
            },
            QueueOrder::ShortestRemaining => Self::ShortestRemaining {
                pids: KeyedPriorityQueue::new(),
                next_seq: 0,
            },
        }
    }

    /// Push to the back (FIFO orders) or into the heap. Returns false and
    /// leaves the queue untouched if `process` is already a member.
    pub fn push(&mut self, pid: Pid, process: &mut ProcessRuntime) -> bool {
        if process.in_queue {
            return false;
        }

        match self {
            Self::Fifo { pids } | Self::Rotating { pids } => pids.push_back(pid),
            Self::ShortestRemaining { pids, next_seq } => {
                let key = SrtKey {
                    remaining: process.remaining_time,
                    arrival: process.arrival_time,
                    seq: *next_seq,
                };
                *next_seq += 1;
                pids.push(pid, key);
            }
        }

        process.in_queue = true;
        true
    }

    pub fn pop(&mut self, procs: &mut SlotMap<Pid, ProcessRuntime>) -> Option<Pid> {
        let pid = match self {
            Self::Fifo { pids } | Self::Rotating { pids } => pids.pop_front(),
            Self::ShortestRemaining { pids, .. } => pids.pop().map(|(pid, _)| pid),
        }?;

        let process = &mut procs[pid];
        debug_assert!(process.in_queue, "Process {} missing queue flag", process.id);
        process.in_queue = false;
        Some(pid)
    }

    pub fn peek(&self) -> Option<Pid> {
        match self {
            Self::Fifo { pids } | Self::Rotating { pids } => pids.front().copied(),
            Self::ShortestRemaining { pids, .. } => pids.peek().map(|(pid, _)| *pid),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fifo { pids } | Self::Rotating { pids } => pids.len(),
            Self::ShortestRemaining { pids, .. } => pids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn occurrences(&self, pid: Pid) -> usize {
        match self {
            Self::Fifo { pids } | Self::Rotating { pids } => {
                pids.iter().filter(|&&p| p == pid).count()
            }
            Self::ShortestRemaining { pids, .. } => pids.iter().filter(|t| *t.0 == pid).count(),
        }
    }

    /// Members in queue order. Heap-backed queues report insertion order.
    pub fn pids(&self) -> Vec<Pid> {
        match self {
            Self::Fifo { pids } | Self::Rotating { pids } => pids.iter().copied().collect(),
            Self::ShortestRemaining { pids, .. } => {
                let mut members: Vec<(u64, Pid)> =
                    pids.iter().map(|(pid, key)| (key.seq, *pid)).collect();
                members.sort_unstable_by_key(|&(seq, _)| seq);
                members.into_iter().map(|(_, pid)| pid).collect()
            }
        }
    }
}
