/*!
 * Engine Property Tests
 * Invariants that hold for every valid workload under every policy
 */

use cpusim::core::{SchedEvent, TickSnapshot};
use cpusim::sim::TraceRecorder;
use cpusim::{Policy, ProcessDescriptor, new_run};
use proptest::prelude::*;
use std::collections::HashMap;

fn descriptor() -> impl Strategy<Value = (i64, Vec<i64>, Vec<i64>)> {
    (0i64..20, prop::collection::vec(1i64..6, 1..4)).prop_flat_map(|(arrival, bursts)| {
        let gaps = bursts.len() - 1;
        (
            Just(arrival),
            Just(bursts),
            prop::collection::vec(1i64..5, gaps),
        )
    })
}

fn workload() -> impl Strategy<Value = Vec<ProcessDescriptor>> {
    prop::collection::vec(descriptor(), 1..7).prop_map(|procs| {
        procs
            .into_iter()
            .enumerate()
            .map(|(i, (arrival, bursts, io))| {
                ProcessDescriptor::new(format!("P{}", i + 1), arrival, &bursts, &io)
            })
            .collect()
    })
}

fn policy() -> impl Strategy<Value = (Policy, Option<i64>)> {
    prop_oneof![
        Just((Policy::Fifo, None)),
        Just((Policy::Sjf, None)),
        Just((Policy::Stcf, None)),
        (1i64..4).prop_map(|q| (Policy::RoundRobin, Some(q))),
    ]
}

fn record(descriptors: &[ProcessDescriptor], policy: Policy, quantum: Option<i64>) -> TraceRecorder {
    let mut recorder = TraceRecorder::new();
    new_run(descriptors, policy, quantum)
        .unwrap()
        .run_to_completion(&mut recorder);
    recorder
}

proptest! {
    #[test]
    fn every_process_finishes_exactly_once(set in workload(), (policy, quantum) in policy()) {
        let recorder = record(&set, policy, quantum);

        let mut finishes: HashMap<&str, usize> = HashMap::new();
        for event in recorder.snapshots.iter().flat_map(|s| &s.events) {
            if let SchedEvent::Finished { id } = event {
                *finishes.entry(id.as_str()).or_default() += 1;
            }
        }
        prop_assert_eq!(finishes.len(), set.len());
        prop_assert!(finishes.values().all(|&n| n == 1));

        let counts: Vec<usize> = recorder.snapshots.iter().map(|s| s.completed_count).collect();
        prop_assert!(counts.windows(2).all(|w| w[1] >= w[0] && w[1] - w[0] <= 1));
        prop_assert!(counts.iter().all(|&c| c < set.len()));

        let summary = recorder.summary.unwrap();
        prop_assert_eq!(summary.completed, set.len());
    }

    #[test]
    fn elapsed_ticks_account_for_every_burst(set in workload(), (policy, quantum) in policy()) {
        let recorder = record(&set, policy, quantum);
        let summary = recorder.summary.as_ref().unwrap();

        let total_cpu: i64 = set.iter().flat_map(|d| d.cpu_bursts.iter()).sum();
        prop_assert_eq!(Some(summary.total_ticks), summary.max_finish_time());
        prop_assert_eq!(summary.busy_ticks(), total_cpu as u64);
        prop_assert_eq!(recorder.idle_ticks() as u64, summary.idle_ticks);
        prop_assert_eq!(recorder.snapshots.len() as u64, summary.total_ticks);

        for (stats, descriptor) in summary.processes.iter().zip(&set) {
            let cpu: i64 = descriptor.cpu_bursts.iter().sum();
            prop_assert_eq!(stats.cpu_time, cpu as u64);
        }
    }

    #[test]
    fn queue_membership_matches_flags(set in workload(), (policy, quantum) in policy()) {
        let mut run = new_run(&set, policy, quantum).unwrap();
        while !run.is_complete() {
            let snapshot = run.step();
            let ctx = &run.core().ctx;

            for (pid, process) in &ctx.procs {
                let occurrences = ctx.ready.occurrences(pid);
                prop_assert!(occurrences <= 1);
                prop_assert_eq!(process.in_queue, occurrences == 1);
            }

            let mut ids = snapshot.ready_ids.clone();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), snapshot.ready_ids.len());
            if let Some(running) = &snapshot.running {
                prop_assert!(!snapshot.ready_ids.contains(&running.id));
            }
        }
    }

    #[test]
    fn stcf_preempts_only_for_strictly_shorter(set in workload()) {
        let mut run = new_run(&set, Policy::Stcf, None).unwrap();
        // Remaining time of every process whose value can be seen in the trace
        let mut remaining: HashMap<String, u64> = HashMap::new();
        let mut prev: Option<TickSnapshot> = None;

        while !run.is_complete() {
            let snapshot = run.step();

            let mut candidates: Vec<String> =
                prev.as_ref().map(|p| p.ready_ids.clone()).unwrap_or_default();
            for event in &snapshot.events {
                match event {
                    SchedEvent::Arrived { id, duration }
                    | SchedEvent::IoCompleted { id, duration, .. } => {
                        remaining.insert(id.clone(), *duration);
                        candidates.push(id.clone());
                    }
                    _ => {}
                }
            }

            // Still on the CPU when the preemption check runs
            let holder = prev
                .as_ref()
                .and_then(|p| p.running.as_ref())
                .filter(|r| r.remaining_time > 0);
            let shortest = candidates.iter().map(|id| remaining[id]).min();
            let expected = match (holder, shortest) {
                (Some(r), Some(m)) => m < r.remaining_time,
                _ => false,
            };
            let preempted = snapshot
                .events
                .iter()
                .any(|e| matches!(e, SchedEvent::Preempted { .. }));
            prop_assert_eq!(preempted, expected, "tick {}", snapshot.time);

            if let Some(r) = &snapshot.running {
                remaining.insert(r.id.clone(), r.remaining_time);
            }
            prev = Some(snapshot);
        }
    }

    #[test]
    fn unit_quantum_keeps_first_dispatch_order_of_fifo(
        arrivals in prop::collection::vec((0i64..10, 1i64..5), 1..7)
    ) {
        let mut arrivals = arrivals;
        arrivals.sort_by_key(|&(a, _)| a);
        let set: Vec<ProcessDescriptor> = arrivals
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| ProcessDescriptor::new(format!("P{}", i + 1), a, &[b], &[]))
            .collect();

        let first_dispatches = |recorder: &TraceRecorder| {
            let mut seen = Vec::new();
            for id in recorder.dispatch_order() {
                if !seen.contains(&id.to_owned()) {
                    seen.push(id.to_owned());
                }
            }
            seen
        };

        let fifo = record(&set, Policy::Fifo, None);
        let rr = record(&set, Policy::RoundRobin, Some(1));
        prop_assert_eq!(first_dispatches(&fifo), first_dispatches(&rr));
    }

    #[test]
    fn unit_quantum_equals_fifo_for_unit_bursts(arrivals in prop::collection::vec(0i64..10, 1..7)) {
        let mut arrivals = arrivals;
        arrivals.sort();
        let set: Vec<ProcessDescriptor> = arrivals
            .iter()
            .enumerate()
            .map(|(i, &a)| ProcessDescriptor::new(format!("P{}", i + 1), a, &[1], &[]))
            .collect();

        let fifo = record(&set, Policy::Fifo, None);
        let rr = record(&set, Policy::RoundRobin, Some(1));
        prop_assert_eq!(fifo.snapshots, rr.snapshots);
    }

    #[test]
    fn fast_forward_is_observationally_identical(set in workload(), (policy, quantum) in policy()) {
        let slow = record(&set, policy, quantum);

        let mut fast = TraceRecorder::new();
        new_run(&set, policy, quantum)
            .unwrap()
            .with_fast_forward(true)
            .run_to_completion(&mut fast);

        prop_assert_eq!(slow.snapshots, fast.snapshots);
        prop_assert_eq!(slow.summary, fast.summary);
    }
}
