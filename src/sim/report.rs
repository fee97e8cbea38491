use std::io::{self, Write};

use crate::core::{PreemptReason, SchedEvent, TickSnapshot};

use super::{driver::StopToken, summary::RunSummary};

/// Receives one snapshot per tick, in tick order, synchronously.
pub trait Reporter {
    fn on_tick(&mut self, snapshot: &TickSnapshot);

    fn on_finish(&mut self, _summary: &RunSummary) {}
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn on_tick(&mut self, snapshot: &TickSnapshot) {
        (**self).on_tick(snapshot);
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        (**self).on_finish(summary);
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn on_tick(&mut self, snapshot: &TickSnapshot) {
        (**self).on_tick(snapshot);
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        (**self).on_finish(summary);
    }
}

/// Headless runs.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn on_tick(&mut self, _snapshot: &TickSnapshot) {}
}

/// Keeps every snapshot in memory.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    pub snapshots: Vec<TickSnapshot>,
    pub summary: Option<RunSummary>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact(&self) -> Vec<String> {
        self.snapshots.iter().map(TickSnapshot::compact).collect()
    }

    pub fn idle_ticks(&self) -> usize {
        self.snapshots.iter().filter(|s| s.is_idle()).count()
    }

    /// Process ids in dispatch order.
    pub fn dispatch_order(&self) -> Vec<&str> {
        self.snapshots
            .iter()
            .flat_map(|s| &s.events)
            .filter_map(|e| match e {
                SchedEvent::Dispatched { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for TraceRecorder {
    fn on_tick(&mut self, snapshot: &TickSnapshot) {
        self.snapshots.push(snapshot.clone());
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        self.summary = Some(summary.clone());
    }
}

/// Wraps another reporter and trips `stop` once `limit` ticks were reported.
#[derive(Debug)]
pub struct TickLimit<R> {
    inner: R,
    limit: u64,
    seen: u64,
    stop: StopToken,
}

impl<R: Reporter> TickLimit<R> {
    pub fn new(inner: R, limit: u64, stop: StopToken) -> Self {
        Self {
            inner,
            limit,
            seen: 0,
            stop,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Reporter> Reporter for TickLimit<R> {
    fn on_tick(&mut self, snapshot: &TickSnapshot) {
        self.inner.on_tick(snapshot);
        self.seen += 1;
        if self.seen >= self.limit {
            self.stop.stop();
        }
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        self.inner.on_finish(summary);
    }
}

/// Human-readable per-tick log.
///
/// Write errors are kept and surfaced by [`ConsoleReporter::finish`]; after
/// the first error further output is dropped.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }

    fn write_tick(&mut self, s: &TickSnapshot) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "\n=== Time {} ===", s.time)?;

        for event in &s.events {
            match event {
                SchedEvent::IoCompleted {
                    id,
                    next_burst,
                    duration,
                } => writeln!(
                    out,
                    "  + {id} completed I/O, moving to CPU burst {next_burst} (duration: {duration})"
                )?,
                SchedEvent::Arrived { id, .. } => {
                    writeln!(out, "  -> {id} arrived and added to ready queue")?
                }
                SchedEvent::Preempted {
                    id,
                    remaining_time,
                    reason,
                } => {
                    let why = match reason {
                        PreemptReason::ShorterJob => "shorter job ready",
                        PreemptReason::QuantumExpired => "quantum expired",
                    };
                    writeln!(out, "  <- {id} preempted, {why} (remaining: {remaining_time})")?
                }
                SchedEvent::Dispatched {
                    id,
                    burst_index,
                    remaining_time,
                } => writeln!(
                    out,
                    "  CPU assigned to {id} (burst {burst_index}, duration: {remaining_time})"
                )?,
                SchedEvent::Blocked {
                    id,
                    io_duration,
                    io_end_time,
                } => writeln!(
                    out,
                    "     `- {id} goes to I/O (duration: {io_duration}, ends @{io_end_time})"
                )?,
                SchedEvent::Finished { id } => writeln!(out, "     `- {id} FINISHED")?,
                SchedEvent::CpuIdle => writeln!(out, "  CPU: IDLE")?,
            }
        }

        writeln!(out, "  System State:")?;
        match &s.running {
            Some(r) => writeln!(
                out,
                "     Running: {} (burst {}, remaining: {} after execution)",
                r.id, r.burst_index, r.remaining_time
            )?,
            None => writeln!(out, "     Running: None")?,
        }
        writeln!(out, "     Ready Queue: [{}]", s.ready_ids.join(", "))?;
        let blocked: Vec<String> = s
            .blocked
            .iter()
            .map(|b| format!("{}(ends@{})", b.id, b.io_end_time))
            .collect();
        writeln!(out, "     Blocked (I/O): [{}]", blocked.join(", "))?;
        writeln!(out, "     Completed: {}/{}", s.completed_count, s.total)
    }

    fn write_summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        let out = &mut self.out;
        let status = if summary.is_complete() {
            "completed"
        } else {
            "cancelled"
        };
        writeln!(
            out,
            "\n=== FINAL: {}/{} processes {status} under {} after {} ticks ===",
            summary.completed, summary.total, summary.policy, summary.total_ticks
        )?;
        writeln!(
            out,
            "{:<8} {:>7} {:>7} {:>10} {:>8} {:>7} {:>8}",
            "id", "arrival", "finish", "turnaround", "response", "waiting", "preempt"
        )?;
        for p in &summary.processes {
            let opt = |v: Option<u64>| v.map_or_else(|| "-".to_owned(), |v| v.to_string());
            writeln!(
                out,
                "{:<8} {:>7} {:>7} {:>10} {:>8} {:>7} {:>8}",
                p.id,
                p.arrival_time,
                opt(p.finish_time),
                opt(p.turnaround),
                opt(p.response),
                p.waiting_time,
                p.preemptions
            )?;
        }
        writeln!(
            out,
            "CPU utilization: {:.1}% ({} busy, {} idle)",
            summary.cpu_utilization() * 100.0,
            summary.busy_ticks(),
            summary.idle_ticks
        )?;
        writeln!(
            out,
            "Average turnaround: {:.2} ticks, response: {:.2} ticks, waiting: {:.2} ticks",
            summary.avg_turnaround(),
            summary.avg_response(),
            summary.avg_waiting()
        )
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_tick(&mut self, snapshot: &TickSnapshot) {
        if self.error.is_none() {
            let result = self.write_tick(snapshot);
            self.record(result);
        }
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        if self.error.is_none() {
            let result = self.write_summary(summary);
            self.record(result);
        }
    }
}

/// One JSON object per line: `{"tick": ...}` per snapshot, then `{"summary": ...}`.
#[derive(Debug)]
pub struct JsonLinesReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> JsonLinesReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, value: serde_json::Value) {
        if self.error.is_some() {
            return;
        }
        let result = serde_json::to_writer(&mut self.out, &value)
            .map_err(io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"));
        if let Err(err) = result {
            self.error = Some(err);
        }
    }
}

impl<W: Write> Reporter for JsonLinesReporter<W> {
    fn on_tick(&mut self, snapshot: &TickSnapshot) {
        self.emit(serde_json::json!({ "tick": snapshot }));
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        self.emit(serde_json::json!({
            "summary": summary,
            "cpu_utilization": summary.cpu_utilization(),
            "avg_turnaround": summary.avg_turnaround(),
            "avg_response": summary.avg_response(),
            "avg_waiting": summary.avg_waiting(),
        }));
    }
}
