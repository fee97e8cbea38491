use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::core::state::Ticks;
use crate::error::ValidationError;

/// Input description of one simulated process.
///
/// Numbers are signed so a workload file with negative values parses and is
/// rejected by [`ProcessDescriptor::validate`] with a precise error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    pub id: String,
    pub arrival_time: i64,
    pub cpu_bursts: Vec<i64>,
    #[serde(default)]
    pub io_times: Vec<i64>,
}

/// A descriptor that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub arrival_time: Ticks,
    pub cpu_bursts: Vec<Ticks>,
    pub io_times: Vec<Ticks>,
}

impl ProcessDescriptor {
    pub fn new(
        id: impl Into<String>,
        arrival_time: i64,
        cpu_bursts: &[i64],
        io_times: &[i64],
    ) -> Self {
        Self {
            id: id.into(),
            arrival_time,
            cpu_bursts: cpu_bursts.to_vec(),
            io_times: io_times.to_vec(),
        }
    }

    /// `index` is the position in the input list, used when the id is empty.
    pub fn validate(&self, index: usize) -> Result<Job, ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyId { index });
        }
        let id = || self.id.clone();

        if self.cpu_bursts.is_empty() {
            return Err(ValidationError::EmptyBursts { id: id() });
        }
        if let Some((index, &value)) = self.cpu_bursts.iter().enumerate().find(|&(_, &b)| b <= 0) {
            return Err(ValidationError::NonPositiveBurst {
                id: id(),
                index,
                value,
            });
        }
        let expected = self.cpu_bursts.len() - 1;
        if self.io_times.len() != expected {
            return Err(ValidationError::IoLengthMismatch {
                id: id(),
                expected,
                actual: self.io_times.len(),
            });
        }
        if let Some((index, &value)) = self.io_times.iter().enumerate().find(|&(_, &t)| t <= 0) {
            return Err(ValidationError::NonPositiveIo {
                id: id(),
                index,
                value,
            });
        }
        if self.arrival_time < 0 {
            return Err(ValidationError::NegativeArrival {
                id: id(),
                value: self.arrival_time,
            });
        }

        Ok(Job {
            id: id(),
            arrival_time: self.arrival_time as Ticks,
            cpu_bursts: self.cpu_bursts.iter().map(|&b| b as Ticks).collect(),
            io_times: self.io_times.iter().map(|&t| t as Ticks).collect(),
        })
    }
}

impl Job {
    pub fn total_cpu(&self) -> Ticks {
        self.cpu_bursts.iter().sum()
    }
}

/// Validate a whole workload up front. Fails on the first bad descriptor,
/// so no run ever starts from partially valid input.
pub fn validate_all(descriptors: &[ProcessDescriptor]) -> Result<Vec<Job>, ValidationError> {
    if descriptors.is_empty() {
        return Err(ValidationError::EmptyWorkload);
    }

    let mut seen = FxHashSet::default();
    let mut jobs = Vec::with_capacity(descriptors.len());
    for (index, descriptor) in descriptors.iter().enumerate() {
        let job = descriptor.validate(index)?;
        if !seen.insert(job.id.clone()) {
            return Err(ValidationError::DuplicateId { id: job.id });
        }
        jobs.push(job);
    }
    Ok(jobs)
}
