use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::render::encoding_engine::EncodeReport;
use crate::render::render_job::RenderJob;
use crate::shared::error::RenderError;

/// Runs render jobs somewhere.
///
/// This is a port. Infrastructure decides on which thread and in which
/// order jobs execute. An `Err` means the job was not accepted; how an
/// accepted job ends is reported through the scheduler's own records.
pub trait Scheduler: Send + Sync {
    fn submit(&self, job: RenderJob) -> Result<(), RenderError>;
}

/// Snapshot of a scheduler's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobCounts {
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
}

impl JobCounts {
    /// Counters are read one by one, so a snapshot taken while jobs finish
    /// may show more finished jobs than submitted ones.
    pub fn pending(&self) -> usize {
        self.submitted
            .saturating_sub(self.completed)
            .saturating_sub(self.failed)
    }
}

/// How one job ended.
#[derive(Clone, Debug)]
pub struct JobRecord {
    pub name: String,
    pub output: PathBuf,
    pub result: Result<EncodeReport, String>,
}

/// Counters, records and the cancel switch shared by scheduler implementations.
#[derive(Debug, Default)]
pub(crate) struct JobLedger {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicBool,
    records: Mutex<Vec<JobRecord>>,
}

impl JobLedger {
    pub fn accept(&self) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
    }

    pub fn withdraw(&self) {
        self.submitted.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Runs `job` unless the ledger was cancelled, then records the outcome.
    pub fn run(&self, job: RenderJob) {
        let name = job.name().to_string();
        let output = job.output().to_path_buf();
        let result = if self.cancelled.load(Ordering::SeqCst) {
            log::info!("Skipping queued render of '{name}'");
            Err(RenderError::Cancelled)
        } else {
            job.run(&self.cancelled)
        };

        let counter = match &result {
            Ok(_) => &self.completed,
            Err(_) => &self.failed,
        };
        if let Ok(mut records) = self.records.lock() {
            records.push(JobRecord {
                name,
                output,
                result: result.map_err(|e| e.to_string()),
            });
        }
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn counts(&self) -> JobCounts {
        JobCounts {
            submitted: self.submitted.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }

    pub fn records(&self) -> Vec<JobRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}
