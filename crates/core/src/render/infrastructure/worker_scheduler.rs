use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::render::render_job::RenderJob;
use crate::render::scheduler::{JobCounts, JobLedger, JobRecord, Scheduler};
use crate::shared::error::RenderError;

/// Executes jobs one after another on a single background thread.
///
/// Layout: `submit → channel → worker`. Counters are polled from any
/// thread; `cancel` makes the running job and everything still queued end
/// in `Cancelled`.
pub struct WorkerScheduler {
    sender: Option<Sender<RenderJob>>,
    worker: Option<JoinHandle<()>>,
    ledger: Arc<JobLedger>,
}

impl WorkerScheduler {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded::<RenderJob>();
        let ledger = Arc::new(JobLedger::default());
        let worker = spawn_worker(receiver, ledger.clone());
        Self {
            sender: Some(sender),
            worker: Some(worker),
            ledger,
        }
    }

    pub fn counts(&self) -> JobCounts {
        self.ledger.counts()
    }

    pub fn records(&self) -> Vec<JobRecord> {
        self.ledger.records()
    }

    pub fn cancel(&self) {
        log::info!("Cancelling render queue");
        self.ledger.cancel();
    }

    /// Stops accepting jobs, waits for the queue to drain and returns the final counts.
    pub fn wait(mut self) -> JobCounts {
        self.shutdown();
        self.counts()
    }

    fn shutdown(&mut self) {
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Render worker thread panicked");
            }
        }
    }
}

impl Default for WorkerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WorkerScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Scheduler for WorkerScheduler {
    fn submit(&self, job: RenderJob) -> Result<(), RenderError> {
        let stopped = || RenderError::InvalidState {
            state: "scheduler stopped".to_string(),
        };
        let sender = self.sender.as_ref().ok_or_else(stopped)?;
        self.ledger.accept();
        sender.send(job).map_err(|_| {
            self.ledger.withdraw();
            stopped()
        })
    }
}

fn spawn_worker(receiver: Receiver<RenderJob>, ledger: Arc<JobLedger>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for job in receiver {
            ledger.run(job);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::domain::catalog::CodecCatalog;
    use crate::render::encoding_engine::EngineSettings;
    use crate::render::test_support::{StubBackend, StubSource};
    use std::path::Path;
    use tempfile::tempdir;

    fn job(backend: &StubBackend, output: &Path, length: i64) -> RenderJob {
        RenderJob::new(
            output.to_path_buf(),
            0..length,
            CodecCatalog::standard().format("avi").unwrap(),
            Box::new(StubSource::small(length)),
            Arc::new(backend.clone()),
            EngineSettings::default(),
        )
    }

    #[test]
    fn test_jobs_run_in_order_and_are_counted() {
        let dir = tempdir().unwrap();
        let backend = StubBackend::new(1152);
        let scheduler = WorkerScheduler::new();

        scheduler.submit(job(&backend, &dir.path().join("a.avi"), 5)).unwrap();
        scheduler.submit(job(&backend, &dir.path().join("b.avi"), 5)).unwrap();
        let ledger = scheduler.ledger.clone();
        let counts = scheduler.wait();

        assert_eq!(
            counts,
            JobCounts {
                submitted: 2,
                completed: 2,
                failed: 0
            }
        );
        assert_eq!(counts.pending(), 0);
        let outputs: Vec<_> = ledger.records().iter().map(|r| r.output.clone()).collect();
        assert_eq!(outputs, vec![dir.path().join("a.avi"), dir.path().join("b.avi")]);
        assert!(dir.path().join("a.avi").exists());
    }

    #[test]
    fn test_failed_job_is_counted_and_recorded() {
        let dir = tempdir().unwrap();
        let mut backend = StubBackend::new(1152);
        backend.fail_encode_at = Some(1);
        let scheduler = WorkerScheduler::new();

        scheduler.submit(job(&backend, &dir.path().join("bad.avi"), 5)).unwrap();
        let ledger = scheduler.ledger.clone();
        let counts = scheduler.wait();

        assert_eq!(counts.failed, 1);
        assert!(ledger.records()[0].result.is_err());
        assert!(!dir.path().join("bad.avi").exists());
    }

    #[test]
    fn test_cancel_fails_queued_jobs() {
        let dir = tempdir().unwrap();
        let backend = StubBackend::new(1152);
        let scheduler = WorkerScheduler::new();
        scheduler.cancel();

        scheduler.submit(job(&backend, &dir.path().join("a.avi"), 5)).unwrap();
        scheduler.submit(job(&backend, &dir.path().join("b.avi"), 5)).unwrap();
        let ledger = scheduler.ledger.clone();
        let counts = scheduler.wait();

        assert_eq!(counts.failed, 2);
        assert_eq!(counts.completed, 0);
        assert!(ledger
            .records()
            .iter()
            .all(|r| r.result.as_ref().unwrap_err() == "render cancelled"));
        assert!(!dir.path().join("a.avi").exists());
    }
}
