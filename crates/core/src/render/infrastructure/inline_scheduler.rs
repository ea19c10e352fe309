use crate::render::render_job::RenderJob;
use crate::render::scheduler::{JobCounts, JobLedger, JobRecord, Scheduler};
use crate::shared::error::RenderError;

/// Runs each job on the caller's thread before `submit` returns.
///
/// A failing job does not fail `submit`; it is counted and recorded like
/// on the worker scheduler, so later jobs of the same request still run.
#[derive(Debug, Default)]
pub struct InlineScheduler {
    ledger: JobLedger,
}

impl InlineScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.ledger.cancel();
    }

    pub fn counts(&self) -> JobCounts {
        self.ledger.counts()
    }

    pub fn records(&self) -> Vec<JobRecord> {
        self.ledger.records()
    }
}

impl Scheduler for InlineScheduler {
    fn submit(&self, job: RenderJob) -> Result<(), RenderError> {
        self.ledger.accept();
        self.ledger.run(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::domain::catalog::CodecCatalog;
    use crate::render::encoding_engine::EngineSettings;
    use crate::render::test_support::{StubBackend, StubSource};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn job(backend: &StubBackend, name: &str, dir: &std::path::Path) -> RenderJob {
        RenderJob::new(
            dir.join(name),
            0..5,
            CodecCatalog::standard().format("avi").unwrap(),
            Box::new(StubSource::small(5)),
            Arc::new(backend.clone()),
            EngineSettings::default(),
        )
    }

    #[test]
    fn test_submit_runs_job_synchronously() {
        let dir = tempdir().unwrap();
        let backend = StubBackend::new(1152);
        let scheduler = InlineScheduler::new();
        scheduler
            .submit(job(&backend, "inline.avi", dir.path()))
            .unwrap();
        assert_eq!(backend.video_frames(), 5);
        assert!(dir.path().join("inline.avi").exists());
        assert_eq!(scheduler.counts().completed, 1);
        assert_eq!(scheduler.counts().pending(), 0);
    }

    #[test]
    fn test_failed_job_is_recorded_not_returned() {
        let dir = tempdir().unwrap();
        let mut backend = StubBackend::new(1152);
        backend.fail_encode_at = Some(1);
        let scheduler = InlineScheduler::new();

        scheduler.submit(job(&backend, "bad.avi", dir.path())).unwrap();

        assert_eq!(scheduler.counts().failed, 1);
        let records = scheduler.records();
        assert_eq!(records[0].output, dir.path().join("bad.avi"));
        assert!(records[0].result.as_ref().unwrap_err().contains("stub write failed"));
    }

    #[test]
    fn test_cancelled_scheduler_fails_jobs() {
        let dir = tempdir().unwrap();
        let backend = StubBackend::new(1152);
        let scheduler = InlineScheduler::new();
        scheduler.cancel();
        scheduler.submit(job(&backend, "cancel.avi", dir.path())).unwrap();

        assert_eq!(scheduler.counts().failed, 1);
        assert_eq!(
            scheduler.records()[0].result.as_ref().unwrap_err(),
            "render cancelled"
        );
        assert_eq!(backend.video_frames(), 0);
    }
}
