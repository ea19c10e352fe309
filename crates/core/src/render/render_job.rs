use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::codec::domain::codec_backend::CodecBackend;
use crate::codec::domain::output_format::OutputFormat;
use crate::render::domain::timeline_source::TimelineSource;
use crate::render::encoding_engine::{EncodeReport, EncodingEngine, EngineSettings, RenderProgress};
use crate::shared::error::RenderError;
use crate::shared::time::Pts;

/// One schedulable unit of work: a range of one sequence into one file.
///
/// Owns everything it needs, so it can move to any worker thread.
pub struct RenderJob {
    name: String,
    output: PathBuf,
    range: Range<Pts>,
    format: OutputFormat,
    source: Box<dyn TimelineSource>,
    backend: Arc<dyn CodecBackend>,
    settings: EngineSettings,
    progress: Arc<RenderProgress>,
}

impl RenderJob {
    pub fn new(
        output: PathBuf,
        range: Range<Pts>,
        format: OutputFormat,
        source: Box<dyn TimelineSource>,
        backend: Arc<dyn CodecBackend>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            name: source.name().to_string(),
            output,
            range,
            format,
            source,
            backend,
            settings,
            progress: Arc::new(RenderProgress::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn range(&self) -> &Range<Pts> {
        &self.range
    }

    pub fn progress(&self) -> Arc<RenderProgress> {
        self.progress.clone()
    }

    /// Runs to completion on the calling thread.
    pub fn run(mut self, cancel: &AtomicBool) -> Result<EncodeReport, RenderError> {
        log::info!(
            "Rendering '{}' [{}, {}) to {}",
            self.name,
            self.range.start,
            self.range.end,
            self.output.display()
        );
        let mut engine = EncodingEngine::new(self.backend.as_ref(), self.settings.clone())
            .with_progress(self.progress.clone());
        let result = engine.run(
            &self.format,
            &self.output,
            self.range.clone(),
            self.source.as_mut(),
            cancel,
        );
        if let Err(e) = &result {
            log::error!("Render of '{}' failed: {e}", self.name);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::domain::catalog::CodecCatalog;
    use crate::render::test_support::{StubBackend, StubSource};
    use tempfile::tempdir;

    #[test]
    fn test_job_runs_its_range_only() {
        let dir = tempdir().unwrap();
        let backend = StubBackend::new(1152);
        let job = RenderJob::new(
            dir.path().join("part.avi"),
            10..20,
            CodecCatalog::standard().format("avi").unwrap(),
            Box::new(StubSource::small(50)),
            Arc::new(backend.clone()),
            EngineSettings::default(),
        );
        assert_eq!(job.name(), "sequence");
        let progress = job.progress();

        let report = job.run(&AtomicBool::new(false)).unwrap();

        assert_eq!(report.video_frames, 10);
        assert_eq!(backend.video_frames(), 10);
        assert_eq!(progress.done(), progress.total());
    }
}
