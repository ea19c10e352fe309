use std::collections::HashMap;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

use crate::codec::domain::catalog::CodecCatalog;
use crate::codec::domain::codec_backend::CodecBackend;
use crate::render::domain::render_config::RenderConfig;
use crate::render::domain::segmentation;
use crate::render::domain::timeline_source::TimelineSource;
use crate::render::encoding_engine::{EngineSettings, RenderProgress};
use crate::render::render_job::RenderJob;
use crate::render::scheduler::Scheduler;
use crate::shared::error::RenderError;
use crate::shared::time::Pts;

/// A job handed to the scheduler.
#[derive(Clone, Debug)]
pub struct ScheduledRender {
    pub output: PathBuf,
    pub range: Range<Pts>,
    pub progress: Arc<RenderProgress>,
}

/// One sequence of a batch render together with its configuration.
pub struct SequenceRender<'a> {
    pub source: &'a dyn TimelineSource,
    pub config: &'a RenderConfig,
}

#[derive(Debug)]
pub struct RejectedSequence {
    pub name: String,
    pub reason: RenderError,
}

#[derive(Debug, Default)]
pub struct ScheduleReport {
    pub scheduled: Vec<ScheduledRender>,
    pub rejected: Vec<RejectedSequence>,
}

/// Turns render requests into encode jobs.
///
/// Runs the pre-flight checks, splits at cuts when asked, and submits one
/// job per output file.
pub struct RenderUseCase<'a> {
    catalog: &'a CodecCatalog,
    backend: Arc<dyn CodecBackend>,
    scheduler: &'a dyn Scheduler,
    settings: EngineSettings,
}

impl<'a> RenderUseCase<'a> {
    pub fn new(
        catalog: &'a CodecCatalog,
        backend: Arc<dyn CodecBackend>,
        scheduler: &'a dyn Scheduler,
        settings: EngineSettings,
    ) -> Self {
        Self {
            catalog,
            backend,
            scheduler,
            settings,
        }
    }

    /// Schedules one sequence. Nothing is submitted when a pre-flight check
    /// fails. A job that fails while running does not stop the others; its
    /// outcome is reported by the scheduler.
    pub fn schedule(
        &self,
        source: &dyn TimelineSource,
        config: &RenderConfig,
    ) -> Result<Vec<ScheduledRender>, RenderError> {
        config.preflight(self.catalog, self.backend.as_ref())?;
        let output = config
            .output_file()
            .ok_or(RenderError::NoOutputFileSelected)?;
        let bounds = config.check_range(source.length())?;
        let planned = segmentation::plan(
            &output,
            bounds,
            &source.tracks(),
            config.separate_at_cuts(),
        );
        log::info!(
            "Scheduling {} job(s) for '{}'",
            planned.len(),
            source.name()
        );

        let mut scheduled = Vec::with_capacity(planned.len());
        for target in planned {
            let job = RenderJob::new(
                target.path.clone(),
                target.range.clone(),
                config.format().clone(),
                source.fork(),
                self.backend.clone(),
                self.settings.clone(),
            );
            let progress = job.progress();
            self.scheduler.submit(job)?;
            scheduled.push(ScheduledRender {
                output: target.path,
                range: target.range,
                progress,
            });
        }
        Ok(scheduled)
    }

    /// Schedules every sequence that passes its checks. Sequences without a
    /// usable file name, or sharing an output file with another sequence,
    /// are rejected and reported instead.
    pub fn schedule_all(&self, sequences: &[SequenceRender<'_>]) -> ScheduleReport {
        let mut uses: HashMap<PathBuf, usize> = HashMap::new();
        for sequence in sequences {
            if let Some(path) = sequence.config.output_file() {
                *uses.entry(path).or_default() += 1;
            }
        }

        let mut report = ScheduleReport::default();
        for sequence in sequences {
            let outcome = self.check_unique(sequence, &uses).and_then(|()| {
                self.schedule(sequence.source, sequence.config)
            });
            match outcome {
                Ok(jobs) => report.scheduled.extend(jobs),
                Err(reason) => {
                    log::warn!("Not rendering '{}': {reason}", sequence.source.name());
                    report.rejected.push(RejectedSequence {
                        name: sequence.source.name().to_string(),
                        reason,
                    });
                }
            }
        }
        report
    }

    fn check_unique(
        &self,
        sequence: &SequenceRender<'_>,
        uses: &HashMap<PathBuf, usize>,
    ) -> Result<(), RenderError> {
        let path = sequence.config.check_file_name(self.catalog)?;
        if uses.get(&path).copied().unwrap_or(0) > 1 {
            return Err(RenderError::DuplicateOutputFile { path });
        }
        Ok(())
    }
}
