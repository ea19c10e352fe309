use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::codec::domain::capability::CodecSupport;
use crate::codec::domain::catalog::CodecCatalog;
use crate::codec::domain::codec_backend::CodecBackend;
use crate::codec::domain::output_format::OutputFormat;
use crate::shared::error::RenderError;
use crate::shared::time::Pts;

/// What to render for one sequence and where to put it.
///
/// The output path is kept as directory, file name and extension so the
/// name can be dropped while the other two survive (the process-wide
/// default stores its directory and extension this way).
///
/// Plain value: clones are independent, `==` compares every field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    directory: Option<PathBuf>,
    file_name: Option<String>,
    extension: Option<String>,
    format: OutputFormat,
    separate_at_cuts: bool,
    range: Option<Range<Pts>>,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            directory: None,
            file_name: None,
            extension: None,
            format,
            separate_at_cuts: false,
            range: None,
        }
    }

    /// A sequence's starting configuration: the default's codecs and flags,
    /// writing `<directory>/<sequence name>.<extension>`. The directory is
    /// the default's, or `home` when it has none. The extension is the
    /// default's, or `default_extension` when it has none and the format
    /// accepts it, or else the format's preferred one.
    pub fn seeded_for_sequence(
        default: &RenderConfig,
        sequence_name: &str,
        home: &Path,
        default_extension: &str,
    ) -> Self {
        let mut config = default.clone();
        if config.directory.is_none() {
            config.directory = Some(home.to_path_buf());
        }
        config.file_name = Some(sequence_name.to_string());
        if config.extension.is_none() {
            let extension = if config.format.accepts_extension(default_extension) {
                default_extension
            } else {
                config.format.preferred_extension()
            };
            config.extension = Some(extension.to_string());
        }
        config
    }

    /// The full target path; `None` while no file name is chosen.
    pub fn output_file(&self) -> Option<PathBuf> {
        let name = self.file_name.as_deref()?;
        let file = match &self.extension {
            Some(ext) => format!("{name}.{ext}"),
            None => name.to_string(),
        };
        Some(match &self.directory {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        })
    }

    pub fn output_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn output_directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn output_extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Sets the target path. When the extension differs from the previous
    /// one and names a known container, the format is re-derived with its
    /// default codecs. Returns whether that happened.
    pub fn set_output_file(&mut self, path: PathBuf, catalog: &CodecCatalog) -> bool {
        let old_extension = self.extension.as_deref().map(str::to_ascii_lowercase);
        self.assign_parts(&path);
        let new_extension = self.extension.as_deref().map(str::to_ascii_lowercase);

        if new_extension == old_extension {
            return false;
        }
        match new_extension.and_then(|ext| catalog.format_by_extension(&ext)) {
            Some(format) => {
                log::debug!("Output extension changed; format is now {}", format.short_name());
                self.format = format;
                true
            }
            None => false,
        }
    }

    /// Sets the path parts as-is, leaving the format alone.
    pub(crate) fn replace_output_parts(
        &mut self,
        directory: Option<PathBuf>,
        file_name: Option<String>,
        extension: Option<String>,
    ) {
        self.directory = directory;
        self.file_name = file_name;
        self.extension = extension;
    }

    fn assign_parts(&mut self, path: &Path) {
        self.directory = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .map(Path::to_path_buf);
        self.file_name = path.file_stem().map(|s| s.to_string_lossy().into_owned());
        self.extension = path.extension().map(|e| e.to_string_lossy().into_owned());
    }

    pub fn format(&self) -> &OutputFormat {
        &self.format
    }

    pub fn format_mut(&mut self) -> &mut OutputFormat {
        &mut self.format
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    pub fn separate_at_cuts(&self) -> bool {
        self.separate_at_cuts
    }

    pub fn set_separate_at_cuts(&mut self, separate: bool) {
        self.separate_at_cuts = separate;
    }

    pub fn range(&self) -> Option<&Range<Pts>> {
        self.range.as_ref()
    }

    pub fn set_range(&mut self, range: Option<Range<Pts>>) {
        self.range = range;
    }

    /// The requested range limited to a timeline of `length` frames.
    pub fn effective_range(&self, length: Pts) -> Range<Pts> {
        match &self.range {
            Some(r) => r.start.clamp(0, length)..r.end.clamp(0, length),
            None => 0..length,
        }
    }

    /// [`effective_range`](Self::effective_range), failing when it holds no frame.
    pub fn check_range(&self, length: Pts) -> Result<Range<Pts>, RenderError> {
        let range = self.effective_range(length);
        if range.is_empty() {
            let requested = self.range.clone().unwrap_or(0..length);
            return Err(RenderError::EmptyRange {
                start: requested.start,
                end: requested.end,
                length,
            });
        }
        Ok(range)
    }

    /// A copy without the output file name. Directory and extension stay.
    pub fn with_file_name_removed(&self) -> Self {
        Self {
            file_name: None,
            ..self.clone()
        }
    }

    pub fn is_default(&self, default: &RenderConfig) -> bool {
        self.with_file_name_removed() == default.with_file_name_removed()
    }

    /// Fails when no file name is chosen, the extension names no known
    /// container, or the directory can not be written.
    pub fn check_file_name(&self, catalog: &CodecCatalog) -> Result<PathBuf, RenderError> {
        let path = self
            .output_file()
            .ok_or(RenderError::NoOutputFileSelected)?;
        let extension = self
            .extension
            .as_deref()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if catalog.format_by_extension(&extension).is_none() {
            return Err(RenderError::UnknownOutputExtension { extension });
        }
        if let Some(dir) = &self.directory {
            let writable = dir
                .metadata()
                .map(|m| m.is_dir() && !m.permissions().readonly())
                .unwrap_or(false);
            if !writable {
                return Err(RenderError::OutputNotWritable { path });
            }
        }
        Ok(path)
    }

    /// Everything that must hold before a job for this configuration is submitted.
    pub fn preflight(
        &self,
        catalog: &CodecCatalog,
        backend: &dyn CodecBackend,
    ) -> Result<(), RenderError> {
        self.check_file_name(catalog)?;
        if !self.format.store_video() && !self.format.store_audio() {
            return Err(RenderError::NothingToRender);
        }
        for codec in [self.format.video_codec(), self.format.audio_codec()] {
            if self.format.check_codec(backend, codec.id()) == CodecSupport::Unsupported {
                return Err(RenderError::UnsupportedCodecForContainer {
                    codec: codec.id().short_name().to_string(),
                    container: self.format.short_name().to_string(),
                });
            }
        }
        Ok(())
    }
}
