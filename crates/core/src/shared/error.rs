use std::path::PathBuf;

use thiserror::Error;

use crate::codec::domain::codec::MediaKind;
use crate::codec::domain::parameter::ParameterId;
use crate::shared::time::Pts;

/// Every failure the render subsystem reports to its caller.
///
/// Pre-flight kinds (`UnsupportedCodecForContainer`, `NothingToRender`,
/// `NoOutputFileSelected`, ...) are raised before a job is submitted.
/// `EncoderOpenError` and `EncodeOrWriteError` are fatal to a running job.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("codec '{codec}' can not be stored in a '{container}' file")]
    UnsupportedCodecForContainer { codec: String, container: String },
    #[error("codec '{codec}' may not work in a '{container}' file; explicit confirmation required")]
    UncertainCodecForContainer { codec: String, container: String },
    #[error("no output file selected")]
    NoOutputFileSelected,
    #[error("file extension '{extension}' does not match any known output format")]
    UnknownOutputExtension { extension: String },
    #[error("output file {path} is not writable")]
    OutputNotWritable { path: PathBuf },
    #[error("output file {path} is used by more than one sequence")]
    DuplicateOutputFile { path: PathBuf },
    #[error("neither an audio nor a video codec is selected")]
    NothingToRender,
    #[error("range [{start}, {end}) holds no frame of a {length}-frame sequence")]
    EmptyRange { start: Pts, end: Pts, length: Pts },
    #[error("unknown output format '{name}'")]
    UnknownContainer { name: String },
    #[error("unknown codec '{name}'")]
    UnknownCodec { name: String },
    #[error("codec '{codec}' has no parameter {parameter:?}")]
    ParameterNotFound { codec: String, parameter: ParameterId },
    #[error("value {value} for {parameter:?} is outside [{minimum}, {maximum}] or not an allowed option")]
    InvalidParameterValue {
        parameter: ParameterId,
        value: i32,
        minimum: i32,
        maximum: i32,
    },
    #[error("invalid render properties: {message}")]
    InvalidProperties { message: String },
    #[error("FourCC '{value}' must be 1 to 4 bytes long")]
    InvalidFourCc { value: String },
    #[error("failed to open {stream} encoder: {message}")]
    EncoderOpenError { stream: MediaKind, message: String },
    #[error("encoding or writing failed: {message}")]
    EncodeOrWriteError { message: String },
    #[error("render engine can not start from state {state}")]
    InvalidState { state: String },
    #[error("render cancelled")]
    Cancelled,
    #[error("codec backend unavailable: {message}")]
    BackendUnavailable { message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl RenderError {
    pub fn encoder_open(stream: MediaKind, message: impl Into<String>) -> Self {
        Self::EncoderOpenError {
            stream,
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::EncodeOrWriteError {
            message: message.into(),
        }
    }

    /// True for the kinds that abort a job that was already running.
    pub fn is_job_failure(&self) -> bool {
        matches!(
            self,
            Self::EncoderOpenError { .. } | Self::EncodeOrWriteError { .. } | Self::Cancelled
        )
    }
}
