use serde::{Deserialize, Serialize};

use super::constants::{
    DEFAULT_CHANNELS, DEFAULT_FRAME_RATE, DEFAULT_HEIGHT, DEFAULT_SAMPLE_RATE, DEFAULT_WIDTH,
};
use super::error::RenderError;
use super::time::Rational;

/// Timeline-wide output properties shared by every stream of a render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderProperties {
    pub width: u32,
    pub height: u32,
    pub frame_rate: Rational,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for RenderProperties {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            frame_rate: Rational::new(DEFAULT_FRAME_RATE.0, DEFAULT_FRAME_RATE.1),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
        }
    }
}

impl RenderProperties {
    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |message: String| Err(RenderError::InvalidProperties { message });
        if self.width == 0 || self.height == 0 {
            return invalid(format!("frame size {}x{} is empty", self.width, self.height));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return invalid(format!(
                "frame size {}x{} must be even in both dimensions",
                self.width, self.height
            ));
        }
        if !self.frame_rate.is_positive() {
            return invalid(format!("frame rate {} must be positive", self.frame_rate));
        }
        if self.sample_rate == 0 {
            return invalid("sample rate must be positive".to_string());
        }
        if self.channels == 0 {
            return invalid("channel count must be positive".to_string());
        }
        Ok(())
    }

    /// Duration of one video frame.
    pub fn frame_duration(&self) -> Rational {
        self.frame_rate.invert()
    }
}
