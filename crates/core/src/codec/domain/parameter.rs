use serde::{Deserialize, Serialize};

use super::encoder_config::EncoderConfig;
use crate::shared::error::RenderError;

/// Identifies a tunable encoder setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterId {
    BitRate,
    BitRateTolerance,
    GopSize,
    BFrames,
    MacroBlockDecision,
    AudioBitRate,
}

impl ParameterId {
    pub const ALL: &[ParameterId] = &[
        ParameterId::BitRate,
        ParameterId::BitRateTolerance,
        ParameterId::GopSize,
        ParameterId::BFrames,
        ParameterId::MacroBlockDecision,
        ParameterId::AudioBitRate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::BitRate => "Bit rate",
            Self::BitRateTolerance => "Bit rate tolerance",
            Self::GopSize => "GOP size",
            Self::BFrames => "Number of B-frames",
            Self::MacroBlockDecision => "Macroblock decision",
            Self::AudioBitRate => "Audio bit rate",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::BitRate => "bit_rate",
            Self::BitRateTolerance => "bit_rate_tolerance",
            Self::GopSize => "gop_size",
            Self::BFrames => "b_frames",
            Self::MacroBlockDecision => "macro_block_decision",
            Self::AudioBitRate => "audio_bit_rate",
        }
    }

    pub fn from_short_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.short_name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for ParameterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Macroblock selection algorithm of MPEG-family encoders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MacroBlockDecision {
    Simple = 0,
    Bits = 1,
    RateDistortion = 2,
}

impl MacroBlockDecision {
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Simple),
            1 => Some(Self::Bits),
            2 => Some(Self::RateDistortion),
            _ => None,
        }
    }

    pub fn options() -> Vec<EnumOption> {
        vec![
            EnumOption::new("Simple", Self::Simple as i32),
            EnumOption::new("Fewest bits", Self::Bits as i32),
            EnumOption::new("Rate distortion", Self::RateDistortion as i32),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumOption {
    pub name: &'static str,
    pub value: i32,
}

impl EnumOption {
    pub fn new(name: &'static str, value: i32) -> Self {
        Self { name, value }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntParameter {
    id: ParameterId,
    default: i32,
    minimum: i32,
    maximum: i32,
    value: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumParameter {
    id: ParameterId,
    options: Vec<EnumOption>,
    default: i32,
    value: i32,
}

impl EnumParameter {
    fn bounds(&self) -> (i32, i32) {
        let min = self.options.iter().map(|o| o.value).min().unwrap_or(0);
        let max = self.options.iter().map(|o| o.value).max().unwrap_or(0);
        (min, max)
    }

    fn contains(&self, value: i32) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParameterKind {
    Int(IntParameter),
    Enum(EnumParameter),
}

/// One bounded encoder setting owned by a codec.
///
/// `minimum <= value() <= maximum` holds after every mutation. Enumerated
/// parameters additionally only ever hold one of their declared options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecParameter {
    kind: ParameterKind,
    enabled: bool,
}

impl CodecParameter {
    pub fn int(id: ParameterId, minimum: i32, maximum: i32, default: i32) -> Self {
        assert!(
            minimum <= default && default <= maximum,
            "default {default} of {id:?} outside [{minimum}, {maximum}]"
        );
        Self {
            kind: ParameterKind::Int(IntParameter {
                id,
                default,
                minimum,
                maximum,
                value: default,
            }),
            enabled: false,
        }
    }

    pub fn enumerated(id: ParameterId, options: Vec<EnumOption>, default: i32) -> Self {
        assert!(
            options.iter().any(|o| o.value == default),
            "default {default} of {id:?} is not one of its options"
        );
        Self {
            kind: ParameterKind::Enum(EnumParameter {
                id,
                options,
                default,
                value: default,
            }),
            enabled: false,
        }
    }

    /// Marks the parameter as editable by an operator.
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn id(&self) -> ParameterId {
        match &self.kind {
            ParameterKind::Int(p) => p.id,
            ParameterKind::Enum(p) => p.id,
        }
    }

    pub fn name(&self) -> &'static str {
        self.id().name()
    }

    pub fn value(&self) -> i32 {
        match &self.kind {
            ParameterKind::Int(p) => p.value,
            ParameterKind::Enum(p) => p.value,
        }
    }

    pub fn default_value(&self) -> i32 {
        match &self.kind {
            ParameterKind::Int(p) => p.default,
            ParameterKind::Enum(p) => p.default,
        }
    }

    pub fn minimum(&self) -> i32 {
        match &self.kind {
            ParameterKind::Int(p) => p.minimum,
            ParameterKind::Enum(p) => p.bounds().0,
        }
    }

    pub fn maximum(&self) -> i32 {
        match &self.kind {
            ParameterKind::Int(p) => p.maximum,
            ParameterKind::Enum(p) => p.bounds().1,
        }
    }

    /// Declared options of an enumerated parameter; empty for integer ranges.
    pub fn options(&self) -> &[EnumOption] {
        match &self.kind {
            ParameterKind::Int(_) => &[],
            ParameterKind::Enum(p) => &p.options,
        }
    }

    pub fn accepts(&self, value: i32) -> bool {
        match &self.kind {
            ParameterKind::Int(p) => p.minimum <= value && value <= p.maximum,
            ParameterKind::Enum(p) => p.contains(value),
        }
    }

    /// Sets the current value.
    ///
    /// # Panics
    /// When `value` is out of range; callers validate first or use
    /// [`try_set_value`](Self::try_set_value).
    pub fn set_value(&mut self, value: i32) {
        assert!(
            self.accepts(value),
            "value {value} not allowed for {:?} [{}, {}]",
            self.id(),
            self.minimum(),
            self.maximum()
        );
        match &mut self.kind {
            ParameterKind::Int(p) => p.value = value,
            ParameterKind::Enum(p) => p.value = value,
        }
    }

    pub fn try_set_value(&mut self, value: i32) -> Result<(), RenderError> {
        if !self.accepts(value) {
            return Err(RenderError::InvalidParameterValue {
                parameter: self.id(),
                value,
                minimum: self.minimum(),
                maximum: self.maximum(),
            });
        }
        self.set_value(value);
        Ok(())
    }

    /// Sets both the default and the current value.
    pub fn set_default(&mut self, value: i32) {
        self.set_value(value);
        match &mut self.kind {
            ParameterKind::Int(p) => p.default = value,
            ParameterKind::Enum(p) => p.default = value,
        }
    }

    /// Writes the current value onto a native encoder configuration.
    pub fn apply(&self, config: &mut dyn EncoderConfig) {
        let value = self.value();
        log::debug!("Applying {} = {value}", self.name());
        match self.id() {
            ParameterId::BitRate | ParameterId::AudioBitRate => {
                config.set_bit_rate(non_negative(value))
            }
            ParameterId::BitRateTolerance => config.set_bit_rate_tolerance(non_negative(value)),
            ParameterId::GopSize => config.set_gop_size(non_negative(value) as u32),
            ParameterId::BFrames => config.set_max_b_frames(non_negative(value)),
            ParameterId::MacroBlockDecision => {
                if let Some(decision) = MacroBlockDecision::from_value(value) {
                    config.set_macroblock_decision(decision);
                }
            }
        }
    }
}

fn non_negative(value: i32) -> usize {
    value.max(0) as usize
}
