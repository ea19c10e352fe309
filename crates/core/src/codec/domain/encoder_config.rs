use super::parameter::MacroBlockDecision;

/// Write side of a native encoder configuration.
///
/// Codec parameters apply themselves through this trait so the parameter
/// model stays independent of the backend library.
pub trait EncoderConfig {
    fn set_bit_rate(&mut self, bit_rate: usize);
    fn set_bit_rate_tolerance(&mut self, tolerance: usize);
    fn set_gop_size(&mut self, gop_size: u32);
    fn set_max_b_frames(&mut self, b_frames: usize);
    fn set_macroblock_decision(&mut self, decision: MacroBlockDecision);
}

/// Records every write; lets domain tests observe what a codec applies.
#[cfg(test)]
#[derive(Debug, Default, PartialEq)]
pub struct RecordingEncoderConfig {
    pub bit_rate: Option<usize>,
    pub bit_rate_tolerance: Option<usize>,
    pub gop_size: Option<u32>,
    pub max_b_frames: Option<usize>,
    pub macroblock_decision: Option<MacroBlockDecision>,
    pub writes: Vec<&'static str>,
}

#[cfg(test)]
impl EncoderConfig for RecordingEncoderConfig {
    fn set_bit_rate(&mut self, bit_rate: usize) {
        self.bit_rate = Some(bit_rate);
        self.writes.push("bit_rate");
    }

    fn set_bit_rate_tolerance(&mut self, tolerance: usize) {
        self.bit_rate_tolerance = Some(tolerance);
        self.writes.push("bit_rate_tolerance");
    }

    fn set_gop_size(&mut self, gop_size: u32) {
        self.gop_size = Some(gop_size);
        self.writes.push("gop_size");
    }

    fn set_max_b_frames(&mut self, b_frames: usize) {
        self.max_b_frames = Some(b_frames);
        self.writes.push("b_frames");
    }

    fn set_macroblock_decision(&mut self, decision: MacroBlockDecision) {
        self.macroblock_decision = Some(decision);
        self.writes.push("macroblock_decision");
    }
}
