use ffmpeg_next::encoder::Decision;

use crate::codec::domain::encoder_config::EncoderConfig;
use crate::codec::domain::parameter::MacroBlockDecision;

/// Parameter writes onto a not yet opened ffmpeg video encoder.
pub struct VideoEncoderConfig<'a>(pub &'a mut ffmpeg_next::encoder::video::Video);

impl EncoderConfig for VideoEncoderConfig<'_> {
    fn set_bit_rate(&mut self, bit_rate: usize) {
        self.0.set_bit_rate(bit_rate);
    }

    fn set_bit_rate_tolerance(&mut self, tolerance: usize) {
        self.0.set_tolerance(tolerance);
    }

    fn set_gop_size(&mut self, gop_size: u32) {
        self.0.set_gop(gop_size);
    }

    fn set_max_b_frames(&mut self, b_frames: usize) {
        self.0.set_max_b_frames(b_frames);
    }

    fn set_macroblock_decision(&mut self, decision: MacroBlockDecision) {
        self.0.set_mb_decision(match decision {
            MacroBlockDecision::Simple => Decision::Simple,
            MacroBlockDecision::Bits => Decision::Bits,
            MacroBlockDecision::RateDistortion => Decision::RateDistortion,
        });
    }
}

/// Parameter writes onto a not yet opened ffmpeg audio encoder. Video-only
/// settings have no audio counterpart and are skipped.
pub struct AudioEncoderConfig<'a>(pub &'a mut ffmpeg_next::encoder::audio::Audio);

impl EncoderConfig for AudioEncoderConfig<'_> {
    fn set_bit_rate(&mut self, bit_rate: usize) {
        self.0.set_bit_rate(bit_rate);
    }

    fn set_bit_rate_tolerance(&mut self, tolerance: usize) {
        self.0.set_tolerance(tolerance);
    }

    fn set_gop_size(&mut self, _gop_size: u32) {
        log::debug!("GOP size ignored for audio encoder");
    }

    fn set_max_b_frames(&mut self, _b_frames: usize) {
        log::debug!("B-frames ignored for audio encoder");
    }

    fn set_macroblock_decision(&mut self, _decision: MacroBlockDecision) {
        log::debug!("Macroblock decision ignored for audio encoder");
    }
}
