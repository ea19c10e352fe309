use super::timeline_source::TimelineSource;
use crate::shared::audio_chunk::AudioChunk;

/// Packs irregular timeline chunks into fixed-size encoder frames.
///
/// Leftover samples of a chunk carry over into the next frame. Once the
/// timeline stops yielding chunks every frame is completed with silence.
pub struct AudioPacker {
    samples_per_channel: usize,
    sample_rate: u32,
    channels: u16,
    current: Option<AudioChunk>,
    exhausted: bool,
}

impl AudioPacker {
    pub fn new(samples_per_channel: usize, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples_per_channel,
            sample_rate,
            channels,
            current: None,
            exhausted: false,
        }
    }

    pub fn frame_len(&self) -> usize {
        self.samples_per_channel * self.channels as usize
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// One full frame of interleaved samples.
    pub fn fill(&mut self, source: &mut dyn TimelineSource) -> Vec<i16> {
        let wanted = self.frame_len();
        let mut frame = Vec::with_capacity(wanted);
        while frame.len() < wanted {
            if let Some(chunk) = self.current.as_mut().filter(|c| !c.is_exhausted()) {
                frame.extend_from_slice(chunk.extract(wanted - frame.len()));
                continue;
            }
            if self.exhausted {
                break;
            }
            match source.next_audio_chunk(self.sample_rate, self.channels) {
                Some(chunk) => self.current = Some(chunk),
                None => {
                    log::debug!("Timeline audio ended; padding with silence");
                    self.exhausted = true;
                }
            }
        }
        frame.resize(wanted, 0);
        frame
    }
}
