/// A run of composed audio handed out by the timeline: interleaved signed
/// 16-bit samples plus a read cursor for partial consumption.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioChunk {
    samples: Vec<i16>,
    channels: u16,
    read: usize,
}

impl AudioChunk {
    pub fn new(samples: Vec<i16>, channels: u16) -> Self {
        debug_assert!(channels > 0, "chunk needs at least one channel");
        debug_assert_eq!(
            samples.len() % channels as usize,
            0,
            "sample count must be a multiple of the channel count"
        );
        Self {
            samples,
            channels,
            read: 0,
        }
    }

    pub fn silence(samples_per_channel: usize, channels: u16) -> Self {
        Self::new(vec![0; samples_per_channel * channels as usize], channels)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Interleaved samples not yet consumed.
    pub fn unread_sample_count(&self) -> usize {
        self.samples.len() - self.read
    }

    pub fn is_exhausted(&self) -> bool {
        self.unread_sample_count() == 0
    }

    /// Takes up to `max` unread interleaved samples and advances the cursor.
    pub fn extract(&mut self, max: usize) -> &[i16] {
        let count = max.min(self.unread_sample_count());
        let start = self.read;
        self.read += count;
        &self.samples[start..start + count]
    }
}
