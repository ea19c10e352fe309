use std::f64::consts::TAU;

use vidrender_core::render::domain::timeline_source::{ClipSpan, TimelineSource, TrackLayout};
use vidrender_core::shared::audio_chunk::AudioChunk;
use vidrender_core::shared::frame::Frame;
use vidrender_core::shared::render_properties::RenderProperties;
use vidrender_core::shared::time::{pts_to_seconds, Pts};

const BARS: [[u8; 3]; 8] = [
    [235, 235, 235],
    [235, 235, 16],
    [16, 235, 235],
    [16, 235, 16],
    [235, 16, 235],
    [235, 16, 16],
    [16, 16, 235],
    [16, 16, 16],
];
const TONE_HZ: f64 = 440.0;
const TONE_AMPLITUDE: f64 = 8_000.0;

/// A synthetic sequence: colour bars with a moving marker and a sine tone.
///
/// `cuts` split the single track into clips; segment numbers listed in
/// `gaps` (1-based) are empty and render as black and silence.
#[derive(Clone)]
pub struct TestPatternSequence {
    name: String,
    length: Pts,
    properties: RenderProperties,
    cuts: Vec<Pts>,
    gaps: Vec<usize>,
    video_position: Pts,
    audio_position: u64,
}

impl TestPatternSequence {
    pub fn new(
        name: &str,
        length: Pts,
        properties: RenderProperties,
        mut cuts: Vec<Pts>,
        gaps: Vec<usize>,
    ) -> Self {
        cuts.retain(|c| *c > 0 && *c < length);
        cuts.sort_unstable();
        cuts.dedup();
        Self {
            name: name.to_string(),
            length,
            properties,
            cuts,
            gaps,
            video_position: 0,
            audio_position: 0,
        }
    }

    fn boundaries(&self) -> Vec<Pts> {
        let mut bounds = vec![0];
        bounds.extend(&self.cuts);
        bounds.push(self.length);
        bounds
    }

    fn in_gap(&self, position: Pts) -> bool {
        let segment = self.cuts.iter().filter(|c| **c <= position).count() + 1;
        self.gaps.contains(&segment)
    }

    fn samples_per_channel(&self, position: Pts, sample_rate: u32) -> u64 {
        (pts_to_seconds(position, self.properties.frame_rate) * sample_rate as f64).round() as u64
    }

    fn draw_bars(&self, frame: &mut Frame) {
        let width = frame.width() as usize;
        let marker = (self.video_position as usize * 4) % width.max(1);
        if let Some(mut pixels) = frame.as_ndarray_mut() {
            for ((_, x, c), value) in pixels.indexed_iter_mut() {
                *value = if x == marker {
                    255
                } else {
                    BARS[x * BARS.len() / width][c]
                };
            }
        }
    }
}

impl TimelineSource for TestPatternSequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn length(&self) -> Pts {
        self.length
    }

    fn properties(&self) -> RenderProperties {
        self.properties
    }

    fn seek(&mut self, position: Pts) {
        self.video_position = position;
        self.audio_position = self.samples_per_channel(position, self.properties.sample_rate);
    }

    fn next_video_frame(&mut self, width: u32, height: u32) -> Option<Frame> {
        if self.video_position >= self.length {
            return None;
        }
        let position = self.video_position;
        let mut frame = Frame::blank(width, height, position)
            .with_forced_key_frame(self.cuts.contains(&position));
        if !self.in_gap(position) {
            self.draw_bars(&mut frame);
        }
        self.video_position += 1;
        Some(frame)
    }

    fn next_audio_chunk(&mut self, sample_rate: u32, channels: u16) -> Option<AudioChunk> {
        let end = self.samples_per_channel(self.length, sample_rate);
        if self.audio_position >= end {
            return None;
        }
        let chunk = (sample_rate as u64 / 25).max(1).min(end - self.audio_position);
        let mut samples = Vec::with_capacity(chunk as usize * channels as usize);
        for i in self.audio_position..self.audio_position + chunk {
            let seconds = i as f64 / sample_rate as f64;
            let position = (seconds * self.properties.frame_rate.as_f64()) as Pts;
            let value = if self.in_gap(position) {
                0
            } else {
                ((TAU * TONE_HZ * seconds).sin() * TONE_AMPLITUDE) as i16
            };
            samples.extend(std::iter::repeat(value).take(channels as usize));
        }
        self.audio_position += chunk;
        Some(AudioChunk::new(samples, channels))
    }

    fn tracks(&self) -> Vec<TrackLayout> {
        let clips = self
            .boundaries()
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                if self.gaps.contains(&(i + 1)) {
                    ClipSpan::gap(pair[0], pair[1])
                } else {
                    ClipSpan::clip(pair[0], pair[1])
                }
            })
            .collect();
        vec![TrackLayout::new(clips)]
    }

    fn fork(&self) -> Box<dyn TimelineSource> {
        let mut copy = self.clone();
        copy.seek(0);
        Box::new(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> TestPatternSequence {
        TestPatternSequence::new(
            "bars",
            40,
            RenderProperties {
                width: 64,
                height: 48,
                sample_rate: 8_000,
                ..RenderProperties::default()
            },
            vec![10, 20, 30],
            vec![4],
        )
    }

    #[test]
    fn test_tracks_mark_gap_segments() {
        let tracks = pattern().tracks();
        assert_eq!(
            tracks[0].clips,
            vec![
                ClipSpan::clip(0, 10),
                ClipSpan::clip(10, 20),
                ClipSpan::clip(20, 30),
                ClipSpan::gap(30, 40),
            ]
        );
    }

    #[test]
    fn test_frames_stop_at_length_and_flag_cuts() {
        let mut source = pattern();
        source.seek(9);
        assert!(!source.next_video_frame(64, 48).unwrap().force_key_frame());
        assert!(source.next_video_frame(64, 48).unwrap().force_key_frame());
        source.seek(39);
        assert!(source.next_video_frame(64, 48).is_some());
        assert!(source.next_video_frame(64, 48).is_none());
    }

    #[test]
    fn test_gap_frames_are_black() {
        let mut source = pattern();
        source.seek(35);
        let frame = source.next_video_frame(64, 48).unwrap();
        assert!(frame.data().iter().all(|v| *v == 0));
    }

    #[test]
    fn test_audio_covers_the_whole_length() {
        let mut source = pattern();
        let mut total = 0;
        while let Some(chunk) = source.next_audio_chunk(8_000, 2) {
            total += chunk.samples().len() / 2;
        }
        // 40 frames at 25 fps.
        assert_eq!(total, 12_800);
    }
}
