use serde::{Deserialize, Serialize};

/// Timeline position, counted in video frames at the project frame rate.
pub type Pts = i64;

/// An exact fraction, used for frame rates and time bases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub fn invert(&self) -> Self {
        Self::new(self.den, self.num)
    }

    pub fn is_positive(&self) -> bool {
        self.num > 0 && self.den > 0
    }
}

impl std::fmt::Display for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Converts a frame count at `frame_rate` to seconds.
pub fn pts_to_seconds(pts: Pts, frame_rate: Rational) -> f64 {
    pts as f64 * frame_rate.den as f64 / frame_rate.num as f64
}

/// Converts seconds to the nearest frame count at `frame_rate`.
pub fn seconds_to_pts(seconds: f64, frame_rate: Rational) -> Pts {
    (seconds * frame_rate.as_f64()).round() as Pts
}

/// Accumulated presentation time of one output stream.
///
/// Time is the number of encoded units multiplied by the duration of one
/// unit, so the clock never drifts from the encoder's own counting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamClock {
    units: u64,
    unit: Rational,
}

impl StreamClock {
    /// `unit` is the duration of one encoded unit in seconds.
    pub fn new(unit: Rational) -> Self {
        debug_assert!(unit.is_positive(), "unit duration must be positive");
        Self { units: 0, unit }
    }

    pub fn advance(&mut self) {
        self.units += 1;
    }

    pub fn units(&self) -> u64 {
        self.units
    }

    pub fn unit(&self) -> Rational {
        self.unit
    }

    /// Units needed to reach `seconds`, rounded up.
    pub fn units_to_reach(&self, seconds: f64) -> u64 {
        (seconds * self.unit.den as f64 / self.unit.num as f64).ceil() as u64
    }

    pub fn seconds(&self) -> f64 {
        self.units as f64 * self.unit.num as f64 / self.unit.den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(25, Rational::new(25, 1), 1.0)]
    #[case(0, Rational::new(25, 1), 0.0)]
    #[case(30_000, Rational::new(30_000, 1001), 1001.0)]
    #[case(12, Rational::new(24, 1), 0.5)]
    fn test_pts_to_seconds(#[case] pts: Pts, #[case] rate: Rational, #[case] expected: f64) {
        assert_relative_eq!(pts_to_seconds(pts, rate), expected);
    }

    #[test]
    fn test_seconds_to_pts_rounds_to_nearest_frame() {
        assert_eq!(seconds_to_pts(1.0, Rational::new(25, 1)), 25);
        assert_eq!(seconds_to_pts(0.019, Rational::new(25, 1)), 0);
        assert_eq!(seconds_to_pts(0.021, Rational::new(25, 1)), 1);
    }

    #[test]
    fn test_clock_accumulates_units() {
        let mut clock = StreamClock::new(Rational::new(1152, 44_100));
        for _ in 0..100 {
            clock.advance();
        }
        assert_eq!(clock.units(), 100);
        assert_relative_eq!(clock.seconds(), 115_200.0 / 44_100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_units_to_reach_rounds_up() {
        let video = StreamClock::new(Rational::new(1, 25));
        assert_eq!(video.units_to_reach(2.0), 50);
        let audio = StreamClock::new(Rational::new(1152, 8_000));
        assert_eq!(audio.units_to_reach(2.0), 14);
        assert_eq!(audio.unit(), Rational::new(1152, 8_000));
    }

    #[test]
    fn test_invert_and_display() {
        let rate = Rational::new(30_000, 1001);
        assert_eq!(rate.invert(), Rational::new(1001, 30_000));
        assert_eq!(rate.to_string(), "30000/1001");
    }
}
