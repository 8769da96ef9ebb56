/*!
    Frame index and time conversions at a constant frame rate.
*/

use std::time::Duration;

use ffmpeg_types::Rational;

use crate::error::{Error, Result};

/**
    Converts between frame indices and media time.

    The clock assumes a constant frame rate, the one the input stream was
    opened with.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameClock {
    frame_rate: Rational,
}

impl FrameClock {
    pub fn new(frame_rate: Rational) -> Result<Self> {
        if !frame_rate.is_valid() || frame_rate.num < 0 || frame_rate.den < 0 {
            return Err(Error::configuration(format!(
                "invalid frame rate {frame_rate}"
            )));
        }
        Ok(Self { frame_rate })
    }

    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }

    pub fn fps(&self) -> f64 {
        self.frame_rate.to_f64()
    }

    /**
        Duration of a single frame.
    */
    pub fn period(&self) -> Duration {
        self.duration_of(1)
    }

    /**
        Time at which frame `frame` starts. Negative indices map to zero.
    */
    pub fn duration_of(&self, frame: i64) -> Duration {
        if frame <= 0 {
            return Duration::ZERO;
        }
        let nanos = frame as i128 * 1_000_000_000 * self.frame_rate.den as i128
            / self.frame_rate.num as i128;
        Duration::from_nanos(nanos.clamp(0, u64::MAX as i128) as u64)
    }

    /**
        Index of the frame nearest to `time`.
    */
    pub fn frame_at(&self, time: Duration) -> i64 {
        (time.as_secs_f64() * self.fps()).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_rates() {
        let clock = FrameClock::new(Rational::new(10, 1)).unwrap();
        assert_eq!(clock.duration_of(100), Duration::from_secs(10));
        assert_eq!(clock.period(), Duration::from_millis(100));
        assert_eq!(clock.frame_at(Duration::from_secs(20)), 200);
        assert_eq!(clock.frame_at(Duration::from_millis(149)), 1);
    }

    #[test]
    fn ntsc_rates_round_trip() {
        let clock = FrameClock::new(Rational::new(30000, 1001)).unwrap();
        for frame in [0, 1, 29, 30, 1799, 107892] {
            assert_eq!(clock.frame_at(clock.duration_of(frame)), frame);
        }
    }

    #[test]
    fn negative_frames_clamp_to_zero() {
        let clock = FrameClock::new(Rational::new(25, 1)).unwrap();
        assert_eq!(clock.duration_of(-3), Duration::ZERO);
    }

    #[test]
    fn invalid_rates_are_rejected() {
        assert!(FrameClock::new(Rational { num: 0, den: 1 }).is_err());
        assert!(FrameClock::new(Rational { num: 1, den: 0 }).is_err());
    }
}
