/*!
    Frame-accurate seeking.

    Containers can only seek to keyframes, so a seek lands at the keyframe at
    or before the target and decodes forward until it reaches the target
    frame. That frame becomes the next item the producer yields.
*/

use std::time::Duration;

use ffmpeg_types::Pts;

use crate::error::Result;
use crate::producer::{FrameProducer, Phase, VideoInput};

impl<I: VideoInput> FrameProducer<I> {
    /**
        Position the producer on the first frame at or after one frame period
        before `target`.

        Returns false when the input ends before such a frame is decoded; the
        producer then only has end of stream left to yield.
    */
    pub fn seek(&mut self, target: Duration) -> Result<bool> {
        let _span = tracing::debug_span!("seek", ?target).entered();

        let time_base = self.input.time_base();
        let timestamp = Pts::from_duration(target.saturating_sub(self.clock.period()), time_base);

        self.input.seek(timestamp)?;
        self.pending.clear();
        self.consumed = true;

        let mut draining = false;
        loop {
            let frames = if draining {
                self.input.drain()?
            } else {
                match self.input.decode_next()? {
                    Some(frames) => frames,
                    None => {
                        draining = true;
                        continue;
                    }
                }
            };

            let mut frames = frames.into_iter();
            if let Some(found) = frames
                .by_ref()
                .find(|frame| frame.pts.is_some_and(|pts| pts >= timestamp))
            {
                let position = found.presentation_time().unwrap_or_default();
                self.counter = self.clock.frame_at(position);
                self.trim.reset();
                self.pending.push_back(found);
                self.pending.extend(frames);
                self.phase = if draining {
                    Phase::Drained
                } else {
                    Phase::Reading
                };

                tracing::debug!(?position, frame = self.counter, "seek landed");
                return Ok(true);
            }

            if draining {
                break;
            }
        }

        tracing::debug!(?timestamp, "seek ran past the end of the input");
        self.phase = Phase::Drained;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::InputFrame;
    use crate::testing::{FakeInput, ten_fps};
    use crate::trim::TrimCursor;

    fn producer(input: FakeInput) -> FrameProducer<FakeInput> {
        let duration = input.duration();
        FrameProducer::new(input, ten_fps(), TrimCursor::keep_all(duration).ranges().to_vec())
    }

    fn next_pts(producer: &mut FrameProducer<FakeInput>) -> Option<i64> {
        match producer.next() {
            Some(Ok(InputFrame::Frame(frame))) => frame.pts.map(|pts| pts.0),
            _ => None,
        }
    }

    #[test]
    fn lands_one_period_before_target() {
        let mut producer = producer(FakeInput::new(100).with_keyframe_interval(10));

        assert!(producer.seek(Duration::from_millis(3500)).unwrap());
        assert_eq!(producer.input().seeks(), &[Pts(34)]);
        assert_eq!(producer.next_position(), Duration::from_millis(3400));
        assert_eq!(next_pts(&mut producer), Some(34));
        assert_eq!(next_pts(&mut producer), Some(35));
    }

    #[test]
    fn works_through_decoder_delay() {
        let mut producer = producer(FakeInput::new(100).with_keyframe_interval(10).with_delay(4));

        assert!(producer.seek(Duration::from_secs(6)).unwrap());
        assert_eq!(next_pts(&mut producer), Some(59));
        assert_eq!(next_pts(&mut producer), Some(60));
    }

    #[test]
    fn backward_seek_after_consuming() {
        let mut producer = producer(FakeInput::new(50).with_keyframe_interval(5));
        for _ in 0..30 {
            producer.next();
        }

        assert!(producer.seek(Duration::from_millis(1100)).unwrap());
        assert_eq!(next_pts(&mut producer), Some(10));
    }

    #[test]
    fn seek_to_start() {
        let mut producer = producer(FakeInput::new(20).with_keyframe_interval(10));
        producer.next();

        assert!(producer.seek(Duration::ZERO).unwrap());
        assert_eq!(next_pts(&mut producer), Some(0));
    }

    #[test]
    fn past_the_end_is_a_miss() {
        let mut producer = producer(FakeInput::new(100).with_keyframe_interval(10));

        assert!(!producer.seek(Duration::from_secs(20)).unwrap());
        assert!(matches!(producer.next(), Some(Ok(InputFrame::EndOfStream))));
        assert!(producer.next().is_none());
    }

    #[test]
    fn seek_revives_a_finished_producer() {
        let mut producer = producer(FakeInput::new(20).with_keyframe_interval(10));
        while producer.next().is_some() {}
        assert!(producer.is_finished());

        assert!(producer.seek(Duration::from_millis(1000)).unwrap());
        assert_eq!(next_pts(&mut producer), Some(9));
        assert!(!producer.is_finished());
    }
}
