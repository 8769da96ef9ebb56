/*!
    Frame-by-frame access for scrubbing.

    [`PreviewReader`] keeps one decoded frame converted to a display pixel
    format. Small forward moves step through frames; anything else seeks.
*/

use std::time::Duration;

use ffmpeg_types::{PixelFormat, VideoFrame};

use crate::error::Result;
use crate::pool::FramePool;
use crate::producer::{FrameProducer, InputFrame, VideoInput};
use crate::timing::FrameClock;
use crate::trim::{TrimCursor, TrimMarker, resolve_trim_ranges};

/// Forward moves up to this far are stepped instead of seeked.
const MAX_STEP_DISTANCE: Duration = Duration::from_secs(1);

/// Stepping stops within this fraction of a frame period of the target.
const STEP_TOLERANCE: f64 = 0.99;

/**
    Converts decoded frames into display frames.

    `dst` arrives with the wanted format and size already set.
*/
pub trait FrameConverter {
    fn convert_into(&mut self, src: &VideoFrame, dst: &mut VideoFrame) -> Result<()>;
}

/**
    Display settings of a [`PreviewReader`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreviewConfig {
    pub display_format: PixelFormat,
    /// Largest display size; frames are shrunk to fit, keeping their aspect.
    pub max_size: Option<(u32, u32)>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            display_format: PixelFormat::Rgba,
            max_size: None,
        }
    }
}

impl PreviewConfig {
    pub fn with_display_format(mut self, format: PixelFormat) -> Self {
        self.display_format = format;
        self
    }

    pub fn with_max_size(mut self, width: u32, height: u32) -> Self {
        self.max_size = Some((width, height));
        self
    }

    /**
        Display size for a `width`x`height` source.
    */
    pub fn display_size(&self, width: u32, height: u32) -> (u32, u32) {
        match self.max_size {
            Some((max_width, max_height)) => fit_within(width, height, max_width, max_height),
            None => (width, height),
        }
    }
}

/**
    Shrink `width`x`height` to fit inside `max_width`x`max_height`, keeping
    the aspect ratio. Sizes that already fit are returned unchanged.
*/
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let fitted = |side: u32| ((side as f64 * scale).floor() as u32).max(1);
    (fitted(width), fitted(height))
}

/**
    Random access to converted frames of one input.
*/
pub struct PreviewReader<I, C> {
    producer: FrameProducer<I>,
    converter: C,
    config: PreviewConfig,
    pool: FramePool,
    display: Option<VideoFrame>,
    position: Duration,
    media_duration: Duration,
}

impl<I: VideoInput, C: FrameConverter> PreviewReader<I, C> {
    /**
        Wrap an input and read its first frame.
    */
    pub fn new(
        input: I,
        clock: FrameClock,
        media_duration: Duration,
        converter: C,
        config: PreviewConfig,
    ) -> Result<Self> {
        let ranges = TrimCursor::keep_all(media_duration).ranges().to_vec();
        let mut reader = Self {
            producer: FrameProducer::new(input, clock, ranges),
            converter,
            config,
            pool: FramePool::new(),
            display: None,
            position: Duration::ZERO,
            media_duration,
        };
        reader.advance_frame()?;
        Ok(reader)
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn media_duration(&self) -> Duration {
        self.media_duration
    }

    pub fn clock(&self) -> &FrameClock {
        self.producer.clock()
    }

    pub fn pool(&self) -> &FramePool {
        &self.pool
    }

    pub fn input(&self) -> &I {
        self.producer.input()
    }

    /**
        The current frame in the display format.
    */
    pub fn current_frame(&self) -> Option<&VideoFrame> {
        self.display.as_ref()
    }

    /**
        How long the current frame is shown, one frame period if the frame
        does not say.
    */
    pub fn frame_duration(&self) -> Duration {
        self.display
            .as_ref()
            .map(VideoFrame::frame_duration)
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| self.producer.clock().period())
    }

    /**
        Skip the cut parts of the timeline when stepping.
    */
    pub fn set_trim_markers(&mut self, markers: &[TrimMarker]) -> Result<()> {
        let ranges = resolve_trim_ranges(markers, self.producer.clock(), self.media_duration)?;
        self.producer.set_trim_ranges(ranges);
        Ok(())
    }

    /**
        Move to the next frame. Returns false at the end of the input, where
        the last frame stays current.
    */
    pub fn advance_frame(&mut self) -> Result<bool> {
        let frame = match self.producer.next().transpose()? {
            Some(InputFrame::Frame(frame)) => frame,
            Some(InputFrame::EndOfStream) | None => return Ok(false),
        };

        self.position = frame.presentation_time().unwrap_or_else(|| {
            self.producer
                .next_position()
                .saturating_sub(self.producer.clock().period())
        });
        self.show(&frame)?;
        Ok(true)
    }

    /**
        Reposition the reader near `target`.

        Short forward moves decode frame by frame; other moves seek, landing
        on the frame one period before `target`. After a seek the reported
        position is `target` itself, so repeating the call changes nothing.
    */
    pub fn set_position(&mut self, target: Duration) -> Result<()> {
        if target == self.position {
            return Ok(());
        }

        if target > self.position && target - self.position <= MAX_STEP_DISTANCE {
            let tolerance = self.producer.clock().period().mul_f64(STEP_TOLERANCE);
            while target.saturating_sub(self.position) >= tolerance {
                if !self.advance_frame()? {
                    break;
                }
            }
            return Ok(());
        }

        if self.producer.seek(target)? {
            self.advance_frame()?;
        } else {
            tracing::debug!(?target, "preview seek past the end");
        }
        self.position = target;
        Ok(())
    }

    fn show(&mut self, frame: &VideoFrame) -> Result<()> {
        let (width, height) = self.config.display_size(frame.width, frame.height);
        let mut display = self
            .pool
            .acquire(self.config.display_format, width, height);

        if let Err(e) = self.converter.convert_into(frame, &mut display) {
            self.pool.release(display);
            return Err(e);
        }

        if let Some(previous) = self.display.replace(display) {
            self.pool.release(previous);
        }
        Ok(())
    }
}

impl<I, C> std::fmt::Debug for PreviewReader<I, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewReader")
            .field("position", &self.position)
            .field("media_duration", &self.media_duration)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConverter, FakeInput, ten_fps};

    fn reader(input: FakeInput) -> PreviewReader<FakeInput, FakeConverter> {
        let duration = input.duration();
        PreviewReader::new(
            input,
            ten_fps(),
            duration,
            FakeConverter::default(),
            PreviewConfig::default(),
        )
        .unwrap()
    }

    fn current_pts(reader: &PreviewReader<FakeInput, FakeConverter>) -> Option<i64> {
        reader.current_frame().and_then(|f| f.pts).map(|p| p.0)
    }

    #[test]
    fn opens_on_the_first_frame() {
        let reader = reader(FakeInput::new(10));
        assert_eq!(reader.position(), Duration::ZERO);
        assert_eq!(current_pts(&reader), Some(0));
        assert_eq!(reader.current_frame().map(|f| f.format), Some(PixelFormat::Rgba));
        assert_eq!(reader.frame_duration(), Duration::from_millis(100));
    }

    #[test]
    fn short_forward_move_steps() {
        let mut reader = reader(FakeInput::new(100).with_keyframe_interval(10));
        reader.set_position(Duration::from_millis(500)).unwrap();

        assert_eq!(current_pts(&reader), Some(5));
        assert!(reader.input().seeks().is_empty());
    }

    #[test]
    fn long_move_seeks() {
        let mut reader = reader(FakeInput::new(100).with_keyframe_interval(10));
        reader.set_position(Duration::from_secs(5)).unwrap();

        assert_eq!(reader.input().seeks().len(), 1);
        assert_eq!(current_pts(&reader), Some(49));

        reader.set_position(Duration::from_secs(1)).unwrap();
        assert_eq!(reader.input().seeks().len(), 2);
        assert_eq!(current_pts(&reader), Some(9));
    }

    #[test]
    fn repeated_seek_keeps_the_frame() {
        let mut reader = reader(FakeInput::new(100).with_keyframe_interval(10));
        reader.set_position(Duration::from_secs(5)).unwrap();
        let first = reader.current_frame().map(|f| f.data.clone());
        assert_eq!(reader.position(), Duration::from_secs(5));

        reader.set_position(Duration::from_secs(5)).unwrap();
        assert_eq!(reader.input().seeks().len(), 1);
        assert_eq!(reader.current_frame().map(|f| f.data.clone()), first);
        assert_eq!(current_pts(&reader), Some(49));
        assert_eq!(reader.converter.calls(), 2);
    }

    #[test]
    fn same_position_does_nothing() {
        let mut reader = reader(FakeInput::new(10));
        reader.set_position(Duration::ZERO).unwrap();
        assert!(reader.input().seeks().is_empty());
        assert_eq!(reader.converter.calls(), 1);
    }

    #[test]
    fn advancing_stops_at_the_end() {
        let mut reader = reader(FakeInput::new(3));
        assert!(reader.advance_frame().unwrap());
        assert!(reader.advance_frame().unwrap());
        assert!(!reader.advance_frame().unwrap());
        assert!(!reader.advance_frame().unwrap());
        assert_eq!(current_pts(&reader), Some(2));
    }

    #[test]
    fn display_frames_are_recycled() {
        let mut reader = reader(FakeInput::new(20));
        for _ in 0..10 {
            reader.advance_frame().unwrap();
        }

        let stats = reader.pool().stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.reuses, 9);
        assert_eq!(reader.pool().idle_count(), 1);
    }

    #[test]
    fn trim_markers_skip_cut_frames() {
        let mut reader = reader(FakeInput::new(30));
        reader
            .set_trim_markers(&[TrimMarker::new(1, true), TrimMarker::new(10, false)])
            .unwrap();

        assert!(reader.advance_frame().unwrap());
        assert_eq!(current_pts(&reader), Some(10));
    }

    #[test]
    fn display_size_fits_within_maximum() {
        assert_eq!(fit_within(1920, 1080, 640, 640), (640, 360));
        assert_eq!(fit_within(1080, 1920, 640, 640), (360, 640));
        assert_eq!(fit_within(320, 240, 640, 640), (320, 240));

        let config = PreviewConfig::default().with_max_size(2, 2);
        assert_eq!(config.display_size(4, 4), (2, 2));
    }
}
