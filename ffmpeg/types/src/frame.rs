/*!
    Decoded frame types.
*/

use std::time::Duration;

use crate::{MediaDuration, PixelFormat, Pts, Rational};

/**
    A decoded video frame.

    Contains raw pixel data in the format specified by `format`. Planes are
    stored back to back without row padding, as described by
    [`PixelFormat::planes`].
*/
#[derive(Clone, Debug)]
pub struct VideoFrame {
    /// Raw pixel data.
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of the data.
    pub format: PixelFormat,
    /// Presentation timestamp (None for frames without timing).
    pub pts: Option<Pts>,
    /// Frame duration in time base units (zero when unknown).
    pub duration: MediaDuration,
    /// Time base for interpreting the PTS and duration.
    pub time_base: Rational,
}

impl VideoFrame {
    /**
        Create a new video frame.
    */
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        pts: Option<Pts>,
        time_base: Rational,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            pts,
            duration: MediaDuration(0),
            time_base,
        }
    }

    /**
        Allocate a zeroed frame with exactly the buffer size the format needs.
    */
    pub fn blank(format: PixelFormat, width: u32, height: u32) -> Self {
        Self::new(
            vec![0; format.frame_size(width, height)],
            width,
            height,
            format,
            None,
            Rational::new(1, 1),
        )
    }

    /**
        Set the frame duration.
    */
    pub fn with_duration(mut self, duration: MediaDuration) -> Self {
        self.duration = duration;
        self
    }

    /**
        Returns the presentation time as a Duration, if PTS is set.
    */
    pub fn presentation_time(&self) -> Option<Duration> {
        self.pts.map(|pts| pts.to_duration(self.time_base))
    }

    /**
        Returns the display duration of this frame.
    */
    pub fn frame_duration(&self) -> Duration {
        self.duration.to_duration(self.time_base)
    }

    /**
        Returns true if the buffer is large enough for the declared geometry.
    */
    pub fn has_complete_data(&self) -> bool {
        self.data.len() >= self.format.frame_size(self.width, self.height)
    }
}

static_assertions::assert_impl_all!(VideoFrame: Send, Sync);
