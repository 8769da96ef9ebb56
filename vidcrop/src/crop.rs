/*!
    Animated crop rectangles.

    Crop keyframes pin a rectangle to an output frame index; frames between
    two keyframes get a linear blend of the pair.
*/

use ffmpeg_filter::CropRegion;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/**
    A crop rectangle described by its center and size, in source pixels.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub center_x: i32,
    pub center_y: i32,
    pub width: i32,
    pub height: i32,
}

impl CropRect {
    pub const fn new(center_x: i32, center_y: i32, width: i32, height: i32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    /**
        The filter region for this rectangle inside a `frame_width`x`frame_height`
        source, clamped to the frame.
    */
    pub fn to_region(self, frame_width: u32, frame_height: u32) -> CropRegion {
        CropRegion::new(
            self.center_x.saturating_sub(self.width / 2),
            self.center_y.saturating_sub(self.height / 2),
            self.width.max(1) as u32,
            self.height.max(1) as u32,
        )
        .clamp_to(frame_width, frame_height)
    }

    fn lerp(self, to: Self, f: f64) -> Self {
        // Float to int casts saturate, so extreme corners can't overflow
        let mix = |a: i32, b: i32| {
            let delta = (i64::from(b) - i64::from(a)) as f64;
            (f64::from(a) + delta * f) as i32
        };
        Self {
            center_x: mix(self.center_x, to.center_x),
            center_y: mix(self.center_y, to.center_y),
            width: mix(self.width, to.width),
            height: mix(self.height, to.height),
        }
    }
}

/**
    A crop rectangle pinned to an output frame index.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropKeyframe {
    pub frame_number: i64,
    pub rect: CropRect,
}

impl CropKeyframe {
    pub const fn new(frame_number: i64, rect: CropRect) -> Self {
        Self { frame_number, rect }
    }
}

/**
    Computes the crop rectangle for increasing frame indices.

    A cursor remembers the keyframe pair the last query fell into, so walking
    a whole video costs one pass over the keyframes.
*/
#[derive(Clone, Debug, Default)]
pub struct CropInterpolator {
    keyframes: Vec<CropKeyframe>,
    cursor: usize,
}

static_assertions::assert_impl_all!(CropInterpolator: Send, Sync);

impl CropInterpolator {
    /**
        Keyframes must have strictly increasing frame numbers and positive sizes.
        An empty list means no cropping.
    */
    pub fn new(keyframes: Vec<CropKeyframe>) -> Result<Self> {
        if let Some(pair) = keyframes
            .windows(2)
            .find(|pair| pair[0].frame_number >= pair[1].frame_number)
        {
            return Err(Error::configuration(format!(
                "crop keyframes out of order: frame {} followed by frame {}",
                pair[0].frame_number, pair[1].frame_number
            )));
        }
        if let Some(keyframe) = keyframes
            .iter()
            .find(|k| k.rect.width <= 0 || k.rect.height <= 0)
        {
            return Err(Error::configuration(format!(
                "crop keyframe at frame {} has empty size {}x{}",
                keyframe.frame_number, keyframe.rect.width, keyframe.rect.height
            )));
        }

        Ok(Self {
            keyframes,
            cursor: 0,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /**
        Rewind the cursor for a new traversal.
    */
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /**
        The rectangle for frame `index`, or None when there are no keyframes.

        Indices must not decrease between calls unless the interpolator is
        [`reset`](Self::reset). Past the last keyframe its rectangle holds;
        before the first, the first one does.
    */
    pub fn rect_at(&mut self, index: i64) -> Option<CropRect> {
        let last = self.keyframes.len().checked_sub(1)?;

        while self.cursor < last && index >= self.keyframes[self.cursor + 1].frame_number {
            self.cursor += 1;
        }

        let current = self.keyframes[self.cursor];
        if self.cursor == last {
            return Some(current.rect);
        }

        let next = self.keyframes[self.cursor + 1];
        let span = (next.frame_number - current.frame_number) as f64;
        let f = ((index - current.frame_number) as f64 / span).max(0.0);
        Some(current.rect.lerp(next.rect, f))
    }
}
