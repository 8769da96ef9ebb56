/*!
    Still image export of display frames.
*/

use std::path::Path;

use ffmpeg_types::{PixelFormat, VideoFrame};
use image::{RgbImage, RgbaImage};

use crate::error::{Error, Result};

/**
    Write an RGBA or RGB24 frame as an image file, its format picked from the
    extension.
*/
pub fn save_still(frame: &VideoFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let size = frame.format.frame_size(frame.width, frame.height);
    let data = frame
        .data
        .get(..size)
        .ok_or_else(|| Error::configuration("frame buffer is shorter than its size"))?
        .to_vec();

    match frame.format {
        PixelFormat::Rgba => RgbaImage::from_raw(frame.width, frame.height, data)
            .ok_or_else(|| Error::configuration("frame buffer does not match its size"))?
            .save(path)?,
        PixelFormat::Rgb24 => RgbImage::from_raw(frame.width, frame.height, data)
            .ok_or_else(|| Error::configuration("frame buffer does not match its size"))?
            .save(path)?,
        other => {
            return Err(Error::configuration(format!(
                "cannot save {other:?} frames as images"
            )));
        }
    }

    tracing::debug!(path = %path.display(), width = frame.width, height = frame.height, "saved still");
    Ok(())
}
