/*!
    Filter graphs for the ffmpeg crate ecosystem.

    This crate wraps FFmpeg's filter graph for the one chain vidcrop
    needs: crop, then scale to the output size, then reset the sample
    aspect ratio to square pixels. The crop rectangle is passed with every
    frame and forwarded to the running graph only when it changes.

    ```ignore
    use ffmpeg_filter::{CropRegion, CropScaleConfig, CropScaleFilter};

    let config = CropScaleConfig::new(&input_info, 1280, 720, PixelFormat::Yuv420p);
    let mut filter = CropScaleFilter::new(config)?;

    let region = CropRegion::new(100, 50, 640, 360);
    for filtered in filter.push(&frame, region)? {
        // Hand to ffmpeg-encode
    }
    for filtered in filter.flush()? {
        // ...
    }
    ```
*/

pub use ffmpeg_types::{Error, PixelFormat, Rational, Result, VideoFrame, VideoStreamInfo};

mod crop_scale;
mod region;

pub use crop_scale::{CropScaleConfig, CropScaleFilter};
pub use region::CropRegion;
