/*!
    Pixel format conversion and scaling for the ffmpeg crate ecosystem.

    [`VideoTransform`] converts frames into caller-owned destination frames,
    so buffers can be recycled between conversions.

    ```ignore
    use ffmpeg_transform::{ScalingAlgorithm, VideoTransform};
    use ffmpeg_types::{PixelFormat, VideoFrame};

    let mut transform = VideoTransform::new(ScalingAlgorithm::Preview);
    let mut display = VideoFrame::blank(PixelFormat::Rgba, 640, 360);
    transform.convert_into(&decoded, &mut display)?;
    ```
*/

mod video;

pub use self::video::{ScalingAlgorithm, VideoTransform};
