/*!
    Video frame conversion through libswscale.
*/

use ffmpeg_next::{
    software::scaling::{context::Context as ScalerContext, flag::Flags as ScalerFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};

use ffmpeg_source::convert::{copy_from_ffmpeg, copy_into_ffmpeg, pixel_format_to_ffmpeg};
use ffmpeg_types::{Error, PixelFormat, Result, VideoFrame};

/**
    Scaling algorithm for video resizing.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScalingAlgorithm {
    /// Nearest neighbor - fastest, lowest quality.
    Nearest,
    /// Bilinear interpolation - fast, acceptable quality.
    #[default]
    Bilinear,
    /// Bicubic interpolation - moderate speed, good quality.
    Bicubic,
    /// Fast bilinear with full chroma interpolation and accurate rounding,
    /// tuned for on-screen preview.
    Preview,
}

impl ScalingAlgorithm {
    fn to_ffmpeg_flags(self) -> ScalerFlags {
        match self {
            Self::Nearest => ScalerFlags::POINT,
            Self::Bilinear => ScalerFlags::BILINEAR,
            Self::Bicubic => ScalerFlags::BICUBIC,
            Self::Preview => {
                ScalerFlags::FAST_BILINEAR | ScalerFlags::FULL_CHR_H_INT | ScalerFlags::ACCURATE_RND
            }
        }
    }
}

/// Geometry and format of one side of a conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Layout {
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Layout {
    fn of(frame: &VideoFrame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            format: frame.format,
        }
    }
}

struct ScalerState {
    context: ScalerContext,
    source: Layout,
    target: Layout,
    source_frame: VideoFrameFFmpeg,
    target_frame: VideoFrameFFmpeg,
}

/**
    Video frame converter.

    The destination frame decides the output geometry and pixel format.
    The scaler and its scratch frames are created on first use and rebuilt
    whenever either side's layout changes.
*/
pub struct VideoTransform {
    algorithm: ScalingAlgorithm,
    state: Option<ScalerState>,
}

impl VideoTransform {
    pub fn new(algorithm: ScalingAlgorithm) -> Self {
        Self {
            algorithm,
            state: None,
        }
    }

    pub fn algorithm(&self) -> ScalingAlgorithm {
        self.algorithm
    }

    /**
        Convert `src` into `dst`, keeping `dst`'s width, height and format.

        The destination buffer is resized in place, so a recycled frame keeps
        its allocation. Timestamps are copied from the source.
    */
    pub fn convert_into(&mut self, src: &VideoFrame, dst: &mut VideoFrame) -> Result<()> {
        if src.width == 0 || src.height == 0 || dst.width == 0 || dst.height == 0 {
            return Err(Error::invalid_data("cannot convert a frame with zero dimensions"));
        }

        let source = Layout::of(src);
        let target = Layout::of(dst);
        let state = match self.state.take() {
            Some(state) if state.source == source && state.target == target => state,
            _ => Self::create_scaler(self.algorithm, source, target)?,
        };
        let state = self.state.insert(state);

        copy_into_ffmpeg(&mut state.source_frame, src)?;
        state
            .context
            .run(&state.source_frame, &mut state.target_frame)
            .map_err(|e| Error::codec(format!("scaling failed: {e}")))?;
        copy_from_ffmpeg(&state.target_frame, dst.format, &mut dst.data)?;

        dst.pts = src.pts;
        dst.duration = src.duration;
        dst.time_base = src.time_base;
        Ok(())
    }

    /**
        Convert `src` into a newly allocated frame.
    */
    pub fn convert(
        &mut self,
        src: &VideoFrame,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<VideoFrame> {
        let mut dst = VideoFrame::blank(format, width, height);
        self.convert_into(src, &mut dst)?;
        Ok(dst)
    }

    fn create_scaler(
        algorithm: ScalingAlgorithm,
        source: Layout,
        target: Layout,
    ) -> Result<ScalerState> {
        let source_pixel = pixel_format_to_ffmpeg(source.format)?;
        let target_pixel = pixel_format_to_ffmpeg(target.format)?;

        let context = ScalerContext::get(
            source_pixel,
            source.width,
            source.height,
            target_pixel,
            target.width,
            target.height,
            algorithm.to_ffmpeg_flags(),
        )
        .map_err(|e| Error::codec(format!("failed to create scaler: {e}")))?;

        tracing::debug!(?source, ?target, ?algorithm, "created scaler");

        Ok(ScalerState {
            context,
            source,
            target,
            source_frame: VideoFrameFFmpeg::new(source_pixel, source.width, source.height),
            target_frame: VideoFrameFFmpeg::new(target_pixel, target.width, target.height),
        })
    }
}

impl std::fmt::Debug for VideoTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTransform")
            .field("algorithm", &self.algorithm)
            .field("initialized", &self.state.is_some())
            .finish()
    }
}
