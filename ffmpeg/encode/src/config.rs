/*!
    Encoder configuration types.
*/

use ffmpeg_types::{CodecId, PixelFormat, Rational};

/**
    Encoder speed preset.

    Slower presets produce better compression (smaller files at same quality)
    but take longer to encode.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncoderPreset {
    /// Fastest encoding, largest files.
    Ultrafast,
    /// Very fast encoding.
    Veryfast,
    /// Fast encoding, good for real-time.
    Fast,
    /// Default balance of speed and compression.
    #[default]
    Medium,
    /// Better compression, slower.
    Slow,
    /// Best compression, slowest.
    Veryslow,
}

impl EncoderPreset {
    /**
        Get the FFmpeg preset string.
    */
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ultrafast => "ultrafast",
            Self::Veryfast => "veryfast",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Veryslow => "veryslow",
        }
    }
}

/**
    Pick the pixel format to encode `input` frames with.

    The input format is kept when the codec's software encoder accepts it,
    otherwise frames are converted to yuv420p.
*/
pub fn encodable_pixel_format(codec: CodecId, input: PixelFormat) -> PixelFormat {
    let accepted: &[PixelFormat] = match codec {
        CodecId::H264 => &[
            PixelFormat::Yuv420p,
            PixelFormat::Yuvj420p,
            PixelFormat::Yuv422p,
            PixelFormat::Yuv444p,
            PixelFormat::Nv12,
            PixelFormat::Yuv420p10,
        ],
        CodecId::Vp9 | CodecId::Av1 => &[
            PixelFormat::Yuv420p,
            PixelFormat::Yuv422p,
            PixelFormat::Yuv444p,
            PixelFormat::Yuv420p10,
        ],
        _ => &[PixelFormat::Yuv420p],
    };

    if accepted.contains(&input) {
        input
    } else {
        PixelFormat::Yuv420p
    }
}

/**
    Configuration for video encoding.
*/
#[derive(Clone, Debug)]
pub struct VideoEncoderConfig {
    /// Codec to use.
    pub codec: CodecId,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate. The encoder time base is its inverse.
    pub frame_rate: Rational,
    /// Expected input pixel format.
    pub pixel_format: PixelFormat,
    /// Constant rate factor (None = codec default).
    pub crf: Option<u8>,
    /// Encoder speed preset (None = codec has no presets).
    pub preset: Option<EncoderPreset>,
    /// Target bitrate in bits per second (None = codec default, 0 = quality only).
    pub bit_rate: Option<usize>,
    /// Quantizer bounds.
    pub qmin: Option<i32>,
    pub qmax: Option<i32>,
    /// Quantizer curve compression.
    pub qcompress: Option<f32>,
    /// Keyframe interval in frames.
    pub gop: u32,
    /// Maximum consecutive B-frames.
    pub max_b_frames: usize,
    /// Encoder threads (0 = let FFmpeg decide).
    pub thread_count: usize,
    /// Slices per frame (0 = codec default).
    pub slices: usize,
    /// Put codec headers in extradata instead of every keyframe.
    pub global_header: bool,
    /// Codec private options, applied in order.
    pub options: Vec<(String, String)>,
}

impl VideoEncoderConfig {
    /**
        Create a new video encoder configuration.
    */
    pub fn new(codec: CodecId, width: u32, height: u32, frame_rate: Rational) -> Self {
        Self {
            codec,
            width,
            height,
            frame_rate,
            pixel_format: PixelFormat::Yuv420p,
            crf: None,
            preset: None,
            bit_rate: None,
            qmin: None,
            qmax: None,
            qcompress: None,
            gop: 600,
            max_b_frames: 2,
            thread_count: 0,
            slices: 0,
            global_header: false,
            options: Vec::new(),
        }
    }

    /**
        The time base frames are counted in: one tick per frame.
    */
    pub fn time_base(&self) -> Rational {
        self.frame_rate.invert()
    }

    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = Some(crf.min(63));
        self
    }

    pub fn with_preset(mut self, preset: EncoderPreset) -> Self {
        self.preset = Some(preset);
        self
    }

    pub fn with_bit_rate(mut self, bit_rate: usize) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /**
        Bound the quantizer to `qmin..=qmax`.
    */
    pub fn with_quantizer_range(mut self, qmin: i32, qmax: i32) -> Self {
        self.qmin = Some(qmin);
        self.qmax = Some(qmax);
        self
    }

    pub fn with_qcompress(mut self, qcompress: f32) -> Self {
        self.qcompress = Some(qcompress);
        self
    }

    pub fn with_gop(mut self, frames: u32) -> Self {
        self.gop = frames;
        self
    }

    pub fn with_max_b_frames(mut self, frames: usize) -> Self {
        self.max_b_frames = frames;
        self
    }

    /**
        Set encoder threads and slices per frame.
    */
    pub fn with_threads(mut self, thread_count: usize, slices: usize) -> Self {
        self.thread_count = thread_count;
        self.slices = slices;
        self
    }

    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    pub fn with_global_header(mut self, global_header: bool) -> Self {
        self.global_header = global_header;
        self
    }

    /**
        Add a codec private option. Later values for the same key win.
    */
    pub fn with_option(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.options.push((key.into(), value.to_string()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_favor_long_gops() {
        let config = VideoEncoderConfig::new(CodecId::H264, 1280, 720, Rational::new(30, 1));
        assert_eq!(config.gop, 600);
        assert_eq!(config.max_b_frames, 2);
        assert_eq!(config.time_base(), Rational::new(1, 30));
        assert!(config.options.is_empty());
    }

    #[test]
    fn builder_collects_options_in_order() {
        let config = VideoEncoderConfig::new(CodecId::Vp9, 640, 360, Rational::new(25, 1))
            .with_crf(31)
            .with_quantizer_range(29, 33)
            .with_option("speed", 2)
            .with_option("row-mt", 1);

        assert_eq!(config.crf, Some(31));
        assert_eq!((config.qmin, config.qmax), (Some(29), Some(33)));
        assert_eq!(
            config.options,
            vec![
                ("speed".to_string(), "2".to_string()),
                ("row-mt".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn pixel_format_falls_back_to_yuv420p() {
        assert_eq!(
            encodable_pixel_format(CodecId::H264, PixelFormat::Yuv444p),
            PixelFormat::Yuv444p
        );
        assert_eq!(
            encodable_pixel_format(CodecId::Vp9, PixelFormat::Nv12),
            PixelFormat::Yuv420p
        );
        assert_eq!(
            encodable_pixel_format(CodecId::H264, PixelFormat::Rgba),
            PixelFormat::Yuv420p
        );
    }
}
