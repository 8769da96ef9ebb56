/*!
    Output codec selection and per-codec encoder tuning.
*/

use std::path::Path;

use ffmpeg_encode::{EncoderPreset, VideoEncoderConfig, encodable_pixel_format};
use ffmpeg_types::{CodecId, PixelFormat, Rational};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound on encoder threads, whatever the core count.
const MAX_ENCODER_THREADS: usize = 16;

/// Slices per frame for every codec.
const ENCODER_SLICES: usize = 8;

/// libvpx-vp9 private options, applied in this order.
const VP9_OPTIONS: &[(&str, &str)] = &[
    ("speed", "2"),
    ("row-mt", "1"),
    ("lag-in-frames", "25"),
    ("cpu-used", "4"),
    ("auto-alt-ref", "1"),
    ("arnr-maxframes", "7"),
    ("arnr-strength", "4"),
    ("aq-mode", "4"),
    ("tile-columns", "6"),
    ("tile-rows", "2"),
];

/**
    Codecs the output can be encoded with.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCodec {
    H264,
    Vp8,
    Vp9,
}

impl OutputCodec {
    /**
        Guess the codec from the output file name: WebM gets VP9, anything
        else H.264.
    */
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("webm") => Self::Vp9,
            _ => Self::H264,
        }
    }

    pub fn codec_id(self) -> CodecId {
        match self {
            Self::H264 => CodecId::H264,
            Self::Vp8 => CodecId::Vp8,
            Self::Vp9 => CodecId::Vp9,
        }
    }

    /**
        Build the encoder configuration for a `width`x`height` output.

        The input pixel format is kept when the codec accepts it. VP8 is
        rejected.
    */
    pub fn encoder_config(
        self,
        width: u32,
        height: u32,
        frame_rate: Rational,
        input_format: PixelFormat,
        crf: u8,
    ) -> Result<VideoEncoderConfig> {
        if width == 0 || height == 0 {
            return Err(Error::configuration(format!(
                "output size {width}x{height} is empty"
            )));
        }

        let codec = self.codec_id();
        let threads = num_cpus::get().min(MAX_ENCODER_THREADS);
        let config = VideoEncoderConfig::new(codec, width, height, frame_rate)
            .with_pixel_format(encodable_pixel_format(codec, input_format))
            .with_threads(threads, ENCODER_SLICES)
            .with_crf(crf);

        let config = match self {
            Self::H264 => config.with_preset(EncoderPreset::Medium),
            Self::Vp8 => {
                return Err(Error::configuration("VP8 output is not implemented"));
            }
            Self::Vp9 => {
                let crf = i32::from(crf);
                VP9_OPTIONS.iter().fold(
                    config
                        .with_bit_rate(0)
                        .with_quantizer_range((crf - 2).max(0), crf + 2)
                        .with_qcompress(1.0),
                    |config, (key, value)| config.with_option(*key, value),
                )
            }
        };

        tracing::debug!(
            codec = %codec,
            width,
            height,
            threads,
            pixel_format = ?config.pixel_format,
            "selected encoder settings"
        );
        Ok(config)
    }
}

impl std::fmt::Display for OutputCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::H264 => "h264",
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
        })
    }
}
