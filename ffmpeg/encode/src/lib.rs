/*!
    Video encoding for the ffmpeg crate ecosystem.

    This crate transforms raw frames into compressed packets. It's the inverse
    of decode: taking raw video and producing H.264, VP9, or other codec
    bitstreams.

    ```ignore
    use ffmpeg_encode::{EncoderPreset, VideoEncoder, VideoEncoderConfig};
    use ffmpeg_types::{CodecId, Rational};

    let config = VideoEncoderConfig::new(CodecId::H264, 1280, 720, Rational::new(30, 1))
        .with_crf(23)
        .with_preset(EncoderPreset::Medium)
        .with_gop(600);

    let mut encoder = VideoEncoder::new(config)?;

    for frame in frames {
        for packet in encoder.encode(&frame)? {
            // Write to muxer
        }
    }

    let final_packets = encoder.flush()?;
    ```

    # Timestamps

    Frame timestamps pass through the encoder untouched, and packets carry
    the time base of the frames that produced them. Callers that want packets
    in a muxer's stream time base stamp their frames in that time base.

    # Quality

    `crf` is forwarded as the encoder's constant rate factor option. Codec
    private options (`speed`, `row-mt`, `tile-columns`, ...) go through
    [`VideoEncoderConfig::with_option`].
*/

mod config;
mod video;

pub use self::config::{EncoderPreset, VideoEncoderConfig, encodable_pixel_format};
pub use self::video::VideoEncoder;
