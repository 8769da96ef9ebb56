/*!
    Media decoding for the ffmpeg crate ecosystem.

    This crate transforms encoded packets into raw frames. It picks the best
    threading mode the codec supports (frame threads, then slice threads,
    then a single thread) and stamps every frame with the decoder's
    best-effort timestamp.

    ```ignore
    use ffmpeg_decode::{VideoDecoder, VideoDecoderConfig};

    let codec = source.take_codec_config().unwrap();
    let mut decoder = VideoDecoder::new(
        codec,
        source.time_base(),
        source.frame_rate(),
        VideoDecoderConfig::default(),
    )?;

    while let Some(packet) = source.next_packet()? {
        for frame in decoder.decode(&packet)? {
            // ...
        }
    }
    for frame in decoder.flush()? {
        // ...
    }
    ```
*/

pub use ffmpeg_types::{Error, Packet, PixelFormat, Rational, Result, VideoFrame};

mod config;
mod video;

pub use config::{ThreadingMode, VideoDecoderConfig};
pub use video::VideoDecoder;
