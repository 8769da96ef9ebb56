/*!
    Media source and demuxing for the ffmpeg crate ecosystem.

    This crate handles the input side of the media pipeline. It opens a media
    file, selects its best video stream, and produces encoded packets that
    downstream crates can decode. It also owns the conversions between
    `ffmpeg-next` types and `ffmpeg-types`, which the other crates reuse.

    # Basic Usage

    ```ignore
    use ffmpeg_source::{Source, SourceConfig};

    let mut source = Source::open("input.mp4", SourceConfig::default())?;
    println!("{} fps", source.frame_rate());

    while let Some(packet) = source.next_packet()? {
        // Hand to ffmpeg-decode
    }
    ```

    # Seeking

    [`Source::seek_backward`] lands on the keyframe at or before a timestamp
    in the stream's own time base. Decoders must be reset afterwards.
*/

pub use ffmpeg_types::{Error, MediaInfo, Packet, Pts, Rational, Result, VideoStreamInfo};

mod codec_config;
pub mod convert;
mod probe;
mod source;

pub use codec_config::CodecConfig;
pub use probe::probe;
pub use source::{Source, SourceConfig};
