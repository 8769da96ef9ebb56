/*!
    Single-stream video muxing for the ffmpeg crate ecosystem.

    This crate handles the output side of the media pipeline. It takes encoded
    packets from the encoder and writes them into a container file.

    Opening an output happens in phases, because the encoder needs to know
    whether the container wants global headers before it opens, and the
    stream needs the opened encoder's extradata:

    ```ignore
    use ffmpeg_sink::{Sink, SinkConfig};

    let mut sink = Sink::create("out.mp4", SinkConfig::default().with_title("vidcrop"))?;
    let encoder = open_encoder(sink.requires_global_header())?;
    sink.add_video_stream(&encoder.stream_info())?;
    let stream_time_base = sink.write_header()?;

    for packet in packets {
        sink.write(&packet)?;
    }
    sink.finish()?;
    ```
*/

mod config;
mod sink;

pub use self::config::{ContainerFormat, SinkConfig};
pub use self::sink::Sink;
