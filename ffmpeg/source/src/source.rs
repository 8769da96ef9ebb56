/*!
    Media source implementation.
*/

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{ffi, format::context::Input as InputContext, media::Type};

use ffmpeg_types::{Error, MediaDuration, MediaInfo, Packet, Pts, Rational, Result};

use crate::codec_config::CodecConfig;
use crate::convert::{pts_from_ffmpeg, rational_from_ffmpeg};
use crate::probe::{extract_media_info, guess_frame_rate, open_input};

/**
    Configuration for opening a media source.
*/
#[derive(Clone, Debug, Default)]
pub struct SourceConfig {
    /// Print FFmpeg's description of the container after opening.
    pub dump_format: bool,
}

impl SourceConfig {
    /**
        Enable or disable the container dump.
    */
    pub fn with_dump_format(mut self, enabled: bool) -> Self {
        self.dump_format = enabled;
        self
    }
}

/**
    A media source that produces encoded video packets.

    Only the best video stream is demuxed; packets of every other stream are
    skipped.
*/
pub struct Source {
    input: InputContext,
    media_info: MediaInfo,
    stream_index: usize,
    time_base: Rational,
    frame_rate: Rational,
    codec_config: Option<CodecConfig>,
}

impl Source {
    /**
        Open a media file and select its best video stream.

        # Example

        ```ignore
        let source = Source::open("video.mp4", SourceConfig::default())?;
        println!("Duration: {:?}", source.duration());
        ```
    */
    pub fn open<P: AsRef<Path>>(path: P, config: SourceConfig) -> Result<Self> {
        let path = path.as_ref();
        let input = open_input(path)?;

        if config.dump_format {
            ffmpeg_next::format::context::input::dump(&input, 0, path.to_str());
        }

        let media_info = extract_media_info(&input)?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| Error::not_found(format!("no video stream in {}", path.display())))?;

        let stream_index = stream.index();
        let time_base = rational_from_ffmpeg(stream.time_base());
        let frame_rate = guess_frame_rate(&input, &stream).ok_or_else(|| {
            Error::unsupported_format(format!("{} has no usable frame rate", path.display()))
        })?;
        let codec_config = CodecConfig::new(stream.parameters());

        tracing::debug!(
            path = %path.display(),
            stream_index,
            %time_base,
            %frame_rate,
            codec = %codec_config.codec_id(),
            "opened video source"
        );

        Ok(Self {
            input,
            media_info,
            stream_index,
            time_base,
            frame_rate,
            codec_config: Some(codec_config),
        })
    }

    /**
        Get the media info for this source.
    */
    pub fn media_info(&self) -> &MediaInfo {
        &self.media_info
    }

    /**
        Total media duration, if the container or stream reports one.
    */
    pub fn duration(&self) -> Option<Duration> {
        self.media_info.duration
    }

    /**
        Time base of the video stream.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Frame rate of the video stream, fixed at open time.
    */
    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }

    /**
        Take the video codec configuration.

        This consumes the codec config from the source; pass it to
        `ffmpeg-decode` to create the decoder.
    */
    pub fn take_codec_config(&mut self) -> Option<CodecConfig> {
        self.codec_config.take()
    }

    /**
        Read the next video packet.

        Returns `Ok(None)` at end of stream.
    */
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        for (stream, ffmpeg_packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            let data = ffmpeg_packet.data().map(|d| d.to_vec()).unwrap_or_default();

            return Ok(Some(Packet::new(
                data,
                pts_from_ffmpeg(ffmpeg_packet.pts()),
                pts_from_ffmpeg(ffmpeg_packet.dts()),
                MediaDuration(ffmpeg_packet.duration()),
                self.time_base,
                ffmpeg_packet.is_key(),
            )));
        }

        Ok(None)
    }

    /**
        Seek to the keyframe at or before `timestamp`, in the stream's time base.

        After seeking, decoder buffers must be reset. The packets that follow
        may start well before the requested timestamp.
    */
    pub fn seek_backward(&mut self, timestamp: Pts) -> Result<()> {
        // SAFETY: the context is valid for the lifetime of self
        let ret = unsafe {
            ffi::av_seek_frame(
                self.input.as_mut_ptr(),
                self.stream_index as i32,
                timestamp.0,
                ffi::AVSEEK_FLAG_BACKWARD as i32,
            )
        };

        if ret < 0 {
            return Err(Error::codec(format!(
                "seek to {} failed: {}",
                timestamp.0,
                ffmpeg_next::Error::from(ret)
            )));
        }

        tracing::trace!(timestamp = timestamp.0, "seeked source");
        Ok(())
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("stream_index", &self.stream_index)
            .field("time_base", &self.time_base)
            .field("frame_rate", &self.frame_rate)
            .finish_non_exhaustive()
    }
}
