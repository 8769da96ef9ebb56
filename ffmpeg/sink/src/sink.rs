/*!
    Media sink implementation.
*/

use std::path::{Path, PathBuf};

use ffmpeg_next::{Dictionary, ffi, format::context::Output as OutputContext};

use ffmpeg_source::convert::{
    codec_id_to_ffmpeg, pixel_format_to_ffmpeg, rational_from_ffmpeg, rational_to_ffmpeg,
};
use ffmpeg_types::{Error, Packet, Rational, Result, VideoStreamInfo};

use crate::config::SinkConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SinkState {
    Created,
    Writing,
    Finished,
}

/**
    Media sink for writing a single video stream to a container file.

    The file is created by [`create`](Self::create); the header is written
    once the stream is added. Packets are rescaled from their own time base
    into the stream's and written interleaved.
*/
pub struct Sink {
    output: OutputContext,
    path: PathBuf,
    config: SinkConfig,
    stream: Option<(usize, Rational)>,
    state: SinkState,
}

impl Sink {
    /**
        Create the output file. Nothing is written until
        [`write_header`](Self::write_header).
    */
    pub fn create<P: AsRef<Path>>(path: P, config: SinkConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let path = path.as_ref();
        let output = match config.format {
            Some(format) => ffmpeg_next::format::output_as(path, format.muxer_name()),
            None => ffmpeg_next::format::output(path),
        }
        .map_err(|e| Error::codec(format!("failed to create output {}: {e}", path.display())))?;

        tracing::debug!(
            path = %path.display(),
            muxer = output.format().name(),
            "created output"
        );

        Ok(Self {
            output,
            path: path.to_path_buf(),
            config,
            stream: None,
            state: SinkState::Created,
        })
    }

    /**
        Whether the container wants codec headers in the stream's extradata.
    */
    pub fn requires_global_header(&self) -> bool {
        self.output
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER)
    }

    /**
        Add the video stream, returning its index.
    */
    pub fn add_video_stream(&mut self, info: &VideoStreamInfo) -> Result<usize> {
        if self.state != SinkState::Created || self.stream.is_some() {
            return Err(Error::invalid_data("sink already has a video stream"));
        }

        let codec_id = codec_id_to_ffmpeg(info.codec_id)?;
        let codec = ffmpeg_next::encoder::find(codec_id)
            .ok_or_else(|| Error::not_found(format!("no encoder for {}", info.codec_id)))?;
        let pixel = ffi::AVPixelFormat::from(pixel_format_to_ffmpeg(info.pixel_format)?);

        let mut stream = self
            .output
            .add_stream(codec)
            .map_err(|e| Error::codec(format!("failed to add video stream: {e}")))?;

        // SAFETY: the stream was just created and owns its codec parameters
        unsafe {
            let par = (*stream.as_mut_ptr()).codecpar;
            (*par).codec_type = ffi::AVMediaType::AVMEDIA_TYPE_VIDEO;
            (*par).codec_id = codec_id.into();
            (*par).width = info.width as i32;
            (*par).height = info.height as i32;
            (*par).format = pixel as i32;
            (*par).sample_aspect_ratio = ffi::AVRational {
                num: info.sample_aspect_ratio.num,
                den: info.sample_aspect_ratio.den,
            };
            if let Some(bitrate) = info.bitrate {
                (*par).bit_rate = bitrate as i64;
            }

            // Codec headers (SPS/PPS for H.264, CodecPrivate for VP9)
            if let Some(extradata) = info.extradata.as_deref().filter(|d| !d.is_empty()) {
                let size = extradata.len() + ffi::AV_INPUT_BUFFER_PADDING_SIZE as usize;
                let buffer = ffi::av_mallocz(size) as *mut u8;
                if buffer.is_null() {
                    return Err(Error::codec("failed to allocate extradata"));
                }
                std::ptr::copy_nonoverlapping(extradata.as_ptr(), buffer, extradata.len());
                (*par).extradata = buffer;
                (*par).extradata_size = extradata.len() as i32;
            }
        }

        stream.set_time_base(rational_to_ffmpeg(info.time_base));
        let index = stream.index();
        self.stream = Some((index, info.time_base));
        Ok(index)
    }

    /**
        Write the container header, returning the stream time base the muxer
        settled on.
    */
    pub fn write_header(&mut self) -> Result<Rational> {
        let Some((index, _)) = self.stream else {
            return Err(Error::invalid_data("no video stream added"));
        };
        if self.state != SinkState::Created {
            return Err(Error::invalid_data("header already written"));
        }

        if let Some(title) = &self.config.title {
            let mut metadata = Dictionary::new();
            metadata.set("encoder-app", title);
            self.output.set_metadata(metadata);
        }

        if self.config.dump_format {
            ffmpeg_next::format::context::output::dump(&self.output, 0, self.path.to_str());
        }

        let mut options = Dictionary::new();
        options.set("avoid_negative_ts", "make_non_negative");
        self.output
            .write_header_with(options)
            .map_err(|e| Error::codec(format!("failed to write header: {e}")))?;

        let time_base = self
            .output
            .stream(index)
            .map(|stream| rational_from_ffmpeg(stream.time_base()))
            .ok_or_else(|| Error::not_found("output stream vanished"))?;

        self.stream = Some((index, time_base));
        self.state = SinkState::Writing;
        tracing::debug!(%time_base, "wrote output header");
        Ok(time_base)
    }

    /**
        Write a packet to the video stream.
    */
    pub fn write(&mut self, packet: &Packet) -> Result<()> {
        let (index, stream_time_base) = match (self.state, self.stream) {
            (SinkState::Writing, Some(stream)) => stream,
            _ => return Err(Error::invalid_data("sink is not accepting packets")),
        };

        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };
        ffmpeg_pkt.set_stream(index);
        ffmpeg_pkt.set_pts(
            packet
                .pts
                .map(|pts| pts.rescale(packet.time_base, stream_time_base).0),
        );
        ffmpeg_pkt.set_dts(
            packet
                .dts
                .map(|dts| dts.rescale(packet.time_base, stream_time_base).0),
        );
        ffmpeg_pkt.set_duration(
            packet
                .duration
                .rescale(packet.time_base, stream_time_base)
                .0,
        );
        if packet.is_keyframe {
            ffmpeg_pkt.set_flags(ffmpeg_next::packet::Flags::KEY);
        }

        ffmpeg_pkt
            .write_interleaved(&mut self.output)
            .map_err(|e| Error::codec(format!("failed to write packet: {e}")))
    }

    /**
        Write the trailer. Calling it again is a no-op.

        The file may be unplayable if this is never called.
    */
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            SinkState::Finished => Ok(()),
            SinkState::Created => Err(Error::invalid_data("header was never written")),
            SinkState::Writing => {
                self.state = SinkState::Finished;
                self.output
                    .write_trailer()
                    .map_err(|e| Error::codec(format!("failed to write trailer: {e}")))?;
                tracing::debug!(path = %self.path.display(), "finished output");
                Ok(())
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == SinkState::Finished
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("path", &self.path)
            .field("stream", &self.stream)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
