/*!
    Video decoder implementation.
*/

use ffmpeg_next::{
    codec::{self, capabilities::Capabilities, decoder::Video as VideoDecoderFFmpeg},
    ffi,
    packet::Mut as PacketMut,
    util::frame::video::Video as VideoFrameFFmpeg,
};

use ffmpeg_source::CodecConfig;
use ffmpeg_source::convert::frame_from_ffmpeg;
use ffmpeg_types::{Error, Packet, Pts, Rational, Result, VideoFrame};

use crate::config::{ThreadingMode, VideoDecoderConfig};

/**
    Video decoder.

    Decodes video packets into frames whose PTS is the decoder's
    best-effort timestamp.
*/
pub struct VideoDecoder {
    decoder: VideoDecoderFFmpeg,
    time_base: Rational,
    threading: ThreadingMode,
}

impl VideoDecoder {
    /**
        Create a new video decoder from codec configuration.

        # Arguments

        * `codec_config` - Codec configuration from the source
        * `time_base` - Time base of the video stream
        * `frame_rate` - Frame rate of the video stream
        * `config` - Decoder configuration (threading overrides)
    */
    pub fn new(
        codec_config: CodecConfig,
        time_base: Rational,
        frame_rate: Rational,
        config: VideoDecoderConfig,
    ) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let codec_id = codec_config.ffmpeg_codec_id();
        let codec = ffmpeg_next::decoder::find(codec_id)
            .ok_or_else(|| Error::not_found(format!("no decoder for {codec_id:?}")))?;

        let capabilities = codec.capabilities();
        let threading = config.threading.unwrap_or_else(|| {
            ThreadingMode::select(
                capabilities.contains(Capabilities::FRAME_THREADS),
                capabilities.contains(Capabilities::SLICE_THREADS),
            )
        });

        let mut decoder_ctx = codec::context::Context::from_parameters(codec_config.into_parameters())
            .map_err(|e| Error::codec(e.to_string()))?;

        // SAFETY: the context is not opened yet, so these fields may be written
        unsafe {
            let ptr = decoder_ctx.as_mut_ptr();
            (*ptr).pkt_timebase = ffi::AVRational {
                num: time_base.num,
                den: time_base.den,
            };
            (*ptr).framerate = ffi::AVRational {
                num: frame_rate.num,
                den: frame_rate.den,
            };
            match threading {
                ThreadingMode::Frame => {
                    (*ptr).thread_type = ffi::FF_THREAD_FRAME as i32;
                    (*ptr).thread_count = config.thread_count as i32;
                }
                ThreadingMode::Slice => {
                    (*ptr).thread_type = ffi::FF_THREAD_SLICE as i32;
                    (*ptr).thread_count = config.thread_count as i32;
                }
                ThreadingMode::Single => {
                    (*ptr).thread_count = 1;
                }
            }
        }

        let decoder = decoder_ctx
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.video())
            .map_err(|e| Error::codec(format!("failed to open decoder: {e}")))?;

        tracing::debug!(
            codec = ?codec_id,
            threading = %threading,
            width = decoder.width(),
            height = decoder.height(),
            "opened video decoder"
        );

        Ok(Self {
            decoder,
            time_base,
            threading,
        })
    }

    /**
        The threading mode selected for this decoder.
    */
    pub fn threading(&self) -> ThreadingMode {
        self.threading
    }

    /**
        Get the time base for this decoder.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Decode a packet, returning decoded frames.

        May return zero, one, or multiple frames depending on codec buffering.
        B-frames and frame threading cause the decoder to buffer frames internally.
    */
    pub fn decode(&mut self, packet: &Packet) -> Result<Vec<VideoFrame>> {
        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };

        // SAFETY: writing plain fields of a packet we own
        unsafe {
            let pkt_ptr = ffmpeg_pkt.as_mut_ptr();
            if let Some(pts) = packet.pts {
                (*pkt_ptr).pts = pts.0;
            }
            if let Some(dts) = packet.dts {
                (*pkt_ptr).dts = dts.0;
            }
            (*pkt_ptr).duration = packet.duration.0;
        }
        if packet.is_keyframe {
            ffmpeg_pkt.set_flags(ffmpeg_next::packet::Flags::KEY);
        }

        // EAGAIN means the decoder's output queue is full: drain, then retry once
        match self.decoder.send_packet(&ffmpeg_pkt) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                let mut frames = self.receive_frames()?;
                self.decoder
                    .send_packet(&ffmpeg_pkt)
                    .map_err(|e| Error::codec(e.to_string()))?;
                frames.extend(self.receive_frames()?);
                return Ok(frames);
            }
            Err(e) => return Err(Error::codec(e.to_string())),
        }

        self.receive_frames()
    }

    /**
        Flush the decoder to get any remaining buffered frames.

        Call this at end of stream. The decoder must be [`reset`](Self::reset)
        before it accepts packets again.
    */
    pub fn flush(&mut self) -> Result<Vec<VideoFrame>> {
        let mut frames = self.receive_frames()?;

        match self.decoder.send_eof() {
            Ok(()) | Err(ffmpeg_next::Error::Eof) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                frames.extend(self.receive_frames()?);
                self.decoder
                    .send_eof()
                    .map_err(|e| Error::codec(e.to_string()))?;
            }
            Err(e) => return Err(Error::codec(e.to_string())),
        }

        frames.extend(self.receive_frames()?);
        Ok(frames)
    }

    /**
        Reset the decoder after a seek or a flush.

        Discards buffered frames and clears the end-of-stream state.
    */
    pub fn reset(&mut self) {
        self.decoder.flush();
    }

    /**
        Receive all available frames from the decoder.
    */
    fn receive_frames(&mut self) -> Result<Vec<VideoFrame>> {
        let mut frames = Vec::new();
        let mut decoded = VideoFrameFFmpeg::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let mut frame = frame_from_ffmpeg(&decoded, self.time_base)?;
                    frame.pts = decoded.timestamp().map(Pts);
                    frames.push(frame);
                }
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => return Err(Error::codec(e.to_string())),
            }
        }

        Ok(frames)
    }
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("time_base", &self.time_base)
            .field("threading", &self.threading)
            .finish_non_exhaustive()
    }
}
