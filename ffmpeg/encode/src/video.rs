/*!
    Video encoder implementation.
*/

use ffmpeg_next::{
    Dictionary,
    codec::{self, encoder::video::Encoder as VideoEncoderFFmpeg},
    ffi,
};

use ffmpeg_source::convert::{
    codec_id_to_ffmpeg, frame_to_ffmpeg, pixel_format_from_ffmpeg, pixel_format_to_ffmpeg,
    rational_to_ffmpeg,
};
use ffmpeg_types::{
    CodecId, Error, MediaDuration, Packet, PixelFormat, Pts, Rational, Result, VideoFrame,
    VideoStreamInfo,
};

use crate::config::VideoEncoderConfig;

/**
    Video encoder.

    Encodes raw video frames into compressed packets. Frame timestamps pass
    through unchanged, so packets come out in whatever time base the frames
    were stamped in.
*/
pub struct VideoEncoder {
    encoder: VideoEncoderFFmpeg,
    codec: CodecId,
    frame_rate: Rational,
    time_base: Rational,
    packet_time_base: Rational,
    frame_count: i64,
}

impl VideoEncoder {
    /**
        Create and open a video encoder.
    */
    pub fn new(config: VideoEncoderConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        if config.width == 0 || config.height == 0 {
            return Err(Error::invalid_data("encoder size must be non-zero"));
        }
        if !config.frame_rate.is_valid() || config.frame_rate.num <= 0 {
            return Err(Error::invalid_data(format!(
                "invalid encoder frame rate {}",
                config.frame_rate
            )));
        }

        let codec_id = codec_id_to_ffmpeg(config.codec)?;
        let codec = ffmpeg_next::encoder::find(codec_id)
            .ok_or_else(|| Error::not_found(format!("no encoder for {:?}", config.codec)))?;

        let mut encoder = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| Error::codec(e.to_string()))?;

        let time_base = config.time_base();
        encoder.set_width(config.width);
        encoder.set_height(config.height);
        encoder.set_format(pixel_format_to_ffmpeg(config.pixel_format)?);
        encoder.set_frame_rate(Some(rational_to_ffmpeg(config.frame_rate)));
        encoder.set_time_base(rational_to_ffmpeg(time_base));
        encoder.set_gop(config.gop);
        encoder.set_max_b_frames(config.max_b_frames);
        if let Some(bit_rate) = config.bit_rate {
            encoder.set_bit_rate(bit_rate);
        }

        // SAFETY: the context is not opened yet, so these fields may be written
        unsafe {
            let ptr = encoder.as_mut_ptr();
            (*ptr).thread_count = config.thread_count as i32;
            (*ptr).slices = config.slices as i32;
            (*ptr).strict_std_compliance = ffi::FF_COMPLIANCE_EXPERIMENTAL as i32;
            if let Some(qmin) = config.qmin {
                (*ptr).qmin = qmin;
            }
            if let Some(qmax) = config.qmax {
                (*ptr).qmax = qmax;
            }
            if let Some(qcompress) = config.qcompress {
                (*ptr).qcompress = qcompress;
            }
            if config.global_header {
                (*ptr).flags |= ffi::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let mut options = Dictionary::new();
        if let Some(preset) = config.preset {
            options.set("preset", preset.as_str());
        }
        if let Some(crf) = config.crf {
            options.set("crf", &crf.to_string());
        }
        for (key, value) in &config.options {
            options.set(key, value);
        }

        tracing::debug!(
            codec = %config.codec,
            width = config.width,
            height = config.height,
            pixel_format = ?config.pixel_format,
            %time_base,
            crf = ?config.crf,
            preset = ?config.preset.map(|p| p.as_str()),
            threads = config.thread_count,
            slices = config.slices,
            options = ?config.options,
            "opening video encoder"
        );

        let encoder = encoder
            .open_with(options)
            .map_err(|e| Error::codec(format!("failed to open encoder: {e}")))?;

        Ok(Self {
            encoder,
            codec: config.codec,
            frame_rate: config.frame_rate,
            time_base,
            packet_time_base: time_base,
            frame_count: 0,
        })
    }

    /**
        The encoder's own time base (the inverse of the frame rate).
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn codec(&self) -> CodecId {
        self.codec
    }

    /**
        Describe the encoded stream for the muxer, codec headers included.
    */
    pub fn stream_info(&self) -> VideoStreamInfo {
        // SAFETY: the encoder is open and owns its extradata
        let extradata = unsafe {
            let ptr = self.encoder.as_ptr();
            let size = (*ptr).extradata_size;
            if (*ptr).extradata.is_null() || size <= 0 {
                None
            } else {
                Some(std::slice::from_raw_parts((*ptr).extradata, size as usize).to_vec())
            }
        };

        VideoStreamInfo {
            width: self.encoder.width(),
            height: self.encoder.height(),
            pixel_format: pixel_format_from_ffmpeg(self.encoder.format())
                .unwrap_or(PixelFormat::Yuv420p),
            frame_rate: Some(self.frame_rate),
            time_base: self.time_base,
            sample_aspect_ratio: Rational::new(1, 1),
            duration: None,
            codec_id: self.codec,
            extradata,
            bitrate: None,
        }
    }

    /**
        Encode a video frame, returning encoded packets.

        May return zero, one, or multiple packets depending on encoder buffering.
        Frames without a timestamp are numbered in submission order.
    */
    pub fn encode(&mut self, frame: &VideoFrame) -> Result<Vec<Packet>> {
        if frame.width != self.encoder.width() || frame.height != self.encoder.height() {
            return Err(Error::invalid_data(format!(
                "frame dimensions {}x{} don't match encoder {}x{}",
                frame.width,
                frame.height,
                self.encoder.width(),
                self.encoder.height()
            )));
        }

        let mut ffmpeg_frame = frame_to_ffmpeg(frame)?;
        if frame.pts.is_none() {
            ffmpeg_frame.set_pts(Some(self.frame_count));
        }
        self.frame_count += 1;
        self.packet_time_base = frame.time_base;

        // EAGAIN means packets must be drained before the frame is accepted
        match self.encoder.send_frame(&ffmpeg_frame) {
            Ok(()) => self.receive_packets(),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                let mut packets = self.receive_packets()?;
                self.encoder
                    .send_frame(&ffmpeg_frame)
                    .map_err(|e| Error::codec(e.to_string()))?;
                packets.extend(self.receive_packets()?);
                Ok(packets)
            }
            Err(e) => Err(Error::codec(e.to_string())),
        }
    }

    /**
        Flush the encoder to get any remaining buffered packets.

        Call this at end of stream.
    */
    pub fn flush(&mut self) -> Result<Vec<Packet>> {
        match self.encoder.send_eof() {
            Ok(()) | Err(ffmpeg_next::Error::Eof) => {}
            Err(e) => return Err(Error::codec(e.to_string())),
        }

        self.receive_packets()
    }

    /**
        Receive all available packets from the encoder.
    */
    fn receive_packets(&mut self) -> Result<Vec<Packet>> {
        let mut packets = Vec::new();
        let mut encoded = ffmpeg_next::Packet::empty();

        loop {
            match self.encoder.receive_packet(&mut encoded) {
                Ok(()) => packets.push(self.convert_packet(&encoded)),
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => return Err(Error::codec(e.to_string())),
            }
        }

        Ok(packets)
    }

    fn convert_packet(&self, pkt: &ffmpeg_next::Packet) -> Packet {
        Packet::new(
            pkt.data().map(|d| d.to_vec()).unwrap_or_default(),
            pkt.pts().map(Pts),
            pkt.dts().map(Pts),
            MediaDuration(pkt.duration()),
            self.packet_time_base,
            pkt.is_key(),
        )
    }
}

impl std::fmt::Debug for VideoEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoEncoder")
            .field("codec", &self.codec)
            .field("width", &self.encoder.width())
            .field("height", &self.encoder.height())
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}
