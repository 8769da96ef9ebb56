/*!
    Crop, scale and square-pixel filter chain.
*/

use std::ffi::CString;

use ffmpeg_next::{ffi, filter, util::frame::video::Video as VideoFrameFFmpeg};

use ffmpeg_source::convert::{frame_from_ffmpeg, frame_to_ffmpeg, pixel_format_to_ffmpeg};
use ffmpeg_types::{Error, PixelFormat, Rational, Result, VideoFrame, VideoStreamInfo};

use crate::region::CropRegion;

/// Name FFmpeg gives the first filter of a parsed chain.
const CROP_FILTER_NAME: &str = "Parsed_crop_0";

/**
    Configuration for a crop/scale filter chain.
*/
#[derive(Clone, Debug)]
pub struct CropScaleConfig {
    /// Width of the frames pushed into the graph.
    pub input_width: u32,
    /// Height of the frames pushed into the graph.
    pub input_height: u32,
    /// Pixel format of the frames pushed into the graph.
    pub input_format: PixelFormat,
    /// Time base of the pushed frames' timestamps.
    pub input_time_base: Rational,
    /// Sample aspect ratio of the input.
    pub sample_aspect_ratio: Rational,
    /// Output width after scaling.
    pub output_width: u32,
    /// Output height after scaling.
    pub output_height: u32,
    /// Pixel format the graph must deliver.
    pub output_format: PixelFormat,
}

impl CropScaleConfig {
    /**
        Create a configuration for frames described by `input`.
    */
    pub fn new(
        input: &VideoStreamInfo,
        output_width: u32,
        output_height: u32,
        output_format: PixelFormat,
    ) -> Self {
        Self {
            input_width: input.width,
            input_height: input.height,
            input_format: input.pixel_format,
            input_time_base: input.time_base,
            sample_aspect_ratio: input.sample_aspect_ratio,
            output_width,
            output_height,
            output_format,
        }
    }

    /**
        The textual filter chain between the buffer source and sink.

        The crop starts as the whole frame; every push replaces it.
    */
    pub fn filter_spec(&self, output_pixel: i32) -> String {
        format!(
            "crop=w={}:h={}:x=0:y=0,scale={}:{},setsar=1:1,format=pix_fmts={}",
            self.input_width, self.input_height, self.output_width, self.output_height, output_pixel
        )
    }

    fn buffer_args(&self, input_pixel: i32) -> String {
        format!(
            "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect={}/{}",
            self.input_width,
            self.input_height,
            input_pixel,
            self.input_time_base.num,
            self.input_time_base.den,
            self.sample_aspect_ratio.num,
            self.sample_aspect_ratio.den,
        )
    }
}

/**
    A running crop → scale → setsar graph.

    Frames go in with the crop region they should be cut with; filtered
    frames come out in the output geometry and pixel format.
*/
pub struct CropScaleFilter {
    graph: filter::Graph,
    config: CropScaleConfig,
    region: CropRegion,
    output_time_base: Rational,
}

impl CropScaleFilter {
    /**
        Build and validate the filter graph.
    */
    pub fn new(config: CropScaleConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        if config.output_width == 0 || config.output_height == 0 {
            return Err(Error::invalid_data("output size must be non-zero"));
        }

        let input_pixel = ffi::AVPixelFormat::from(pixel_format_to_ffmpeg(config.input_format)?) as i32;
        let output_pixel =
            ffi::AVPixelFormat::from(pixel_format_to_ffmpeg(config.output_format)?) as i32;

        let buffer = filter::find("buffer").ok_or_else(|| Error::not_found("buffer filter"))?;
        let buffersink =
            filter::find("buffersink").ok_or_else(|| Error::not_found("buffersink filter"))?;

        let mut graph = filter::Graph::new();
        graph
            .add(&buffer, "in", &config.buffer_args(input_pixel))
            .map_err(|e| Error::codec(format!("failed to create buffer source: {e}")))?;
        graph
            .add(&buffersink, "out", "")
            .map_err(|e| Error::codec(format!("failed to create buffer sink: {e}")))?;

        let spec = config.filter_spec(output_pixel);
        graph
            .output("in", 0)
            .and_then(|parser| parser.input("out", 0))
            .and_then(|parser| parser.parse(&spec))
            .map_err(|e| Error::codec(format!("failed to parse filter graph '{spec}': {e}")))?;
        graph
            .validate()
            .map_err(|e| Error::codec(format!("invalid filter graph: {e}")))?;

        let output_time_base = {
            let sink = graph
                .get("out")
                .ok_or_else(|| Error::not_found("buffer sink in graph"))?;
            // SAFETY: the sink context is owned by the graph and configured
            let rate = unsafe { ffi::av_buffersink_get_time_base(sink.as_ptr()) };
            match (Rational { num: rate.num, den: rate.den }) {
                tb if tb.is_valid() => tb,
                _ => config.input_time_base,
            }
        };

        tracing::debug!(%spec, %output_time_base, "built crop/scale filter graph");

        Ok(Self {
            graph,
            region: CropRegion::full(config.input_width, config.input_height),
            config,
            output_time_base,
        })
    }

    /**
        Time base of the frames the graph delivers.
    */
    pub fn output_time_base(&self) -> Rational {
        self.output_time_base
    }

    /**
        The crop region currently applied.
    */
    pub fn region(&self) -> CropRegion {
        self.region
    }

    /**
        Push a frame cut with `region` and pull every frame the graph
        releases.

        The region is clamped to the input frame first.
    */
    pub fn push(&mut self, frame: &VideoFrame, region: CropRegion) -> Result<Vec<VideoFrame>> {
        let region = region.clamp_to(frame.width, frame.height);
        if region != self.region {
            self.apply_region(region)?;
        }

        let ffmpeg_frame = frame_to_ffmpeg(frame)?;
        self.graph
            .get("in")
            .ok_or_else(|| Error::not_found("buffer source in graph"))?
            .source()
            .add(&ffmpeg_frame)
            .map_err(|e| Error::codec(format!("failed to push frame into filter: {e}")))?;

        self.receive_frames()
    }

    /**
        Signal end of input and pull the frames the graph still holds.
    */
    pub fn flush(&mut self) -> Result<Vec<VideoFrame>> {
        self.graph
            .get("in")
            .ok_or_else(|| Error::not_found("buffer source in graph"))?
            .source()
            .flush()
            .map_err(|e| Error::codec(format!("failed to flush filter: {e}")))?;

        self.receive_frames()
    }

    fn apply_region(&mut self, region: CropRegion) -> Result<()> {
        // Size before position, so the crop filter never sees a rectangle
        // that only fits with the new size
        let commands = [
            ("w", region.width.to_string()),
            ("h", region.height.to_string()),
            ("x", region.x.to_string()),
            ("y", region.y.to_string()),
        ];

        for (command, argument) in commands {
            self.send_command(command, &argument)?;
        }

        tracing::trace!(?region, "updated crop region");
        self.region = region;
        Ok(())
    }

    fn send_command(&mut self, command: &str, argument: &str) -> Result<()> {
        let target = CString::new(CROP_FILTER_NAME).map_err(|e| Error::codec(e.to_string()))?;
        let command_c = CString::new(command).map_err(|e| Error::codec(e.to_string()))?;
        let argument_c = CString::new(argument).map_err(|e| Error::codec(e.to_string()))?;
        let mut response = [0 as std::ffi::c_char; 256];

        // SAFETY: all strings are NUL terminated and outlive the call
        let ret = unsafe {
            ffi::avfilter_graph_send_command(
                self.graph.as_mut_ptr(),
                target.as_ptr(),
                command_c.as_ptr(),
                argument_c.as_ptr(),
                response.as_mut_ptr(),
                response.len() as i32,
                0,
            )
        };

        if ret < 0 {
            return Err(Error::codec(format!(
                "crop command {command}={argument} failed: {}",
                ffmpeg_next::Error::from(ret)
            )));
        }
        Ok(())
    }

    fn receive_frames(&mut self) -> Result<Vec<VideoFrame>> {
        let mut frames = Vec::new();
        let mut sink = self
            .graph
            .get("out")
            .ok_or_else(|| Error::not_found("buffer sink in graph"))?;

        loop {
            let mut filtered = VideoFrameFFmpeg::empty();
            match sink.sink().frame(&mut filtered) {
                Ok(()) => frames.push(frame_from_ffmpeg(&filtered, self.output_time_base)?),
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => return Err(Error::codec(format!("filter error: {e}"))),
            }
        }

        Ok(frames)
    }
}

impl std::fmt::Debug for CropScaleFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CropScaleFilter")
            .field("config", &self.config)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_types::CodecId;

    fn input_info() -> VideoStreamInfo {
        VideoStreamInfo {
            width: 640,
            height: 480,
            pixel_format: PixelFormat::Yuv420p,
            frame_rate: Some(Rational::new(25, 1)),
            time_base: Rational::new(1, 12800),
            sample_aspect_ratio: Rational::new(1, 1),
            duration: None,
            codec_id: CodecId::H264,
            extradata: None,
            bitrate: None,
        }
    }

    #[test]
    fn filter_spec_chains_crop_scale_setsar() {
        let config = CropScaleConfig::new(&input_info(), 320, 240, PixelFormat::Yuv420p);
        assert_eq!(
            config.filter_spec(0),
            "crop=w=640:h=480:x=0:y=0,scale=320:240,setsar=1:1,format=pix_fmts=0"
        );
    }

    #[test]
    fn buffer_args_describe_input() {
        let config = CropScaleConfig::new(&input_info(), 320, 240, PixelFormat::Yuv420p);
        assert_eq!(
            config.buffer_args(0),
            "video_size=640x480:pix_fmt=0:time_base=1/12800:pixel_aspect=1/1"
        );
    }

    #[test]
    fn crops_and_scales_frames() {
        let info = input_info();
        let config = CropScaleConfig::new(&info, 160, 120, PixelFormat::Yuv420p);
        let mut filter = CropScaleFilter::new(config).unwrap();

        let mut frame = VideoFrame::blank(PixelFormat::Yuv420p, info.width, info.height);
        frame.time_base = info.time_base;

        let mut output = Vec::new();
        for index in 0..3 {
            frame.pts = Some(ffmpeg_types::Pts(index * 512));
            let region = CropRegion::new(index as i32 * 10, 0, 320, 240);
            output.extend(filter.push(&frame, region).unwrap());
        }
        output.extend(filter.flush().unwrap());

        assert_eq!(output.len(), 3);
        assert!(output.iter().all(|f| f.width == 160 && f.height == 120));
        assert_eq!(filter.region(), CropRegion::new(20, 0, 320, 240));
    }
}
