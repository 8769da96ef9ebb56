/*!
    Whole-file transcoding.

    A [`Transcoder`] owns one open input and at most one open output. Each
    [`run`](Transcoder::run) starts from the beginning of the input, pushes
    every kept frame through the crop/scale/encode pipeline and reports
    progress after each frame.
*/

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_decode::ThreadingMode;
use ffmpeg_encode::VideoEncoder;
use ffmpeg_filter::{CropScaleConfig, CropScaleFilter};
use ffmpeg_sink::{ContainerFormat, Sink, SinkConfig};
use ffmpeg_types::{Rational, VideoStreamInfo};

use crate::backend::FfmpegInput;
use crate::codec::OutputCodec;
use crate::crop::{CropInterpolator, CropKeyframe};
use crate::error::{Error, Result};
use crate::pipeline::{CropFilter, EncodePipeline, FrameEncoder, PacketWriter, PipelineState};
use crate::producer::{FrameProducer, InputFrame, VideoInput};
use crate::trim::{TrimMarker, resolve_trim_ranges};

/// Constant rate factor used when none is given.
pub const DEFAULT_CRF: u8 = 23;

/// Default `encoder-app` tag.
pub const DEFAULT_TITLE: &str = "vidcrop";

/**
    Where and how to write the output.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSettings {
    pub path: PathBuf,
    /// None picks the codec from the file extension.
    pub codec: Option<OutputCodec>,
    pub crf: u8,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub crop_keyframes: Vec<CropKeyframe>,
    /// Above one plays faster, below one slower.
    pub frame_rate_multiplier: f64,
    pub dump_format: bool,
}

impl OutputSettings {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            codec: None,
            crf: DEFAULT_CRF,
            width,
            height,
            title: DEFAULT_TITLE.to_string(),
            crop_keyframes: Vec::new(),
            frame_rate_multiplier: 1.0,
            dump_format: false,
        }
    }

    pub fn with_codec(mut self, codec: OutputCodec) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_crop_keyframes(mut self, keyframes: Vec<CropKeyframe>) -> Self {
        self.crop_keyframes = keyframes;
        self
    }

    pub fn with_frame_rate_multiplier(mut self, multiplier: f64) -> Self {
        self.frame_rate_multiplier = multiplier;
        self
    }

    pub fn with_dump_format(mut self, enabled: bool) -> Self {
        self.dump_format = enabled;
        self
    }

    pub fn codec(&self) -> OutputCodec {
        self.codec
            .unwrap_or_else(|| OutputCodec::from_path(&self.path))
    }
}

/**
    Progress of a running transcode.
*/
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    /// Media time of the last frame read.
    pub position: Duration,
    pub media_duration: Duration,
    pub frames_encoded: u64,
}

impl Progress {
    /**
        Completed share in `0.0..=1.0`, zero when the length is unknown.
    */
    pub fn fraction(&self) -> f64 {
        if self.media_duration.is_zero() || self.media_duration == Duration::MAX {
            return 0.0;
        }
        (self.position.as_secs_f64() / self.media_duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/**
    Outcome of a transcode run.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TranscodeSummary {
    pub frames_read: u64,
    pub frames_encoded: u64,
    pub packets_written: u64,
    /// The progress callback stopped the run early.
    pub cancelled: bool,
}

static_assertions::assert_impl_all!(OutputSettings: Send, Sync);
static_assertions::assert_impl_all!(TranscodeSummary: Send, Sync);

/**
    Pull every item from `producer` into `pipeline`.

    `progress` is called after each frame; breaking stops reading and flushes
    the pipeline, so the output stays playable.
*/
pub fn transcode_frames<I, F, E, W>(
    producer: &mut FrameProducer<I>,
    pipeline: &mut EncodePipeline<F, E, W>,
    media_duration: Duration,
    mut progress: impl FnMut(Progress) -> ControlFlow<()>,
) -> Result<TranscodeSummary>
where
    I: VideoInput,
    F: CropFilter,
    E: FrameEncoder,
    W: PacketWriter,
{
    let _span = tracing::debug_span!("transcode").entered();
    let mut summary = TranscodeSummary::default();

    while let Some(item) = producer.next() {
        let item = item?;
        let position = match &item {
            InputFrame::Frame(frame) => frame.presentation_time(),
            InputFrame::EndOfStream => None,
        };
        let is_frame = !item.is_end_of_stream();

        pipeline.encode(item)?;
        if !is_frame {
            continue;
        }

        summary.frames_read += 1;
        let report = Progress {
            position: position.unwrap_or_else(|| producer.next_position()),
            media_duration,
            frames_encoded: pipeline.stats().frames_encoded,
        };
        if progress(report).is_break() {
            tracing::debug!(position = ?report.position, "transcode cancelled");
            pipeline.encode(InputFrame::EndOfStream)?;
            summary.cancelled = true;
            break;
        }
    }

    let stats = pipeline.stats();
    summary.frames_encoded = stats.frames_encoded;
    summary.packets_written = stats.packets_written;

    tracing::debug!(?summary, "transcode finished");
    Ok(summary)
}

type FfmpegPipeline = EncodePipeline<CropScaleFilter, VideoEncoder, Sink>;

/**
    Transcodes one input file into output files.

    ```ignore
    let mut transcoder = Transcoder::open_input("in.mp4", false)?;
    transcoder.set_trim_markers(&[TrimMarker::new(100, true), TrimMarker::new(200, false)])?;
    transcoder.open_output(OutputSettings::new("out.mp4", 1280, 720))?;
    let summary = transcoder.run(|_| ControlFlow::Continue(()))?;
    transcoder.close()?;
    ```
*/
pub struct Transcoder {
    producer: FrameProducer<FfmpegInput>,
    info: VideoStreamInfo,
    media_duration: Duration,
    output: Option<FfmpegPipeline>,
}

impl Transcoder {
    /**
        Open the input file. Nothing is decoded yet.
    */
    pub fn open_input(path: impl AsRef<Path>, dump_format: bool) -> Result<Self> {
        let input = FfmpegInput::open(path, dump_format)?;
        let clock = input.clock()?;
        let info = input.stream_info().clone();
        let media_duration = input.duration();
        let ranges = resolve_trim_ranges(&[], &clock, media_duration)?;

        Ok(Self {
            producer: FrameProducer::new(input, clock, ranges),
            info,
            media_duration,
            output: None,
        })
    }

    pub fn media_duration(&self) -> Duration {
        self.media_duration
    }

    pub fn frame_rate(&self) -> Rational {
        self.producer.clock().frame_rate()
    }

    pub fn stream_info(&self) -> &VideoStreamInfo {
        &self.info
    }

    /**
        How the decoder spreads work across threads.
    */
    pub fn threading(&self) -> ThreadingMode {
        self.producer.input().threading()
    }

    /**
        Replace the trim markers. An empty list keeps the whole input.
    */
    pub fn set_trim_markers(&mut self, markers: &[TrimMarker]) -> Result<()> {
        let ranges = resolve_trim_ranges(markers, self.producer.clock(), self.media_duration)?;
        tracing::debug!(?ranges, "trim ranges");
        self.producer.set_trim_ranges(ranges);
        Ok(())
    }

    /**
        Create the output file, encoder and filter. An output that is still
        open is finished first.
    */
    pub fn open_output(&mut self, settings: OutputSettings) -> Result<()> {
        self.close_output()?;

        let crop = CropInterpolator::new(settings.crop_keyframes.clone())?;
        let codec = settings.codec();

        let mut sink_config = SinkConfig::default()
            .with_title(settings.title.clone())
            .with_dump_format(settings.dump_format);
        if let Some(format) = ContainerFormat::from_path(&settings.path) {
            sink_config = sink_config.with_format(format);
        }
        let mut sink = Sink::create(&settings.path, sink_config)?;

        let encoder_config = codec
            .encoder_config(
                settings.width,
                settings.height,
                self.frame_rate(),
                self.info.pixel_format,
                settings.crf,
            )?
            .with_global_header(sink.requires_global_header());
        let pixel_format = encoder_config.pixel_format;
        let encoder = VideoEncoder::new(encoder_config)?;

        sink.add_video_stream(&encoder.stream_info())?;
        let stream_time_base = sink.write_header()?;

        let filter = CropScaleFilter::new(CropScaleConfig::new(
            &self.info,
            settings.width,
            settings.height,
            pixel_format,
        ))?;

        self.output = Some(EncodePipeline::new(
            filter,
            encoder,
            sink,
            crop,
            stream_time_base,
            settings.frame_rate_multiplier,
        )?);

        tracing::debug!(
            path = %settings.path.display(),
            %codec,
            width = settings.width,
            height = settings.height,
            "opened output"
        );
        Ok(())
    }

    /**
        Transcode the kept part of the input into the open output.

        Every run starts at the beginning of the input. An output takes one
        run; open another output to run again.
    */
    pub fn run(
        &mut self,
        progress: impl FnMut(Progress) -> ControlFlow<()>,
    ) -> Result<TranscodeSummary> {
        let pipeline = self
            .output
            .as_mut()
            .ok_or_else(|| Error::configuration("no output is open"))?;
        if pipeline.state() == PipelineState::Flushed {
            return Err(Error::configuration(
                "output is already complete, open a new one",
            ));
        }

        self.producer.rewind()?;
        transcode_frames(&mut self.producer, pipeline, self.media_duration, progress)
    }

    /**
        Finish the output file, writing its trailer.
    */
    pub fn close(&mut self) -> Result<()> {
        self.close_output()
    }

    fn close_output(&mut self) -> Result<()> {
        match self.output.take() {
            Some(pipeline) => {
                pipeline.finish()?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for Transcoder {
    fn drop(&mut self) {
        if let Some(pipeline) = self.output.take() {
            if let Err(e) = pipeline.finish() {
                tracing::error!(error = %e, "failed to finish output");
            }
        }
    }
}

impl std::fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcoder")
            .field("producer", &self.producer)
            .field("media_duration", &self.media_duration)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
