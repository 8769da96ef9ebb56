/*!
    The FFmpeg-backed stages.

    Wires the `ffmpeg-*` crates into the traits the producer, pipeline and
    preview reader are written against.
*/

use std::path::Path;
use std::time::Duration;

use ffmpeg_decode::{ThreadingMode, VideoDecoder, VideoDecoderConfig};
use ffmpeg_encode::VideoEncoder;
use ffmpeg_filter::{CropRegion, CropScaleFilter};
use ffmpeg_sink::Sink;
use ffmpeg_source::{Source, SourceConfig};
use ffmpeg_transform::{ScalingAlgorithm, VideoTransform};
use ffmpeg_types::{Packet, Pts, Rational, VideoFrame, VideoStreamInfo};

use crate::error::{Error, Result};
use crate::pipeline::{CropFilter, FrameEncoder, PacketWriter};
use crate::preview::{FrameConverter, PreviewConfig, PreviewReader};
use crate::producer::VideoInput;
use crate::timing::FrameClock;

/**
    A demuxed and decoded video file.
*/
pub struct FfmpegInput {
    source: Source,
    decoder: VideoDecoder,
    info: VideoStreamInfo,
}

impl FfmpegInput {
    /**
        Open `path` and a decoder for its best video stream.
    */
    pub fn open(path: impl AsRef<Path>, dump_format: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut source = Source::open(path, SourceConfig::default().with_dump_format(dump_format))?;

        let info = source
            .media_info()
            .video
            .clone()
            .ok_or_else(|| Error::not_found(format!("no video stream in {}", path.display())))?;
        let codec_config = source
            .take_codec_config()
            .ok_or_else(|| Error::not_found("video codec parameters"))?;

        let decoder = VideoDecoder::new(
            codec_config,
            source.time_base(),
            source.frame_rate(),
            VideoDecoderConfig::default(),
        )?;

        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            pixel_format = ?info.pixel_format,
            threading = %decoder.threading(),
            "opened input"
        );
        if source.duration().is_none() {
            tracing::warn!(path = %path.display(), "input reports no duration, reading to the end");
        }

        Ok(Self {
            source,
            decoder,
            info,
        })
    }

    pub fn stream_info(&self) -> &VideoStreamInfo {
        &self.info
    }

    /**
        Length of the media. A file that does not report one is treated as
        unbounded, so an open trailing range runs until the stream ends.
    */
    pub fn duration(&self) -> Duration {
        self.source.duration().unwrap_or(Duration::MAX)
    }

    pub fn frame_rate(&self) -> Rational {
        self.source.frame_rate()
    }

    /**
        A clock ticking at the stream's frame rate.
    */
    pub fn clock(&self) -> Result<FrameClock> {
        FrameClock::new(self.frame_rate())
    }

    pub fn threading(&self) -> ThreadingMode {
        self.decoder.threading()
    }
}

impl VideoInput for FfmpegInput {
    fn decode_next(&mut self) -> Result<Option<Vec<VideoFrame>>> {
        match self.source.next_packet()? {
            Some(packet) => Ok(Some(self.decoder.decode(&packet)?)),
            None => Ok(None),
        }
    }

    fn drain(&mut self) -> Result<Vec<VideoFrame>> {
        Ok(self.decoder.flush()?)
    }

    fn seek(&mut self, timestamp: Pts) -> Result<()> {
        self.source.seek_backward(timestamp)?;
        self.decoder.reset();
        Ok(())
    }

    fn time_base(&self) -> Rational {
        self.decoder.time_base()
    }
}

impl std::fmt::Debug for FfmpegInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegInput")
            .field("info", &self.info)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}

impl CropFilter for CropScaleFilter {
    fn push(&mut self, frame: &VideoFrame, region: CropRegion) -> Result<Vec<VideoFrame>> {
        Ok(CropScaleFilter::push(self, frame, region)?)
    }

    fn flush(&mut self) -> Result<Vec<VideoFrame>> {
        Ok(CropScaleFilter::flush(self)?)
    }
}

impl FrameEncoder for VideoEncoder {
    fn encode(&mut self, frame: &VideoFrame) -> Result<Vec<Packet>> {
        Ok(VideoEncoder::encode(self, frame)?)
    }

    fn flush(&mut self) -> Result<Vec<Packet>> {
        Ok(VideoEncoder::flush(self)?)
    }

    fn time_base(&self) -> Rational {
        VideoEncoder::time_base(self)
    }
}

impl PacketWriter for Sink {
    fn write(&mut self, packet: &Packet) -> Result<()> {
        Ok(Sink::write(self, packet)?)
    }

    fn finish(&mut self) -> Result<()> {
        Ok(Sink::finish(self)?)
    }
}

impl FrameConverter for VideoTransform {
    fn convert_into(&mut self, src: &VideoFrame, dst: &mut VideoFrame) -> Result<()> {
        Ok(VideoTransform::convert_into(self, src, dst)?)
    }
}

impl PreviewReader<FfmpegInput, VideoTransform> {
    /**
        Open `path` for scrubbing, positioned on its first frame.
    */
    pub fn open(path: impl AsRef<Path>, config: PreviewConfig) -> Result<Self> {
        let input = FfmpegInput::open(path, false)?;
        let clock = input.clock()?;
        let duration = input.duration();
        PreviewReader::new(
            input,
            clock,
            duration,
            VideoTransform::new(ScalingAlgorithm::Preview),
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::{FrameProducer, InputFrame};
    use crate::testing::{TEST_VIDEO_SIZE, read_presentation_times, write_test_video};
    use crate::trim::TrimRange;

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn producer(path: &Path) -> FrameProducer<FfmpegInput> {
        let input = FfmpegInput::open(path, false).unwrap();
        let clock = input.clock().unwrap();
        FrameProducer::new(
            input,
            clock,
            vec![TrimRange::new(Duration::ZERO, Duration::MAX)],
        )
    }

    fn presentation_times(items: &[InputFrame]) -> Vec<Duration> {
        items
            .iter()
            .filter_map(|item| match item {
                InputFrame::Frame(frame) => frame.presentation_time(),
                InputFrame::EndOfStream => None,
            })
            .collect()
    }

    #[test]
    fn reports_stream_properties() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.mkv");
        write_test_video(&path, 30);

        let input = FfmpegInput::open(&path, false).unwrap();
        let info = input.stream_info();
        assert_eq!((info.width, info.height), TEST_VIDEO_SIZE);
        assert_eq!(input.clock().unwrap().period(), millis(100));

        let seconds = input.duration().as_secs_f64();
        assert!((2.85..=3.05).contains(&seconds), "duration {seconds}");
    }

    #[test]
    fn decodes_and_drains_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.mkv");
        write_test_video(&path, 30);

        let mut producer = producer(&path);
        let items: Vec<InputFrame> = producer.by_ref().collect::<Result<_>>().unwrap();

        let times = presentation_times(&items);
        assert_eq!(times.len(), 30);
        assert_eq!(times[0], Duration::ZERO);
        assert_eq!(times[29], millis(2900));
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(items.iter().filter(|i| i.is_end_of_stream()).count(), 1);
        assert!(items.last().is_some_and(InputFrame::is_end_of_stream));
        assert!(producer.next().is_none());
    }

    #[test]
    fn seek_lands_one_period_before_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.mkv");
        write_test_video(&path, 30);

        let mut producer = producer(&path);
        assert!(producer.seek(millis(1500)).unwrap());

        let items: Vec<InputFrame> = producer.by_ref().collect::<Result<_>>().unwrap();
        let times = presentation_times(&items);
        assert_eq!(times.first(), Some(&millis(1400)));
        assert_eq!(times.len(), 16);
        assert!(items.last().is_some_and(InputFrame::is_end_of_stream));

        producer.rewind().unwrap();
        assert_eq!(producer.by_ref().filter(|i| matches!(i, Ok(InputFrame::Frame(_)))).count(), 30);
    }

    #[test]
    fn seek_past_the_end_misses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.mkv");
        write_test_video(&path, 20);

        let mut producer = producer(&path);
        assert!(!producer.seek(Duration::from_secs(10)).unwrap());
        assert!(matches!(producer.next(), Some(Ok(InputFrame::EndOfStream))));
        assert!(producer.next().is_none());
    }

    #[test]
    fn preview_scrubs_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.mkv");
        write_test_video(&path, 30);

        let mut reader = PreviewReader::open(&path, PreviewConfig::default().with_max_size(32, 32))
            .unwrap();
        let frame = reader.current_frame().unwrap();
        assert_eq!(frame.format, ffmpeg_types::PixelFormat::Rgba);
        assert_eq!((frame.width, frame.height), (32, 24));

        reader.set_position(Duration::from_secs(2)).unwrap();
        assert_eq!(reader.position(), Duration::from_secs(2));
        reader.set_position(Duration::from_secs(2)).unwrap();
        assert_eq!(reader.position(), Duration::from_secs(2));

        assert!(reader.advance_frame().unwrap());
        assert_eq!(reader.position(), Duration::from_secs(2));
        assert!(reader.advance_frame().unwrap());
        assert_eq!(reader.position(), millis(2100));
    }

    #[test]
    fn written_file_reads_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.mkv");
        write_test_video(&path, 12);

        let times = read_presentation_times(&path);
        assert_eq!(times, (0..12).map(|i| millis(i * 100)).collect::<Vec<_>>());
    }
}
