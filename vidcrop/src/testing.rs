/*!
    In-memory stand-ins for the FFmpeg-backed stages, and small media files
    for exercising the real ones.
*/

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use ffmpeg_encode::{VideoEncoder, VideoEncoderConfig};
use ffmpeg_filter::CropRegion;
use ffmpeg_sink::{ContainerFormat, Sink, SinkConfig};
use ffmpeg_types::{CodecId, MediaDuration, Packet, PixelFormat, Pts, Rational, VideoFrame};

use crate::backend::FfmpegInput;
use crate::error::{Error, Result};
use crate::pipeline::{CropFilter, FrameEncoder, PacketWriter};
use crate::preview::FrameConverter;
use crate::producer::{FrameProducer, InputFrame, VideoInput};
use crate::timing::FrameClock;
use crate::trim::TrimRange;

pub(crate) const FAKE_TIME_BASE: Rational = Rational { num: 1, den: 10 };

pub(crate) fn ten_fps() -> FrameClock {
    FrameClock::new(Rational::new(10, 1)).unwrap()
}

/**
    A 4x4 RGBA frame stamped `index` in a 1/10 time base.
*/
pub(crate) fn test_frame(index: i64, width: u32, height: u32) -> VideoFrame {
    let mut frame = VideoFrame::blank(PixelFormat::Rgba, width, height);
    frame.pts = Some(Pts(index));
    frame.time_base = FAKE_TIME_BASE;
    frame.with_duration(MediaDuration(1))
}

/// Geometry of the files written by [`write_test_video`].
pub(crate) const TEST_VIDEO_SIZE: (u32, u32) = (64, 48);

/**
    Write a 10 fps MPEG-4 Matroska file of `frames` frames with a keyframe
    every 10 frames. Each frame has its own brightness.
*/
pub(crate) fn write_test_video(path: &Path, frames: i64) {
    let (width, height) = TEST_VIDEO_SIZE;
    let mut sink = Sink::create(
        path,
        SinkConfig::default().with_format(ContainerFormat::Matroska),
    )
    .unwrap();
    let config = VideoEncoderConfig::new(CodecId::Mpeg4, width, height, Rational::new(10, 1))
        .with_gop(10)
        .with_max_b_frames(0)
        .with_global_header(sink.requires_global_header());
    let mut encoder = VideoEncoder::new(config).unwrap();
    sink.add_video_stream(&encoder.stream_info()).unwrap();
    sink.write_header().unwrap();

    let luma = (width * height) as usize;
    for index in 0..frames {
        let mut frame = VideoFrame::blank(PixelFormat::Yuv420p, width, height);
        frame.data[..luma].fill(16 + (index * 7 % 220) as u8);
        frame.pts = Some(Pts(index));
        frame.time_base = FAKE_TIME_BASE;
        for packet in encoder.encode(&frame.with_duration(MediaDuration(1))).unwrap() {
            sink.write(&packet).unwrap();
        }
    }
    for packet in encoder.flush().unwrap() {
        sink.write(&packet).unwrap();
    }
    sink.finish().unwrap();
}

/**
    Decode every frame of `path`, returning their presentation times.
*/
pub(crate) fn read_presentation_times(path: &Path) -> Vec<Duration> {
    let input = FfmpegInput::open(path, false).unwrap();
    let clock = input.clock().unwrap();
    let unbounded = vec![TrimRange::new(Duration::ZERO, Duration::MAX)];
    FrameProducer::new(input, clock, unbounded)
        .map(|item| item.unwrap())
        .filter_map(|item| match item {
            InputFrame::Frame(frame) => frame.presentation_time(),
            InputFrame::EndOfStream => None,
        })
        .collect()
}

/**
    A 10 fps input of `frames` frames, one packet per frame.
*/
#[derive(Debug)]
pub(crate) struct FakeInput {
    frames: i64,
    next: i64,
    delay: usize,
    keyframe_interval: i64,
    failing_at: Option<i64>,
    buffered: VecDeque<VideoFrame>,
    packets_read: usize,
    drains: usize,
    seeks: Vec<Pts>,
}

impl FakeInput {
    pub(crate) fn new(frames: i64) -> Self {
        Self {
            frames,
            next: 0,
            delay: 0,
            keyframe_interval: 1,
            failing_at: None,
            buffered: VecDeque::new(),
            packets_read: 0,
            drains: 0,
            seeks: Vec::new(),
        }
    }

    /// Hold back `delay` frames like a reordering decoder.
    pub(crate) fn with_delay(mut self, delay: usize) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn with_keyframe_interval(mut self, interval: i64) -> Self {
        self.keyframe_interval = interval.max(1);
        self
    }

    /// Fail decoding the packet with this index.
    pub(crate) fn failing_at(mut self, packet: i64) -> Self {
        self.failing_at = Some(packet);
        self
    }

    pub(crate) fn duration(&self) -> Duration {
        ten_fps().duration_of(self.frames)
    }

    pub(crate) fn packets_read(&self) -> usize {
        self.packets_read
    }

    pub(crate) fn drains(&self) -> usize {
        self.drains
    }

    pub(crate) fn seeks(&self) -> &[Pts] {
        &self.seeks
    }
}

impl VideoInput for FakeInput {
    fn decode_next(&mut self) -> Result<Option<Vec<VideoFrame>>> {
        if self.next >= self.frames {
            return Ok(None);
        }
        if self.failing_at == Some(self.next) {
            return Err(Error::Codec(ffmpeg_types::Error::codec("corrupt packet")));
        }

        self.buffered.push_back(test_frame(self.next, 4, 4));
        self.next += 1;
        self.packets_read += 1;

        let mut frames = Vec::new();
        while self.buffered.len() > self.delay {
            frames.extend(self.buffered.pop_front());
        }
        Ok(Some(frames))
    }

    fn drain(&mut self) -> Result<Vec<VideoFrame>> {
        self.drains += 1;
        Ok(self.buffered.drain(..).collect())
    }

    fn seek(&mut self, timestamp: Pts) -> Result<()> {
        let target = timestamp.0.clamp(0, (self.frames - 1).max(0));
        self.next = target / self.keyframe_interval * self.keyframe_interval;
        self.buffered.clear();
        self.seeks.push(timestamp);
        Ok(())
    }

    fn time_base(&self) -> Rational {
        FAKE_TIME_BASE
    }
}

/**
    Records crop regions and emits blank frames of the output size.
*/
#[derive(Debug)]
pub(crate) struct FakeFilter {
    width: u32,
    height: u32,
    regions: Vec<CropRegion>,
}

impl FakeFilter {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            regions: Vec::new(),
        }
    }

    pub(crate) fn regions(&self) -> &[CropRegion] {
        &self.regions
    }
}

impl CropFilter for FakeFilter {
    fn push(&mut self, frame: &VideoFrame, region: CropRegion) -> Result<Vec<VideoFrame>> {
        self.regions.push(region.clamp_to(frame.width, frame.height));

        let mut output = VideoFrame::blank(PixelFormat::Yuv420p, self.width, self.height);
        output.pts = frame.pts;
        output.duration = frame.duration;
        output.time_base = frame.time_base;
        Ok(vec![output])
    }

    fn flush(&mut self) -> Result<Vec<VideoFrame>> {
        Ok(Vec::new())
    }
}

/**
    Emits one packet per frame carrying the frame's timing.
*/
#[derive(Debug)]
pub(crate) struct FakeEncoder {
    time_base: Rational,
    frames: Vec<Option<Pts>>,
    flushes: usize,
}

impl FakeEncoder {
    pub(crate) fn new(time_base: Rational) -> Self {
        Self {
            time_base,
            frames: Vec::new(),
            flushes: 0,
        }
    }

    pub(crate) fn frames(&self) -> &[Option<Pts>] {
        &self.frames
    }

    pub(crate) fn flushes(&self) -> usize {
        self.flushes
    }
}

impl FrameEncoder for FakeEncoder {
    fn encode(&mut self, frame: &VideoFrame) -> Result<Vec<Packet>> {
        self.frames.push(frame.pts);
        if frame.pts.is_none() {
            return Ok(Vec::new());
        }
        Ok(vec![Packet::new(
            vec![0; 8],
            frame.pts,
            frame.pts,
            frame.duration,
            frame.time_base,
            self.frames.len() == 1,
        )])
    }

    fn flush(&mut self) -> Result<Vec<Packet>> {
        self.flushes += 1;
        Ok(Vec::new())
    }

    fn time_base(&self) -> Rational {
        self.time_base
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeWriter {
    packets: Vec<Packet>,
    finished: bool,
}

impl FakeWriter {
    pub(crate) fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }
}

impl PacketWriter for FakeWriter {
    fn write(&mut self, packet: &Packet) -> Result<()> {
        if self.finished {
            return Err(Error::configuration("writer already finished"));
        }
        self.packets.push(packet.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/**
    Fills the destination with the source's first byte and copies timing.
*/
#[derive(Debug, Default)]
pub(crate) struct FakeConverter {
    calls: usize,
}

impl FakeConverter {
    pub(crate) fn calls(&self) -> usize {
        self.calls
    }
}

impl FrameConverter for FakeConverter {
    fn convert_into(&mut self, src: &VideoFrame, dst: &mut VideoFrame) -> Result<()> {
        self.calls += 1;
        let fill = src.data.first().copied().unwrap_or_default();
        dst.data.clear();
        dst.data.resize(dst.format.frame_size(dst.width, dst.height), fill);
        dst.pts = src.pts;
        dst.duration = src.duration;
        dst.time_base = src.time_base;
        Ok(())
    }
}
