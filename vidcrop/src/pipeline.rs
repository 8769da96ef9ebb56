/*!
    Filter and encode pipeline.

    Frames come in with their input timestamps, get cut to the animated crop
    rectangle and scaled, are renumbered on the output timeline (optionally
    sped up or slowed down), encoded and handed to the packet writer.
*/

use ffmpeg_filter::CropRegion;
use ffmpeg_types::{MediaDuration, Packet, Pts, Rational, VideoFrame};

use crate::crop::CropInterpolator;
use crate::error::{Error, Result};
use crate::producer::InputFrame;

/**
    The crop → scale → square-pixel stage.
*/
pub trait CropFilter {
    /**
        Push a frame cut with `region`, returning the frames the filter releases.
    */
    fn push(&mut self, frame: &VideoFrame, region: CropRegion) -> Result<Vec<VideoFrame>>;

    /**
        Signal end of input, returning the remaining frames.
    */
    fn flush(&mut self) -> Result<Vec<VideoFrame>>;
}

/**
    The video encoder stage.
*/
pub trait FrameEncoder {
    fn encode(&mut self, frame: &VideoFrame) -> Result<Vec<Packet>>;
    fn flush(&mut self) -> Result<Vec<Packet>>;

    /**
        The encoder's time base, one tick per output frame.
    */
    fn time_base(&self) -> Rational;
}

/**
    Where encoded packets end up.
*/
pub trait PacketWriter {
    fn write(&mut self, packet: &Packet) -> Result<()>;

    /**
        Finalize the output. Further calls are no-ops.
    */
    fn finish(&mut self) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Built, no frame seen yet.
    Configured,
    /// At least one frame went through.
    Encoding,
    /// End of stream flushed the filter and the encoder.
    Flushed,
}

/**
    Counters reported by the pipeline.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_in: u64,
    pub frames_encoded: u64,
    pub packets_written: u64,
}

/**
    Drives frames from the producer through filter, encoder and writer.
*/
pub struct EncodePipeline<F, E, W> {
    filter: F,
    encoder: E,
    writer: W,
    crop: CropInterpolator,
    stream_time_base: Rational,
    frame_time_base: Rational,
    encoded_frames: i64,
    state: PipelineState,
    stats: PipelineStats,
}

impl<F, E, W> EncodePipeline<F, E, W>
where
    F: CropFilter,
    E: FrameEncoder,
    W: PacketWriter,
{
    /**
        Build a pipeline writing into a stream with `stream_time_base`.

        A `frame_rate_multiplier` above one plays the output faster: output
        frame `n` is stamped at `n / multiplier` encoder ticks.
    */
    pub fn new(
        filter: F,
        encoder: E,
        writer: W,
        crop: CropInterpolator,
        stream_time_base: Rational,
        frame_rate_multiplier: f64,
    ) -> Result<Self> {
        if !frame_rate_multiplier.is_finite() || frame_rate_multiplier <= 0.0 {
            return Err(Error::configuration(format!(
                "frame rate multiplier must be positive, got {frame_rate_multiplier}"
            )));
        }
        if !stream_time_base.is_valid() {
            return Err(Error::configuration("output stream has no time base"));
        }

        let stretch = Rational::approximate(1.0 / frame_rate_multiplier, i32::MAX);
        let frame_time_base = encoder.time_base().mul(stretch);

        tracing::debug!(
            %stream_time_base,
            %frame_time_base,
            frame_rate_multiplier,
            "configured encode pipeline"
        );

        Ok(Self {
            filter,
            encoder,
            writer,
            crop,
            stream_time_base,
            frame_time_base,
            encoded_frames: 0,
            state: PipelineState::Configured,
            stats: PipelineStats::default(),
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /**
        Feed one item of the frame sequence.

        End of stream flushes the filter and the encoder; nothing is accepted
        afterwards.
    */
    pub fn encode(&mut self, item: InputFrame) -> Result<()> {
        if self.state == PipelineState::Flushed {
            return Err(Error::configuration("pipeline was already flushed"));
        }

        match item {
            InputFrame::Frame(frame) => {
                self.state = PipelineState::Encoding;
                self.stats.frames_in += 1;

                let region = self
                    .crop
                    .rect_at(self.encoded_frames)
                    .map(|rect| rect.to_region(frame.width, frame.height))
                    .unwrap_or_else(|| CropRegion::full(frame.width, frame.height));

                for filtered in self.filter.push(&frame, region)? {
                    self.encode_filtered(filtered)?;
                }
            }
            InputFrame::EndOfStream => {
                for filtered in self.filter.flush()? {
                    self.encode_filtered(filtered)?;
                }
                let packets = self.encoder.flush()?;
                self.write_packets(packets)?;
                self.state = PipelineState::Flushed;
                tracing::debug!(stats = ?self.stats, "flushed encode pipeline");
            }
        }

        Ok(())
    }

    fn encode_filtered(&mut self, mut frame: VideoFrame) -> Result<()> {
        if let Some(pts) = frame.pts {
            let input_number = pts.rescale(frame.time_base, self.encoder.time_base());
            let output_number = self.encoded_frames;
            self.encoded_frames += 1;

            frame.pts = Some(
                Pts(output_number).rescale(self.frame_time_base, self.stream_time_base),
            );
            frame.duration =
                MediaDuration(1).rescale(self.frame_time_base, self.stream_time_base);
            frame.time_base = self.stream_time_base;

            tracing::trace!(
                input = input_number.0,
                output = output_number,
                pts = ?frame.pts,
                "renumbered frame"
            );
        }

        let packets = self.encoder.encode(&frame)?;
        self.stats.frames_encoded += 1;
        self.write_packets(packets)
    }

    fn write_packets(&mut self, packets: Vec<Packet>) -> Result<()> {
        for mut packet in packets {
            packet.dts = Some(Pts(0));
            self.writer.write(&packet)?;
            self.stats.packets_written += 1;
        }
        Ok(())
    }

    /**
        Finish the writer and hand the stages back.
    */
    pub fn finish(mut self) -> Result<(F, E, W)> {
        self.writer.finish()?;
        Ok((self.filter, self.encoder, self.writer))
    }
}

impl<F, E, W> std::fmt::Debug for EncodePipeline<F, E, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodePipeline")
            .field("state", &self.state)
            .field("stats", &self.stats)
            .field("stream_time_base", &self.stream_time_base)
            .field("frame_time_base", &self.frame_time_base)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::{CropKeyframe, CropRect};
    use crate::testing::{FakeEncoder, FakeFilter, FakeWriter, test_frame};

    type Pipeline = EncodePipeline<FakeFilter, FakeEncoder, FakeWriter>;

    fn pipeline(crop: CropInterpolator, multiplier: f64) -> Pipeline {
        EncodePipeline::new(
            FakeFilter::new(200, 200),
            FakeEncoder::new(Rational::new(1, 10)),
            FakeWriter::default(),
            crop,
            Rational::new(1, 1000),
            multiplier,
        )
        .unwrap()
    }

    fn run(pipeline: &mut Pipeline, frames: i64) {
        for index in 0..frames {
            pipeline
                .encode(InputFrame::Frame(test_frame(index, 400, 400)))
                .unwrap();
        }
        pipeline.encode(InputFrame::EndOfStream).unwrap();
    }

    fn written_pts(pipeline: &Pipeline) -> Vec<i64> {
        pipeline
            .writer()
            .packets()
            .iter()
            .filter_map(|p| p.pts)
            .map(|p| p.0)
            .collect()
    }

    #[test]
    fn timestamps_increase_at_normal_speed() {
        let mut pipeline = pipeline(CropInterpolator::default(), 1.0);
        run(&mut pipeline, 5);

        assert_eq!(written_pts(&pipeline), vec![0, 100, 200, 300, 400]);
        assert!(pipeline.writer().packets().iter().all(|p| p.dts == Some(Pts(0))));
        assert!(
            pipeline
                .writer()
                .packets()
                .iter()
                .all(|p| p.duration == MediaDuration(100))
        );
    }

    #[test]
    fn half_speed_doubles_spacing() {
        let mut pipeline = pipeline(CropInterpolator::default(), 0.5);
        run(&mut pipeline, 4);
        assert_eq!(written_pts(&pipeline), vec![0, 200, 400, 600]);
    }

    #[test]
    fn double_speed_halves_spacing() {
        let mut pipeline = pipeline(CropInterpolator::default(), 2.0);
        run(&mut pipeline, 3);
        assert_eq!(written_pts(&pipeline), vec![0, 50, 100]);
    }

    #[test]
    fn crop_follows_encoded_frame_index() {
        let crop = CropInterpolator::new(vec![
            CropKeyframe::new(0, CropRect::new(200, 200, 100, 100)),
            CropKeyframe::new(10, CropRect::new(200, 200, 200, 200)),
        ])
        .unwrap();
        let mut pipeline = pipeline(crop, 1.0);
        run(&mut pipeline, 15);

        let regions = pipeline.filter().regions();
        assert_eq!(regions.len(), 15);
        assert_eq!(regions[0], CropRegion::new(150, 150, 100, 100));
        assert_eq!(regions[5], CropRegion::new(125, 125, 150, 150));
        assert_eq!(regions[10], CropRegion::new(100, 100, 200, 200));
        assert_eq!(regions[14], regions[10]);
    }

    #[test]
    fn no_keyframes_uses_full_frame() {
        let mut pipeline = pipeline(CropInterpolator::default(), 1.0);
        run(&mut pipeline, 2);
        assert!(
            pipeline
                .filter()
                .regions()
                .iter()
                .all(|r| *r == CropRegion::full(400, 400))
        );
    }

    #[test]
    fn end_of_stream_flushes_and_seals() {
        let mut pipeline = pipeline(CropInterpolator::default(), 1.0);
        assert_eq!(pipeline.state(), PipelineState::Configured);

        pipeline
            .encode(InputFrame::Frame(test_frame(0, 400, 400)))
            .unwrap();
        assert_eq!(pipeline.state(), PipelineState::Encoding);

        pipeline.encode(InputFrame::EndOfStream).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Flushed);
        assert_eq!(pipeline.encoder().flushes(), 1);
        assert_eq!(pipeline.stats().packets_written, 1);

        assert!(matches!(
            pipeline.encode(InputFrame::EndOfStream),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn frames_without_timestamps_keep_the_counter() {
        let mut pipeline = pipeline(CropInterpolator::default(), 1.0);
        let mut untimed = test_frame(0, 400, 400);
        untimed.pts = None;

        pipeline.encode(InputFrame::Frame(untimed)).unwrap();
        pipeline
            .encode(InputFrame::Frame(test_frame(1, 400, 400)))
            .unwrap();
        pipeline.encode(InputFrame::EndOfStream).unwrap();

        assert_eq!(written_pts(&pipeline), vec![0]);
        assert_eq!(pipeline.stats().frames_encoded, 2);
    }

    #[test]
    fn invalid_multiplier_is_rejected() {
        for multiplier in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = EncodePipeline::new(
                FakeFilter::new(10, 10),
                FakeEncoder::new(Rational::new(1, 10)),
                FakeWriter::default(),
                CropInterpolator::default(),
                Rational::new(1, 1000),
                multiplier,
            );
            assert!(result.is_err());
        }
    }

    #[test]
    fn finish_finalizes_the_writer() {
        let mut pipeline = pipeline(CropInterpolator::default(), 1.0);
        run(&mut pipeline, 1);
        let (_, _, writer) = pipeline.finish().unwrap();
        assert!(writer.is_finished());
    }
}
