/*!
    The decode/trim frame producer.

    [`FrameProducer`] pulls packets through a [`VideoInput`], numbers the
    decoded frames and lets only the frames inside the kept trim ranges
    through. The sequence always ends with a single
    [`InputFrame::EndOfStream`], which downstream stages use to flush.
*/

use std::collections::VecDeque;
use std::time::Duration;

use ffmpeg_types::{Pts, Rational, VideoFrame};

use crate::error::{Error, Result};
use crate::timing::FrameClock;
use crate::trim::{TrimCursor, TrimDecision, TrimRange};

/**
    An item of the frame sequence.
*/
#[derive(Clone, Debug)]
pub enum InputFrame {
    Frame(VideoFrame),
    EndOfStream,
}

static_assertions::assert_impl_all!(InputFrame: Send, Sync);

impl InputFrame {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

/**
    A demuxer and decoder pair, seen from the producer.
*/
pub trait VideoInput {
    /**
        Read the next packet and decode it. Returns None once the input has
        no packets left; buffered frames are then released by [`drain`](Self::drain).
    */
    fn decode_next(&mut self) -> Result<Option<Vec<VideoFrame>>>;

    /**
        Signal end of input and return every frame the decoder still holds.
    */
    fn drain(&mut self) -> Result<Vec<VideoFrame>>;

    /**
        Seek to the keyframe at or before `timestamp` and discard decoder state.
    */
    fn seek(&mut self, timestamp: Pts) -> Result<()>;

    /**
        Time base of decoded frame timestamps.
    */
    fn time_base(&self) -> Rational;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Packets are being read.
    Reading,
    /// Input or trim ranges ran out; the decoder still has to be drained.
    Draining,
    /// The decoder is drained; end of stream is next.
    Drained,
    /// End of stream was yielded.
    Done,
}

/**
    Lazy, trimming-aware sequence of decoded frames.

    Each decoded frame is numbered from the start (or from the last seek) and
    placed on the timeline at that index's time. Frames before the current
    kept range are skipped; once a frame lands past the last kept range,
    reading stops and the decoder is drained.
*/
pub struct FrameProducer<I> {
    pub(crate) input: I,
    pub(crate) clock: FrameClock,
    pub(crate) trim: TrimCursor,
    pub(crate) counter: i64,
    pub(crate) pending: VecDeque<VideoFrame>,
    pub(crate) phase: Phase,
    pub(crate) consumed: bool,
}

impl<I: VideoInput> FrameProducer<I> {
    pub fn new(input: I, clock: FrameClock, ranges: Vec<TrimRange>) -> Self {
        Self {
            input,
            clock,
            trim: TrimCursor::new(ranges),
            counter: 0,
            pending: VecDeque::new(),
            phase: Phase::Reading,
            consumed: false,
        }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /**
        Replace the kept ranges. Takes effect from the next frame.
    */
    pub fn set_trim_ranges(&mut self, ranges: Vec<TrimRange>) {
        self.trim.set_ranges(ranges);
    }

    /**
        Timeline position the next decoded frame will get.
    */
    pub fn next_position(&self) -> Duration {
        self.clock.duration_of(self.counter)
    }

    /**
        Whether end of stream has been yielded.
    */
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }

    /**
        Start over from the beginning of the input.

        Does nothing if no frame has been pulled yet.
    */
    pub fn rewind(&mut self) -> Result<()> {
        if !self.consumed {
            return Ok(());
        }

        self.input.seek(Pts(0))?;
        self.pending.clear();
        self.counter = 0;
        self.trim.reset();
        self.phase = Phase::Reading;
        self.consumed = false;
        tracing::debug!("rewound frame producer");
        Ok(())
    }

    fn fail(&mut self, error: Error) -> Option<Result<InputFrame>> {
        self.phase = Phase::Done;
        self.pending.clear();
        Some(Err(error))
    }
}

impl<I: VideoInput> Iterator for FrameProducer<I> {
    type Item = Result<InputFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.consumed = true;

        loop {
            if self.phase == Phase::Done {
                return None;
            }

            if let Some(frame) = self.pending.pop_front() {
                let position = self.clock.duration_of(self.counter);
                self.counter += 1;

                match self.trim.classify(position) {
                    TrimDecision::Keep => {
                        tracing::trace!(?position, pts = ?frame.pts, "yielding frame");
                        return Some(Ok(InputFrame::Frame(frame)));
                    }
                    TrimDecision::Skip => continue,
                    TrimDecision::Exhausted => {
                        self.pending.clear();
                        if self.phase == Phase::Reading {
                            tracing::debug!(?position, "trim ranges exhausted");
                            self.phase = Phase::Draining;
                        }
                        continue;
                    }
                }
            }

            match self.phase {
                Phase::Reading => match self.input.decode_next() {
                    Ok(Some(frames)) => self.pending.extend(frames),
                    Ok(None) => self.phase = Phase::Draining,
                    Err(e) => return self.fail(e),
                },
                Phase::Draining => match self.input.drain() {
                    Ok(frames) => {
                        self.pending.extend(frames);
                        self.phase = Phase::Drained;
                    }
                    Err(e) => return self.fail(e),
                },
                Phase::Drained => {
                    self.phase = Phase::Done;
                    return Some(Ok(InputFrame::EndOfStream));
                }
                Phase::Done => return None,
            }
        }
    }
}

impl<I> std::fmt::Debug for FrameProducer<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameProducer")
            .field("counter", &self.counter)
            .field("pending", &self.pending.len())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
