/*!
    Trimming: markers on the timeline become kept time ranges.
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timing::FrameClock;

/**
    A cut point on the timeline.

    `trim_after` discards everything from this marker up to the next one
    (or to the end of the media for the last marker).
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimMarker {
    pub frame_number: i64,
    #[serde(default)]
    pub trim_after: bool,
}

impl TrimMarker {
    pub const fn new(frame_number: i64, trim_after: bool) -> Self {
        Self {
            frame_number,
            trim_after,
        }
    }
}

/**
    A kept, half-open span of media time.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrimRange {
    pub start: Duration,
    pub end: Duration,
}

impl TrimRange {
    pub const fn new(start: Duration, end: Duration) -> Self {
        Self { start, end }
    }
}

/**
    Turn markers into the ordered list of kept ranges.

    Without markers the whole media is kept. The timeline always starts
    with an implicit kept marker at frame 0, so media before the first
    marker survives unless that marker sits at frame 0 itself. Touching
    kept ranges are merged. Markers must have non-negative, strictly
    increasing frame numbers.
*/
pub fn resolve_trim_ranges(
    markers: &[TrimMarker],
    clock: &FrameClock,
    media_duration: Duration,
) -> Result<Vec<TrimRange>> {
    validate_markers(markers)?;

    let Some(first) = markers.first() else {
        return Ok(vec![TrimRange::new(Duration::ZERO, media_duration)]);
    };

    let mut ranges: Vec<TrimRange> = Vec::new();
    let mut keep = |start: Duration, end: Duration| {
        let end = end.min(media_duration);
        if start >= end {
            return;
        }
        match ranges.last_mut() {
            Some(previous) if previous.end == start => previous.end = end,
            _ => ranges.push(TrimRange::new(start, end)),
        }
    };

    if first.frame_number > 0 {
        keep(Duration::ZERO, clock.duration_of(first.frame_number));
    }

    for pair in markers.windows(2) {
        if !pair[0].trim_after {
            keep(
                clock.duration_of(pair[0].frame_number),
                clock.duration_of(pair[1].frame_number),
            );
        }
    }

    if let Some(last) = markers.last().filter(|m| !m.trim_after) {
        keep(clock.duration_of(last.frame_number), media_duration);
    }

    tracing::debug!(markers = markers.len(), ?ranges, "resolved trim ranges");
    Ok(ranges)
}

fn validate_markers(markers: &[TrimMarker]) -> Result<()> {
    if let Some(marker) = markers.iter().find(|m| m.frame_number < 0) {
        return Err(Error::configuration(format!(
            "trim marker at negative frame {}",
            marker.frame_number
        )));
    }
    if let Some(pair) = markers
        .windows(2)
        .find(|pair| pair[0].frame_number >= pair[1].frame_number)
    {
        return Err(Error::configuration(format!(
            "trim markers out of order: frame {} followed by frame {}",
            pair[0].frame_number, pair[1].frame_number
        )));
    }
    Ok(())
}

/**
    What to do with a frame at a given position.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrimDecision {
    /// The frame lies in a kept range.
    Keep,
    /// The frame precedes the current kept range.
    Skip,
    /// Every kept range is behind us; nothing more will be kept.
    Exhausted,
}

/**
    Walks kept ranges alongside increasing frame positions.

    The range index only moves forward, so a whole traversal costs one pass
    over the ranges. [`reset`](Self::reset) rewinds it after a seek.
*/
#[derive(Clone, Debug)]
pub struct TrimCursor {
    ranges: Vec<TrimRange>,
    index: usize,
}

impl TrimCursor {
    pub fn new(ranges: Vec<TrimRange>) -> Self {
        Self { ranges, index: 0 }
    }

    /**
        A cursor keeping everything up to `media_duration`.
    */
    pub fn keep_all(media_duration: Duration) -> Self {
        Self::new(vec![TrimRange::new(Duration::ZERO, media_duration)])
    }

    pub fn ranges(&self) -> &[TrimRange] {
        &self.ranges
    }

    pub fn set_ranges(&mut self, ranges: Vec<TrimRange>) {
        self.ranges = ranges;
        self.index = 0;
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn classify(&mut self, position: Duration) -> TrimDecision {
        let Some(last) = self.ranges.len().checked_sub(1) else {
            return TrimDecision::Exhausted;
        };

        while self.index < last && position >= self.ranges[self.index].end {
            self.index += 1;
        }

        let range = self.ranges[self.index];
        if position >= range.end {
            TrimDecision::Exhausted
        } else if position < range.start {
            TrimDecision::Skip
        } else {
            TrimDecision::Keep
        }
    }
}
