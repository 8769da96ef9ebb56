/*!
    Encoded packet type.
*/

use crate::{MediaDuration, Pts, Rational};

/**
    An encoded video packet.

    Packets are opaque to everything except the codec that produced them.
    Timestamps are interpreted in `time_base`.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    /// Encoded bitstream payload.
    pub data: Vec<u8>,
    /// Presentation timestamp.
    pub pts: Option<Pts>,
    /// Decode timestamp.
    pub dts: Option<Pts>,
    /// Packet duration in time base units.
    pub duration: MediaDuration,
    /// Time base of the timestamps.
    pub time_base: Rational,
    /// Whether the packet starts a keyframe.
    pub is_keyframe: bool,
}

impl Packet {
    /**
        Create a new packet.
    */
    pub fn new(
        data: Vec<u8>,
        pts: Option<Pts>,
        dts: Option<Pts>,
        duration: MediaDuration,
        time_base: Rational,
        is_keyframe: bool,
    ) -> Self {
        Self {
            data,
            pts,
            dts,
            duration,
            time_base,
            is_keyframe,
        }
    }

    /**
        Returns the payload size in bytes.
    */
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /**
        Returns true if the packet carries no payload.
    */
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

static_assertions::assert_impl_all!(Packet: Send, Sync);
