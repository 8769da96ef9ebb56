/*!
    Shared types for the ffmpeg crate ecosystem.

    This crate defines the vocabulary of the ecosystem, the types that cross crate
    boundaries. It has no dependency on FFmpeg, making it lightweight and enabling
    consumers to depend on it without pulling in FFmpeg bindings.

    # Core Types

    - [`Rational`] - Rational numbers for time bases and frame rates
    - [`Pts`] and [`MediaDuration`] - Timestamps in time_base units
    - [`VideoFrame`] - Decoded frame data with tightly packed planes
    - [`Packet`] - Encoded packet data

    # Format Types

    - [`PixelFormat`] and [`Plane`] - Video pixel formats and their memory layout
    - [`CodecId`] - Codec identifiers

    # Stream Information

    - [`VideoStreamInfo`] - Video stream metadata
    - [`MediaInfo`] - Combined media information

    # Error Handling

    - [`Error`] and [`Result`] - Common error types
*/

mod codec;
mod error;
mod format;
mod frame;
mod packet;
mod rational;
mod stream;
mod timestamp;

pub use codec::CodecId;
pub use error::{Error, Result};
pub use format::{PixelFormat, Plane};
pub use frame::VideoFrame;
pub use packet::Packet;
pub use rational::Rational;
pub use stream::{MediaInfo, VideoStreamInfo};
pub use timestamp::{MediaDuration, Pts};
