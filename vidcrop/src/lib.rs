/*!
    Frame-accurate trimming, animated cropping and re-encoding of video.

    The library decodes one input, drops the trimmed-out parts of its
    timeline, cuts every kept frame with a crop rectangle that moves between
    keyframes, scales it to the output size and re-encodes it. A preview
    reader gives random access to converted frames for scrubbing.

    # Pipeline

    - [`FrameProducer`] - Decodes and trims into a sequence ending with [`InputFrame::EndOfStream`]
    - [`EncodePipeline`] - Crops, scales, renumbers and encodes frames
    - [`Transcoder`] - Runs a whole file through both, with progress reporting
    - [`PreviewReader`] - Steps and seeks through converted frames

    # Timeline

    - [`FrameClock`] - Frame index and time conversions
    - [`TrimMarker`] and [`resolve_trim_ranges`] - Markers to kept ranges
    - [`CropKeyframe`] and [`CropInterpolator`] - Animated crop rectangles

    The stages are generic over [`VideoInput`], [`CropFilter`],
    [`FrameEncoder`], [`PacketWriter`] and [`FrameConverter`]; the
    FFmpeg-backed implementations live in [`backend`].
*/

pub mod backend;
mod codec;
mod crop;
mod error;
mod job;
pub mod logging;
mod pipeline;
mod pool;
mod preview;
mod producer;
mod seek;
mod still;
mod timing;
mod transcode;
mod trim;

#[cfg(test)]
mod testing;

pub use backend::FfmpegInput;
pub use codec::OutputCodec;
pub use crop::{CropInterpolator, CropKeyframe, CropRect};
pub use error::{Error, Result};
pub use job::TranscodeJob;
pub use pipeline::{
    CropFilter, EncodePipeline, FrameEncoder, PacketWriter, PipelineState, PipelineStats,
};
pub use pool::{FramePool, PoolStats};
pub use preview::{FrameConverter, PreviewConfig, PreviewReader, fit_within};
pub use producer::{FrameProducer, InputFrame, VideoInput};
pub use still::save_still;
pub use timing::FrameClock;
pub use transcode::{
    DEFAULT_CRF, DEFAULT_TITLE, OutputSettings, Progress, TranscodeSummary, Transcoder,
    transcode_frames,
};
pub use trim::{TrimCursor, TrimDecision, TrimMarker, TrimRange, resolve_trim_ranges};
