/*!
    Decoder configuration types.
*/

/**
    How a decoder spreads work across threads.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ThreadingMode {
    /// Several frames are decoded in parallel (adds latency of a few frames).
    Frame,
    /// Each frame is split into slices decoded in parallel.
    Slice,
    /// No internal parallelism.
    #[default]
    Single,
}

impl ThreadingMode {
    /**
        Pick the best mode a codec supports: frame threads, then slice
        threads, then a single thread.
    */
    pub const fn select(frame_threads: bool, slice_threads: bool) -> Self {
        if frame_threads {
            Self::Frame
        } else if slice_threads {
            Self::Slice
        } else {
            Self::Single
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Frame => "frame",
            Self::Slice => "slice",
            Self::Single => "single",
        }
    }
}

impl std::fmt::Display for ThreadingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/**
    Configuration for video decoding.
*/
#[derive(Clone, Debug, Default)]
pub struct VideoDecoderConfig {
    /// Force a threading mode instead of selecting from codec capabilities.
    pub threading: Option<ThreadingMode>,
    /// Thread count for frame/slice threading (0 = let FFmpeg decide).
    pub thread_count: usize,
}

impl VideoDecoderConfig {
    /**
        Force a threading mode.
    */
    pub fn with_threading(mut self, mode: ThreadingMode) -> Self {
        self.threading = Some(mode);
        self
    }

    /**
        Set the number of decoding threads.
    */
    pub fn with_thread_count(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_threads_are_preferred() {
        assert_eq!(ThreadingMode::select(true, true), ThreadingMode::Frame);
        assert_eq!(ThreadingMode::select(true, false), ThreadingMode::Frame);
    }

    #[test]
    fn falls_back_to_slice_then_single() {
        assert_eq!(ThreadingMode::select(false, true), ThreadingMode::Slice);
        assert_eq!(ThreadingMode::select(false, false), ThreadingMode::Single);
    }

    #[test]
    fn config_builder() {
        let config = VideoDecoderConfig::default()
            .with_threading(ThreadingMode::Slice)
            .with_thread_count(4);
        assert_eq!(config.threading, Some(ThreadingMode::Slice));
        assert_eq!(config.thread_count, 4);
    }
}
