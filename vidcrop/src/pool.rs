/*!
    Reusable scratch frames for format conversion.
*/

use std::collections::HashMap;

use ffmpeg_types::{PixelFormat, VideoFrame};

/// Pool key: pixel format and geometry.
type FrameKey = (PixelFormat, u32, u32);

/**
    Allocation counters of a [`FramePool`].
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocations: u64,
    pub reuses: u64,
}

/**
    Idle frames keyed by format and size.

    A frame is moved out on [`acquire`](FramePool::acquire) and must be
    handed back with [`release`](FramePool::release) to be reused.
*/
#[derive(Debug, Default)]
pub struct FramePool {
    idle: HashMap<FrameKey, Vec<VideoFrame>>,
    stats: PoolStats,
}

impl FramePool {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Take an idle frame with this layout, or allocate a zeroed one.

        Reused frames keep their previous pixels and timestamps.
    */
    pub fn acquire(&mut self, format: PixelFormat, width: u32, height: u32) -> VideoFrame {
        if let Some(frame) = self
            .idle
            .get_mut(&(format, width, height))
            .and_then(Vec::pop)
        {
            self.stats.reuses += 1;
            return frame;
        }

        self.stats.allocations += 1;
        tracing::trace!(?format, width, height, "allocating pooled frame");
        VideoFrame::blank(format, width, height)
    }

    pub fn release(&mut self, frame: VideoFrame) {
        self.idle
            .entry((frame.format, frame.width, frame.height))
            .or_default()
            .push(frame);
    }

    pub fn idle_count(&self) -> usize {
        self.idle.values().map(Vec::len).sum()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /**
        Free every idle frame.
    */
    pub fn clear(&mut self) {
        self.idle.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_reuses_the_buffer() {
        let mut pool = FramePool::new();
        let frame = pool.acquire(PixelFormat::Rgba, 8, 8);
        let pointer = frame.data.as_ptr();
        pool.release(frame);

        let again = pool.acquire(PixelFormat::Rgba, 8, 8);
        assert_eq!(again.data.as_ptr(), pointer);
        assert_eq!(pool.stats(), PoolStats { allocations: 1, reuses: 1 });
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn different_key_allocates() {
        let mut pool = FramePool::new();
        let frame = pool.acquire(PixelFormat::Rgba, 8, 8);
        pool.release(frame);

        let other = pool.acquire(PixelFormat::Rgba, 16, 8);
        assert_eq!((other.width, other.height), (16, 8));
        assert_eq!(other.data.len(), PixelFormat::Rgba.frame_size(16, 8));
        assert_eq!(pool.stats().allocations, 2);
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn clear_frees_idle_frames() {
        let mut pool = FramePool::new();
        let a = pool.acquire(PixelFormat::Yuv420p, 4, 4);
        let b = pool.acquire(PixelFormat::Yuv420p, 4, 4);
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.idle_count(), 2);

        pool.clear();
        assert_eq!(pool.idle_count(), 0);
    }
}
