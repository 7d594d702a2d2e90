use crate::video::palette::{Color, Palette};
use crate::video::{SCREEN_HEIGHT, SCREEN_WIDTH};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type FrameCallback = Arc<dyn Fn() + Send + Sync>;

/// A full 160x144 screen of packed pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Vec<Color>,
}

impl Frame {
    pub fn new() -> Frame {
        Frame {
            pixels: vec![Palette::White.into(); SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        self.pixels[y * SCREEN_WIDTH + x] = color;
    }

    pub fn line(&self, y: usize) -> &[Color] {
        &self.pixels[y * SCREEN_WIDTH..(y + 1) * SCREEN_WIDTH]
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }
}

impl Default for Frame {
    fn default() -> Frame {
        Frame::new()
    }
}

/// Front buffer shared with presentation. The display controller only ever
/// swaps a finished back buffer in, so a reader never sees a partial frame.
#[derive(Clone, Default)]
pub struct FrameHandoff {
    front: Arc<Mutex<Frame>>,
    callback: Arc<Mutex<Option<FrameCallback>>>,
    frames: Arc<AtomicU64>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FrameHandoff {
    pub fn new() -> FrameHandoff {
        FrameHandoff::default()
    }

    /// Swaps `back` with the front buffer and notifies the listener. The
    /// listener runs unlocked and may replace itself.
    pub fn present(&self, back: &mut Frame) {
        std::mem::swap(&mut *relock(&self.front), back);
        self.frames.fetch_add(1, Ordering::Release);

        let callback = relock(&self.callback).clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Copy of the most recently completed frame.
    pub fn latest(&self) -> Frame {
        relock(&self.front).clone()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub fn set_callback(&self, callback: FrameCallback) {
        *relock(&self.callback) = Some(callback);
    }
}
