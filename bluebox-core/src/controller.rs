//! Long-press tracking

use portable_atomic::{AtomicBool, AtomicU16, Ordering};

/// Atomic long-press countdown
///
/// Armed by the foreground when a key goes down, ticked once per elapsed
/// millisecond from inside the blocking delay, so time spent playing
/// tones counts towards the hold. Safe for use in interrupt contexts.
pub struct LongPress {
    remaining: AtomicU16,
    armed: AtomicBool,
    fired: AtomicBool,
}

impl LongPress {
    pub const fn new() -> Self {
        Self {
            remaining: AtomicU16::new(0),
            armed: AtomicBool::new(false),
            fired: AtomicBool::new(false),
        }
    }

    /// Start a countdown of `threshold_ms`, discarding any earlier one
    pub fn arm(&self, threshold_ms: u16) {
        self.armed.store(false, Ordering::Release);
        self.fired.store(false, Ordering::Relaxed);
        self.remaining.store(threshold_ms, Ordering::Relaxed);
        self.armed.store(true, Ordering::Release);
    }

    /// Stop counting; a pending fired flag is dropped too
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
        self.fired.store(false, Ordering::Relaxed);
    }

    /// One millisecond elapsed
    #[inline]
    pub fn tick(&self) {
        if !self.armed.load(Ordering::Acquire) {
            return;
        }
        let remaining = self.remaining.load(Ordering::Relaxed);
        if remaining <= 1 {
            self.remaining.store(0, Ordering::Relaxed);
            self.armed.store(false, Ordering::Relaxed);
            self.fired.store(true, Ordering::Release);
        } else {
            self.remaining.store(remaining - 1, Ordering::Relaxed);
        }
    }

    /// Consume the fired flag; true at most once per countdown
    pub fn take_fired(&self) -> bool {
        self.fired.swap(false, Ordering::Acquire)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    pub fn remaining_ms(&self) -> u16 {
        self.remaining.load(Ordering::Relaxed)
    }
}

impl Default for LongPress {
    fn default() -> Self {
        Self::new()
    }
}
