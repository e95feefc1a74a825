//! Millisecond time base and the blocking delay built on it
//!
//! The tick interrupt calls [`TimeBase::tick`]; every `ticks_per_ms`
//! ticks it raises a one-shot flag. [`TickDelay`] is the only way the
//! foreground waits: it spins, consuming one flag per millisecond.

use embedded_hal::delay::DelayNs;
use portable_atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

use crate::controller::LongPress;

/// Tick-driven millisecond counter
///
/// Written by the tick handler, read by the foreground.
pub struct TimeBase {
    reload: u16,
    countdown: AtomicU16,
    ms_flag: AtomicBool,
    uptime_ms: AtomicU32,
}

impl TimeBase {
    /// Time base reloading every `ticks_per_ms` ticks
    pub const fn new(ticks_per_ms: u16) -> Self {
        let reload = if ticks_per_ms == 0 { 1 } else { ticks_per_ms };
        Self {
            reload,
            countdown: AtomicU16::new(reload),
            ms_flag: AtomicBool::new(false),
            uptime_ms: AtomicU32::new(0),
        }
    }

    /// Time base for a tick frequency in Hz
    pub const fn from_tick_hz(tick_hz: u32) -> Self {
        let per_ms = tick_hz / 1000;
        let per_ms = if per_ms > u16::MAX as u32 { u16::MAX } else { per_ms as u16 };
        Self::new(per_ms)
    }

    /// Tick handler entry; never blocks
    #[inline]
    pub fn tick(&self) {
        let remaining = self.countdown.load(Ordering::Relaxed);
        if remaining <= 1 {
            self.countdown.store(self.reload, Ordering::Relaxed);
            self.uptime_ms
                .store(self.uptime_ms.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
            self.ms_flag.store(true, Ordering::Release);
        } else {
            self.countdown.store(remaining - 1, Ordering::Relaxed);
        }
    }

    /// Consume the millisecond flag if it is raised
    #[inline]
    pub fn take_millisecond(&self) -> bool {
        self.ms_flag.swap(false, Ordering::Acquire)
    }

    /// Milliseconds since reset (wraps after ~49 days)
    pub fn uptime_ms(&self) -> u32 {
        self.uptime_ms.load(Ordering::Relaxed)
    }

    pub fn ticks_per_ms(&self) -> u16 {
        self.reload
    }
}

/// Busy-wait delay counting time base milliseconds
///
/// Each elapsed millisecond also advances the long-press countdown when
/// one is attached, so key-hold time keeps running while tones play.
#[derive(Copy, Clone)]
pub struct TickDelay<'a> {
    timebase: &'a TimeBase,
    press: Option<&'a LongPress>,
}

impl<'a> TickDelay<'a> {
    pub fn new(timebase: &'a TimeBase) -> Self {
        Self {
            timebase,
            press: None,
        }
    }

    /// Feed the long-press tracker once per elapsed millisecond
    pub fn with_press(mut self, press: &'a LongPress) -> Self {
        self.press = Some(press);
        self
    }

    fn wait_ms(&self, mut ms: u32) {
        while ms > 0 {
            if self.timebase.take_millisecond() {
                ms -= 1;
                if let Some(press) = self.press {
                    press.tick();
                }
            } else {
                core::hint::spin_loop();
            }
        }
    }
}

impl DelayNs for TickDelay<'_> {
    // Resolution is one millisecond; shorter waits round up.
    fn delay_ns(&mut self, ns: u32) {
        self.wait_ms(ns.div_ceil(1_000_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.wait_ms(us.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait_ms(ms);
    }
}
