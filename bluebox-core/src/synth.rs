//! Dual-tone synthesizer
//!
//! Two 16-bit phase accumulators (8 integer bits indexing the sine
//! table, 8 fractional bits) advance once per tick. The tick handler
//! sums the two samples into the PWM compare value.
//!
//! Shared state contract: the foreground only writes steps and phases
//! while the generator is stopped, then publishes them by setting the
//! active flag (Release). The tick handler reads the flag (Acquire)
//! before touching anything else, so it never sees a half-written
//! configuration.

use embedded_hal::delay::DelayNs;
use portable_atomic::{AtomicBool, AtomicU16, Ordering};

use crate::hal::ToneOutput;
use crate::sine::{self, PWM_MIDPOINT};
use crate::timebase::TimeBase;

/// Phase units in one table cycle (256 entries x 256 sub-steps)
const PHASE_CYCLE: u64 = 1 << 16;

/// Phase increment per tick for `freq_hz`, rounded to nearest
pub const fn phase_step(freq_hz: u16, tick_hz: u32) -> u16 {
    if tick_hz == 0 {
        return 0;
    }
    let step = (freq_hz as u64 * PHASE_CYCLE + tick_hz as u64 / 2) / tick_hz as u64;
    if step > u16::MAX as u64 {
        u16::MAX
    } else {
        step as u16
    }
}

/// Tone generator state shared between foreground and tick handler
pub struct ToneGenerator {
    tick_hz: u32,
    step_a: AtomicU16,
    step_b: AtomicU16,
    phase_a: AtomicU16,
    phase_b: AtomicU16,
    active: AtomicBool,
}

impl ToneGenerator {
    pub const fn new(tick_hz: u32) -> Self {
        Self {
            tick_hz,
            step_a: AtomicU16::new(0),
            step_b: AtomicU16::new(0),
            phase_a: AtomicU16::new(0),
            phase_b: AtomicU16::new(0),
            active: AtomicBool::new(false),
        }
    }

    /// Load both steps and rewind the accumulators. Call only while stopped.
    ///
    /// `freq_b == 0` reuses `freq_a`, giving a single pure tone.
    pub fn configure(&self, freq_a: u16, freq_b: u16) {
        debug_assert!(!self.is_active(), "reconfigured while playing");
        let step_a = phase_step(freq_a, self.tick_hz);
        let step_b = if freq_b == 0 {
            step_a
        } else {
            phase_step(freq_b, self.tick_hz)
        };
        self.step_a.store(step_a, Ordering::Relaxed);
        self.step_b.store(step_b, Ordering::Relaxed);
        self.phase_a.store(0, Ordering::Relaxed);
        self.phase_b.store(0, Ordering::Relaxed);
    }

    /// Publish the configuration to the tick handler
    pub fn start(&self) {
        self.active.store(true, Ordering::Release);
    }

    pub fn stop(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Tick handler entry: next PWM compare value
    ///
    /// Samples are 7-bit, so the saturating sum never actually clips
    /// with the built-in table.
    #[inline]
    pub fn next_duty(&self) -> u8 {
        if !self.active.load(Ordering::Acquire) {
            return PWM_MIDPOINT;
        }
        let phase_a = self.phase_a.load(Ordering::Relaxed);
        let phase_b = self.phase_b.load(Ordering::Relaxed);
        let duty = sine::sample(phase_a).saturating_add(sine::sample(phase_b));

        self.phase_a.store(
            phase_a.wrapping_add(self.step_a.load(Ordering::Relaxed)),
            Ordering::Relaxed,
        );
        self.phase_b.store(
            phase_b.wrapping_add(self.step_b.load(Ordering::Relaxed)),
            Ordering::Relaxed,
        );
        duty
    }

    /// Current (step_a, step_b)
    pub fn steps(&self) -> (u16, u16) {
        (
            self.step_a.load(Ordering::Relaxed),
            self.step_b.load(Ordering::Relaxed),
        )
    }

    /// Current (phase_a, phase_b)
    pub fn phases(&self) -> (u16, u16) {
        (
            self.phase_a.load(Ordering::Relaxed),
            self.phase_b.load(Ordering::Relaxed),
        )
    }

    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }
}

/// Everything the tick interrupt drives: tone generation and the time base
///
/// Both share one clock, the PWM timer's overflow.
pub struct TickEngine {
    pub tones: ToneGenerator,
    pub timebase: TimeBase,
}

impl TickEngine {
    pub const fn new(tick_hz: u32) -> Self {
        Self {
            tones: ToneGenerator::new(tick_hz),
            timebase: TimeBase::from_tick_hz(tick_hz),
        }
    }

    /// Interrupt body; returns the compare value for the next PWM period
    #[inline]
    pub fn on_tick(&self) -> u8 {
        let duty = self.tones.next_duty();
        self.timebase.tick();
        duty
    }
}

/// Foreground side of the synthesizer: configure, wait, stop
pub struct Synthesizer<'a, D> {
    generator: &'a ToneGenerator,
    delay: D,
}

impl<'a, D: DelayNs> Synthesizer<'a, D> {
    pub fn new(generator: &'a ToneGenerator, delay: D) -> Self {
        Self { generator, delay }
    }

    pub fn generator(&self) -> &ToneGenerator {
        self.generator
    }
}

impl<D: DelayNs> ToneOutput for Synthesizer<'_, D> {
    fn play(&mut self, duration_ms: u16, freq_a: u16, freq_b: u16) {
        if duration_ms == 0 {
            return;
        }
        trace!("play {=u16} ms {=u16}/{=u16} Hz", duration_ms, freq_a, freq_b);
        self.generator.configure(freq_a, freq_b);
        self.generator.start();
        self.delay.delay_ms(duration_ms as u32);
        self.generator.stop();
    }

    fn pause(&mut self, duration_ms: u16) {
        self.delay.delay_ms(duration_ms as u32);
    }
}
