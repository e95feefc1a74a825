//! Hardware Abstraction Layer for the bluebox
//!
//! The core never touches registers. The keypad ADC, the PWM-driven
//! tone output and the persistent store are reached through the traits
//! below; delays use [`embedded_hal::delay::DelayNs`].

use crate::types::{ConfigError, Key};

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Analog conversion failed
    AdcError,
    /// Persistent store read or write failed
    StorageError,
    /// Store access outside the device's capacity
    AddressOutOfRange,
    /// Device configuration rejected at boot
    InvalidConfig,
}

impl From<ConfigError> for HalError {
    fn from(_: ConfigError) -> Self {
        HalError::InvalidConfig
    }
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::AdcError => write!(f, "ADC conversion failed"),
            HalError::StorageError => write!(f, "Storage operation failed"),
            HalError::AddressOutOfRange => write!(f, "Storage address out of range"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// One analog channel fed by the keypad resistor ladder
pub trait AnalogInput {
    /// Run one conversion and return the 8-bit result
    fn read(&mut self) -> Result<u8, HalError>;
}

/// Source of debounced key identities
pub trait KeySource {
    /// Block until a stable reading is available; `None` means no key
    fn read_key(&mut self) -> Result<Option<Key>, HalError>;
}

/// Audible output: dual-tone playback and timed silence
///
/// Both calls block for the full duration.
pub trait ToneOutput {
    /// Play `freq_a` + `freq_b` for `duration_ms`; `freq_b == 0` plays `freq_a` alone
    fn play(&mut self, duration_ms: u16, freq_a: u16, freq_b: u16);

    /// Stay silent for `duration_ms`
    fn pause(&mut self, duration_ms: u16);
}

/// Byte-addressed persistent store (EEPROM or emulated in flash)
pub trait Storage {
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), HalError>;

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), HalError>;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use crate::controller::LongPress;
    use crate::dispatch::Segment;
    use crate::memory::STORE_LEN;
    use embedded_hal::delay::DelayNs;
    use std::vec::Vec;

    /// ADC returning a scripted list of readings, repeating the last one
    #[derive(Default)]
    pub struct MockAdc {
        readings: Vec<u8>,
        position: usize,
        conversions: usize,
    }

    impl MockAdc {
        pub fn new(readings: &[u8]) -> Self {
            Self {
                readings: readings.to_vec(),
                position: 0,
                conversions: 0,
            }
        }

        /// Constant input level
        pub fn steady(level: u8) -> Self {
            Self::new(&[level])
        }

        pub fn conversions(&self) -> usize {
            self.conversions
        }
    }

    impl AnalogInput for MockAdc {
        fn read(&mut self) -> Result<u8, HalError> {
            self.conversions += 1;
            let value = self
                .readings
                .get(self.position)
                .or(self.readings.last())
                .copied()
                .ok_or(HalError::AdcError)?;
            if self.position < self.readings.len() {
                self.position += 1;
            }
            Ok(value)
        }
    }

    /// Simulated wall clock shared by the mocks of one test
    #[derive(Default)]
    pub struct SimClock {
        now_ms: core::cell::Cell<u32>,
    }

    impl SimClock {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn now_ms(&self) -> u32 {
            self.now_ms.get()
        }

        pub fn advance(&self, ms: u32) {
            self.now_ms.set(self.now_ms.get() + ms);
        }
    }

    /// Delay that returns immediately but accounts the elapsed milliseconds
    /// and feeds them to a long-press tracker and a clock
    #[derive(Default)]
    pub struct SimDelay<'a> {
        press: Option<&'a LongPress>,
        clock: Option<&'a SimClock>,
        elapsed_ms: u32,
    }

    impl<'a> SimDelay<'a> {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_press(press: &'a LongPress) -> Self {
            Self {
                press: Some(press),
                ..Self::default()
            }
        }

        pub fn shared(press: &'a LongPress, clock: &'a SimClock) -> Self {
            Self {
                press: Some(press),
                clock: Some(clock),
                elapsed_ms: 0,
            }
        }

        pub fn elapsed_ms(&self) -> u32 {
            self.elapsed_ms
        }
    }

    impl DelayNs for SimDelay<'_> {
        fn delay_ns(&mut self, ns: u32) {
            self.delay_ms(ns.div_ceil(1_000_000));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.elapsed_ms += ms;
            if let Some(clock) = self.clock {
                clock.advance(ms);
            }
            if let Some(press) = self.press {
                for _ in 0..ms {
                    press.tick();
                }
            }
        }
    }

    /// Key source replaying a timeline of (key, held for ms) steps
    ///
    /// Each read takes `ms_per_read` of simulated time and reports the key
    /// down at the clock's current time. Past the end of the timeline no
    /// key is down.
    pub struct ScriptedKeys<'a> {
        steps: Vec<(Option<Key>, u32)>,
        clock: &'a SimClock,
        delay: SimDelay<'a>,
        ms_per_read: u32,
        reads: usize,
    }

    impl<'a> ScriptedKeys<'a> {
        pub fn new(press: &'a LongPress, clock: &'a SimClock, ms_per_read: u32) -> Self {
            Self {
                steps: Vec::new(),
                clock,
                delay: SimDelay::shared(press, clock),
                ms_per_read,
                reads: 0,
            }
        }

        /// Append steps to the timeline
        pub fn extend(&mut self, steps: &[(Option<Key>, u32)]) {
            self.steps.extend_from_slice(steps);
        }

        pub fn total_ms(&self) -> u32 {
            self.steps.iter().map(|(_, ms)| *ms).sum()
        }

        pub fn is_exhausted(&self) -> bool {
            self.clock.now_ms() >= self.total_ms()
        }

        pub fn reads(&self) -> usize {
            self.reads
        }

        fn key_at(&self, time_ms: u32) -> Option<Key> {
            let mut start = 0;
            for (key, ms) in &self.steps {
                if time_ms < start + ms {
                    return *key;
                }
                start += ms;
            }
            None
        }
    }

    impl KeySource for ScriptedKeys<'_> {
        fn read_key(&mut self) -> Result<Option<Key>, HalError> {
            self.delay.delay_ms(self.ms_per_read.max(1));
            self.reads += 1;
            Ok(self.key_at(self.clock.now_ms()))
        }
    }

    /// Tone output recording every segment it is asked to produce
    pub struct RecordingTones<'a> {
        log: Vec<Segment>,
        delay: SimDelay<'a>,
    }

    impl<'a> RecordingTones<'a> {
        pub fn new() -> Self {
            Self {
                log: Vec::new(),
                delay: SimDelay::new(),
            }
        }

        /// Playback time counts towards the long-press countdown
        pub fn with_press(press: &'a LongPress) -> Self {
            Self {
                log: Vec::new(),
                delay: SimDelay::with_press(press),
            }
        }

        /// Playback time also advances `clock`
        pub fn shared(press: &'a LongPress, clock: &'a SimClock) -> Self {
            Self {
                log: Vec::new(),
                delay: SimDelay::shared(press, clock),
            }
        }

        pub fn segments(&self) -> &[Segment] {
            &self.log
        }

        /// Only the audible segments, gaps dropped
        pub fn tones(&self) -> Vec<Segment> {
            self.log
                .iter()
                .copied()
                .filter(|segment| matches!(segment, Segment::Tone { .. }))
                .collect()
        }

        pub fn total_ms(&self) -> u32 {
            self.log.iter().map(|segment| segment.duration_ms() as u32).sum()
        }

        pub fn clear(&mut self) {
            self.log.clear();
        }
    }

    impl Default for RecordingTones<'_> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ToneOutput for RecordingTones<'_> {
        fn play(&mut self, duration_ms: u16, freq_a: u16, freq_b: u16) {
            self.log.push(Segment::Tone {
                ms: duration_ms,
                freq_a,
                freq_b,
            });
            self.delay.delay_ms(duration_ms as u32);
        }

        fn pause(&mut self, duration_ms: u16) {
            self.log.push(Segment::Gap(duration_ms));
            self.delay.delay_ms(duration_ms as u32);
        }
    }

    /// RAM store initialised to the erased state (all 0xFF)
    pub struct MockStorage {
        bytes: [u8; STORE_LEN],
        writes: usize,
        fail: bool,
    }

    impl MockStorage {
        pub fn new() -> Self {
            Self {
                bytes: [0xFF; STORE_LEN],
                writes: 0,
                fail: false,
            }
        }

        /// Raw contents, as a persistent store dump
        pub fn bytes(&self) -> &[u8] {
            &self.bytes
        }

        /// Overwrite raw contents without counting a write
        pub fn poke(&mut self, address: usize, data: &[u8]) {
            self.bytes[address..address + data.len()].copy_from_slice(data);
        }

        pub fn writes(&self) -> usize {
            self.writes
        }

        /// Make every subsequent access fail
        pub fn set_failing(&mut self, fail: bool) {
            self.fail = fail;
        }

        fn range(&self, address: u16, len: usize) -> Result<core::ops::Range<usize>, HalError> {
            if self.fail {
                return Err(HalError::StorageError);
            }
            let start = address as usize;
            let end = start + len;
            if end > self.bytes.len() {
                return Err(HalError::AddressOutOfRange);
            }
            Ok(start..end)
        }
    }

    impl Default for MockStorage {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Storage for MockStorage {
        fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), HalError> {
            let range = self.range(address, buf.len())?;
            buf.copy_from_slice(&self.bytes[range]);
            Ok(())
        }

        fn write(&mut self, address: u16, data: &[u8]) -> Result<(), HalError> {
            let range = self.range(address, data.len())?;
            self.bytes[range].copy_from_slice(data);
            self.writes += 1;
            Ok(())
        }
    }
}
