//! Resistor-ladder keypad decoding
//!
//! Thirteen keys tap a ladder feeding one ADC channel. A reading is
//! accepted only when two conversions separated by the debounce
//! interval agree; it is then classified into a voltage band.

use embedded_hal::delay::DelayNs;

use crate::hal::{AnalogInput, HalError, KeySource};
use crate::types::{ConfigError, Key};

/// Inclusive ADC range produced by one ladder tap
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Band {
    pub low: u8,
    pub high: u8,
    pub key: Key,
}

impl Band {
    pub const fn new(low: u8, high: u8, key: Key) -> Self {
        Self { low, high, key }
    }

    pub const fn contains(&self, value: u8) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Voltage band to key mapping for one physical wiring of the ladder
///
/// Bands are ordered from the top of the range down and must tile
/// `noise_floor..=255` without gaps or overlaps.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeypadLayout {
    /// Readings below this are "no key"
    pub noise_floor: u8,
    pub bands: [Band; 13],
}

/// Band edges of a 14 x 1k ladder read with an 8-bit ADC at Vdd = 5 V
const EDGES: [(u8, u8); 13] = [
    (234, 255),
    (211, 233),
    (192, 210),
    (174, 191),
    (156, 173),
    (138, 155),
    (120, 137),
    (102, 119),
    (83, 101),
    (65, 82),
    (47, 64),
    (28, 46),
    (9, 27),
];

const fn build_layout(keys: [Key; 13]) -> KeypadLayout {
    let mut bands = [Band::new(0, 0, Key::One); 13];
    let mut i = 0;
    while i < 13 {
        bands[i] = Band::new(EDGES[i].0, EDGES[i].1, keys[i]);
        i += 1;
    }
    KeypadLayout {
        noise_floor: EDGES[12].0,
        bands,
    }
}

impl KeypadLayout {
    /// Key 1 at the supply end of the ladder, seize next to ground
    pub const STANDARD: KeypadLayout = build_layout(Key::ALL);

    /// Ladder wired the other way round: seize at the supply end
    pub const REVERSED: KeypadLayout = build_layout([
        Key::Seize,
        Key::Hash,
        Key::Zero,
        Key::Star,
        Key::Nine,
        Key::Eight,
        Key::Seven,
        Key::Six,
        Key::Five,
        Key::Four,
        Key::Three,
        Key::Two,
        Key::One,
    ]);

    /// Map a stable ADC reading to a key
    pub fn classify(&self, value: u8) -> Option<Key> {
        if value < self.noise_floor {
            return None;
        }
        // Anything that slips through every band is treated as no key.
        self.bands
            .iter()
            .find(|band| band.contains(value))
            .map(|band| band.key)
    }

    /// Check that bands are descending, contiguous and cover the range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let first = self.bands[0];
        let last = self.bands[self.bands.len() - 1];
        if first.high != u8::MAX || last.low != self.noise_floor {
            return Err(ConfigError::BadKeypadBands);
        }
        for pair in self.bands.windows(2) {
            let (upper, lower) = (pair[0], pair[1]);
            if upper.low > upper.high || lower.high.checked_add(1) != Some(upper.low) {
                return Err(ConfigError::BadKeypadBands);
            }
        }
        for (i, band) in self.bands.iter().enumerate() {
            if self.bands[i + 1..].iter().any(|other| other.key == band.key) {
                return Err(ConfigError::BadKeypadBands);
            }
        }
        Ok(())
    }
}

impl Default for KeypadLayout {
    fn default() -> Self {
        KeypadLayout::STANDARD
    }
}

/// Debounced key reader over an ADC channel
pub struct KeyDecoder<A, D> {
    adc: A,
    delay: D,
    layout: KeypadLayout,
    debounce_ms: u32,
}

impl<A, D> KeyDecoder<A, D>
where
    A: AnalogInput,
    D: DelayNs,
{
    pub fn new(adc: A, delay: D, layout: KeypadLayout, debounce_ms: u32) -> Self {
        Self {
            adc,
            delay,
            layout,
            debounce_ms,
        }
    }

    pub fn layout(&self) -> &KeypadLayout {
        &self.layout
    }

    pub fn adc(&self) -> &A {
        &self.adc
    }

    /// Release the ADC and delay
    pub fn release(self) -> (A, D) {
        (self.adc, self.delay)
    }
}

impl<A, D> KeySource for KeyDecoder<A, D>
where
    A: AnalogInput,
    D: DelayNs,
{
    fn read_key(&mut self) -> Result<Option<Key>, HalError> {
        loop {
            let first = self.adc.read()?;
            self.delay.delay_ms(self.debounce_ms);
            let second = self.adc.read()?;
            if first != second {
                trace!("bounce {=u8} -> {=u8}", first, second);
                continue;
            }
            return Ok(self.layout.classify(second));
        }
    }
}
