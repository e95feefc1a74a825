//! Core data types for the bluebox

use crate::keypad::KeypadLayout;

/// Keypad keys, numbered by their store byte value
#[derive(Copy, Clone, PartialEq, Eq, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Key {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Star = 10,
    Zero = 11,
    Hash = 12,
    /// Dedicated 2600 Hz key
    Seize = 13,
}

impl Key {
    /// All keys in code order
    pub const ALL: [Key; 13] = [
        Key::One,
        Key::Two,
        Key::Three,
        Key::Four,
        Key::Five,
        Key::Six,
        Key::Seven,
        Key::Eight,
        Key::Nine,
        Key::Star,
        Key::Zero,
        Key::Hash,
        Key::Seize,
    ];

    /// Decode a stored key byte
    pub const fn from_code(code: u8) -> Option<Key> {
        match code {
            1..=13 => Some(Key::ALL[code as usize - 1]),
            _ => None,
        }
    }

    /// Byte written to memory chunks
    pub const fn code(&self) -> u8 {
        *self as u8
    }

    /// Memory slot addressed by this key; the seize key has none
    pub const fn slot(&self) -> Option<usize> {
        match self {
            Key::Seize => None,
            _ => Some(self.code() as usize - 1),
        }
    }

    /// Number of dial pulses for digit keys (0 dials ten)
    pub const fn pulses(&self) -> Option<u8> {
        match self {
            Key::Zero => Some(10),
            Key::Star | Key::Hash | Key::Seize => None,
            _ => Some(self.code()),
        }
    }
}

/// Signalling protocol selected for the session
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ToneMode {
    /// Inter-office multi-frequency
    Mf = 1,
    /// Touch-tone
    Dtmf = 2,
    /// Coin deposit tones (redbox)
    Redbox = 3,
    /// Operator signalling tones (greenbox)
    Greenbox = 4,
    /// 2600 Hz rotary-dial pulse trains
    Pulse = 5,
}

impl ToneMode {
    /// Decode a stored mode byte
    pub const fn from_byte(byte: u8) -> Option<ToneMode> {
        match byte {
            1 => Some(ToneMode::Mf),
            2 => Some(ToneMode::Dtmf),
            3 => Some(ToneMode::Redbox),
            4 => Some(ToneMode::Greenbox),
            5 => Some(ToneMode::Pulse),
            _ => None,
        }
    }

    /// Mode chosen by holding key 1-5
    pub const fn from_key(key: Key) -> Option<ToneMode> {
        ToneMode::from_byte(key.code())
    }

    pub const fn as_byte(&self) -> u8 {
        *self as u8
    }
}

impl Default for ToneMode {
    fn default() -> Self {
        ToneMode::Mf
    }
}

/// Digit tone duration for MF and DTMF
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ToneLength {
    /// 75 ms
    Fast,
    /// 120 ms
    Slow,
}

impl ToneLength {
    pub const FAST_MS: u16 = 75;
    pub const SLOW_MS: u16 = 120;

    /// Decode a stored length byte (its millisecond value)
    pub const fn from_byte(byte: u8) -> Option<ToneLength> {
        match byte as u16 {
            Self::FAST_MS => Some(ToneLength::Fast),
            Self::SLOW_MS => Some(ToneLength::Slow),
            _ => None,
        }
    }

    pub const fn as_byte(&self) -> u8 {
        self.as_millis() as u8
    }

    pub const fn as_millis(&self) -> u16 {
        match self {
            ToneLength::Fast => Self::FAST_MS,
            ToneLength::Slow => Self::SLOW_MS,
        }
    }

    pub const fn toggled(&self) -> ToneLength {
        match self {
            ToneLength::Fast => ToneLength::Slow,
            ToneLength::Slow => ToneLength::Fast,
        }
    }
}

impl Default for ToneLength {
    fn default() -> Self {
        ToneLength::Fast
    }
}

/// Press tracking states of the device state machine
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressState {
    /// No key held
    Idle,
    /// Key held, long-press countdown running
    HeldShortWindow,
    /// Countdown expired while the key was still held
    LongPressFired,
}

/// Configuration errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Tick too slow to derive a millisecond
    TickTooSlow,
    /// Debounce interval above 100 ms
    DebounceTooLong,
    /// Long-press threshold of zero
    LongPressDisabled,
    /// Keypad bands overlap, leave gaps or are out of order
    BadKeypadBands,
}

/// Device configuration: tick rate, timing constants and keypad wiring
#[derive(Copy, Clone, Debug)]
pub struct BlueboxConfig {
    /// Tick (PWM overflow) frequency in Hz
    pub tick_hz: u32,
    /// Pause between the two ADC conversions of one sample
    pub debounce_ms: u32,
    /// Hold time before a long press fires
    pub long_press_ms: u16,
    /// MF KP tone
    pub kp_ms: u16,
    /// 2600 Hz seize tone
    pub seize_ms: u16,
    /// Extra pause after seize during memory playback
    pub seize_pause_ms: u16,
    pub pulse_on_ms: u16,
    pub pulse_off_ms: u16,
    /// Greenbox wink tone
    pub wink_ms: u16,
    /// Gap after the wink for collect/return/operator signals
    pub wink_gap_ms: u16,
    /// Gap after the wink for ringback
    pub ringback_gap_ms: u16,
    /// Greenbox signal tone
    pub signal_ms: u16,
    /// Voltage band to key mapping
    pub layout: KeypadLayout,
}

impl Default for BlueboxConfig {
    fn default() -> Self {
        Self {
            tick_hz: 93_750,
            debounce_ms: 8,
            long_press_ms: 2000,
            kp_ms: 120,
            seize_ms: 1000,
            seize_pause_ms: 1500,
            pulse_on_ms: 66,
            pulse_off_ms: 34,
            wink_ms: 90,
            wink_gap_ms: 60,
            ringback_gap_ms: 6,
            signal_ms: 900,
            layout: KeypadLayout::STANDARD,
        }
    }
}

impl BlueboxConfig {
    /// Reference timing with a different tick frequency
    pub fn with_tick_hz(tick_hz: u32) -> Result<Self, ConfigError> {
        let config = Self {
            tick_hz,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the keypad layout
    pub fn with_layout(mut self, layout: KeypadLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz < 1000 {
            return Err(ConfigError::TickTooSlow);
        }
        if self.debounce_ms > 100 {
            return Err(ConfigError::DebounceTooLong);
        }
        if self.long_press_ms == 0 {
            return Err(ConfigError::LongPressDisabled);
        }
        self.layout.validate()
    }

    /// Ticks per millisecond, the time base reload value
    pub fn ticks_per_ms(&self) -> u16 {
        (self.tick_hz / 1000).clamp(1, u16::MAX as u32) as u16
    }
}
