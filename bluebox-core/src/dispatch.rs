//! Tone-mode dispatch tables
//!
//! Each (key, mode) pair expands into a short list of tone and gap
//! segments. Building the list is pure; [`play`] hands it to a
//! [`ToneOutput`]. Keys a mode does not define expand to nothing.

use heapless::Vec;

use crate::hal::ToneOutput;
use crate::types::{BlueboxConfig, Key, ToneLength, ToneMode};

/// One step of a tone sequence
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Segment {
    /// Two tones mixed for `ms` milliseconds
    Tone { ms: u16, freq_a: u16, freq_b: u16 },
    /// Silence
    Gap(u16),
}

impl Segment {
    pub const fn tone(ms: u16, freq_a: u16, freq_b: u16) -> Self {
        Segment::Tone { ms, freq_a, freq_b }
    }

    /// Single frequency tone
    pub const fn pure(ms: u16, freq: u16) -> Self {
        Segment::Tone {
            ms,
            freq_a: freq,
            freq_b: freq,
        }
    }

    pub const fn duration_ms(&self) -> u16 {
        match self {
            Segment::Tone { ms, .. } => *ms,
            Segment::Gap(ms) => *ms,
        }
    }
}

/// Longest expansion: pulse-dialled 0 is ten pulses plus ten gaps
pub const MAX_SEGMENTS: usize = 24;

pub type Sequence = Vec<Segment, MAX_SEGMENTS>;

/// Supervisory tone
pub const SEIZE_HZ: u16 = 2600;

/// MF pairs for keys 1-9, KP, 0, ST (indexed by key code - 1)
const MF_PAIRS: [(u16, u16); 12] = [
    (700, 900),
    (700, 1100),
    (900, 1100),
    (700, 1300),
    (900, 1300),
    (1100, 1300),
    (700, 1500),
    (900, 1500),
    (1100, 1500),
    (1100, 1700),
    (1300, 1500),
    (1500, 1700),
];

const DTMF_ROWS: [u16; 4] = [697, 770, 852, 941];
const DTMF_COLUMNS: [u16; 3] = [1209, 1336, 1477];

/// US coin tone pair
const COIN_US: (u16, u16) = (1700, 2200);
/// UK coin tone
const COIN_UK_HZ: u16 = 1000;

/// MF "8" used as an alternative wink
const MF_WINK: (u16, u16) = (900, 1500);

const COIN_COLLECT: (u16, u16) = (700, 1100);
const COIN_RETURN: (u16, u16) = (1100, 1700);
const RINGBACK: (u16, u16) = (700, 1700);
const OPERATOR_ATTACHED: (u16, u16) = (1300, 1500);
const OPERATOR_RELEASED: (u16, u16) = (900, 1300);

/// Fixed acknowledgment and error patterns
pub mod signal {
    use super::Segment;

    /// Mode or length picked at power-up
    pub const BOOT_ACK: &[Segment] = &[Segment::pure(1000, 1700)];

    /// Long press accepted: memory stored, startup default saved
    pub const CONFIRM: &[Segment] = &[
        Segment::pure(100, 1700),
        Segment::Gap(50),
        Segment::pure(100, 1700),
    ];

    /// Ascending pair: playback mode on
    pub const PLAYBACK_ON: &[Segment] = &[
        Segment::pure(150, 1300),
        Segment::Gap(50),
        Segment::pure(150, 1700),
    ];

    /// Descending pair: playback mode off
    pub const PLAYBACK_OFF: &[Segment] = &[
        Segment::pure(150, 1700),
        Segment::Gap(50),
        Segment::pure(150, 1300),
    ];

    /// Playback requested from an unwritten slot
    pub const EMPTY_SLOT: &[Segment] = &[
        Segment::pure(150, 500),
        Segment::Gap(100),
        Segment::pure(150, 500),
    ];

    /// Stored settings were corrupt and have been reset
    pub const CONFIG_ERROR: &[Segment] = &[
        Segment::pure(100, 400),
        Segment::Gap(100),
        Segment::pure(100, 400),
        Segment::Gap(100),
        Segment::pure(100, 400),
    ];
}

/// Expand a key press into its tone segments
///
/// `playback` adds the post-seize pause used when replaying memories.
pub fn segments(
    key: Key,
    mode: ToneMode,
    length: ToneLength,
    config: &BlueboxConfig,
    playback: bool,
) -> Sequence {
    let mut seq = Sequence::new();

    // The seize key sounds the same in every mode
    if key == Key::Seize {
        seq.push(Segment::pure(config.seize_ms, SEIZE_HZ)).ok();
        if playback {
            seq.push(Segment::Gap(config.seize_pause_ms)).ok();
        }
        return seq;
    }

    match mode {
        ToneMode::Mf => mf(&mut seq, key, length, config),
        ToneMode::Dtmf => dtmf(&mut seq, key, length),
        ToneMode::Redbox => redbox(&mut seq, key),
        ToneMode::Greenbox => greenbox(&mut seq, key, config),
        ToneMode::Pulse => pulse(&mut seq, key, config),
    }
    seq
}

fn mf(seq: &mut Sequence, key: Key, length: ToneLength, config: &BlueboxConfig) {
    let (a, b) = MF_PAIRS[key.code() as usize - 1];
    let ms = if key == Key::Star {
        config.kp_ms
    } else {
        length.as_millis()
    };
    seq.push(Segment::tone(ms, a, b)).ok();
}

fn dtmf(seq: &mut Sequence, key: Key, length: ToneLength) {
    let index = key.code() as usize - 1;
    let (row, column) = (index / 3, index % 3);
    seq.push(Segment::tone(
        length.as_millis(),
        DTMF_ROWS[row],
        DTMF_COLUMNS[column],
    ))
    .ok();
}

fn coin_pulses(seq: &mut Sequence, count: usize, ms: u16) {
    for i in 0..count {
        if i > 0 {
            seq.push(Segment::Gap(ms)).ok();
        }
        seq.push(Segment::tone(ms, COIN_US.0, COIN_US.1)).ok();
    }
}

fn redbox(seq: &mut Sequence, key: Key) {
    match key {
        // Nickel
        Key::One => coin_pulses(seq, 1, 66),
        // Dime
        Key::Two => coin_pulses(seq, 2, 66),
        // Quarter
        Key::Three => coin_pulses(seq, 5, 33),
        // UK 10 pence
        Key::Four => {
            seq.push(Segment::pure(200, COIN_UK_HZ)).ok();
        }
        // UK 50 pence
        Key::Five => {
            seq.push(Segment::pure(350, COIN_UK_HZ)).ok();
        }
        _ => {}
    }
}

fn greenbox(seq: &mut Sequence, key: Key, config: &BlueboxConfig) {
    let seize_wink = Segment::pure(config.wink_ms, SEIZE_HZ);
    let mf_wink = Segment::tone(config.wink_ms, MF_WINK.0, MF_WINK.1);

    let (wink, gap, signal) = match key {
        Key::One => (seize_wink, config.wink_gap_ms, COIN_COLLECT),
        Key::Two => (seize_wink, config.wink_gap_ms, COIN_RETURN),
        Key::Three => (seize_wink, config.ringback_gap_ms, RINGBACK),
        Key::Four => (mf_wink, config.wink_gap_ms, COIN_COLLECT),
        Key::Five => (mf_wink, config.wink_gap_ms, COIN_RETURN),
        Key::Six => (mf_wink, config.ringback_gap_ms, RINGBACK),
        Key::Seven => (seize_wink, config.wink_gap_ms, OPERATOR_ATTACHED),
        Key::Eight => (seize_wink, config.wink_gap_ms, OPERATOR_RELEASED),
        _ => return,
    };
    seq.push(wink).ok();
    seq.push(Segment::Gap(gap)).ok();
    seq.push(Segment::tone(config.signal_ms, signal.0, signal.1)).ok();
}

fn pulse(seq: &mut Sequence, key: Key, config: &BlueboxConfig) {
    let Some(count) = key.pulses() else {
        return;
    };
    for _ in 0..count {
        seq.push(Segment::pure(config.pulse_on_ms, SEIZE_HZ)).ok();
        seq.push(Segment::Gap(config.pulse_off_ms)).ok();
    }
}

/// Play a segment list in order
pub fn play<T: ToneOutput>(out: &mut T, segments: &[Segment]) {
    for segment in segments {
        match *segment {
            Segment::Tone { ms, freq_a, freq_b } => out.play(ms, freq_a, freq_b),
            Segment::Gap(ms) => out.pause(ms),
        }
    }
}

/// Expand and play one key press; returns the number of segments played
pub fn dispatch<T: ToneOutput>(
    out: &mut T,
    key: Key,
    mode: ToneMode,
    length: ToneLength,
    config: &BlueboxConfig,
    playback: bool,
) -> usize {
    let seq = segments(key, mode, length, config, playback);
    play(out, &seq);
    seq.len()
}
