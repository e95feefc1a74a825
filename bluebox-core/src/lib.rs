#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # Bluebox Core
//!
//! Tone signalling core for a single-chip bluebox.
//! A fixed-rate tick drives two-tone sine synthesis and a millisecond
//! time base; on top of that sit the resistor-ladder key decoder, the
//! per-mode tone dispatcher and the long-press / playback state machine.

#[macro_use]
mod macros;

pub mod types;
pub mod hal;
pub mod sine;
pub mod timebase;
pub mod synth;
pub mod keypad;
pub mod dispatch;
pub mod memory;
pub mod controller;
pub mod fsm;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;


pub use types::*;
pub use hal::{AnalogInput, HalError, KeySource, Storage, ToneOutput};
pub use timebase::{TickDelay, TimeBase};
pub use synth::{Synthesizer, TickEngine, ToneGenerator};
pub use keypad::{Band, KeyDecoder, KeypadLayout};
pub use dispatch::{Segment, Sequence};
pub use memory::{Chunk, ChunkError, KeyRing, Settings};
pub use controller::LongPress;
pub use fsm::{Bluebox, Press};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reference configuration: 93.75 kHz tick (24 MHz / 256), standard ladder
pub fn default_config() -> BlueboxConfig {
    BlueboxConfig::default()
}
