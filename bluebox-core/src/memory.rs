//! Keystroke memories and persisted settings
//!
//! Store layout (byte addresses):
//!
//! | offset | size     | contents                          |
//! |--------|----------|-----------------------------------|
//! | 0      | 1        | startup tone mode                 |
//! | 1      | 1        | startup tone length (ms)          |
//! | 2      | 12 x 41  | memory chunks, slot = key code - 1 |
//!
//! A chunk is a mode byte followed by up to 40 key codes; unused bytes
//! hold the [`SENTINEL`]. An erased store reads 0xFF throughout, so a
//! never-written chunk decodes as [`Chunk::Empty`].

use heapless::{Deque, Vec};

use crate::hal::{HalError, Storage};
use crate::types::{Key, ToneLength, ToneMode};

pub const CONFIG_MODE_ADDR: u16 = 0;
pub const CONFIG_LENGTH_ADDR: u16 = 1;
pub const CHUNK_BASE: u16 = 2;
pub const CHUNK_SIZE: usize = 41;
pub const SLOT_COUNT: usize = 12;
/// Keys per chunk, also the ring capacity
pub const MAX_KEYS: usize = CHUNK_SIZE - 1;
/// Unused-byte marker, the erased value of EEPROM and flash
pub const SENTINEL: u8 = 0xFF;
/// Bytes of persistent store used
pub const STORE_LEN: usize = CHUNK_BASE as usize + SLOT_COUNT * CHUNK_SIZE;

/// Store address of a memory slot
pub const fn chunk_addr(slot: usize) -> u16 {
    CHUNK_BASE + (slot * CHUNK_SIZE) as u16
}

/// Chunk decoding errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChunkError {
    /// Leading byte is neither a mode nor the sentinel
    InvalidMode(u8),
}

/// Bounded queue of keys typed in normal mode
///
/// Only the foreground touches it, so no atomics. When full, the oldest
/// key is dropped to make room.
#[derive(Clone, Debug, Default)]
pub struct KeyRing {
    keys: Deque<Key, MAX_KEYS>,
}

impl KeyRing {
    pub const fn new() -> Self {
        Self { keys: Deque::new() }
    }

    pub fn push(&mut self, key: Key) {
        if self.keys.is_full() {
            self.keys.pop_front();
        }
        // Cannot fail, room was made above
        let _ = self.keys.push_back(key);
    }

    /// Remove and return every queued key, oldest first
    pub fn drain(&mut self) -> Vec<Key, MAX_KEYS> {
        let mut out = Vec::new();
        while let Some(key) = self.keys.pop_front() {
            let _ = out.push(key);
        }
        out
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }
}

/// One persisted memory slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Chunk {
    /// Never written
    Empty,
    /// Recorded keys and the mode they were typed in
    Sequence {
        mode: ToneMode,
        keys: Vec<Key, MAX_KEYS>,
    },
}

impl Chunk {
    pub fn encode(&self) -> [u8; CHUNK_SIZE] {
        let mut bytes = [SENTINEL; CHUNK_SIZE];
        if let Chunk::Sequence { mode, keys } = self {
            bytes[0] = mode.as_byte();
            for (byte, key) in bytes[1..].iter_mut().zip(keys.iter()) {
                *byte = key.code();
            }
        }
        bytes
    }

    /// Decode a raw chunk; keys end at the first byte that is not a key code
    pub fn decode(bytes: &[u8; CHUNK_SIZE]) -> Result<Chunk, ChunkError> {
        if bytes[0] == SENTINEL {
            return Ok(Chunk::Empty);
        }
        let mode = ToneMode::from_byte(bytes[0]).ok_or(ChunkError::InvalidMode(bytes[0]))?;
        let mut keys = Vec::new();
        for key in bytes[1..].iter().map_while(|byte| Key::from_code(*byte)) {
            let _ = keys.push(key);
        }
        Ok(Chunk::Sequence { mode, keys })
    }

    /// Read the chunk stored for `slot`
    pub fn load<S: Storage>(store: &mut S, slot: usize) -> Result<Result<Chunk, ChunkError>, HalError> {
        if slot >= SLOT_COUNT {
            return Err(HalError::AddressOutOfRange);
        }
        let mut bytes = [SENTINEL; CHUNK_SIZE];
        store.read(chunk_addr(slot), &mut bytes)?;
        Ok(Chunk::decode(&bytes))
    }

    /// Write this chunk to `slot`, sentinel-filling the tail
    pub fn save<S: Storage>(&self, store: &mut S, slot: usize) -> Result<(), HalError> {
        if slot >= SLOT_COUNT {
            return Err(HalError::AddressOutOfRange);
        }
        store.write(chunk_addr(slot), &self.encode())
    }
}

/// Power-on defaults kept in the two configuration bytes
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub mode: ToneMode,
    pub length: ToneLength,
}

impl Settings {
    /// Decode the configuration bytes, substituting defaults for bad ones
    ///
    /// The flag is true when anything was substituted.
    pub fn decode(bytes: [u8; 2]) -> (Settings, bool) {
        let mode = ToneMode::from_byte(bytes[0]);
        let length = ToneLength::from_byte(bytes[1]);
        let repaired = mode.is_none() || length.is_none();
        (
            Settings {
                mode: mode.unwrap_or_default(),
                length: length.unwrap_or_default(),
            },
            repaired,
        )
    }

    pub fn encode(&self) -> [u8; 2] {
        [self.mode.as_byte(), self.length.as_byte()]
    }

    /// Read the settings, rewriting the store if they had to be repaired
    pub fn load<S: Storage>(store: &mut S) -> Result<(Settings, bool), HalError> {
        let mut bytes = [0u8; 2];
        store.read(CONFIG_MODE_ADDR, &mut bytes)?;
        let (settings, repaired) = Settings::decode(bytes);
        if repaired {
            warn!("settings {=u8} {=u8} invalid, reset", bytes[0], bytes[1]);
            settings.save(store)?;
        }
        Ok((settings, repaired))
    }

    pub fn save<S: Storage>(&self, store: &mut S) -> Result<(), HalError> {
        store.write(CONFIG_MODE_ADDR, &self.encode())
    }
}
