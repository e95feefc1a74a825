//! Keystroke state machine: boot protocol, long press, memory playback

use crate::controller::LongPress;
use crate::dispatch::{self, signal};
use crate::hal::{HalError, KeySource, Storage, ToneOutput};
use crate::memory::{Chunk, ChunkError, KeyRing, Settings};
use crate::types::{BlueboxConfig, Key, PressState, ToneLength, ToneMode};

/// Outcome of one handled key press
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Press {
    pub key: Key,
    /// The long-press countdown expired while the key was held
    pub long: bool,
}

/// Main bluebox state machine
///
/// Owns the key source, the tone output and the store. Every wait happens
/// inside those collaborators' blocking delays, which also advance the
/// shared [`LongPress`] countdown.
pub struct Bluebox<'a, K, T, S> {
    keys: K,
    tones: T,
    store: S,
    press: &'a LongPress,
    config: BlueboxConfig,
    mode: ToneMode,
    length: ToneLength,
    playback: bool,
    ring: KeyRing,
    state: PressState,
}

impl<'a, K, T, S> Bluebox<'a, K, T, S>
where
    K: KeySource,
    T: ToneOutput,
    S: Storage,
{
    pub fn new(keys: K, tones: T, store: S, press: &'a LongPress, config: BlueboxConfig) -> Self {
        Self {
            keys,
            tones,
            store,
            press,
            config,
            mode: ToneMode::default(),
            length: ToneLength::default(),
            playback: false,
            ring: KeyRing::new(),
            state: PressState::Idle,
        }
    }

    /// Power-on sequence
    ///
    /// Rejects an invalid [`BlueboxConfig`] with [`HalError::InvalidConfig`].
    /// Loads the stored defaults (repairing them if corrupt), then looks
    /// at the key held while powering up:
    /// - 1..5 selects that tone mode for this session
    /// - hash toggles the tone length for this session
    /// - seize enters the "set startup default" flow
    pub fn boot(&mut self) -> Result<(), HalError> {
        if let Err(err) = self.config.validate() {
            warn!("config rejected: {}", err);
            return Err(err.into());
        }

        let (settings, repaired) = Settings::load(&mut self.store)?;
        self.mode = settings.mode;
        self.length = settings.length;
        if repaired {
            dispatch::play(&mut self.tones, signal::CONFIG_ERROR);
        }

        let Some(key) = self.keys.read_key()? else {
            info!("boot: mode {} length {}", self.mode, self.length);
            return Ok(());
        };

        match key {
            Key::Hash => {
                self.length = self.length.toggled();
                dispatch::play(&mut self.tones, signal::BOOT_ACK);
            }
            Key::Seize => {
                dispatch::play(&mut self.tones, signal::BOOT_ACK);
                self.wait_release(key)?;
                return self.set_defaults(settings);
            }
            _ => match ToneMode::from_key(key) {
                Some(mode) => {
                    self.mode = mode;
                    dispatch::play(&mut self.tones, signal::BOOT_ACK);
                }
                None => debug!("boot key {} ignored", key),
            },
        }
        info!("boot: mode {} length {}", self.mode, self.length);
        self.wait_release(key)
    }

    /// Persist a new startup mode or tone length from the next key press
    fn set_defaults(&mut self, mut settings: Settings) -> Result<(), HalError> {
        let key = loop {
            if let Some(key) = self.keys.read_key()? {
                break key;
            }
        };

        let changed = match (key, ToneMode::from_key(key)) {
            (_, Some(mode)) => {
                settings.mode = mode;
                self.mode = mode;
                true
            }
            (Key::Hash, None) => {
                settings.length = settings.length.toggled();
                self.length = settings.length;
                true
            }
            _ => false,
        };

        if changed {
            settings.save(&mut self.store)?;
            info!("startup default: mode {} length {}", settings.mode, settings.length);
            dispatch::play(&mut self.tones, signal::CONFIRM);
        }
        self.wait_release(key)
    }

    /// Handle one key press from key-down to release
    ///
    /// Returns `None` when no key was down.
    pub fn step(&mut self) -> Result<Option<Press>, HalError> {
        let Some(key) = self.keys.read_key()? else {
            return Ok(None);
        };
        debug!("key {}", key);

        self.state = PressState::HeldShortWindow;
        self.press.arm(self.config.long_press_ms);

        // The short-press action happens at key-down; a live seize in
        // playback gets its trailing pause after release
        if self.playback && key != Key::Seize {
            self.play_memory(key)?;
        } else {
            dispatch::dispatch(&mut self.tones, key, self.mode, self.length, &self.config, false);
        }

        let result = self.hold(key);
        self.press.disarm();
        let long = self.state == PressState::LongPressFired;
        self.state = PressState::Idle;
        result?;

        if !long {
            if self.playback && key == Key::Seize {
                self.tones.pause(self.config.seize_pause_ms);
            } else if !self.playback {
                self.ring.push(key);
            }
        }
        Ok(Some(Press { key, long }))
    }

    /// Poll until `key` is released, running the long-press action once
    fn hold(&mut self, key: Key) -> Result<(), HalError> {
        while self.keys.read_key()? == Some(key) {
            if self.state == PressState::HeldShortWindow && self.press.take_fired() {
                self.state = PressState::LongPressFired;
                self.long_press(key)?;
            }
        }
        Ok(())
    }

    fn long_press(&mut self, key: Key) -> Result<(), HalError> {
        match (key, key.slot()) {
            (Key::Seize, _) => {
                self.playback = !self.playback;
                self.ring.clear();
                info!("playback {}", self.playback);
                let ack = if self.playback {
                    signal::PLAYBACK_ON
                } else {
                    signal::PLAYBACK_OFF
                };
                dispatch::play(&mut self.tones, ack);
            }
            (_, Some(slot)) if !self.playback => {
                let chunk = Chunk::Sequence {
                    mode: self.mode,
                    keys: self.ring.drain(),
                };
                chunk.save(&mut self.store, slot)?;
                info!("stored slot {=usize}", slot);
                dispatch::play(&mut self.tones, signal::CONFIRM);
            }
            _ => {}
        }
        Ok(())
    }

    /// Replay the memory stored under `key`
    fn play_memory(&mut self, key: Key) -> Result<(), HalError> {
        let Some(slot) = key.slot() else {
            return Ok(());
        };
        match Chunk::load(&mut self.store, slot)? {
            Ok(Chunk::Empty) => {
                debug!("slot {=usize} empty", slot);
                dispatch::play(&mut self.tones, signal::EMPTY_SLOT);
            }
            Ok(Chunk::Sequence { mode, keys }) => {
                // Replay in the recorded mode, then fall back to the session's
                let session_mode = core::mem::replace(&mut self.mode, mode);
                for stored in keys.iter() {
                    dispatch::dispatch(&mut self.tones, *stored, self.mode, self.length, &self.config, true);
                }
                self.mode = session_mode;
            }
            Err(ChunkError::InvalidMode(byte)) => {
                warn!("slot {=usize} has invalid mode {=u8}", slot, byte);
            }
        }
        Ok(())
    }

    fn wait_release(&mut self, key: Key) -> Result<(), HalError> {
        while self.keys.read_key()? == Some(key) {}
        Ok(())
    }

    pub fn mode(&self) -> ToneMode {
        self.mode
    }

    pub fn tone_length(&self) -> ToneLength {
        self.length
    }

    pub fn is_playback(&self) -> bool {
        self.playback
    }

    pub fn ring(&self) -> &KeyRing {
        &self.ring
    }

    pub fn state(&self) -> PressState {
        self.state
    }

    pub fn config(&self) -> &BlueboxConfig {
        &self.config
    }

    pub fn tones(&self) -> &T {
        &self.tones
    }

    pub fn tones_mut(&mut self) -> &mut T {
        &mut self.tones
    }

    pub fn keys_mut(&mut self) -> &mut K {
        &mut self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
