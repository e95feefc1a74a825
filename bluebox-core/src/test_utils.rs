//! Test utilities for bluebox core functionality

pub mod key_simulator {
    //! Keypad input simulation for testing

    use crate::types::Key;
    use std::vec::Vec;

    /// Simulated time one debounced key read takes
    pub const READ_MS: u32 = 8;

    /// How long a tap is held
    pub const TAP_MS: u32 = 100;

    /// Gap after each release, long enough for a few reads
    pub const RELEASE_MS: u32 = 50;

    /// Key press timeline as (key, duration in ms) steps
    #[derive(Debug, Clone, Default)]
    pub struct KeyScript {
        steps: Vec<(Option<Key>, u32)>,
    }

    impl KeyScript {
        pub fn new() -> Self {
            Self::default()
        }

        /// Short press followed by a release
        pub fn tap(self, key: Key) -> Self {
            self.hold(key, TAP_MS)
        }

        /// Hold `key` for `ms`, then release
        pub fn hold(mut self, key: Key, ms: u32) -> Self {
            self.steps.push((Some(key), ms));
            self.steps.push((None, RELEASE_MS));
            self
        }

        /// No key for `ms`
        pub fn idle(mut self, ms: u32) -> Self {
            self.steps.push((None, ms));
            self
        }

        /// Tap every key in order, waiting `gap_ms` after each release
        pub fn taps(self, keys: &[Key], gap_ms: u32) -> Self {
            keys.iter()
                .fold(self, |script, key| script.tap(*key).idle(gap_ms))
        }

        pub fn steps(&self) -> &[(Option<Key>, u32)] {
            &self.steps
        }

        /// Number of presses in the script
        pub fn presses(&self) -> usize {
            self.steps.iter().filter(|(key, _)| key.is_some()).count()
        }

        /// Length of the whole timeline
        pub fn duration_ms(&self) -> u32 {
            self.steps.iter().map(|(_, ms)| *ms).sum()
        }
    }
}

pub mod harness {
    //! Bluebox wired to mock peripherals

    use super::key_simulator::{KeyScript, READ_MS};
    use crate::controller::LongPress;
    use crate::fsm::{Bluebox, Press};
    use crate::hal::mock::{MockStorage, RecordingTones, ScriptedKeys, SimClock};
    use crate::hal::HalError;
    use crate::types::BlueboxConfig;

    pub type TestBluebox<'a> = Bluebox<'a, ScriptedKeys<'a>, RecordingTones<'a>, MockStorage>;

    /// Long-press tracker and clock shared by one test's mocks
    #[derive(Default)]
    pub struct SimTime {
        pub press: LongPress,
        pub clock: SimClock,
    }

    impl SimTime {
        pub fn new() -> Self {
            Self::default()
        }
    }

    /// Builder for a [`TestBluebox`]
    ///
    /// Key reads and tone playback both advance the clock and the
    /// long-press countdown, the way the firmware's tick delay does.
    pub struct Harness<'a> {
        sim: &'a SimTime,
        script: KeyScript,
        store: MockStorage,
        config: BlueboxConfig,
    }

    impl<'a> Harness<'a> {
        pub fn new(sim: &'a SimTime) -> Self {
            Self {
                sim,
                script: KeyScript::new(),
                store: MockStorage::new(),
                config: BlueboxConfig::default(),
            }
        }

        pub fn script(mut self, script: KeyScript) -> Self {
            self.script = script;
            self
        }

        /// Start from an existing store image
        pub fn store(mut self, store: MockStorage) -> Self {
            self.store = store;
            self
        }

        pub fn config(mut self, config: BlueboxConfig) -> Self {
            self.config = config;
            self
        }

        pub fn build(self) -> TestBluebox<'a> {
            let mut keys = ScriptedKeys::new(&self.sim.press, &self.sim.clock, READ_MS);
            keys.extend(self.script.steps());
            Bluebox::new(
                keys,
                RecordingTones::shared(&self.sim.press, &self.sim.clock),
                self.store,
                &self.sim.press,
                self.config,
            )
        }
    }

    /// Step until the next handled press or the end of the script
    pub fn next_press(bb: &mut TestBluebox<'_>) -> Result<Option<Press>, HalError> {
        while !bb.keys_mut().is_exhausted() {
            if let Some(press) = bb.step()? {
                return Ok(Some(press));
            }
        }
        Ok(None)
    }

    /// Step until the script is used up; returns the handled presses
    pub fn run_to_end(bb: &mut TestBluebox<'_>) -> Result<std::vec::Vec<Press>, HalError> {
        let mut presses = std::vec::Vec::new();
        while let Some(press) = next_press(bb)? {
            presses.push(press);
        }
        Ok(presses)
    }
}

pub use harness::{next_press, run_to_end, Harness, SimTime, TestBluebox};
pub use key_simulator::KeyScript;
