//! End-to-end device scenarios

use bluebox_core::dispatch::Segment;
use bluebox_core::hal::mock::{MockAdc, MockStorage, SimDelay};
use bluebox_core::synth::phase_step;
use bluebox_core::test_utils::{next_press, run_to_end, Harness, KeyScript, SimTime};
use bluebox_core::{
    Bluebox, Key, KeyDecoder, KeypadLayout, LongPress, Press, Synthesizer, ToneGenerator,
    ToneLength, ToneMode,
};
use proptest::prelude::*;

const TICK_HZ: u32 = 93_750;

fn store_with(mode: ToneMode, length: ToneLength) -> MockStorage {
    let mut store = MockStorage::new();
    store.poke(0, &[mode.as_byte(), length.as_byte()]);
    store
}

#[test]
fn test_full_stack_key_to_generator() {
    // Real decoder and synthesizer over mocked ADC, delay and store
    let press = LongPress::new();
    let gen = ToneGenerator::new(TICK_HZ);
    let adc = MockAdc::new(&[165, 165, 165, 165, 0]);
    let keys = KeyDecoder::new(adc, SimDelay::with_press(&press), KeypadLayout::STANDARD, 8);
    let tones = Synthesizer::new(&gen, SimDelay::with_press(&press));
    let mut bb = Bluebox::new(keys, tones, MockStorage::new(), &press, Default::default());

    assert_eq!(bb.step(), Ok(Some(Press { key: Key::Five, long: false })));
    assert_eq!(gen.steps(), (phase_step(900, TICK_HZ), phase_step(1300, TICK_HZ)));
    assert!(!gen.is_active());
    assert_eq!(bb.ring().len(), 1);
    assert_eq!(bb.step(), Ok(None));
}

#[test]
fn test_reversed_keypad_wiring() {
    let press = LongPress::new();
    let gen = ToneGenerator::new(TICK_HZ);
    let config = bluebox_core::default_config().with_layout(KeypadLayout::REVERSED);
    // Top of the ladder is the seize key on this wiring
    let adc = MockAdc::new(&[246, 246, 0]);
    let keys = KeyDecoder::new(adc, SimDelay::with_press(&press), config.layout, config.debounce_ms);
    let tones = Synthesizer::new(&gen, SimDelay::with_press(&press));
    let mut bb = Bluebox::new(keys, tones, MockStorage::new(), &press, config);

    assert_eq!(bb.step(), Ok(Some(Press { key: Key::Seize, long: false })));
    assert_eq!(gen.steps(), (phase_step(2600, TICK_HZ), phase_step(2600, TICK_HZ)));
}

#[test]
fn test_greenbox_session_from_boot() {
    let sim = SimTime::new();
    let script = KeyScript::new()
        .hold(Key::Four, 2000)
        .idle(200)
        .tap(Key::Three)
        .idle(1200)
        .tap(Key::Seven);
    let mut bb = Harness::new(&sim)
        .store(store_with(ToneMode::Mf, ToneLength::Fast))
        .script(script)
        .build();
    bb.boot().unwrap();
    assert_eq!(bb.mode(), ToneMode::Greenbox);
    bb.tones_mut().clear();

    let presses = run_to_end(&mut bb).unwrap();
    assert_eq!(presses.len(), 2);
    assert_eq!(
        bb.tones().segments(),
        &[
            Segment::pure(90, 2600),
            Segment::Gap(6),
            Segment::tone(900, 700, 1700),
            Segment::pure(90, 2600),
            Segment::Gap(60),
            Segment::tone(900, 1300, 1500),
        ]
    );
}

#[test]
fn test_memories_survive_a_reboot() {
    let sim = SimTime::new();
    let script = KeyScript::new()
        .idle(50)
        .taps(&[Key::Star, Key::Four, Key::Hash], 100)
        .hold(Key::Six, 2500);
    let mut bb = Harness::new(&sim)
        .store(store_with(ToneMode::Mf, ToneLength::Slow))
        .script(script)
        .build();
    bb.boot().unwrap();
    run_to_end(&mut bb).unwrap();
    let image = bb.store().bytes().to_vec();

    // Power cycle onto the same store image, straight into playback
    let sim = SimTime::new();
    let mut store = MockStorage::new();
    store.poke(0, &image);
    let script = KeyScript::new()
        .idle(50)
        .hold(Key::Seize, 2500)
        .idle(500)
        .tap(Key::Six);
    let mut bb = Harness::new(&sim).store(store).script(script).build();
    bb.boot().unwrap();
    assert_eq!(bb.tone_length(), ToneLength::Slow);
    next_press(&mut bb).unwrap();
    bb.tones_mut().clear();
    next_press(&mut bb).unwrap();

    assert_eq!(
        bb.tones().segments(),
        &[
            Segment::tone(120, 1100, 1700),
            Segment::tone(120, 700, 1300),
            Segment::tone(120, 1500, 1700),
        ]
    );
}

fn any_mode() -> impl Strategy<Value = ToneMode> {
    (1u8..=5).prop_map(|byte| ToneMode::from_byte(byte).unwrap())
}

fn recordable_key() -> impl Strategy<Value = Key> {
    // Seize is excluded: replay adds its extra pause
    (1u8..=12).prop_map(|code| Key::from_code(code).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_replay_matches_live_dispatch(
        mode in any_mode(),
        keys in prop::collection::vec(recordable_key(), 1..12),
    ) {
        let sim = SimTime::new();
        let script = KeyScript::new()
            .idle(50)
            .taps(&keys, 1200)
            .hold(Key::One, 3500)
            .idle(200)
            .hold(Key::Seize, 2500)
            .idle(500)
            .tap(Key::One);
        let mut bb = Harness::new(&sim)
            .store(store_with(mode, ToneLength::Fast))
            .script(script)
            .build();
        bb.boot().unwrap();

        for _ in 0..keys.len() {
            next_press(&mut bb).unwrap();
        }
        let live = bb.tones().segments().to_vec();

        let stored = next_press(&mut bb).unwrap();
        prop_assert_eq!(stored.map(|press| press.long), Some(true));
        next_press(&mut bb).unwrap();
        prop_assert!(bb.is_playback());
        bb.tones_mut().clear();

        next_press(&mut bb).unwrap();
        prop_assert_eq!(bb.tones().segments(), live.as_slice());
    }
}
