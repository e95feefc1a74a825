//! Dispatch table coverage across all tone modes

use bluebox_core::dispatch::{segments, Segment};
use bluebox_core::{BlueboxConfig, Key, ToneLength, ToneMode};
use rstest::rstest;

fn expand(key: Key, mode: ToneMode) -> Vec<Segment> {
    segments(key, mode, ToneLength::Fast, &BlueboxConfig::default(), false).to_vec()
}

#[rstest]
#[case(Key::One, 700, 900)]
#[case(Key::Two, 700, 1100)]
#[case(Key::Three, 900, 1100)]
#[case(Key::Four, 700, 1300)]
#[case(Key::Five, 900, 1300)]
#[case(Key::Six, 1100, 1300)]
#[case(Key::Seven, 700, 1500)]
#[case(Key::Eight, 900, 1500)]
#[case(Key::Nine, 1100, 1500)]
#[case(Key::Zero, 1300, 1500)]
#[case(Key::Hash, 1500, 1700)]
fn test_mf_pairs(#[case] key: Key, #[case] freq_a: u16, #[case] freq_b: u16) {
    assert_eq!(expand(key, ToneMode::Mf), vec![Segment::tone(75, freq_a, freq_b)]);
}

#[rstest]
#[case(Key::One, 697, 1209)]
#[case(Key::Two, 697, 1336)]
#[case(Key::Three, 697, 1477)]
#[case(Key::Four, 770, 1209)]
#[case(Key::Five, 770, 1336)]
#[case(Key::Six, 770, 1477)]
#[case(Key::Seven, 852, 1209)]
#[case(Key::Eight, 852, 1336)]
#[case(Key::Nine, 852, 1477)]
#[case(Key::Star, 941, 1209)]
#[case(Key::Zero, 941, 1336)]
#[case(Key::Hash, 941, 1477)]
fn test_dtmf_pairs(#[case] key: Key, #[case] row: u16, #[case] column: u16) {
    assert_eq!(expand(key, ToneMode::Dtmf), vec![Segment::tone(75, row, column)]);
}

#[rstest]
#[case(ToneLength::Fast, 75)]
#[case(ToneLength::Slow, 120)]
fn test_digit_length_follows_setting(#[case] length: ToneLength, #[case] ms: u16) {
    let config = BlueboxConfig::default();
    for mode in [ToneMode::Mf, ToneMode::Dtmf] {
        let seq = segments(Key::Eight, mode, length, &config, false);
        assert_eq!(seq[0].duration_ms(), ms);
    }
    // KP is fixed
    let kp = segments(Key::Star, ToneMode::Mf, length, &config, false);
    assert_eq!(kp[0].duration_ms(), 120);
}

#[rstest]
#[case(Key::One, 1, 66)]
#[case(Key::Two, 3, 198)]
#[case(Key::Three, 9, 297)]
#[case(Key::Four, 1, 200)]
#[case(Key::Five, 1, 350)]
fn test_redbox_coins(#[case] key: Key, #[case] count: usize, #[case] total_ms: u32) {
    let seq = expand(key, ToneMode::Redbox);
    assert_eq!(seq.len(), count);
    assert_eq!(seq.iter().map(|s| s.duration_ms() as u32).sum::<u32>(), total_ms);
}

#[rstest]
#[case(Key::One, Segment::pure(90, 2600), 60, (700, 1100))]
#[case(Key::Two, Segment::pure(90, 2600), 60, (1100, 1700))]
#[case(Key::Three, Segment::pure(90, 2600), 6, (700, 1700))]
#[case(Key::Four, Segment::tone(90, 900, 1500), 60, (700, 1100))]
#[case(Key::Five, Segment::tone(90, 900, 1500), 60, (1100, 1700))]
#[case(Key::Six, Segment::tone(90, 900, 1500), 6, (700, 1700))]
#[case(Key::Seven, Segment::pure(90, 2600), 60, (1300, 1500))]
#[case(Key::Eight, Segment::pure(90, 2600), 60, (900, 1300))]
fn test_greenbox_wink_then_signal(
    #[case] key: Key,
    #[case] wink: Segment,
    #[case] gap: u16,
    #[case] signal: (u16, u16),
) {
    assert_eq!(
        expand(key, ToneMode::Greenbox),
        vec![wink, Segment::Gap(gap), Segment::tone(900, signal.0, signal.1)]
    );
}

#[rstest]
#[case(Key::One, 1)]
#[case(Key::Five, 5)]
#[case(Key::Nine, 9)]
#[case(Key::Zero, 10)]
fn test_pulse_counts(#[case] key: Key, #[case] pulses: usize) {
    let seq = expand(key, ToneMode::Pulse);
    assert_eq!(seq.len(), pulses * 2);
    assert_eq!(seq.iter().map(|s| s.duration_ms() as u32).sum::<u32>(), pulses as u32 * 100);
}

#[rstest]
fn test_unmapped_keys_are_silent(
    #[values(ToneMode::Redbox, ToneMode::Greenbox, ToneMode::Pulse)] mode: ToneMode,
    #[values(Key::Star, Key::Hash)] key: Key,
) {
    assert!(expand(key, mode).is_empty());
}

#[rstest]
fn test_seize_is_mode_independent(
    #[values(ToneMode::Mf, ToneMode::Dtmf, ToneMode::Redbox, ToneMode::Greenbox, ToneMode::Pulse)]
    mode: ToneMode,
    #[values(false, true)] playback: bool,
) {
    let seq = segments(Key::Seize, mode, ToneLength::Slow, &BlueboxConfig::default(), playback);
    assert_eq!(seq[0], Segment::pure(1000, 2600));
    assert_eq!(seq.len(), if playback { 2 } else { 1 });
}

#[test]
fn test_custom_timing_is_honoured() {
    let config = BlueboxConfig {
        pulse_on_ms: 60,
        pulse_off_ms: 40,
        ..BlueboxConfig::default()
    };
    let seq = segments(Key::Two, ToneMode::Pulse, ToneLength::Fast, &config, false);
    assert_eq!(
        seq.as_slice(),
        &[Segment::pure(60, 2600), Segment::Gap(40), Segment::pure(60, 2600), Segment::Gap(40)]
    );
}
