//! Key decoder behaviour over the full ADC range

use bluebox_core::hal::mock::MockAdc;
use bluebox_core::{HalError, Key, KeyDecoder, KeySource, KeypadLayout};
use embedded_hal_mock::eh1::delay::NoopDelay;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case(255, Some(Key::One))]
#[case(234, Some(Key::One))]
#[case(233, Some(Key::Two))]
#[case(156, Some(Key::Five))]
#[case(82, Some(Key::Star))]
#[case(47, Some(Key::Zero))]
#[case(46, Some(Key::Hash))]
#[case(9, Some(Key::Seize))]
#[case(8, None)]
#[case(0, None)]
fn test_band_edges(#[case] reading: u8, #[case] expected: Option<Key>) {
    let mut decoder = KeyDecoder::new(MockAdc::steady(reading), NoopDelay::new(), KeypadLayout::STANDARD, 8);
    assert_eq!(decoder.read_key(), Ok(expected));
}

#[rstest]
fn test_layouts_map_every_key_once(#[values(KeypadLayout::STANDARD, KeypadLayout::REVERSED)] layout: KeypadLayout) {
    let mut seen = std::collections::HashSet::new();
    for value in 0..=255u8 {
        if let Some(key) = layout.classify(value) {
            seen.insert(key);
        }
    }
    assert_eq!(seen.len(), 13);
}

proptest! {
    #[test]
    fn prop_stable_reading_matches_classification(reading in any::<u8>()) {
        let mut decoder = KeyDecoder::new(MockAdc::steady(reading), NoopDelay::new(), KeypadLayout::STANDARD, 8);
        prop_assert_eq!(decoder.read_key(), Ok(KeypadLayout::STANDARD.classify(reading)));
        prop_assert_eq!(decoder.adc().conversions(), 2);
    }

    #[test]
    fn prop_decoding_is_idempotent(reading in any::<u8>()) {
        let mut decoder = KeyDecoder::new(MockAdc::steady(reading), NoopDelay::new(), KeypadLayout::STANDARD, 8);
        let first = decoder.read_key();
        prop_assert_eq!(decoder.read_key(), first);
    }

    #[test]
    fn prop_bounce_settles_on_final_level(noise in prop::collection::vec(any::<u8>(), 1..6), level in any::<u8>()) {
        // Strictly alternating noise never yields two equal consecutive pairs
        let mut readings = Vec::new();
        for value in &noise {
            readings.push(*value);
            readings.push(value.wrapping_add(1));
        }
        readings.push(level);
        readings.push(level);
        let mut decoder = KeyDecoder::new(MockAdc::new(&readings), NoopDelay::new(), KeypadLayout::STANDARD, 8);
        prop_assert_eq!(decoder.read_key(), Ok(KeypadLayout::STANDARD.classify(level)));
        prop_assert_eq!(decoder.adc().conversions(), readings.len());
    }
}

#[test]
fn test_empty_adc_reports_error() {
    let mut decoder = KeyDecoder::new(MockAdc::new(&[]), NoopDelay::new(), KeypadLayout::STANDARD, 8);
    assert_eq!(decoder.read_key(), Err(HalError::AdcError));
}
