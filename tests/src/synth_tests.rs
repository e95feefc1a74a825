//! Tone generator output and tick-driven timing

use bluebox_core::hal::mock::SimDelay;
use bluebox_core::sine::{self, PWM_MIDPOINT, SAMPLE_MAX};
use bluebox_core::synth::phase_step;
use bluebox_core::{LongPress, Synthesizer, TickDelay, TickEngine, ToneGenerator, ToneOutput};
use embedded_hal::delay::DelayNs;
use rstest::rstest;
use std::sync::atomic::{AtomicBool, Ordering};

const TICK_HZ: u32 = 93_750;

#[rstest]
#[case(400)]
#[case(697)]
#[case(1700)]
#[case(2600)]
fn test_frequency_accuracy(#[case] freq: u16) {
    // One second of ticks should wrap the accumulator `freq` times, give or
    // take the rounding of the step
    let step = phase_step(freq, TICK_HZ) as u64;
    let cycles = step * TICK_HZ as u64 / 65_536;
    assert!((cycles as i64 - freq as i64).abs() <= 1, "{} Hz gave {}", freq, cycles);
}

#[test]
fn test_same_frequency_pair_doubles_amplitude() {
    let gen = ToneGenerator::new(TICK_HZ);
    gen.configure(1700, 1700);
    gen.start();
    let mut peak = 0;
    for _ in 0..TICK_HZ / 100 {
        let duty = gen.next_duty();
        assert_eq!(duty % 2, 0);
        peak = peak.max(duty);
    }
    assert!(peak > SAMPLE_MAX + SAMPLE_MAX / 2);
}

#[test]
fn test_zero_second_frequency_matches_pure_tone() {
    let pure = ToneGenerator::new(TICK_HZ);
    let doubled = ToneGenerator::new(TICK_HZ);
    pure.configure(2600, 0);
    doubled.configure(2600, 2600);
    pure.start();
    doubled.start();
    for _ in 0..1000 {
        assert_eq!(pure.next_duty(), doubled.next_duty());
    }
}

#[test]
fn test_dual_tone_stays_in_pwm_range() {
    let gen = ToneGenerator::new(TICK_HZ);
    gen.configure(1100, 1700);
    gen.start();
    for _ in 0..TICK_HZ / 10 {
        assert!(gen.next_duty() <= 2 * SAMPLE_MAX);
    }
}

#[test]
fn test_engine_is_silent_between_tones() {
    let engine = TickEngine::new(TICK_HZ);
    let mut synth = Synthesizer::new(&engine.tones, SimDelay::new());
    synth.play(75, 900, 1300);
    for _ in 0..500 {
        assert_eq!(engine.on_tick(), PWM_MIDPOINT);
    }
}

#[test]
fn test_first_samples_follow_the_table() {
    let gen = ToneGenerator::new(TICK_HZ);
    gen.configure(1000, 1500);
    gen.start();
    let (step_a, step_b) = gen.steps();
    let (mut phase_a, mut phase_b) = (0u16, 0u16);
    for _ in 0..300 {
        let expected = sine::sample(phase_a) + sine::sample(phase_b);
        assert_eq!(gen.next_duty(), expected);
        phase_a = phase_a.wrapping_add(step_a);
        phase_b = phase_b.wrapping_add(step_b);
    }
}

#[test]
fn test_tick_delay_runs_on_interrupt_ticks() {
    // A thread stands in for the timer interrupt
    let engine = TickEngine::new(TICK_HZ);
    let press = LongPress::new();
    press.arm(3);
    let done = AtomicBool::new(false);

    std::thread::scope(|s| {
        s.spawn(|| {
            while !done.load(Ordering::Acquire) {
                engine.on_tick();
            }
        });
        let mut delay = TickDelay::new(&engine.timebase).with_press(&press);
        delay.delay_ms(4);
        done.store(true, Ordering::Release);
    });

    assert!(engine.timebase.uptime_ms() >= 4);
    assert!(press.take_fired());
}
