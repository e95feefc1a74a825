//! Sine wave lookup table for tone synthesis
//!
//! 256 entries covering one full cycle, 7-bit unsigned samples so that
//! the sum of two samples still fits an 8-bit PWM compare register.

/// Number of entries in the sine table
pub const TABLE_LEN: usize = 256;

/// Largest sample value
pub const SAMPLE_MAX: u8 = 126;

/// Sample value at 0° and 180°
pub const SAMPLE_MIDPOINT: u8 = 63;

/// PWM compare value while no tone plays (0 V after DC decoupling)
pub const PWM_MIDPOINT: u8 = 0x7F;

/// Pre-computed sine table
///
/// Index 0 = 0°, 64 = 90°, 128 = 180°, 192 = 270°.
pub static SINE_TABLE: [u8; TABLE_LEN] = {
    let mut table = [0u8; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        let angle = (i as f64) * core::f64::consts::PI * 2.0 / (TABLE_LEN as f64);
        let scaled = SAMPLE_MIDPOINT as f64 * (1.0 + const_sin(angle));
        let rounded = (scaled + 0.5) as i32;
        table[i] = if rounded < 0 {
            0
        } else if rounded > SAMPLE_MAX as i32 {
            SAMPLE_MAX
        } else {
            rounded as u8
        };
        i += 1;
    }
    table
};

/// Const-compatible sine approximation using Taylor series
const fn const_sin(x: f64) -> f64 {
    let mut x = x;
    while x > core::f64::consts::PI {
        x -= 2.0 * core::f64::consts::PI;
    }
    while x < -core::f64::consts::PI {
        x += 2.0 * core::f64::consts::PI;
    }

    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;
    let x7 = x5 * x2;
    let x9 = x7 * x2;
    let x11 = x9 * x2;

    x - x3 / 6.0 + x5 / 120.0 - x7 / 5040.0 + x9 / 362880.0 - x11 / 39916800.0
}

/// Sample at a 16-bit phase (top 8 bits index the table)
#[inline(always)]
pub fn sample(phase: u16) -> u8 {
    SINE_TABLE[(phase >> 8) as usize]
}
