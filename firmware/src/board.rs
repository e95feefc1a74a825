//! CH32V003 peripheral setup: clocks, pins, the tick/PWM timer and the keypad ADC
//!
//! Pin assignments:
//! PD2 = tone output (TIM1_CH1, PWM into an RC low-pass)
//! PC4 = keypad resistor ladder (ADC channel 2)

use bluebox_core::sine::PWM_MIDPOINT;
use bluebox_core::{AnalogInput, HalError};

const RCC_BASE: u32 = 0x4002_1000;
const GPIOC_BASE: u32 = 0x4001_1000;
const GPIOD_BASE: u32 = 0x4001_1400;
const ADC1_BASE: u32 = 0x4001_2400;
const TIM1_BASE: u32 = 0x4001_2C00;
const PFIC_BASE: u32 = 0xE000_E000;

// RCC
const RCC_CFGR0: u32 = 0x04;
const RCC_APB2PCENR: u32 = 0x18;

// GPIO
const GPIO_CFGLR: u32 = 0x00;

// TIM1
const TIM_CTLR1: u32 = 0x00;
const TIM_DMAINTENR: u32 = 0x0C;
const TIM_INTFR: u32 = 0x10;
const TIM_CHCTLR1: u32 = 0x18;
const TIM_CCER: u32 = 0x20;
const TIM_PSC: u32 = 0x28;
const TIM_ATRLR: u32 = 0x2C;
const TIM_CH1CVR: u32 = 0x34;
const TIM_BDTR: u32 = 0x44;

// ADC1
const ADC_STATR: u32 = 0x00;
const ADC_CTLR2: u32 = 0x08;
const ADC_SAMPTR2: u32 = 0x10;
const ADC_RSQR3: u32 = 0x34;
const ADC_RDATAR: u32 = 0x4C;

const ADC_EOC: u32 = 1 << 1;
const ADC_ADON: u32 = 1 << 0;
const ADC_CAL: u32 = 1 << 2;
const ADC_RSTCAL: u32 = 1 << 3;
const ADC_EXTSEL_SWSTART: u32 = 0b111 << 17;
const ADC_EXTTRIG: u32 = 1 << 20;
const ADC_SWSTART: u32 = 1 << 22;

const TIM1_UP_IRQN: u32 = 35;

/// 8-bit PWM: 24 MHz / 256 gives the 93.75 kHz tick
pub const PWM_TOP: u32 = 255;

const KEYPAD_CHANNEL: u32 = 2;
const SPIN_LIMIT: u32 = 10_000;

#[inline(always)]
unsafe fn read_reg(base: u32, offset: u32) -> u32 {
    core::ptr::read_volatile((base + offset) as *const u32)
}

#[inline(always)]
unsafe fn write_reg(base: u32, offset: u32, value: u32) {
    core::ptr::write_volatile((base + offset) as *mut u32, value)
}

#[inline(always)]
unsafe fn modify_reg(base: u32, offset: u32, f: impl FnOnce(u32) -> u32) {
    let value = read_reg(base, offset);
    write_reg(base, offset, f(value));
}

/// Bring up everything the firmware uses; the tick starts running on return
pub fn init() {
    configure_clocks();
    configure_gpio_pins();
    configure_adc();
    configure_tick_pwm();
}

/// Run HCLK straight off the 24 MHz HSI and enable peripheral clocks
fn configure_clocks() {
    unsafe {
        // HPRE = 0: no AHB divider (reset value divides by 3)
        modify_reg(RCC_BASE, RCC_CFGR0, |cfgr| cfgr & !(0xF << 4));
        // Bit 0 = AFIO, 4 = GPIOC, 5 = GPIOD, 9 = ADC1, 11 = TIM1
        modify_reg(RCC_BASE, RCC_APB2PCENR, |en| {
            en | (1 << 0) | (1 << 4) | (1 << 5) | (1 << 9) | (1 << 11)
        });
    }
}

fn configure_gpio_pins() {
    unsafe {
        // PD2: CNF=10 (AF push-pull), MODE=11
        modify_reg(GPIOD_BASE, GPIO_CFGLR, |cfg| (cfg & !(0xF << (2 * 4))) | (0xB << (2 * 4)));
        // PC4: CNF=00 MODE=00, analog input
        modify_reg(GPIOC_BASE, GPIO_CFGLR, |cfg| cfg & !(0xF << (4 * 4)));
    }
}

fn configure_adc() {
    unsafe {
        // Longest sample time on the ladder channel, single conversion sequence
        modify_reg(ADC1_BASE, ADC_SAMPTR2, |s| s | (0b111 << (KEYPAD_CHANNEL * 3)));
        write_reg(ADC1_BASE, ADC_RSQR3, KEYPAD_CHANNEL);
        write_reg(ADC1_BASE, ADC_CTLR2, ADC_ADON | ADC_EXTSEL_SWSTART | ADC_EXTTRIG);

        modify_reg(ADC1_BASE, ADC_CTLR2, |c| c | ADC_RSTCAL);
        let mut spins = 0;
        while read_reg(ADC1_BASE, ADC_CTLR2) & ADC_RSTCAL != 0 && spins < SPIN_LIMIT {
            spins += 1;
        }
        modify_reg(ADC1_BASE, ADC_CTLR2, |c| c | ADC_CAL);
        spins = 0;
        while read_reg(ADC1_BASE, ADC_CTLR2) & ADC_CAL != 0 && spins < SPIN_LIMIT {
            spins += 1;
        }
    }
}

/// TIM1 channel 1 as 8-bit PWM whose update interrupt is the system tick
fn configure_tick_pwm() {
    unsafe {
        write_reg(TIM1_BASE, TIM_PSC, 0);
        write_reg(TIM1_BASE, TIM_ATRLR, PWM_TOP);
        write_reg(TIM1_BASE, TIM_CH1CVR, PWM_MIDPOINT as u32);

        // PWM mode 1, preload enable
        write_reg(TIM1_BASE, TIM_CHCTLR1, (0x6 << 4) | (1 << 3));
        write_reg(TIM1_BASE, TIM_CCER, 1);
        // MOE
        write_reg(TIM1_BASE, TIM_BDTR, 1 << 15);
        // Update interrupt
        write_reg(TIM1_BASE, TIM_DMAINTENR, 1);

        let ienr = PFIC_BASE + 0x100 + 4 * (TIM1_UP_IRQN / 32);
        core::ptr::write_volatile(ienr as *mut u32, 1 << (TIM1_UP_IRQN % 32));

        // ARPE, CEN
        write_reg(TIM1_BASE, TIM_CTLR1, (1 << 7) | 1);
    }
}

/// Acknowledge the update interrupt
#[inline(always)]
pub fn clear_tick() {
    unsafe { write_reg(TIM1_BASE, TIM_INTFR, !1) }
}

/// Compare value for the next PWM period
#[inline(always)]
pub fn set_duty(duty: u8) {
    unsafe { write_reg(TIM1_BASE, TIM_CH1CVR, duty as u32) }
}

/// Software-triggered conversions on the keypad channel
pub struct KeypadAdc {
    _private: (),
}

impl KeypadAdc {
    /// Only meaningful after [`init`]
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl AnalogInput for KeypadAdc {
    fn read(&mut self) -> Result<u8, HalError> {
        unsafe {
            modify_reg(ADC1_BASE, ADC_CTLR2, |c| c | ADC_SWSTART);
            let mut spins = 0;
            while read_reg(ADC1_BASE, ADC_STATR) & ADC_EOC == 0 {
                spins += 1;
                if spins >= SPIN_LIMIT {
                    return Err(HalError::AdcError);
                }
            }
            // Reading the data register clears EOC; 10-bit result scaled to 8
            let raw = read_reg(ADC1_BASE, ADC_RDATAR) & 0x3FF;
            Ok((raw >> 2) as u8)
        }
    }
}
