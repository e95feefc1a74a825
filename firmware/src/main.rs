#![no_std]
#![no_main]

#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_halt as _;

// Logging forwards to defmt when enabled, otherwise a unit expression
#[cfg(feature = "defmt")]
macro_rules! info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => { () };
}

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($($arg:tt)*) => { () };
}

#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => { () };
}

mod board;
mod flash;

use bluebox_core::{
    Bluebox, BlueboxConfig, KeyDecoder, LongPress, Synthesizer, TickDelay, TickEngine,
};
use riscv_rt::entry;

use crate::board::KeypadAdc;
use crate::flash::FlashStore;

/// 24 MHz HCLK over an 8-bit PWM period
const TICK_HZ: u32 = 24_000_000 / (board::PWM_TOP + 1);

static ENGINE: TickEngine = TickEngine::new(TICK_HZ);
static PRESS: LongPress = LongPress::new();

struct RiscvCriticalSection;
critical_section::set_impl!(RiscvCriticalSection);

unsafe impl critical_section::Impl for RiscvCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let mstatus = riscv::register::mstatus::read();
        riscv::register::mstatus::clear_mie();
        mstatus.mie() as u8
    }

    unsafe fn release(was_enabled: critical_section::RawRestoreState) {
        if was_enabled != 0 {
            riscv::register::mstatus::set_mie();
        }
    }
}

#[entry]
fn main() -> ! {
    let config = match BlueboxConfig::with_tick_hz(TICK_HZ) {
        Ok(config) => config,
        Err(_e) => {
            warn!("tick {} Hz rejected: {}, using defaults", TICK_HZ, _e);
            bluebox_core::default_config()
        }
    };
    board::init();
    unsafe { riscv::register::mstatus::set_mie() };
    info!("bluebox {} tick {} Hz", bluebox_core::VERSION, TICK_HZ);

    let mut store = FlashStore::new();
    if let Err(_e) = store.prepare() {
        warn!("store format failed: {}", _e);
    }

    let keys = KeyDecoder::new(
        KeypadAdc::new(),
        TickDelay::new(&ENGINE.timebase).with_press(&PRESS),
        config.layout,
        config.debounce_ms,
    );
    let tones = Synthesizer::new(&ENGINE.tones, TickDelay::new(&ENGINE.timebase).with_press(&PRESS));
    let mut bluebox = Bluebox::new(keys, tones, store, &PRESS, config);

    if let Err(_e) = bluebox.boot() {
        warn!("boot: {}", _e);
    }
    info!("mode {} length {}", bluebox.mode(), bluebox.tone_length());

    loop {
        match bluebox.step() {
            Ok(Some(_press)) => debug!("{}", _press),
            Ok(None) => {}
            Err(_e) => warn!("step: {}", _e),
        }
    }
}

/// PWM period end: next sample out, time base forward
#[no_mangle]
extern "C" fn TIM1_UP_IRQHandler() {
    board::clear_tick();
    board::set_duty(ENGINE.on_tick());
}
