//! Hardware abstraction and peripheral initialization.
//!
//! This module defines the pin mappings and low-power controls for the
//! prank board.
//!
//! # Pin Assignments
//!
//! - **PA0**: TAP - Bare contact to Vcc, pulled down internally
//! - **PA1**: PIEZO - Push-pull drive for the piezo element
//!
//! ## Low Power & RTC
//! - **PC14**: OSC32_IN - 32.768 kHz crystal input
//! - **PC15**: OSC32_OUT - 32.768 kHz crystal output
//!
//! ## Debug (SWD)
//! - **PA13**: SWDIO
//! - **PA14**: SWCLK
//!
//! Every other pin stays in its reset state (analog mode), which is already
//! the lowest-leakage configuration on STM32L0.

use annoyatron::{CycleDelay, TapReader, ToneGenerator};
use embassy_stm32::gpio::{Flex, Level, Output, Pull, Speed};
use embassy_stm32::pac;

/// System clock used to time tone half-periods (MSI range 6).
pub const SYSCLK_HZ: u32 = 4_194_304;

/// Top-level peripheral container for the prank board.
pub struct Peripherals {
    /// Piezo driver
    pub tone: ToneGenerator<Output<'static>, CycleDelay>,
    /// Tap contact, only needed during configuration
    pub taps: TapReader<Flex<'static>>,
}

impl Peripherals {
    /// Initializes all peripherals from STM32 peripheral singleton.
    ///
    /// # Initial GPIO States
    ///
    /// - PA0 (TAP): Input, pull-down
    /// - PA1 (PIEZO): Low
    ///
    /// # Arguments
    ///
    /// * `p` - STM32 peripheral singleton from embassy_stm32::init()
    pub fn new(p: embassy_stm32::Peripherals) -> Self {
        let mut tap = Flex::new(p.PA0);
        tap.set_as_input(Pull::Down);

        Self {
            tone: ToneGenerator::new(
                Output::new(p.PA1, Level::Low, Speed::Low),
                CycleDelay::new(SYSCLK_HZ, cortex_m::asm::delay),
            ),
            taps: TapReader::new(tap),
        }
    }
}

/// Puts the tap pin into analog mode once configuration is over.
///
/// Removes the pull-down so a contact left shorted costs no current.
pub fn park_tap_pin(taps: TapReader<Flex<'static>>) {
    let mut pin = taps.release();
    pin.set_as_analog();
}

/// Makes every later idle period enter STOP mode with the low-power
/// regulator instead of plain sleep.
///
/// Only the RTC wakeup (EXTI line 20) brings the core back.
pub fn enable_stop_mode() {
    pac::PWR.cr().modify(|w| {
        w.set_lpsdsr(true);
        w.set_ulp(true);
    });

    #[cfg(feature = "debug-mode")]
    pac::DBGMCU.cr().modify(|w| w.set_dbg_stop(true));

    let mut core = unsafe { cortex_m::Peripherals::steal() };
    core.SCB.set_sleepdeep();
}
