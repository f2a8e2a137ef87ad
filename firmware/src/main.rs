//! Firmware for a battery-powered piezo prank device.
//!
//! # Overview
//!
//! After power-up the device listens for a tap on its contact:
//! - No tap within 5 seconds: two falling tones, then it beeps on every
//!   wake at the fastest rate ("super annoying" mode)
//! - Tap: the operator enters days of quiet, the number of devices in the
//!   deployment and optionally test timing, each as a burst of taps
//!
//! It then sleeps and plays a random pattern at random intervals until the
//! battery is pulled. There is no off switch.
//!
//! # Hardware
//!
//! - **MCU**: STM32L031G6U6 (Cortex-M0+, ultra-low-power), or STM32L011K4
//!   with the `stm32l011k4` feature
//! - **Piezo**: driven directly from a GPIO
//! - **Tap contact**: bare pad shorting a GPIO to Vcc
//! - **RTC**: 32.768 kHz crystal for the wake timer in STOP mode
//!
//! # Low Power Operation
//!
//! - MSI oscillator at 4.194 MHz, enough to bit-bang tones
//! - RTC wakeup timer fires every tick; everything else is stopped
//! - After configuration the core enters STOP mode whenever the executor
//!   is idle
//!
//! # Module Organization
//!
//! - [`hardware`] - Pin mappings, tone delay and low-power controls
//! - [`wake_timer`] - RTC wakeup timer and its interrupt

#![no_std]
#![no_main]

mod hardware;
mod wake_timer;

use annoyatron::{AnnoyanceScheduler, ConfigurationStage};
use embassy_executor::Spawner;
use embassy_stm32::{
    Config,
    rcc::{LsConfig, LseConfig, mux::ClockMux},
    time::Hertz,
};
use embassy_time::Instant;
use {defmt_rtt as _, panic_probe as _};

use hardware::{Peripherals, enable_stop_mode, park_tap_pin};
use wake_timer::{WAKE_COUNTER, next_wake, start_wake_timer};

/// Creates a low-power clock configuration for STM32L0.
///
/// # Clock Settings
///
/// - **MSI**: 4.194 MHz, the slowest range that still times tone
///   half-periods cleanly
/// - **System clock**: MSI (no PLL)
/// - **LSE**: 32.768 kHz external crystal for RTC
/// - **Voltage scale**: Range 1
///
/// MSI is also the clock the core wakes up on after STOP mode, so no
/// reconfiguration is needed after each wake.
fn create_low_power_config() -> embassy_stm32::rcc::Config {
    embassy_stm32::rcc::Config {
        msi: Some(embassy_stm32::rcc::MSIRange::RANGE4M),
        hsi: false,
        hse: None,
        pll: None,
        sys: embassy_stm32::rcc::Sysclk::MSI,
        ahb_pre: embassy_stm32::rcc::AHBPrescaler::DIV1,
        apb1_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        apb2_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        ls: LsConfig {
            rtc: embassy_stm32::rcc::RtcClockSource::LSE,
            lsi: false,
            lse: Some(LseConfig {
                frequency: Hertz::hz(32768),
                mode: embassy_stm32::rcc::LseMode::Oscillator(embassy_stm32::rcc::LseDrive::Low),
            }),
        },
        voltage_scale: embassy_stm32::rcc::VoltageScale::RANGE1,
        mux: ClockMux::default(),
    }
}

/// Seed for the pattern and interval generator.
///
/// Mixes the 96-bit device UID with the time taken to configure, which
/// depends on the operator's tapping. Two devices armed side by side still
/// end up on different sequences.
fn boot_seed() -> u64 {
    let mut seed: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in embassy_stm32::uid::uid() {
        seed ^= u64::from(*byte);
        seed = seed.wrapping_mul(0x0000_0100_0000_01b3);
    }
    seed ^ Instant::now().as_ticks()
}

/// Main entry point for the prank firmware.
///
/// # Initialization Sequence
///
/// 1. Configure clocks (4.194 MHz MSI, LSE for the RTC)
/// 2. Initialize STM32 peripherals
/// 3. Run the tap configuration dialogue
/// 4. Park the tap pin and seed the scheduler
/// 5. Start the RTC wakeup timer at the configured period
/// 6. Enable STOP mode on idle
/// 7. Enter main loop
///
/// # Main Loop
///
/// Sleeps until the wake timer fires, then lets the scheduler decide
/// whether this tick plays an episode.
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let mut config = Config::default();
    config.rcc = create_low_power_config();

    let p = embassy_stm32::init(config);

    #[cfg(feature = "debug-mode")]
    defmt::info!("Annoyatron firmware starting...");

    // Wait 3 seconds after boot to allow debugger connection
    // before the activation window opens.
    #[cfg(feature = "debug-mode")]
    {
        defmt::info!("Waiting 3 seconds for debugger connection...");
        embassy_time::Timer::after_secs(3).await;
    }

    let Peripherals { mut tone, mut taps } = Peripherals::new(p);

    #[cfg(feature = "debug-mode")]
    defmt::info!("Listening for activation tap...");

    let (_setup, device_config) = ConfigurationStage::new(&mut taps, &mut tone).run();

    #[cfg(feature = "debug-mode")]
    defmt::info!("Setup: {}", _setup);

    park_tap_pin(taps);

    let mut scheduler = AnnoyanceScheduler::new(device_config, boot_seed());

    #[cfg(feature = "debug-mode")]
    defmt::info!(
        "Armed, first episode after {} ticks of {} ms",
        scheduler.threshold(),
        device_config.wake_period.millis()
    );

    start_wake_timer(device_config.wake_period);
    enable_stop_mode();

    loop {
        next_wake().await;
        scheduler.on_wake(&WAKE_COUNTER, &mut tone);
    }
}
