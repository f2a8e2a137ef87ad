//! Boot-time configuration ritual.
//!
//! Runs once after power-up and turns a handful of tap bursts into a
//! [`DeviceConfig`]:
//!
//! ```text
//! AwaitActivation --no tap (5 s)--> NotActivated (super annoying)
//!        |
//!       tap
//!        v
//!    CountDays --1 s silence--> CountOtherDevices --1 s silence--> TestModeQuery
//! ```
//!
//! Silence is always a valid answer. There is no error path.

use core::convert::Infallible;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::config::{DeviceConfig, PRODUCTION, TEST};
use crate::fmt::info;
use crate::tap::TapReader;
use crate::tone::{Tone, ToneGenerator};

/// How long the device listens for the activation tap after boot.
pub const ACTIVATION_WINDOW_MS: u32 = 5_000;

/// Silence that ends a tap count.
pub const COUNT_TIMEOUT_MS: u32 = 1_000;

/// How long the device listens for the test-mode tap.
pub const TEST_MODE_WINDOW_MS: u32 = 1_000;

/// Pitch of every tap confirmation.
pub const TAP_FEEDBACK_HALF_PERIOD_US: u16 = 250;

/// Length of the tone acknowledging the activation tap.
pub const ACTIVATION_TONE_MS: u32 = 300;

/// Silence after the failure cue before the device arms.
pub const NOT_ACTIVATED_PAUSE_MS: u32 = 3_000;

/// Two descending tones: no activation tap was seen.
pub const NOT_ACTIVATED_CUE: [Tone; 2] = [
    Tone::new(300, 200).with_pause(100),
    Tone::new(600, 400),
];

/// Read-back beep, played once per counted unit.
pub const COUNT_BEEP: Tone = Tone::new(250, 100).with_pause(150);

/// Low tone read back when zero days were entered.
pub const ZERO_TONE: Tone = Tone::new(800, 400).with_pause(100);

/// Production timing kept.
pub const PRODUCTION_CONFIRM: Tone = Tone::new(250, 100).with_pause(150);

/// What the operator entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Setup {
    /// No activation tap: beep continuously, starting now.
    NotActivated,
    Activated {
        days: u32,
        /// Total devices in the deployment, this one included.
        devices: u32,
        test_mode: bool,
    },
}

impl Setup {
    /// Turns the operator's answers into scheduler parameters.
    pub fn device_config(&self) -> DeviceConfig {
        match *self {
            Setup::NotActivated => DeviceConfig::super_annoying(),
            Setup::Activated {
                days,
                devices,
                test_mode,
            } => {
                let profile = if test_mode { &TEST } else { &PRODUCTION };
                DeviceConfig::from_profile(profile, days, devices)
            }
        }
    }
}

/// Drives the tap dialogue over a tap reader and the buzzer.
pub struct ConfigurationStage<'a, I, P, D> {
    taps: &'a mut TapReader<I>,
    tone: &'a mut ToneGenerator<P, D>,
}

impl<'a, I, P, D> ConfigurationStage<'a, I, P, D>
where
    I: InputPin<Error = Infallible>,
    P: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    pub fn new(taps: &'a mut TapReader<I>, tone: &'a mut ToneGenerator<P, D>) -> Self {
        Self { taps, tone }
    }

    /// Runs the whole dialogue and returns the answers with the derived
    /// config.
    pub fn run(mut self) -> (Setup, DeviceConfig) {
        let setup = if self.await_activation() {
            let days = self.count_days();
            let devices = self.count_devices();
            let test_mode = self.query_test_mode();
            Setup::Activated {
                days,
                devices,
                test_mode,
            }
        } else {
            self.not_activated();
            Setup::NotActivated
        };

        let config = setup.device_config();
        info!("configured: {}", config);
        (setup, config)
    }

    fn await_activation(&mut self) -> bool {
        let activated = self.taps.wait_for_tap(
            self.tone,
            TAP_FEEDBACK_HALF_PERIOD_US,
            ACTIVATION_TONE_MS,
            ACTIVATION_WINDOW_MS,
        );
        if activated {
            info!("activated");
            self.taps.wait_for_release(self.tone);
        }
        activated
    }

    fn not_activated(&mut self) {
        info!("no activation tap, arming super annoying mode");
        self.tone.play_all(&NOT_ACTIVATED_CUE);
        self.tone.silence(NOT_ACTIVATED_PAUSE_MS);
    }

    fn count_days(&mut self) -> u32 {
        let days = self
            .taps
            .count_taps(self.tone, TAP_FEEDBACK_HALF_PERIOD_US, COUNT_TIMEOUT_MS);
        info!("days: {}", days);
        if days == 0 {
            self.tone.play(ZERO_TONE);
        } else {
            self.read_back(days);
        }
        days
    }

    fn count_devices(&mut self) -> u32 {
        let others = self
            .taps
            .count_taps(self.tone, TAP_FEEDBACK_HALF_PERIOD_US, COUNT_TIMEOUT_MS);
        let devices = others + 1;
        info!("devices: {}", devices);
        self.read_back(devices);
        devices
    }

    fn query_test_mode(&mut self) -> bool {
        let test_mode = self.taps.wait_for_tap(
            self.tone,
            TAP_FEEDBACK_HALF_PERIOD_US,
            ACTIVATION_TONE_MS,
            TEST_MODE_WINDOW_MS,
        );
        if test_mode {
            info!("test timing selected");
        } else {
            self.tone.play(PRODUCTION_CONFIRM);
        }
        test_mode
    }

    fn read_back(&mut self, count: u32) {
        for _ in 0..count {
            self.tone.play(COUNT_BEEP);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WakePeriod;

    #[test]
    fn activated_setup_scales_production_profile() {
        let setup = Setup::Activated {
            days: 3,
            devices: 3,
            test_mode: false,
        };
        let config = setup.device_config();
        assert_eq!(config.min_interval_ticks, PRODUCTION.min_interval_ticks * 3);
        assert_eq!(config.max_interval_ticks, PRODUCTION.max_interval_ticks * 3);
        assert_eq!(
            config.initial_delay_ticks,
            PRODUCTION.initial_delay_ticks + 3 * PRODUCTION.day_ticks
        );
        assert_eq!(config.wake_period, WakePeriod::S8);
    }

    #[test]
    fn test_mode_switches_every_timing_constant() {
        let setup = Setup::Activated {
            days: 1,
            devices: 2,
            test_mode: true,
        };
        let config = setup.device_config();
        assert_eq!(config.wake_period, TEST.wake_period);
        assert_eq!(config.min_interval_ticks, TEST.min_interval_ticks * 2);
        assert_eq!(config.max_interval_ticks, TEST.max_interval_ticks * 2);
        assert_eq!(config.initial_delay_ticks, TEST.initial_delay_ticks + TEST.day_ticks);
        assert_eq!(config.day_ticks, TEST.day_ticks);
    }

    #[test]
    fn not_activated_is_super_annoying() {
        assert_eq!(Setup::NotActivated.device_config(), DeviceConfig::super_annoying());
    }
}
