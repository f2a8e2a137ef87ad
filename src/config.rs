//! Compile-time timing constants and the runtime device configuration.
//!
//! All durations the scheduler reasons about are expressed in wake ticks,
//! one tick being one firing of the periodic wake timer. A [`TimingProfile`]
//! bundles the tick period with the interval bounds and day length that
//! make sense for it; the configuration ritual picks one and scales it into
//! a [`DeviceConfig`].

/// Number of days of wake ticks between two decay evaluations.
pub const DECAY_PERIOD_DAYS: u32 = 3;

/// Wake timer period, following the classic watchdog prescaler ladder.
///
/// The discriminant is the period code (0 = fastest, 9 = slowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WakePeriod {
    Ms16 = 0,
    Ms32 = 1,
    Ms64 = 2,
    Ms125 = 3,
    Ms250 = 4,
    Ms500 = 5,
    S1 = 6,
    S2 = 7,
    S4 = 8,
    S8 = 9,
}

impl WakePeriod {
    /// Shortest period, used by super annoying mode.
    pub const FASTEST: Self = WakePeriod::Ms16;

    /// All periods ordered by code.
    pub const ALL: [Self; 10] = [
        WakePeriod::Ms16,
        WakePeriod::Ms32,
        WakePeriod::Ms64,
        WakePeriod::Ms125,
        WakePeriod::Ms250,
        WakePeriod::Ms500,
        WakePeriod::S1,
        WakePeriod::S2,
        WakePeriod::S4,
        WakePeriod::S8,
    ];

    /// Looks up a period by its code, `None` above 9.
    pub const fn from_code(code: u8) -> Option<Self> {
        if (code as usize) < Self::ALL.len() {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Nominal period in milliseconds.
    pub const fn millis(self) -> u32 {
        match self {
            WakePeriod::Ms16 => 16,
            WakePeriod::Ms32 => 32,
            WakePeriod::Ms64 => 64,
            WakePeriod::Ms125 => 125,
            WakePeriod::Ms250 => 250,
            WakePeriod::Ms500 => 500,
            WakePeriod::S1 => 1_000,
            WakePeriod::S2 => 2_000,
            WakePeriod::S4 => 4_000,
            WakePeriod::S8 => 8_000,
        }
    }

    /// Number of wakeup clock cycles per period when the timer runs from a
    /// 32.768 kHz crystal divided by 16 (2048 Hz).
    ///
    /// The hardware reload register takes this value minus one.
    pub const fn wakeup_cycles(self) -> u16 {
        32 << self.code()
    }
}

/// A consistent set of timing constants for one wake period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingProfile {
    pub wake_period: WakePeriod,
    pub min_interval_ticks: u32,
    pub max_interval_ticks: u32,
    pub initial_delay_ticks: u32,
    pub day_ticks: u32,
}

/// Deployment timing: 8 s ticks, a beep every 30 minutes to 3 hours,
/// first beep no earlier than an hour after arming.
pub const PRODUCTION: TimingProfile = TimingProfile {
    wake_period: WakePeriod::S8,
    min_interval_ticks: 225,
    max_interval_ticks: 1_350,
    initial_delay_ticks: 450,
    day_ticks: 10_800,
};

/// Compressed timing for bench testing: 1 s ticks and one-minute "days".
pub const TEST: TimingProfile = TimingProfile {
    wake_period: WakePeriod::S1,
    min_interval_ticks: 5,
    max_interval_ticks: 20,
    initial_delay_ticks: 10,
    day_ticks: 60,
};

/// Scheduler parameters produced by the configuration ritual.
///
/// Invariants: `min_interval_ticks <= max_interval_ticks` and
/// `device_count >= 1`. Only the decay policy mutates it after boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub min_interval_ticks: u32,
    pub max_interval_ticks: u32,
    pub initial_delay_ticks: u32,
    pub wake_period: WakePeriod,
    pub device_count: u32,
    pub day_ticks: u32,
}

impl DeviceConfig {
    /// Builds a config from a profile for a deployment of `device_count`
    /// devices that should stay quiet for `days` extra days.
    ///
    /// Interval bounds scale with the device count so the deployment as a
    /// whole beeps at the profile's rate.
    pub fn from_profile(profile: &TimingProfile, days: u32, device_count: u32) -> Self {
        let device_count = device_count.max(1);
        Self {
            min_interval_ticks: profile.min_interval_ticks.saturating_mul(device_count),
            max_interval_ticks: profile.max_interval_ticks.saturating_mul(device_count),
            initial_delay_ticks: profile
                .initial_delay_ticks
                .saturating_add(days.saturating_mul(profile.day_ticks)),
            wake_period: profile.wake_period,
            device_count,
            day_ticks: profile.day_ticks,
        }
    }

    /// Fire on every wake at the fastest tick rate, starting immediately.
    pub const fn super_annoying() -> Self {
        Self {
            min_interval_ticks: 0,
            max_interval_ticks: 0,
            initial_delay_ticks: 0,
            wake_period: WakePeriod::FASTEST,
            device_count: 1,
            day_ticks: PRODUCTION.day_ticks,
        }
    }

    /// Wake ticks between two decay evaluations.
    pub fn decay_period_ticks(&self) -> u32 {
        self.day_ticks.saturating_mul(DECAY_PERIOD_DAYS)
    }

    /// Drops one device from the deployment, shrinking both interval bounds
    /// by `(n - 1) / n`. Returns `false` once a single device is left.
    pub fn decay(&mut self) -> bool {
        if self.device_count <= 1 {
            return false;
        }
        let n = u64::from(self.device_count);
        let shrink = |ticks: u32| (u64::from(ticks) * (n - 1) / n) as u32;
        self.min_interval_ticks = shrink(self.min_interval_ticks);
        self.max_interval_ticks = shrink(self.max_interval_ticks);
        self.device_count -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_codes_round_trip_through_lookup() {
        for (code, period) in WakePeriod::ALL.iter().enumerate() {
            assert_eq!(period.code() as usize, code);
            assert_eq!(WakePeriod::from_code(code as u8), Some(*period));
        }
        assert_eq!(WakePeriod::from_code(10), None);
    }

    #[test]
    fn wakeup_cycles_track_nominal_period() {
        assert_eq!(WakePeriod::Ms16.wakeup_cycles(), 32);
        assert_eq!(WakePeriod::S1.wakeup_cycles(), 2_048);
        assert_eq!(WakePeriod::S8.wakeup_cycles(), 16_384);
        for period in WakePeriod::ALL {
            let millis = u32::from(period.wakeup_cycles()) * 1_000 / 2_048;
            assert!(millis.abs_diff(period.millis()) <= period.millis() / 20 + 1);
        }
    }

    #[test]
    fn production_day_matches_tick_period() {
        assert_eq!(PRODUCTION.day_ticks * PRODUCTION.wake_period.millis(), 86_400_000);
    }

    #[test]
    fn profile_scaling_multiplies_bounds_and_offsets_delay() {
        let config = DeviceConfig::from_profile(&PRODUCTION, 2, 3);
        assert_eq!(config.min_interval_ticks, 675);
        assert_eq!(config.max_interval_ticks, 4_050);
        assert_eq!(config.initial_delay_ticks, 450 + 2 * 10_800);
        assert_eq!(config.device_count, 3);
        assert_eq!(config.wake_period, WakePeriod::S8);
    }

    #[test]
    fn zero_devices_is_clamped_to_one() {
        let config = DeviceConfig::from_profile(&TEST, 0, 0);
        assert_eq!(config.device_count, 1);
        assert_eq!(config.min_interval_ticks, TEST.min_interval_ticks);
    }

    #[test]
    fn decay_shrinks_bounds_until_single_device() {
        let mut config = DeviceConfig {
            min_interval_ticks: 100,
            max_interval_ticks: 200,
            initial_delay_ticks: 0,
            wake_period: WakePeriod::S8,
            device_count: 4,
            day_ticks: 10,
        };
        assert!(config.decay());
        assert_eq!((config.min_interval_ticks, config.max_interval_ticks), (75, 150));
        assert_eq!(config.device_count, 3);

        assert!(config.decay());
        assert_eq!((config.min_interval_ticks, config.max_interval_ticks), (50, 100));
        assert!(config.decay());
        assert_eq!((config.min_interval_ticks, config.max_interval_ticks), (25, 50));
        assert_eq!(config.device_count, 1);

        assert!(!config.decay());
        assert_eq!((config.min_interval_ticks, config.max_interval_ticks), (25, 50));
        assert_eq!(config.device_count, 1);
    }

    #[test]
    fn super_annoying_fires_at_fastest_rate() {
        let config = DeviceConfig::super_annoying();
        assert_eq!(config.min_interval_ticks, 0);
        assert_eq!(config.max_interval_ticks, 0);
        assert_eq!(config.initial_delay_ticks, 0);
        assert_eq!(config.wake_period, WakePeriod::FASTEST);
        assert_eq!(config.device_count, 1);
    }
}
