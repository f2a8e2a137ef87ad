//! Per-wake decision logic.
//!
//! On every wake the scheduler:
//!
//! 1. advances the day counter, once the device has gone off at least once;
//! 2. every [`DECAY_PERIOD_DAYS`](crate::config::DECAY_PERIOD_DAYS) days,
//!    drops one device from a multi-device deployment, shrinking the
//!    interval bounds so the survivors beep more often. Once a single
//!    device is left the day counter just keeps running;
//! 3. fires an episode when the wake counter reaches the current trigger
//!    threshold (plus the initial delay, the first time round).
//!
//! The decision in [`AnnoyanceScheduler::tick`] is pure bookkeeping and does
//! no I/O; [`AnnoyanceScheduler::on_wake`] adds the sound.

use core::convert::Infallible;

use embedded_hal::{delay::DelayNs, digital::OutputPin};
use oorandom::Rand32;

use crate::config::DeviceConfig;
use crate::episode::Pattern;
use crate::fmt::{debug, info};
use crate::tone::ToneGenerator;
use crate::wake::WakeCounter;

pub struct AnnoyanceScheduler {
    config: DeviceConfig,
    rng: Rand32,
    threshold: u32,
    /// Extra ticks added to the first threshold only.
    pending_delay: u32,
    day_counter: u32,
    started: bool,
}

impl AnnoyanceScheduler {
    pub fn new(config: DeviceConfig, seed: u64) -> Self {
        let mut scheduler = Self {
            config,
            rng: Rand32::new(seed),
            threshold: 0,
            pending_delay: config.initial_delay_ticks,
            day_counter: 0,
            started: false,
        };
        scheduler.threshold = scheduler.draw_threshold();
        scheduler
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Wake ticks needed before the next episode, initial delay included.
    pub fn threshold(&self) -> u32 {
        self.threshold.saturating_add(self.pending_delay)
    }

    pub fn started(&self) -> bool {
        self.started
    }

    /// Ticks counted toward the next decay.
    pub fn day_counter(&self) -> u32 {
        self.day_counter
    }

    /// Updates the bookkeeping for one wake and returns the pattern to play,
    /// if this wake fires an episode.
    pub fn tick(&mut self, counter: &WakeCounter) -> Option<Pattern> {
        if self.started {
            self.day_counter = self.day_counter.saturating_add(1);
        }

        let decay_period = self.config.decay_period_ticks();
        if decay_period > 0 && self.config.device_count > 1 && self.day_counter >= decay_period
        {
            self.day_counter = 0;
            self.config.decay();
            info!(
                "decayed to {} devices, interval {}..={}",
                self.config.device_count,
                self.config.min_interval_ticks,
                self.config.max_interval_ticks
            );
        }

        counter.take_if_at_least(self.threshold())?;

        self.pending_delay = 0;
        self.threshold = self.draw_threshold();
        self.started = true;

        let pattern = Pattern::random(&mut self.rng);
        debug!("episode {}, next in {} ticks", pattern, self.threshold);
        Some(pattern)
    }

    /// Processes one wake, playing an episode if one is due.
    ///
    /// Returns whether an episode played.
    pub fn on_wake<P, D>(&mut self, counter: &WakeCounter, tone: &mut ToneGenerator<P, D>) -> bool
    where
        P: OutputPin<Error = Infallible>,
        D: DelayNs,
    {
        match self.tick(counter) {
            Some(pattern) => {
                pattern.play(tone, &mut self.rng);
                true
            }
            None => false,
        }
    }

    /// Uniform draw from `[min, max]`.
    fn draw_threshold(&mut self) -> u32 {
        let min = self.config.min_interval_ticks;
        let max = self.config.max_interval_ticks;
        if min >= max {
            return min;
        }
        match max.checked_add(1) {
            Some(end) => self.rng.rand_range(min..end),
            None => self.rng.rand_range(min..max),
        }
    }
}
