//! Annoyance episodes.
//!
//! Every time the scheduler fires it picks one of six patterns at random,
//! so there is no rhythm or melody for the victim to home in on.

use core::convert::Infallible;

use embedded_hal::{delay::DelayNs, digital::OutputPin};
use heapless::Vec;
use oorandom::Rand32;

use crate::tone::{Tone, ToneGenerator};

/// Number of random steps in a glide.
pub const GLIDE_STEPS: usize = 100;

/// Each glide step sounds for this long.
pub const GLIDE_STEP_MS: u32 = 1;

const FALLING_PAIR: [Tone; 2] = [Tone::new(200, 150).with_pause(50), Tone::new(400, 250)];

const FALLING_RUN: [Tone; 5] = [
    Tone::new(150, 80).with_pause(20),
    Tone::new(200, 80).with_pause(20),
    Tone::new(250, 80).with_pause(20),
    Tone::new(300, 80).with_pause(20),
    Tone::new(350, 80),
];

const SUSTAINED: Tone = Tone::new(180, 1_000);

/// Half-period band a glide draws its steps from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GlideBand {
    Low,
    Mid,
    High,
}

impl GlideBand {
    /// Half-period range in microseconds, upper bound exclusive.
    pub const fn half_periods_us(self) -> core::ops::Range<u16> {
        match self {
            GlideBand::Low => 400..800,
            GlideBand::Mid => 200..400,
            GlideBand::High => 80..200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pattern {
    FallingPair,
    FallingRun,
    Sustained,
    Glide(GlideBand),
}

impl Pattern {
    pub const ALL: [Pattern; 6] = [
        Pattern::FallingPair,
        Pattern::FallingRun,
        Pattern::Sustained,
        Pattern::Glide(GlideBand::Low),
        Pattern::Glide(GlideBand::Mid),
        Pattern::Glide(GlideBand::High),
    ];

    /// Picks a pattern uniformly.
    pub fn random(rng: &mut Rand32) -> Self {
        Self::ALL[rng.rand_range(0..Self::ALL.len() as u32) as usize]
    }

    /// Plays the pattern to completion.
    pub fn play<P, D>(self, tone: &mut ToneGenerator<P, D>, rng: &mut Rand32)
    where
        P: OutputPin<Error = Infallible>,
        D: DelayNs,
    {
        match self {
            Pattern::FallingPair => tone.play_all(&FALLING_PAIR),
            Pattern::FallingRun => tone.play_all(&FALLING_RUN),
            Pattern::Sustained => tone.play(SUSTAINED),
            Pattern::Glide(band) => {
                let steps = glide_steps(band, rng);
                for half_period_us in steps.iter().chain(steps.iter().rev()) {
                    tone.beep(*half_period_us, GLIDE_STEP_MS);
                }
            }
        }
    }
}

/// Draws the random half-periods of one glide.
pub fn glide_steps(band: GlideBand, rng: &mut Rand32) -> Vec<u16, GLIDE_STEPS> {
    let range = band.half_periods_us();
    let range = u32::from(range.start)..u32::from(range.end);
    (0..GLIDE_STEPS)
        .map(|_| rng.rand_range(range.clone()) as u16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_rise_in_pitch() {
        let low = GlideBand::Low.half_periods_us();
        let mid = GlideBand::Mid.half_periods_us();
        let high = GlideBand::High.half_periods_us();
        assert!(high.end <= mid.start);
        assert!(mid.end <= low.start);
    }

    #[test]
    fn glide_steps_stay_in_band() {
        let mut rng = Rand32::new(7);
        for band in [GlideBand::Low, GlideBand::Mid, GlideBand::High] {
            let steps = glide_steps(band, &mut rng);
            assert_eq!(steps.len(), GLIDE_STEPS);
            assert!(steps.iter().all(|p| band.half_periods_us().contains(p)));
        }
    }

    #[test]
    fn every_pattern_gets_picked() {
        let mut rng = Rand32::new(42);
        let mut seen = [false; 6];
        for _ in 0..600 {
            let pattern = Pattern::random(&mut rng);
            let index = Pattern::ALL.iter().position(|p| *p == pattern).unwrap();
            seen[index] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
