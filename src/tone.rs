//! Bit-banged square wave driver for the piezo element.
//!
//! The piezo sits directly on a push-pull GPIO. Every tone is produced by
//! toggling the pin from a busy-wait loop, so a call to [`ToneGenerator::play`]
//! owns the CPU for the whole tone. That is fine here: tones are short,
//! human-scale, and nothing else needs the core while one is sounding.

use core::convert::Infallible;

use embedded_hal::{delay::DelayNs, digital::OutputPin};

/// Duty cycle used when a tone does not ask for one.
pub const DEFAULT_DUTY_PERCENT: u8 = 25;

/// Longest high pulse per cycle. Longer pulses make low tones buzz.
pub const MAX_HIGH_US: u32 = 250;

/// One tone: a square wave plus the silence that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tone {
    /// Half of the wave period in microseconds. Smaller is higher pitch.
    pub half_period_us: u16,
    pub duration_ms: u32,
    pub pause_ms: u32,
    pub duty_percent: u8,
}

impl Tone {
    pub const fn new(half_period_us: u16, duration_ms: u32) -> Self {
        Self {
            half_period_us,
            duration_ms,
            pause_ms: 0,
            duty_percent: DEFAULT_DUTY_PERCENT,
        }
    }

    /// Holds the pin low for `pause_ms` after the wave.
    pub const fn with_pause(mut self, pause_ms: u32) -> Self {
        self.pause_ms = pause_ms;
        self
    }

    pub const fn with_duty(mut self, duty_percent: u8) -> Self {
        self.duty_percent = duty_percent;
        self
    }

    /// Microseconds the pin is high and low in one cycle.
    ///
    /// The duty is clamped to 100 % and the high phase to [`MAX_HIGH_US`].
    pub fn phases_us(&self) -> (u32, u32) {
        let cycle = 2 * u32::from(self.half_period_us);
        let duty = u32::from(self.duty_percent.min(100));
        let high = (cycle * duty / 100).min(MAX_HIGH_US);
        (high, cycle - high)
    }
}

/// Plays [`Tone`]s on an output pin using a blocking delay.
///
/// The pin is expected to be low whenever no tone is playing.
pub struct ToneGenerator<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> ToneGenerator<P, D>
where
    P: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    pub fn new(mut pin: P, delay: D) -> Self {
        let Ok(()) = pin.set_low();
        Self { pin, delay }
    }

    /// Plays `tone`, then its pause. Returns once both have elapsed.
    pub fn play(&mut self, tone: Tone) {
        let duration_us = tone.duration_ms.saturating_mul(1_000);
        let (high_us, low_us) = tone.phases_us();
        let cycle_us = high_us + low_us;

        if cycle_us == 0 {
            self.silence(tone.duration_ms);
        } else {
            let mut elapsed_us = 0u32;
            while elapsed_us < duration_us {
                if high_us > 0 {
                    let Ok(()) = self.pin.set_high();
                    self.delay.delay_us(high_us);
                }
                let Ok(()) = self.pin.set_low();
                self.delay.delay_us(low_us);
                elapsed_us = elapsed_us.saturating_add(cycle_us);
            }
        }

        self.silence(tone.pause_ms);
    }

    /// Plays each tone of `tones` in order.
    pub fn play_all(&mut self, tones: &[Tone]) {
        for tone in tones {
            self.play(*tone);
        }
    }

    /// Shorthand for a default-duty tone with no pause.
    pub fn beep(&mut self, half_period_us: u16, duration_ms: u32) {
        self.play(Tone::new(half_period_us, duration_ms));
    }

    /// Holds the pin low for `ms` milliseconds.
    pub fn silence(&mut self, ms: u32) {
        if ms > 0 {
            let Ok(()) = self.pin.set_low();
            self.delay.delay_ms(ms);
        }
    }

    /// Gives back the pin and delay.
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}
