//! Single-pin tap input.
//!
//! The only operator control is a bare contact that shorts the tap pin to
//! Vcc. Numbers are entered as bursts of taps separated by silence, so
//! everything here is about bounded polling: each wait has a timeout and
//! the tone generator's delay doubles as the polling clock.

use core::convert::Infallible;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::fmt::trace;
use crate::tone::{Tone, ToneGenerator};

/// Time between two samples of the tap pin.
pub const POLL_INTERVAL_MS: u32 = 1;

/// Confirmation chirp played for every tap while counting.
pub const COUNT_CONFIRM_MS: u32 = 20;

/// Settle time after a release before the next tap is accepted.
pub const DEBOUNCE_MS: u32 = 50;

/// Longest a tap may be held before counting resumes regardless.
pub const RELEASE_TIMEOUT_MS: u32 = 2_000;

/// Reads taps from an active-high input pin.
pub struct TapReader<I> {
    pin: I,
}

impl<I> TapReader<I>
where
    I: InputPin<Error = Infallible>,
{
    pub fn new(pin: I) -> Self {
        Self { pin }
    }

    pub fn is_pressed(&mut self) -> bool {
        let Ok(pressed) = self.pin.is_high();
        pressed
    }

    /// Polls for a tap for up to `timeout_ms`.
    ///
    /// On the first sample that reads pressed, plays a confirmation tone of
    /// `tone_ms` at `feedback_half_period_us` and returns `true`. Returns
    /// `false` if the window closes first.
    pub fn wait_for_tap<P, D>(
        &mut self,
        tone: &mut ToneGenerator<P, D>,
        feedback_half_period_us: u16,
        tone_ms: u32,
        timeout_ms: u32,
    ) -> bool
    where
        P: OutputPin<Error = Infallible>,
        D: DelayNs,
    {
        let mut waited_ms = 0;
        while waited_ms < timeout_ms {
            if self.is_pressed() {
                tone.play(Tone::new(feedback_half_period_us, tone_ms));
                return true;
            }
            tone.silence(POLL_INTERVAL_MS);
            waited_ms += POLL_INTERVAL_MS;
        }
        false
    }

    /// Waits for the pin to be released, then lets the contact settle.
    ///
    /// Gives up after [`RELEASE_TIMEOUT_MS`] so a stuck contact cannot wedge
    /// the configuration.
    pub fn wait_for_release<P, D>(&mut self, tone: &mut ToneGenerator<P, D>)
    where
        P: OutputPin<Error = Infallible>,
        D: DelayNs,
    {
        let mut waited_ms = 0;
        while self.is_pressed() && waited_ms < RELEASE_TIMEOUT_MS {
            tone.silence(POLL_INTERVAL_MS);
            waited_ms += POLL_INTERVAL_MS;
        }
        tone.silence(DEBOUNCE_MS);
    }

    /// Counts taps until `timeout_ms` passes without one.
    ///
    /// Each tap is confirmed with a short chirp and must be released before
    /// the next one counts. Returns 0 if the first window expires.
    pub fn count_taps<P, D>(
        &mut self,
        tone: &mut ToneGenerator<P, D>,
        feedback_half_period_us: u16,
        timeout_ms: u32,
    ) -> u32
    where
        P: OutputPin<Error = Infallible>,
        D: DelayNs,
    {
        let mut taps = 0;
        while self.wait_for_tap(tone, feedback_half_period_us, COUNT_CONFIRM_MS, timeout_ms) {
            taps += 1;
            trace!("tap {}", taps);
            self.wait_for_release(tone);
        }
        taps
    }

    /// Gives back the input pin so it can be parked.
    pub fn release(self) -> I {
        self.pin
    }
}
