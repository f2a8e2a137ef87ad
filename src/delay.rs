//! Busy-wait delay counted in core clock cycles.
//!
//! Tone half-periods are tens of microseconds, well below the resolution of
//! the low-power time driver, so tones are timed by spinning the core.
//! [`ToneGenerator`](crate::ToneGenerator) calls [`DelayNs::delay_us`] twice
//! per wave cycle. Converting microseconds to cycles there is a 32-bit
//! multiply and shift: Cortex-M0+ has no divide instruction, and a 64-bit
//! software division per half-period would eat into the half-period itself.

use embedded_hal::delay::DelayNs;

/// Fraction bits of the cycles-per-microsecond factor.
const US_FRAC_BITS: u32 = 10;

pub struct CycleDelay {
    /// Core cycles per microsecond, Q22.10 fixed point.
    cycles_per_us: u32,
    cycles_per_ms: u32,
    spin: fn(u32),
}

impl CycleDelay {
    /// `spin` must busy-wait for the given number of core cycles, e.g.
    /// `cortex_m::asm::delay`.
    pub const fn new(sysclk_hz: u32, spin: fn(u32)) -> Self {
        let scaled = (sysclk_hz as u64) << US_FRAC_BITS;
        Self {
            cycles_per_us: ((scaled + 500_000) / 1_000_000) as u32,
            cycles_per_ms: sysclk_hz / 1_000,
            spin,
        }
    }

    /// Cycles in `us` microseconds, for `us` below one millisecond.
    pub const fn cycles_for_us(&self, us: u32) -> u32 {
        us.saturating_mul(self.cycles_per_us) >> US_FRAC_BITS
    }

    pub const fn cycles_per_ms(&self) -> u32 {
        self.cycles_per_ms
    }

    fn spin(&self, cycles: u32) {
        if cycles > 0 {
            (self.spin)(cycles);
        }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_us(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        if us < 1_000 {
            self.spin(self.cycles_for_us(us));
        } else {
            self.delay_ms(us / 1_000);
            self.spin(self.cycles_for_us(us % 1_000));
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.spin(self.cycles_per_ms);
        }
    }
}
