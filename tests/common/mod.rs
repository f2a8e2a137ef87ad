//! Shared test infrastructure for annoyatron integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use annoyatron::ToneGenerator;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

// ============================================================================
// Simulated Clock
// ============================================================================

/// Simulated time in nanoseconds, only advanced by `MockDelay`.
#[derive(Clone, Default)]
pub struct Clock(Rc<Cell<u64>>);

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ns(&self) -> u64 {
        self.0.get()
    }

    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

/// Delay that advances the simulated clock instead of sleeping.
pub struct MockDelay {
    clock: Clock,
}

impl MockDelay {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance_ns(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance_ns(u64::from(ms) * 1_000_000);
    }
}

// ============================================================================
// Mock Buzzer
// ============================================================================

/// Records every rising edge with its timestamp.
#[derive(Clone)]
pub struct MockBuzzer {
    clock: Clock,
    high: Rc<Cell<bool>>,
    rising_edges: Rc<RefCell<Vec<u64>>>,
}

impl MockBuzzer {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            high: Rc::new(Cell::new(false)),
            rising_edges: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn is_high(&self) -> bool {
        self.high.get()
    }

    /// Rising edge timestamps in nanoseconds.
    pub fn rising_edges(&self) -> Vec<u64> {
        self.rising_edges.borrow().clone()
    }

    pub fn edge_count(&self) -> usize {
        self.rising_edges.borrow().len()
    }

    pub fn clear(&self) {
        self.rising_edges.borrow_mut().clear();
    }

    /// Groups rising edges into bursts separated by at least `gap_ms` of
    /// silence. Returns the number of bursts.
    pub fn bursts(&self, gap_ms: u64) -> usize {
        self.burst_edges(gap_ms).len()
    }

    /// Rising edges split into bursts separated by at least `gap_ms` of
    /// silence.
    pub fn burst_edges(&self, gap_ms: u64) -> Vec<Vec<u64>> {
        let gap_ns = gap_ms * 1_000_000;
        let mut bursts: Vec<Vec<u64>> = Vec::new();
        for &edge in self.rising_edges.borrow().iter() {
            match bursts.last_mut() {
                Some(burst) if edge - burst[burst.len() - 1] < gap_ns => burst.push(edge),
                _ => bursts.push(vec![edge]),
            }
        }
        bursts
    }
}

impl ErrorType for MockBuzzer {
    type Error = Infallible;
}

impl OutputPin for MockBuzzer {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high.get() {
            self.rising_edges.borrow_mut().push(self.clock.now_ns());
        }
        self.high.set(true);
        Ok(())
    }
}

// ============================================================================
// Scripted Tap Pin
// ============================================================================

/// Tap pin that reads high during scripted `[start_ms, end_ms)` windows.
pub struct ScriptedTapPin {
    clock: Clock,
    presses: Vec<(u64, u64)>,
}

impl ScriptedTapPin {
    pub fn new(clock: &Clock, presses: &[(u64, u64)]) -> Self {
        Self {
            clock: clock.clone(),
            presses: presses.to_vec(),
        }
    }

    /// A pin nobody ever touches.
    pub fn untouched(clock: &Clock) -> Self {
        Self::new(clock, &[])
    }

    /// `count` taps of `hold_ms`, the first at `start_ms`, one every
    /// `spacing_ms`.
    pub fn taps(clock: &Clock, start_ms: u64, count: u64, spacing_ms: u64, hold_ms: u64) -> Self {
        let presses: Vec<_> = (0..count)
            .map(|i| {
                let start = start_ms + i * spacing_ms;
                (start, start + hold_ms)
            })
            .collect();
        Self::new(clock, &presses)
    }
}

impl ErrorType for ScriptedTapPin {
    type Error = Infallible;
}

impl InputPin for ScriptedTapPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let now = self.clock.now_ms();
        Ok(self
            .presses
            .iter()
            .any(|&(start, end)| now >= start && now < end))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Tone generator on a recording buzzer, driven by the simulated clock.
pub fn tone_generator(clock: &Clock) -> (ToneGenerator<MockBuzzer, MockDelay>, MockBuzzer) {
    let buzzer = MockBuzzer::new(clock);
    (
        ToneGenerator::new(buzzer.clone(), MockDelay::new(clock)),
        buzzer,
    )
}
