#![cfg_attr(not(test), no_std)]

//! Scheduling core of a battery-powered piezo prank device.
//!
//! After power-up the operator configures the device by tapping a single
//! contact. The device then sleeps on a periodic wake timer and, at random
//! intervals, plays a random beep pattern until its battery is removed.
//!
//! # Core Concepts
//!
//! - **`ToneGenerator`**: bit-bangs square waves on the piezo pin
//! - **`CycleDelay`**: cycle-counting busy-wait that times the tones
//! - **`TapReader`**: polls the tap pin, debounces and counts taps
//! - **`ConfigurationStage`**: the boot-time tap dialogue producing a `DeviceConfig`
//! - **`WakeCounter`**: tick counter incremented by the wake timer interrupt
//! - **`AnnoyanceScheduler`**: decides on each wake whether to decay and whether to beep
//!
//! Everything is generic over the `embedded-hal` 1.0 pin and delay traits.
//! Pins must be infallible, which holds for on-chip GPIO.

pub(crate) mod fmt;

pub mod config;
pub mod configuration;
pub mod delay;
pub mod episode;
pub mod scheduler;
pub mod tap;
pub mod tone;
pub mod wake;

pub use config::{DeviceConfig, TimingProfile, WakePeriod, PRODUCTION, TEST};
pub use configuration::{ConfigurationStage, Setup};
pub use delay::CycleDelay;
pub use episode::{GlideBand, Pattern};
pub use scheduler::AnnoyanceScheduler;
pub use tap::TapReader;
pub use tone::{Tone, ToneGenerator};
pub use wake::WakeCounter;
