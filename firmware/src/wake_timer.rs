//! Periodic wake source built on the RTC wakeup timer.
//!
//! The wakeup timer counts the 32.768 kHz LSE divided by 16 (2048 Hz) and
//! fires once per [`WakePeriod`]. Its event is routed through EXTI line 20
//! so it also brings the MCU out of STOP mode.
//!
//! # Interrupt Path
//!
//! The `RTC` handler clears the wakeup flags, bumps [`WAKE_COUNTER`] and
//! signals the main task. Nothing else runs in interrupt context.

use annoyatron::{WakeCounter, WakePeriod};
use embassy_stm32::pac;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use pac::interrupt;

/// EXTI line number for the RTC wakeup event (fixed at line 20 on STM32L0)
const RTC_WAKEUP_EXTI_LINE: usize = 20;

/// IMR register index for EXTI line 20 (lines 0-31 are in IMR1)
const IMR1_REG_IDX: usize = 0;

/// Write protection unlock keys for the RTC registers
const RTC_UNLOCK_KEYS: [u8; 2] = [0xCA, 0x53];

/// Any other value re-locks the RTC registers
const RTC_LOCK_KEY: u8 = 0xFF;

/// Wake ticks since the last annoyance episode.
///
/// Incremented only by the `RTC` interrupt handler.
pub static WAKE_COUNTER: WakeCounter = WakeCounter::new();

/// Wakes the main task after every timer firing.
static WAKE_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// RTC interrupt handler (wakeup timer via EXTI line 20).
#[interrupt]
fn RTC() {
    let rtc = pac::RTC;
    let exti = pac::EXTI;

    rtc.isr().modify(|w| w.set_wutf(false));
    exti.pr(IMR1_REG_IDX)
        .modify(|w| w.set_line(RTC_WAKEUP_EXTI_LINE, true));

    WAKE_COUNTER.tick();
    WAKE_SIGNAL.signal(());
}

/// Starts the wakeup timer with the given period and unmasks its interrupt.
///
/// The RTC must already be clocked from the LSE (done by the RCC config).
/// The whole reprogramming sequence runs with interrupts masked so the
/// handler never sees a half-configured timer.
pub fn start_wake_timer(period: WakePeriod) {
    let rtc = pac::RTC;
    let exti = pac::EXTI;

    cortex_m::interrupt::free(|_| {
        // Backup domain write access for the RTC registers
        pac::PWR.cr().modify(|w| w.set_dbp(true));

        for key in RTC_UNLOCK_KEYS {
            rtc.wpr().write(|w| w.set_key(key));
        }

        rtc.cr().modify(|w| {
            w.set_wute(false);
            w.set_wutie(false);
        });
        while !rtc.isr().read().wutwf() {}

        rtc.wutr()
            .write(|w| w.set_wut(period.wakeup_cycles() - 1));
        rtc.isr().modify(|w| w.set_wutf(false));
        rtc.cr().modify(|w| {
            w.set_wucksel(pac::rtc::vals::Wucksel::DIV16);
            w.set_wutie(true);
            w.set_wute(true);
        });

        rtc.wpr().write(|w| w.set_key(RTC_LOCK_KEY));

        exti.imr(IMR1_REG_IDX)
            .modify(|w| w.set_line(RTC_WAKEUP_EXTI_LINE, true));
        exti.rtsr(IMR1_REG_IDX)
            .modify(|w| w.set_line(RTC_WAKEUP_EXTI_LINE, true));
        exti.pr(IMR1_REG_IDX)
            .modify(|w| w.set_line(RTC_WAKEUP_EXTI_LINE, true));
    });

    WAKE_COUNTER.reset();

    unsafe {
        cortex_m::peripheral::NVIC::unmask(embassy_stm32::interrupt::RTC);
    };
}

/// Suspends the main task until the next timer firing.
pub async fn next_wake() {
    WAKE_SIGNAL.wait().await;
}
