//! Millisecond time base for the transmit timeout.
//!
//! The driver only needs a wrapping 16 bit millisecond count. Every elapsed-time check is a
//! `wrapping_sub`, so a rollover every 65.5 s is harmless as long as the timeout is shorter.
//!
//! Contains:
//! - [`Clock`]: the time source trait consumed by [`Nrf24`](crate::driver::Nrf24)
//! - `compute_ocr_value`: runtime OCR calculator for a 1 ms timer interrupt
//! - `const_ocr_value`: compile-time OCR calculator
//! - `MillisCounter`: a counter ticked from that interrupt (feature `isr`)
//!
//! Common prescalers: (For use with `compute_ocr_value` and `const_ocr_value` at 16 MHz)
//!
//! | PRESCALER | TIMER_COUNTS | Overflow Interval |
//! |-----------|--------------|-------------------|
//! |        64 |          250 |              1 ms |
//! |       256 |          125 |              2 ms |
//! |       256 |          250 |              4 ms |
//! |      1024 |          125 |              8 ms |
//! |      1024 |          250 |             16 ms |

use libm::round;

#[cfg(feature = "isr")]
mod isr;
#[cfg(feature = "isr")]
pub use isr::MillisCounter;

/// 1,000,000 microseconds = 1 second
pub const MICROSECONDS_PER_SECOND: u32 = 1_000_000;

/// A monotonic, wrapping millisecond clock.
pub trait Clock {
    /// Milliseconds since an arbitrary origin, wrapping at `u16::MAX`.
    fn millis(&self) -> u16;
}

impl<C: Clock> Clock for &C {
    fn millis(&self) -> u16 {
        (**self).millis()
    }
}

/// Milliseconds from `start` to `now`, tolerant of one wraparound.
pub fn elapsed_ms(start: u16, now: u16) -> u16 {
    now.wrapping_sub(start)
}

/// Computes the OCR value for an AVR timer (CTC mode)
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 8, 64, 256)
/// - `tick_us`: desired tick interval in microseconds (e.g., 1000.0 for the millisecond clock)
///
/// # Returns
/// - OCR value for OCRnA (rounds to nearest integer)
pub fn compute_ocr_value(f_cpu: u32, prescaler: u32, tick_us: f32) -> u16 {
    let ticks_per_second = f_cpu as f64 / prescaler as f64;
    let ticks_per_tick = ticks_per_second * (tick_us as f64 / MICROSECONDS_PER_SECOND as f64);
    round(ticks_per_tick) as u16
}

/// Compile-time OCR value calculator
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 8, 64, 256)
/// - `tick_us`: desired tick interval in whole microseconds
///
/// # Returns
/// - OCR value for OCRnA (truncated)
pub const fn const_ocr_value(f_cpu: u32, prescaler: u32, tick_us: u32) -> u16 {
    ((f_cpu / prescaler) as u64 * tick_us as u64 / MICROSECONDS_PER_SECOND as u64) as u16
}
