use super::Clock;
use core::cell::Cell;
use critical_section::Mutex;

/// A wrapping millisecond counter advanced from a 1 ms timer interrupt.
///
/// Meant to live in a `static` and be shared by the timer ISR, the radio driver and the
/// main loop.
///
/// # Example
/// ```rust
/// use nrf24_homespace::timer::{Clock, MillisCounter};
///
/// static MILLIS: MillisCounter = MillisCounter::new();
///
/// // #[interrupt]
/// fn timer0_compa() {
///     MILLIS.tick();
/// }
///
/// timer0_compa();
/// assert_eq!(MILLIS.millis(), 1);
/// ```
#[derive(Debug)]
pub struct MillisCounter {
    count: Mutex<Cell<u16>>,
}

impl Default for MillisCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl MillisCounter {
    /// Creates a counter starting at zero.
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(Cell::new(0)),
        }
    }

    /// Advances the counter by one millisecond. Call from the timer interrupt.
    pub fn tick(&self) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            count.set(count.get().wrapping_add(1));
        });
    }

    /// Overwrites the current count.
    pub fn set(&self, millis: u16) {
        critical_section::with(|cs| self.count.borrow(cs).set(millis));
    }
}

impl Clock for MillisCounter {
    fn millis(&self) -> u16 {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_wraps() {
        let counter = MillisCounter::new();
        counter.set(u16::MAX);
        counter.tick();
        assert_eq!(counter.millis(), 0);
        counter.tick();
        assert_eq!(counter.millis(), 1);
    }
}
