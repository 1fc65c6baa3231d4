//! Error types of the radio driver.

use thiserror::Error as ThisError;

/// Errors returned by [`Nrf24`](crate::driver::Nrf24).
///
/// `SpiE` and `PinE` are the error types of the SPI device and the chip-enable pin.
/// Configuration errors are raised before any bus traffic takes place.
///
/// Checksum failures, receive queue overflow and malformed pipe numbers are not errors;
/// they are counted in [`LinkStats`](crate::driver::LinkStats).
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<SpiE, PinE> {
    /// The SPI transfer failed.
    #[error("SPI transfer failed: {0:?}")]
    Spi(SpiE),
    /// Driving the chip-enable line failed.
    #[error("chip-enable pin error: {0:?}")]
    Pin(PinE),
    /// Channel above 125.
    #[error("channel {0} is out of range (0-125)")]
    InvalidChannel(u8),
    /// Pipe number above 5.
    #[error("pipe {0} does not exist")]
    InvalidPipe(u8),
    /// Pipe mask with bits set above bit 5.
    #[error("pipe mask {0:#04x} has bits above 0x3f")]
    InvalidPipeMask(u8),
    /// More data than one frame can carry.
    #[error("{0} bytes do not fit in one 30 byte frame")]
    PayloadTooLong(usize),
    /// The previous transmission did not complete in time; the radio was forced back
    /// into receive mode and the frame was not sent.
    #[error("transmission timed out, radio reset to receive mode")]
    TxTimeout,
    /// The shared driver instance has not been set up.
    #[error("radio not initialized")]
    NotInitialized,
}
