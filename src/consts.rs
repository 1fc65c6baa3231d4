//! Constants used across the radio link implementation.
//!
//! This module defines the protocol-wide values used for frame layout, channel limits,
//! pipe bookkeeping, timing and buffer sizing.
//!
//! ## Key Concepts
//!
//! - **Hardware payload**: the radio always exchanges [`PAYLOAD_SIZE`] bytes per packet.
//! - **Frame overhead**: one length byte and one checksum byte, leaving [`MAX_DATA_LEN`]
//!   bytes for application data.
//! - **Pipes**: six logical receive channels, addressed by a six bit mask.
//! - **Timing**: transmissions that do not complete within [`TX_TIMEOUT_MS`] are abandoned
//!   and the radio is forced back into receive mode.
//!
//! These values should be used wherever framing or buffer logic is implemented to ensure
//! consistent frame boundaries.

/// Size (in bytes) of the fixed payload exchanged with the radio in one packet.
pub const PAYLOAD_SIZE: u8 = 32;

/// See [`PAYLOAD_SIZE`](crate::consts::PAYLOAD_SIZE)
pub const PAYLOAD_SIZE_USIZE: usize = PAYLOAD_SIZE as usize;

/// Index of the data length byte inside a frame.
pub const DATA_COUNT_INDEX: usize = 0;

/// Maximum number of application bytes carried by one frame.
///
/// The hardware payload minus the length byte and the checksum byte.
pub const MAX_DATA_LEN: u8 = PAYLOAD_SIZE - 2;

/// See [`MAX_DATA_LEN`](crate::consts::MAX_DATA_LEN)
pub const MAX_DATA_LEN_USIZE: usize = MAX_DATA_LEN as usize;

/// Byte used to pad a frame after the checksum.
pub const PAYLOAD_FILLER: u8 = 0x00;

/// Highest RF channel accepted by the driver (2400 MHz + channel).
pub const MAX_CHANNEL: u8 = 125;

/// Channel selected by [`RadioConfig::default`](crate::config::RadioConfig::default).
pub const DEFAULT_CHANNEL: u8 = 66;

/// Number of hardware receive pipes.
pub const PIPE_COUNT: u8 = 6;

/// See [`PIPE_COUNT`](crate::consts::PIPE_COUNT)
pub const PIPE_COUNT_USIZE: usize = PIPE_COUNT as usize;

/// Mask with one bit per receive pipe; also the widest mask the enable register accepts.
pub const ALL_PIPES: u8 = 0x3F;

/// Default time (in milliseconds) a transmission may take before the driver
/// forces the radio back into receive mode.
pub const TX_TIMEOUT_MS: u16 = 100;

/// Time (in milliseconds) the radio needs after power on before configuration sticks.
pub const POWER_ON_SETTLE_MS: u32 = 50;

/// Default capacity (in bytes) of each per-pipe receive queue.
pub const PIPE_QUEUE_LEN: usize = 64;

/// Number of bytes in a radio address (32 bit MSB group + 8 bit LSB).
pub const ADDRESS_LEN: usize = 5;
