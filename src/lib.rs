//! # nrf24-homespace
//!
//! A portable, no_std Rust driver for the Nordic nRF24L01 2.4 GHz packet radio, together
//! with the `home_space` tree-address routing layer that runs on top of it.
//!
//! The driver treats the radio as a best-effort, half-duplex link:
//! - `embedded-hal` traits for the SPI bus, the chip-enable line and delays
//! - a variable-length payload (up to 30 bytes) framed inside the fixed 32-byte hardware
//!   payload, protected by a one byte additive checksum
//! - an interrupt-driven receive path that demultiplexes the six hardware pipes into
//!   per-pipe byte queues
//! - a transmit path that can never stay wedged: a missed completion interrupt or a stuck
//!   transmitter is recovered by a forced return to receive mode after a timeout
//! - interrupt-safe sharing of one driver instance with `critical-section`
//!
//! ## Crate features
//! | Feature         | Description |
//! |-----------------|-------------|
//! | `std`           | Disables `#![no_std]` support |
//! | `isr` (default) | Global driver singleton, IRQ glue and the ISR millisecond counter, built on `critical_section::with` |
//! | `defmt-0-3`     | Uses `defmt` logging |
//! | `log`           | Uses `log` logging |
//!
//! ## Wire format
//!
//! Every hardware payload is 32 bytes:
//!
//! | Offset   | Size | Meaning |
//! |----------|------|---------|
//! | 0        | 1    | data length N, 0 ≤ N ≤ 30 |
//! | 1..N     | N    | payload bytes |
//! | N+1      | 1    | checksum = !(N + Σ payload) |
//! | N+2..31  | rest | filler `0x00` |
//!
//! The `home_space` layer carries a 9 byte header (destination, source, command, count)
//! followed by the command data inside that payload. See [`home_space`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nrf24_homespace::{DataPipe, RadioConfig, Nrf24};
//!
//! let mut radio: Nrf24<_, _, _> = Nrf24::new(spi, ce, &MILLIS, RadioConfig::default());
//! radio.initialize(&mut delay)?;
//! radio.write_payload(b"hello")?;
//!
//! // From the radio IRQ line (falling edge):
//! radio.handle_irq()?;
//!
//! let mut buf = [0u8; 16];
//! let n = radio.read_pipe(DataPipe::DP1, &mut buf);
//! ```
//!
//! With the `isr` feature, use [`init_radio!`], [`setup_radio!`] and [`radio_irq!`] or the functions in [`irq`]
//! to share the driver between `main` and the interrupt handler.
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "isr")]
pub use critical_section;

pub use heapless;

#[macro_use]
mod logging;

pub mod config;
pub mod consts;
pub mod driver;
pub mod error;
pub mod frame;
pub mod home_space;
#[cfg(feature = "isr")]
pub mod irq;
pub mod queue;
pub mod register;
pub mod status;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::config::{DataPipe, RadioAddress, RadioConfig};
pub use crate::driver::{LinkStats, Nrf24, RadioMode};
pub use crate::error::Error;
pub use crate::timer::Clock;
