//! nRF24L01 link layer driver.
//!
//! This module provides the [`Nrf24`] struct, which drives an nRF24L01 over an
//! `embedded-hal` [`SpiDevice`] and a chip-enable [`OutputPin`]. It layers a variable
//! length, checksummed frame over the fixed 32 byte hardware payload and buffers received
//! data per pipe.
//!
//! ## Modes
//!
//! The radio is half duplex. It rests in [`RadioMode::Receiving`] and only enters
//! [`RadioMode::Transmitting`] for the duration of one frame. It leaves that mode when:
//! - the radio reports completion (`TX_DS`) or gives up (`MAX_RT`), seen either by
//!   [`handle_irq`](Nrf24::handle_irq) or by polling,
//! - the transmit timeout expires, in which case the radio is forcibly reset to receive
//!   mode and the reset is counted in [`LinkStats::resets`].
//!
//! The timeout runs from the moment the frame was handed to the radio, so a wedged radio
//! or a lost interrupt can never leave the driver stuck in transmit mode.
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::{digital::Mock as Pin, spi::Mock as Spi};
//! use nrf24_homespace::{config::RadioConfig, driver::Nrf24, timer::MillisCounter};
//!
//! static MILLIS: MillisCounter = MillisCounter::new();
//!
//! # let mut spi = Spi::new(&[]);
//! # let mut ce = Pin::new(&[]);
//! let radio: Nrf24<_, _, _> = Nrf24::new(spi.clone(), ce.clone(), &MILLIS, RadioConfig::default());
//! assert_eq!(radio.config().get_channel(), 66);
//! # spi.done();
//! # ce.done();
//! ```

use crate::config::{DataPipe, RadioAddress, RadioConfig};
use crate::consts::{
    ADDRESS_LEN, ALL_PIPES, MAX_CHANNEL, PAYLOAD_FILLER, PAYLOAD_SIZE,
    PAYLOAD_SIZE_USIZE, PIPE_COUNT_USIZE, PIPE_QUEUE_LEN, POWER_ON_SETTLE_MS,
};
use crate::error::Error;
use crate::frame::{FrameError, decode_frame, encode_frame, frame_chunks};
use crate::queue::PipeQueue;
use crate::register::{Command, Register, bits};
use crate::status::{FifoStatus, ObserveTx, Status};
use crate::timer::{Clock, elapsed_ms};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, SpiDevice};
use nb::block;

/// Error type of a driver built on `SPI` and `CE`.
pub type RadioError<SPI, CE> =
    Error<<SPI as spi::ErrorType>::Error, <CE as digital::ErrorType>::Error>;

/// Operating mode of the radio, as tracked by the driver.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RadioMode {
    /// Powered down or not yet initialized.
    #[default]
    Standby,
    /// Listening on the enabled pipes.
    Receiving,
    /// A frame has been handed to the radio and is being sent.
    Transmitting,
}

/// Link statistics. Every counter only grows and saturates at `u16::MAX`.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LinkStats {
    /// Received frames rejected because of a bad length byte or checksum.
    pub checksum_errors: u16,
    /// Forced returns to receive mode after a transmit timeout.
    pub resets: u16,
    /// Received bytes dropped because their pipe queue was full.
    pub dropped_bytes: u16,
}

/// Driver for one nRF24L01.
///
/// ## Type Parameters
///
/// - `SPI`: the radio's [`SpiDevice`]; it owns chip select
/// - `CE`: the chip-enable [`OutputPin`]
/// - `CLK`: the millisecond [`Clock`] used for the transmit timeout
/// - `N`: capacity in bytes of each of the six receive queues
///
/// ## Notes
///
/// - [`handle_irq`](Nrf24::handle_irq) must run on the falling edge of the radio's IRQ
///   line. When the driver is shared with an interrupt handler, use the helpers in
///   [`crate::irq`] so both contexts go through `critical_section`.
/// - Only [`write_payload`](Nrf24::write_payload) blocks, and never for longer than the
///   transmit timeout per frame.
#[derive(Debug)]
pub struct Nrf24<SPI, CE, CLK, const N: usize = PIPE_QUEUE_LEN> {
    spi: SPI,
    ce: CE,
    clock: CLK,
    config: RadioConfig,
    mode: RadioMode,
    tx_started: u16,
    queues: [PipeQueue<N>; PIPE_COUNT_USIZE],
    stats: LinkStats,
    buf: [u8; PAYLOAD_SIZE_USIZE + 1],
}

impl<SPI, CE, CLK, const N: usize> Nrf24<SPI, CE, CLK, N>
where
    SPI: SpiDevice,
    CE: OutputPin,
    CLK: Clock,
{
    /// Creates a driver. No bus traffic happens until [`initialize`](Nrf24::initialize).
    pub fn new(spi: SPI, ce: CE, clock: CLK, config: RadioConfig) -> Self {
        Self {
            spi,
            ce,
            clock,
            config,
            mode: RadioMode::Standby,
            tx_started: 0,
            queues: core::array::from_fn(|_| PipeQueue::new()),
            stats: LinkStats::default(),
            buf: [0; PAYLOAD_SIZE_USIZE + 1],
        }
    }

    /// Releases the bus, the pin and the clock.
    pub fn release(self) -> (SPI, CE, CLK) {
        (self.spi, self.ce, self.clock)
    }

    /// Brings the radio from power-on into receive mode using the stored configuration.
    ///
    /// Waits for the radio to settle, programs channel, payload widths, auto
    /// acknowledgement, enabled pipes and addresses, empties both FIFOs, clears pending
    /// interrupts and starts listening.
    ///
    /// # Errors
    /// [`Error::InvalidChannel`] or [`Error::InvalidPipeMask`] for a bad configuration,
    /// detected before touching the bus.
    pub fn initialize<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), RadioError<SPI, CE>> {
        if !self.config.channel_valid() {
            return Err(Error::InvalidChannel(self.config.channel));
        }
        if !self.config.pipes_valid() {
            return Err(Error::InvalidPipeMask(self.config.pipes));
        }

        self.ce_low()?;
        delay.delay_ms(POWER_ON_SETTLE_MS);

        self.write_register(Register::RF_CH, self.config.channel)?;
        for register in Register::RX_PW {
            self.write_register(register, PAYLOAD_SIZE)?;
        }
        self.write_register(Register::EN_AA, self.config.auto_ack)?;
        self.write_register(Register::EN_RXADDR, self.config.pipes)?;

        for pipe in DataPipe::ALL {
            if let Some(address) = self.config.rx_addresses[pipe.index()] {
                self.write_rx_address(pipe, address)?;
            }
        }
        if let Some(address) = self.config.tx_address {
            self.write_address(Register::TX_ADDR, address)?;
        }

        self.flush_tx()?;
        self.flush_rx()?;
        self.write_register(Register::STATUS, bits::ALL_IRQ)?;
        self.write_register(Register::CONFIG, bits::CONFIG_RX)?;
        self.ce_high()?;
        self.mode = RadioMode::Receiving;

        debug!(
            "nrf24: listening on channel {} with pipe mask {}",
            self.config.channel, self.config.pipes
        );
        Ok(())
    }

    /// Stored configuration, updated by the setters.
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Current mode.
    pub fn mode(&self) -> RadioMode {
        self.mode
    }

    /// Snapshot of the link statistics.
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Selects the RF channel (2400 MHz + `channel`).
    ///
    /// # Errors
    /// [`Error::InvalidChannel`] if `channel > 125`; the radio is left untouched.
    pub fn set_channel(&mut self, channel: u8) -> Result<(), RadioError<SPI, CE>> {
        if channel > MAX_CHANNEL {
            return Err(Error::InvalidChannel(channel));
        }
        self.write_register(Register::RF_CH, channel)?;
        self.config.channel = channel;
        Ok(())
    }

    /// Reads the RF channel back from the radio.
    pub fn channel(&mut self) -> Result<u8, RadioError<SPI, CE>> {
        self.read_register(Register::RF_CH)
    }

    /// Sets the receive address of `pipe`.
    ///
    /// Pipes 0 and 1 take the whole 40 bit address. Pipes 2-5 only take `low`; their
    /// upper 32 bits are shared with pipe 1 and `high` is ignored.
    ///
    /// # Errors
    /// [`Error::InvalidPipe`] if `pipe > 5`.
    pub fn set_receive_address(
        &mut self,
        pipe: u8,
        high: u32,
        low: u8,
    ) -> Result<(), RadioError<SPI, CE>> {
        let pipe = DataPipe::try_from(pipe).map_err(Error::InvalidPipe)?;
        let address = RadioAddress::new(high, low);
        self.write_rx_address(pipe, address)?;
        self.config.rx_addresses[pipe.index()] = Some(address);
        Ok(())
    }

    /// Sets the address every following frame is sent to.
    ///
    /// Waits for a frame still in flight to finish, at most for the transmit timeout, and
    /// writes the address with CE low so the radio is in standby.
    pub fn set_transmit_address(&mut self, high: u32, low: u8) -> Result<(), RadioError<SPI, CE>> {
        let _ = block!(self.try_idle())?;
        let address = RadioAddress::new(high, low);
        self.ce_low()?;
        self.write_address(Register::TX_ADDR, address)?;
        if self.mode == RadioMode::Receiving {
            self.ce_high()?;
        }
        self.config.tx_address = Some(address);
        Ok(())
    }

    /// Enables the pipes set in `mask`, keeping the others as they are.
    ///
    /// # Errors
    /// [`Error::InvalidPipeMask`] if `mask > 0x3F`; the radio is left untouched.
    pub fn enable_pipes(&mut self, mask: u8) -> Result<(), RadioError<SPI, CE>> {
        if mask > ALL_PIPES {
            return Err(Error::InvalidPipeMask(mask));
        }
        let enabled = self.read_register(Register::EN_RXADDR)? | mask;
        self.write_register(Register::EN_RXADDR, enabled)?;
        self.config.pipes = enabled;
        Ok(())
    }

    /// Disables the pipes set in `mask`, keeping the others as they are.
    ///
    /// # Errors
    /// [`Error::InvalidPipeMask`] if `mask > 0x3F`; the radio is left untouched.
    pub fn disable_pipes(&mut self, mask: u8) -> Result<(), RadioError<SPI, CE>> {
        if mask > ALL_PIPES {
            return Err(Error::InvalidPipeMask(mask));
        }
        let enabled = self.read_register(Register::EN_RXADDR)? & !mask;
        self.write_register(Register::EN_RXADDR, enabled)?;
        self.config.pipes = enabled;
        Ok(())
    }

    /// Reads the status register.
    pub fn status(&mut self) -> Result<Status, RadioError<SPI, CE>> {
        self.command(Command::Nop)
    }

    /// Reads the FIFO status register.
    pub fn fifo_status(&mut self) -> Result<FifoStatus, RadioError<SPI, CE>> {
        self.read_register(Register::FIFO_STATUS).map(FifoStatus::from)
    }

    /// Whether the hardware TX FIFO is empty.
    pub fn tx_fifo_empty(&mut self) -> Result<bool, RadioError<SPI, CE>> {
        Ok(self.fifo_status()?.tx_empty())
    }

    /// Reads the lost packet and retransmission counters.
    pub fn observe_tx(&mut self) -> Result<ObserveTx, RadioError<SPI, CE>> {
        self.read_register(Register::OBSERVE_TX).map(ObserveTx::from)
    }

    /// Empties the hardware TX FIFO.
    pub fn flush_tx(&mut self) -> Result<(), RadioError<SPI, CE>> {
        self.command(Command::FlushTx).map(|_| ())
    }

    /// Empties the hardware RX FIFO.
    pub fn flush_rx(&mut self) -> Result<(), RadioError<SPI, CE>> {
        self.command(Command::FlushRx).map(|_| ())
    }

    /// Powers the radio down. Any frame in flight is lost.
    ///
    /// Call [`initialize`](Nrf24::initialize) to resume.
    pub fn power_down(&mut self) -> Result<(), RadioError<SPI, CE>> {
        self.ce_low()?;
        self.write_register(Register::CONFIG, bits::CONFIG_BASE)?;
        self.mode = RadioMode::Standby;
        debug!("nrf24: powered down");
        Ok(())
    }

    /// Whether a frame is still in flight.
    ///
    /// Polls the radio for completion, returning to receive mode if the frame is done.
    /// Useful when the IRQ line is not wired.
    pub fn is_sending(&mut self) -> Result<bool, RadioError<SPI, CE>> {
        if self.mode != RadioMode::Transmitting {
            return Ok(false);
        }
        if self.status()?.tx_concluded() {
            self.finish_transmission()?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Hands one frame to the radio without blocking.
    ///
    /// Returns `WouldBlock` while the previous frame is in flight. If that frame has been
    /// in flight for longer than the transmit timeout, the radio is reset to receive mode
    /// and `data` is abandoned with [`Error::TxTimeout`].
    ///
    /// # Errors
    /// [`Error::PayloadTooLong`] if `data` is longer than 30 bytes.
    pub fn try_write_frame(&mut self, data: &[u8]) -> nb::Result<(), RadioError<SPI, CE>> {
        let frame = encode_frame(data).map_err(|FrameError::TooLong(len)| {
            nb::Error::Other(Error::PayloadTooLong(len))
        })?;

        if self.try_idle()? {
            return Err(nb::Error::Other(Error::TxTimeout));
        }

        self.ce_low()?;
        self.mode = RadioMode::Transmitting;
        self.tx_started = self.clock.millis();
        self.write_register(Register::CONFIG, bits::CONFIG_TX)?;
        self.flush_tx()?;
        self.buf[0] = Command::WriteTxPayload.opcode();
        self.buf[1..].copy_from_slice(&frame);
        let _ = self.transfer(PAYLOAD_SIZE_USIZE)?;
        self.ce_high()?;
        trace!("nrf24: sending {} bytes", data.len());
        Ok(())
    }

    /// Sends `data`, split into as many frames as needed.
    ///
    /// Every frame but the last carries 30 bytes. Blocks while the previous frame is in
    /// flight, at most for the transmit timeout. Empty data sends nothing.
    ///
    /// # Errors
    /// [`Error::TxTimeout`] if a frame could not be handed to the radio in time. That
    /// frame and every following one are dropped; retrying is up to the caller.
    pub fn write_payload(&mut self, data: &[u8]) -> Result<(), RadioError<SPI, CE>> {
        for chunk in frame_chunks(data) {
            block!(self.try_write_frame(chunk))?;
        }
        Ok(())
    }

    /// Forces the radio back into receive mode, abandoning any frame in flight.
    ///
    /// Counted in [`LinkStats::resets`].
    pub fn reset_to_receive(&mut self) -> Result<(), RadioError<SPI, CE>> {
        self.stats.resets = self.stats.resets.saturating_add(1);
        self.write_register(Register::STATUS, bits::ALL_IRQ)?;
        self.ce_low()?;
        self.write_register(Register::CONFIG, bits::CONFIG_RX)?;
        self.ce_high()?;
        self.mode = RadioMode::Receiving;
        Ok(())
    }

    /// Services the radio interrupt.
    ///
    /// A finished transmission returns the radio to receive mode. A received frame is read,
    /// validated and its data appended to the queue of its pipe; frames with a bad checksum
    /// are counted and discarded.
    pub fn handle_irq(&mut self) -> Result<(), RadioError<SPI, CE>> {
        let status = self.status()?;
        if status.tx_concluded() {
            if status.max_retransmits() {
                trace!("nrf24: retransmits exhausted");
            }
            return self.finish_transmission();
        }
        if status.data_ready() {
            match status.data_pipe() {
                Some(pipe) => self.receive_frame(pipe)?,
                None => {
                    trace!("nrf24: ignoring payload on pipe {}", status.pipe_number());
                    self.write_register(Register::STATUS, bits::RX_DR)?;
                }
            }
        }
        Ok(())
    }

    /// Whether the radio holds a received frame.
    ///
    /// Always `false` while transmitting. A transmission stuck past the timeout is
    /// recovered here as well.
    pub fn data_ready(&mut self) -> Result<bool, RadioError<SPI, CE>> {
        if self.mode == RadioMode::Transmitting {
            if self.tx_timed_out() {
                warning!("nrf24: transmission timed out, forcing receive mode");
                self.reset_to_receive()?;
            }
            return Ok(false);
        }
        Ok(self.status()?.data_ready())
    }

    /// Number of bytes queued for `pipe`.
    pub fn available(&self, pipe: DataPipe) -> usize {
        self.queues[pipe.index()].len()
    }

    /// Moves up to `buf.len()` queued bytes of `pipe` into `buf`, returning the count.
    pub fn read_pipe(&mut self, pipe: DataPipe, buf: &mut [u8]) -> usize {
        self.queues[pipe.index()].read(buf)
    }

    /// Returns the queued byte of `pipe` at `offset` without consuming it.
    pub fn peek_pipe(&self, pipe: DataPipe, offset: usize) -> Option<u8> {
        self.queues[pipe.index()].peek(offset)
    }

    /// `WouldBlock` while a frame is in flight. Once the radio is idle, returns whether the
    /// frame had to be abandoned because of the transmit timeout.
    fn try_idle(&mut self) -> nb::Result<bool, RadioError<SPI, CE>> {
        if !self.is_sending()? {
            return Ok(false);
        }
        if !self.tx_timed_out() {
            return Err(nb::Error::WouldBlock);
        }
        warning!("nrf24: transmission timed out, forcing receive mode");
        self.reset_to_receive()?;
        Ok(true)
    }

    fn tx_timed_out(&self) -> bool {
        elapsed_ms(self.tx_started, self.clock.millis()) >= self.config.tx_timeout_ms
    }

    fn finish_transmission(&mut self) -> Result<(), RadioError<SPI, CE>> {
        self.mode = RadioMode::Receiving;
        self.write_register(Register::CONFIG, bits::CONFIG_RX)?;
        self.write_register(Register::STATUS, bits::TX_DS | bits::MAX_RT)
    }

    fn receive_frame(&mut self, pipe: DataPipe) -> Result<(), RadioError<SPI, CE>> {
        self.buf[0] = Command::ReadRxPayload.opcode();
        self.buf[1..].fill(PAYLOAD_FILLER);
        let _ = self.transfer(PAYLOAD_SIZE_USIZE)?;
        let mut frame = [PAYLOAD_FILLER; PAYLOAD_SIZE_USIZE];
        frame.copy_from_slice(&self.buf[1..]);
        self.flush_rx()?;
        self.write_register(Register::STATUS, bits::RX_DR)?;

        let decoded = decode_frame(&frame);
        if !decoded.checksum_valid {
            self.stats.checksum_errors = self.stats.checksum_errors.saturating_add(1);
            warning!(
                "nrf24: bad frame on pipe {} (length byte {})",
                pipe.number(),
                decoded.len
            );
            return Ok(());
        }

        let queue = &mut self.queues[pipe.index()];
        let mut dropped: u16 = 0;
        for byte in decoded.data.iter() {
            if !queue.push(*byte) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            self.stats.dropped_bytes = self.stats.dropped_bytes.saturating_add(dropped);
            warning!("nrf24: pipe {} queue full, {} bytes dropped", pipe.number(), dropped);
        }
        trace!("nrf24: {} bytes on pipe {}", decoded.data.len(), pipe.number());
        Ok(())
    }

    fn write_rx_address(
        &mut self,
        pipe: DataPipe,
        address: RadioAddress,
    ) -> Result<(), RadioError<SPI, CE>> {
        let register = Register::RX_ADDR[pipe.index()];
        if pipe.has_full_address() {
            self.write_address(register, address)
        } else {
            self.write_register(register, address.low())
        }
    }

    fn write_address(
        &mut self,
        register: Register,
        address: RadioAddress,
    ) -> Result<(), RadioError<SPI, CE>> {
        self.buf[0] = Command::write(register);
        self.buf[1..=ADDRESS_LEN].copy_from_slice(&address.to_bytes());
        self.transfer(ADDRESS_LEN).map(|_| ())
    }

    fn read_register(&mut self, register: Register) -> Result<u8, RadioError<SPI, CE>> {
        self.buf[0] = Command::read(register);
        self.buf[1] = Command::Nop.opcode();
        let _ = self.transfer(1)?;
        Ok(self.buf[1])
    }

    fn write_register(&mut self, register: Register, value: u8) -> Result<(), RadioError<SPI, CE>> {
        self.buf[0] = Command::write(register);
        self.buf[1] = value;
        self.transfer(1).map(|_| ())
    }

    fn command(&mut self, command: Command) -> Result<Status, RadioError<SPI, CE>> {
        self.buf[0] = command.opcode();
        self.transfer(0)
    }

    /// Clocks out the opcode in `buf[0]` followed by `len` bytes, in place.
    fn transfer(&mut self, len: usize) -> Result<Status, RadioError<SPI, CE>> {
        self.spi
            .transfer_in_place(&mut self.buf[..=len])
            .map_err(Error::Spi)?;
        Ok(Status::from(self.buf[0]))
    }

    fn ce_low(&mut self) -> Result<(), RadioError<SPI, CE>> {
        self.ce.set_low().map_err(Error::Pin)
    }

    fn ce_high(&mut self) -> Result<(), RadioError<SPI, CE>> {
        self.ce.set_high().map_err(Error::Pin)
    }
}
