//! Test doubles: a simulated nRF24L01 and helpers for `embedded-hal-mock`.

use crate::config::RadioConfig;
use crate::consts::{ADDRESS_LEN, PAYLOAD_SIZE_USIZE};
use crate::driver::Nrf24;
use crate::frame::encode_frame;
use crate::register::{Command, Register, bits};
use crate::timer::Clock;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};
use embedded_hal_mock::eh1::spi::Transaction as SpiTransaction;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

const HW_FIFO_DEPTH: usize = 3;

/// Register file and FIFOs of one simulated radio.
#[derive(Debug, Default)]
pub(crate) struct ChipState {
    pub regs: [u8; 0x18],
    pub rx_addr_p0: [u8; ADDRESS_LEN],
    pub rx_addr_p1: [u8; ADDRESS_LEN],
    pub tx_addr: [u8; ADDRESS_LEN],
    pub rx_fifo: VecDeque<(u8, [u8; PAYLOAD_SIZE_USIZE])>,
    pub tx_fifo: VecDeque<[u8; PAYLOAD_SIZE_USIZE]>,
    /// Frames that went on air, with the address they were sent to.
    pub sent: Vec<([u8; ADDRESS_LEN], [u8; PAYLOAD_SIZE_USIZE])>,
    /// A wedged radio accepts payloads but never transmits or raises TX_DS.
    pub wedged: bool,
    pub ce: bool,
    /// TX_ADDR writes that arrived while the radio was transmitting.
    pub tx_addr_writes_in_flight: usize,
}

impl ChipState {
    fn status(&self) -> u8 {
        let pipe = self.rx_fifo.front().map_or(0x07, |(pipe, _)| *pipe);
        let full = if self.tx_fifo.len() >= HW_FIFO_DEPTH {
            bits::TX_FULL
        } else {
            0
        };
        (self.regs[Register::STATUS.addr() as usize] & bits::ALL_IRQ)
            | (pipe << bits::RX_P_NO_SHIFT)
            | full
    }

    fn fifo_status(&self) -> u8 {
        let mut value = 0;
        if self.tx_fifo.is_empty() {
            value |= bits::FIFO_TX_EMPTY;
        }
        if self.tx_fifo.len() >= HW_FIFO_DEPTH {
            value |= bits::FIFO_TX_FULL;
        }
        if self.rx_fifo.is_empty() {
            value |= bits::FIFO_RX_EMPTY;
        }
        if self.rx_fifo.len() >= HW_FIFO_DEPTH {
            value |= bits::FIFO_RX_FULL;
        }
        value
    }

    pub fn reg(&self, register: Register) -> u8 {
        match register {
            Register::STATUS => self.status(),
            Register::FIFO_STATUS => self.fifo_status(),
            _ => self.regs[register.addr() as usize],
        }
    }

    pub fn set_flag(&mut self, flag: u8) {
        self.regs[Register::STATUS.addr() as usize] |= flag;
    }

    pub fn receiving(&self) -> bool {
        let config = self.regs[Register::CONFIG.addr() as usize];
        self.ce && config & (bits::PWR_UP | bits::PRIM_RX) == bits::PWR_UP | bits::PRIM_RX
    }

    /// Places a raw payload in the RX FIFO as if it arrived on `pipe`.
    pub fn inject(&mut self, pipe: u8, frame: [u8; PAYLOAD_SIZE_USIZE]) {
        self.rx_fifo.push_back((pipe, frame));
        self.set_flag(bits::RX_DR);
    }

    /// Pipe whose address matches `address`, if that pipe is enabled.
    pub fn pipe_for(&self, address: &[u8; ADDRESS_LEN]) -> Option<u8> {
        let enabled = self.regs[Register::EN_RXADDR.addr() as usize];
        (0u8..6).find(|&pipe| {
            let own = match pipe {
                0 => self.rx_addr_p0,
                1 => self.rx_addr_p1,
                _ => {
                    let mut own = self.rx_addr_p1;
                    own[0] = self.regs[Register::RX_ADDR[pipe as usize].addr() as usize];
                    own
                }
            };
            enabled & (1 << pipe) != 0 && own == *address
        })
    }

    fn exchange(&mut self, buf: &mut [u8]) {
        let command = buf[0];
        buf[0] = self.status();
        let register = (command & Command::REGISTER_MASK) as usize;
        let len = buf.len() - 1;
        match command {
            0x00..=0x1F => match register {
                0x0A => buf[1..].copy_from_slice(&self.rx_addr_p0[..len]),
                0x0B => buf[1..].copy_from_slice(&self.rx_addr_p1[..len]),
                0x10 => buf[1..].copy_from_slice(&self.tx_addr[..len]),
                0x07 => buf[1] = self.status(),
                0x17 => buf[1] = self.fifo_status(),
                _ => buf[1] = self.regs[register],
            },
            0x20..=0x3F => match register {
                0x0A => self.rx_addr_p0.copy_from_slice(&buf[1..]),
                0x0B => self.rx_addr_p1.copy_from_slice(&buf[1..]),
                0x10 => {
                    if self.ce && self.transmitting() {
                        self.tx_addr_writes_in_flight += 1;
                    }
                    self.tx_addr.copy_from_slice(&buf[1..]);
                }
                0x07 => self.regs[register] &= !(buf[1] & bits::ALL_IRQ),
                _ => self.regs[register] = buf[1],
            },
            0x61 => {
                if let Some((_, frame)) = self.rx_fifo.pop_front() {
                    buf[1..].copy_from_slice(&frame);
                }
            }
            0xA0 => {
                if self.tx_fifo.len() < HW_FIFO_DEPTH {
                    let mut frame = [0u8; PAYLOAD_SIZE_USIZE];
                    frame.copy_from_slice(&buf[1..]);
                    self.tx_fifo.push_back(frame);
                }
            }
            0xE1 => self.tx_fifo.clear(),
            0xE2 => self.rx_fifo.clear(),
            0xFF => {}
            other => panic!("unexpected command {other:#04x}"),
        }
    }

    fn transmitting(&self) -> bool {
        let config = self.regs[Register::CONFIG.addr() as usize];
        config & (bits::PWR_UP | bits::PRIM_RX) == bits::PWR_UP
    }

    fn ce_rising(&mut self) {
        if !self.transmitting() || self.wedged {
            return;
        }
        if let Some(frame) = self.tx_fifo.pop_front() {
            self.sent.push((self.tx_addr, frame));
            self.set_flag(bits::TX_DS);
        }
    }
}

/// Shared handle on a simulated radio.
pub(crate) type Chip = Rc<RefCell<ChipState>>;

/// SPI side of a simulated radio.
#[derive(Debug, Clone)]
pub(crate) struct SimSpi(pub Chip);

impl spi::ErrorType for SimSpi {
    type Error = Infallible;
}

impl SpiDevice for SimSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        for operation in operations.iter_mut() {
            match operation {
                Operation::TransferInPlace(buf) => self.0.borrow_mut().exchange(buf),
                _ => unimplemented!("only in-place transfers are simulated"),
            }
        }
        Ok(())
    }
}

/// Chip-enable line of a simulated radio. A rising edge in transmit mode sends the head
/// of the TX FIFO.
#[derive(Debug, Clone)]
pub(crate) struct SimPin(pub Chip);

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().ce = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut chip = self.0.borrow_mut();
        if !chip.ce {
            chip.ce = true;
            chip.ce_rising();
        }
        Ok(())
    }
}

/// Clock that advances by `step` milliseconds every time it is read.
#[derive(Debug, Clone)]
pub(crate) struct SimClock {
    pub now: Rc<Cell<u16>>,
    pub step: u16,
}

impl SimClock {
    pub fn starting_at(now: u16, step: u16) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
            step,
        }
    }
}

impl Clock for SimClock {
    fn millis(&self) -> u16 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        now
    }
}

pub(crate) type SimRadio<const N: usize = 64> = Nrf24<SimSpi, SimPin, SimClock, N>;

/// Builds a driver on a fresh simulated radio, initialized with `config`.
pub(crate) fn sim_radio<const N: usize>(config: RadioConfig) -> (SimRadio<N>, Chip) {
    let chip = Chip::default();
    let mut radio = Nrf24::new(
        SimSpi(chip.clone()),
        SimPin(chip.clone()),
        SimClock::starting_at(0, 1),
        config,
    );
    radio
        .initialize(&mut embedded_hal_mock::eh1::delay::NoopDelay)
        .unwrap();
    (radio, chip)
}

/// Moves every frame `from` has sent to `to`, if `to` listens on the frame's address.
/// Returns how many frames arrived.
pub(crate) fn air(from: &Chip, to: &Chip) -> usize {
    let sent: Vec<_> = from.borrow_mut().sent.drain(..).collect();
    let mut to = to.borrow_mut();
    let mut delivered = 0;
    for (address, frame) in sent {
        if !to.receiving() {
            continue;
        }
        if let Some(pipe) = to.pipe_for(&address) {
            to.inject(pipe, frame);
            delivered += 1;
        }
    }
    delivered
}

/// Encodes `data` as a hardware payload.
pub(crate) fn frame(data: &[u8]) -> [u8; PAYLOAD_SIZE_USIZE] {
    encode_frame(data).unwrap()
}

/// Wraps each `(mosi, miso)` pair in its own SPI transaction.
pub(crate) fn spi_expects(pairs: &[(&[u8], &[u8])]) -> Vec<SpiTransaction<u8>> {
    pairs
        .iter()
        .flat_map(|(expected, response)| {
            [
                SpiTransaction::transaction_start(),
                SpiTransaction::transfer_in_place(expected.to_vec(), response.to_vec()),
                SpiTransaction::transaction_end(),
            ]
        })
        .collect()
}
