//! Static configuration of the radio: channel, pipes and addresses.

use crate::consts::{
    ADDRESS_LEN, ALL_PIPES, DEFAULT_CHANNEL, MAX_CHANNEL, PIPE_COUNT, PIPE_COUNT_USIZE,
    TX_TIMEOUT_MS,
};

/// A 40 bit radio address, split the way the hardware stores it.
///
/// Pipes 0 and 1 and the transmitter have a full 40 bit address. Pipes 2-5 only own the
/// low byte; their upper 32 bits are always those of pipe 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RadioAddress {
    high: u32,
    low: u8,
}

impl RadioAddress {
    /// Creates an address from its 32 bit MSB group and its 8 bit LSB.
    pub const fn new(high: u32, low: u8) -> Self {
        Self { high, low }
    }

    /// Creates an address from the low 40 bits of `address`.
    pub const fn from_u64(address: u64) -> Self {
        Self {
            high: ((address >> 8) & 0xFFFF_FFFF) as u32,
            low: (address & 0xFF) as u8,
        }
    }

    /// The 32 most significant bits.
    pub const fn high(&self) -> u32 {
        self.high
    }

    /// The least significant byte.
    pub const fn low(&self) -> u8 {
        self.low
    }

    /// The address as a 40 bit integer.
    pub const fn as_u64(&self) -> u64 {
        ((self.high as u64) << 8) | self.low as u64
    }

    /// Byte order used on the wire: LSB first.
    pub fn to_bytes(&self) -> [u8; ADDRESS_LEN] {
        let [h0, h1, h2, h3] = self.high.to_le_bytes();
        [self.low, h0, h1, h2, h3]
    }
}

/// One of the six receive pipes.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
pub enum DataPipe {
    /// Data pipe 0, full 40 bit address.
    DP0 = 0,
    /// Data pipe 1, full 40 bit address.
    DP1 = 1,
    /// Data pipe 2, shares the upper bytes of pipe 1.
    DP2 = 2,
    /// Data pipe 3, shares the upper bytes of pipe 1.
    DP3 = 3,
    /// Data pipe 4, shares the upper bytes of pipe 1.
    DP4 = 4,
    /// Data pipe 5, shares the upper bytes of pipe 1.
    DP5 = 5,
}

impl DataPipe {
    /// Every pipe, in order.
    pub const ALL: [DataPipe; PIPE_COUNT_USIZE] = [
        DataPipe::DP0,
        DataPipe::DP1,
        DataPipe::DP2,
        DataPipe::DP3,
        DataPipe::DP4,
        DataPipe::DP5,
    ];

    /// Pipe number.
    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Pipe number as an index.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Bit of this pipe in a pipe mask.
    pub fn mask(&self) -> u8 {
        1 << self.number()
    }

    /// Whether this pipe has its own 40 bit address.
    pub fn has_full_address(&self) -> bool {
        matches!(self, DataPipe::DP0 | DataPipe::DP1)
    }
}

impl TryFrom<u8> for DataPipe {
    type Error = u8;

    fn try_from(pipe: u8) -> Result<Self, Self::Error> {
        match pipe {
            0 => Ok(DataPipe::DP0),
            1 => Ok(DataPipe::DP1),
            2 => Ok(DataPipe::DP2),
            3 => Ok(DataPipe::DP3),
            4 => Ok(DataPipe::DP4),
            5 => Ok(DataPipe::DP5),
            _ => Err(pipe),
        }
    }
}

/// Per-device configuration applied by [`Nrf24::initialize`](crate::driver::Nrf24::initialize).
///
/// The hardware payload size is not configurable; every pipe uses the full 32 bytes.
///
/// ```rust
/// use nrf24_homespace::config::{RadioAddress, RadioConfig};
///
/// let config = RadioConfig::default()
///     .channel(95)
///     .pipes(0b0000_0011)
///     .rx_address(1, RadioAddress::from_u64(0xEBAC_8171_C1))
///     .tx_address(RadioAddress::from_u64(0xDFAC_8071_00));
/// assert_eq!(config.get_channel(), 95);
/// ```
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub struct RadioConfig {
    pub(crate) channel: u8,
    pub(crate) pipes: u8,
    pub(crate) auto_ack: u8,
    pub(crate) rx_addresses: [Option<RadioAddress>; PIPE_COUNT_USIZE],
    pub(crate) tx_address: Option<RadioAddress>,
    pub(crate) tx_timeout_ms: u16,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL,
            pipes: ALL_PIPES,
            auto_ack: 0,
            rx_addresses: [
                Some(RadioAddress::from_u64(0xE7E7_E7E7_E7)),
                Some(RadioAddress::from_u64(0xC2C2_C2C2_C2)),
                Some(RadioAddress::from_u64(0xC2C2_C2C2_C3)),
                Some(RadioAddress::from_u64(0xC2C2_C2C2_C4)),
                Some(RadioAddress::from_u64(0xC2C2_C2C2_C5)),
                Some(RadioAddress::from_u64(0xC2C2_C2C2_C6)),
            ],
            tx_address: Some(RadioAddress::from_u64(0xE7E7_E7E7_E7)),
            tx_timeout_ms: TX_TIMEOUT_MS,
        }
    }
}

impl RadioConfig {
    /// Sets the RF channel (0-125). Checked by `initialize`.
    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Sets the mask of enabled receive pipes (bit i = pipe i). Checked by `initialize`.
    pub fn pipes(mut self, mask: u8) -> Self {
        self.pipes = mask;
        self
    }

    /// Sets the mask of pipes with hardware auto acknowledgement. Defaults to none.
    pub fn auto_ack(mut self, mask: u8) -> Self {
        self.auto_ack = mask & ALL_PIPES;
        self
    }

    /// Sets the receive address of `pipe`. Out of range pipes are ignored.
    ///
    /// For pipes 2-5 only the low byte is written to the radio.
    pub fn rx_address(mut self, pipe: u8, address: RadioAddress) -> Self {
        if pipe < PIPE_COUNT {
            self.rx_addresses[pipe as usize] = Some(address);
        }
        self
    }

    /// Sets the transmit address.
    pub fn tx_address(mut self, address: RadioAddress) -> Self {
        self.tx_address = Some(address);
        self
    }

    /// Sets how long a transmission may stay in flight before it is abandoned.
    pub fn tx_timeout_ms(mut self, timeout: u16) -> Self {
        self.tx_timeout_ms = timeout;
        self
    }

    /// Configured RF channel.
    pub fn get_channel(&self) -> u8 {
        self.channel
    }

    /// Configured pipe mask.
    pub fn get_pipes(&self) -> u8 {
        self.pipes
    }

    /// Configured transmit timeout.
    pub fn get_tx_timeout_ms(&self) -> u16 {
        self.tx_timeout_ms
    }

    /// Configured receive address of `pipe`.
    pub fn get_rx_address(&self, pipe: DataPipe) -> Option<RadioAddress> {
        self.rx_addresses[pipe.index()]
    }

    /// Configured transmit address.
    pub fn get_tx_address(&self) -> Option<RadioAddress> {
        self.tx_address
    }

    pub(crate) fn channel_valid(&self) -> bool {
        self.channel <= MAX_CHANNEL
    }

    pub(crate) fn pipes_valid(&self) -> bool {
        self.pipes <= ALL_PIPES
    }
}
