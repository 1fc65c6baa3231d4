//! The `home_space` network: packets routed over a tree of radios.
//!
//! Each node is identified by a [`TreeAddress`]. Packets start with a 9 byte [`Header`]
//! and carry at most [`MAX_COMMAND_DATA`] bytes of command data, so one packet always fits
//! in one radio frame. A node either runs the command itself, through its
//! [`CommandTable`], or forwards the packet one hop along the tree.
//!
//! ```rust,ignore
//! use nrf24_homespace::home_space::{HomeSpace, HomeSpaceConfig, TreeAddress, ids};
//!
//! let mut led = |_source, rgb: &[u8]| strip.fill(rgb[0], rgb[1], rgb[2]);
//! let mut node: HomeSpace<'_, 4> =
//!     HomeSpace::new(HomeSpaceConfig::node(TreeAddress::new(0xAC8172)));
//! node.register(ids::SET_RGB_LED_STRIP, 3, &mut led)?;
//!
//! let mut radio: Nrf24<_, _, _> = Nrf24::new(spi, ce, &MILLIS, node.radio_config());
//! radio.initialize(&mut delay)?;
//! loop {
//!     if let Some(delivery) = node.poll(&mut radio)? {
//!         // ...
//!     }
//! }
//! ```

pub mod address;
pub mod command;

pub use address::{Route, TreeAddress, route};
pub use command::{
    CommandError, CommandHandler, CommandTable, HEADER_LEN, Header, MAX_COMMAND_DATA, ids,
};

use crate::config::{DataPipe, RadioAddress, RadioConfig};
use crate::consts::{ALL_PIPES, MAX_DATA_LEN_USIZE};
use crate::driver::{Nrf24, RadioError};
use crate::timer::Clock;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

/// RF channel of the network.
pub const HOME_SPACE_CHANNEL: u8 = 95;

/// Identity of this node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct HomeSpaceConfig {
    /// Tree address of this board.
    pub board: TreeAddress,
    /// The coordinator is the root; it has nowhere to send traffic going up.
    pub coordinator: bool,
}

impl HomeSpaceConfig {
    /// A regular node.
    pub const fn node(board: TreeAddress) -> Self {
        Self {
            board,
            coordinator: false,
        }
    }

    /// The root of the tree.
    pub const fn coordinator(board: TreeAddress) -> Self {
        Self {
            board,
            coordinator: true,
        }
    }
}

/// Why a packet was discarded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DropReason {
    /// No handler is registered for the command.
    UnknownCommand(u16),
    /// The data length differs from the one the command was registered with.
    LengthMismatch(u16),
    /// The next hop does not exist.
    NoRoute,
    /// The header announced more data than a packet can carry.
    Oversized(u8),
}

/// What happened to a packet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Delivery {
    /// Run by the local handler of `command`.
    Handled {
        /// Command id.
        command: u16,
    },
    /// Sent one hop further.
    Forwarded(Route),
    /// Discarded.
    Dropped(DropReason),
}

/// A `home_space` node: routing plus up to `C` command handlers.
#[derive(Debug)]
pub struct HomeSpace<'h, const C: usize> {
    config: HomeSpaceConfig,
    commands: CommandTable<'h, C>,
    next_pipe: usize,
}

impl<'h, const C: usize> HomeSpace<'h, C> {
    /// Creates a node without any command.
    pub const fn new(config: HomeSpaceConfig) -> Self {
        Self {
            config,
            commands: CommandTable::new(),
            next_pipe: 0,
        }
    }

    /// Identity of this node.
    pub fn config(&self) -> &HomeSpaceConfig {
        &self.config
    }

    /// Registers the handler of command `id`. See [`CommandTable::register`].
    pub fn register(
        &mut self,
        id: u16,
        bytes_to_receive: u8,
        handler: &'h mut dyn CommandHandler,
    ) -> Result<(), CommandError> {
        self.commands.register(id, bytes_to_receive, handler)
    }

    /// Radio settings of this node: the network channel, pipe 0 listening to the parent,
    /// pipes 1-5 listening to the children and transmission towards the parent.
    pub fn radio_config(&self) -> RadioConfig {
        let board = self.config.board;
        let mut config = RadioConfig::default()
            .channel(HOME_SPACE_CHANNEL)
            .pipes(ALL_PIPES)
            .rx_address(DataPipe::DP0.number(), board.downlink_address());
        for pipe in &DataPipe::ALL[1..] {
            config = config.rx_address(pipe.number(), board.uplink_address(*pipe));
        }
        match self.uplink_target() {
            Some(parent) => config.tx_address(parent),
            None => config,
        }
    }

    /// Applies [`radio_config`](Self::radio_config) to an initialized radio.
    pub fn configure_radio<SPI, CE, CLK, const N: usize>(
        &self,
        radio: &mut Nrf24<SPI, CE, CLK, N>,
    ) -> Result<(), RadioError<SPI, CE>>
    where
        SPI: SpiDevice,
        CE: OutputPin,
        CLK: Clock,
    {
        let config = self.radio_config();
        radio.set_channel(config.get_channel())?;
        for pipe in DataPipe::ALL {
            if let Some(address) = config.get_rx_address(pipe) {
                radio.set_receive_address(pipe.number(), address.high(), address.low())?;
            }
        }
        radio.enable_pipes(config.get_pipes())?;
        if let Some(address) = config.get_tx_address() {
            radio.set_transmit_address(address.high(), address.low())?;
        }
        Ok(())
    }

    /// Takes the next complete packet off the radio's pipe queues and delivers it.
    ///
    /// Returns `None` while no pipe holds a whole packet. Each call starts looking one pipe
    /// after the pipe served last, so busy pipes cannot starve the others. A header that
    /// announces more than [`MAX_COMMAND_DATA`] bytes is consumed and reported as
    /// [`DropReason::Oversized`]; the bytes behind it are left for the next call.
    pub fn poll<SPI, CE, CLK, const N: usize>(
        &mut self,
        radio: &mut Nrf24<SPI, CE, CLK, N>,
    ) -> Result<Option<Delivery>, RadioError<SPI, CE>>
    where
        SPI: SpiDevice,
        CE: OutputPin,
        CLK: Clock,
    {
        for step in 0..DataPipe::ALL.len() {
            let index = (self.next_pipe + step) % DataPipe::ALL.len();
            let pipe = DataPipe::ALL[index];
            let Some(header) = peek_header(radio, pipe) else {
                continue;
            };
            let count = usize::from(header.count);
            if count <= MAX_COMMAND_DATA && radio.available(pipe) < HEADER_LEN + count {
                continue;
            }
            self.next_pipe = (index + 1) % DataPipe::ALL.len();
            if count > MAX_COMMAND_DATA {
                let mut discard = [0u8; HEADER_LEN];
                let _ = radio.read_pipe(pipe, &mut discard);
                return Ok(Some(self.dropped(DropReason::Oversized(header.count))));
            }
            let mut packet = [0u8; MAX_DATA_LEN_USIZE];
            let len = radio.read_pipe(pipe, &mut packet[..HEADER_LEN + count]);
            let data = &packet[HEADER_LEN..len];
            return self.deliver(radio, &header, data).map(Some);
        }
        Ok(None)
    }

    /// Originates a packet from this board.
    ///
    /// A packet addressed to the board itself is handled locally.
    pub fn send<SPI, CE, CLK, const N: usize>(
        &mut self,
        radio: &mut Nrf24<SPI, CE, CLK, N>,
        destination: TreeAddress,
        command: u16,
        data: &[u8],
    ) -> Result<Delivery, RadioError<SPI, CE>>
    where
        SPI: SpiDevice,
        CE: OutputPin,
        CLK: Clock,
    {
        let count = u8::try_from(data.len()).unwrap_or(u8::MAX);
        if data.len() > MAX_COMMAND_DATA {
            return Ok(self.dropped(DropReason::Oversized(count)));
        }
        let header = Header {
            destination,
            source: self.config.board,
            command,
            count,
        };
        self.deliver(radio, &header, data)
    }

    fn deliver<SPI, CE, CLK, const N: usize>(
        &mut self,
        radio: &mut Nrf24<SPI, CE, CLK, N>,
        header: &Header,
        data: &[u8],
    ) -> Result<Delivery, RadioError<SPI, CE>>
    where
        SPI: SpiDevice,
        CE: OutputPin,
        CLK: Clock,
    {
        let next = route(header.destination, self.config.board);
        let target = match next {
            Route::Local => {
                return Ok(match self.commands.dispatch(header.command, header.source, data) {
                    Ok(()) => Delivery::Handled {
                        command: header.command,
                    },
                    Err(reason) => self.dropped(reason),
                });
            }
            Route::Up => self.uplink_target(),
            Route::Down(pipe) => self
                .config
                .board
                .child(pipe)
                .map(|child| child.downlink_address()),
        };
        let Some(target) = target else {
            return Ok(self.dropped(DropReason::NoRoute));
        };

        debug!(
            "home_space: forwarding {:x} to {:x}",
            header.command,
            header.destination.raw()
        );
        let mut packet = [0u8; MAX_DATA_LEN_USIZE];
        packet[..HEADER_LEN].copy_from_slice(&header.to_bytes());
        packet[HEADER_LEN..HEADER_LEN + data.len()].copy_from_slice(data);
        radio.set_transmit_address(target.high(), target.low())?;
        radio.write_payload(&packet[..HEADER_LEN + data.len()])?;
        Ok(Delivery::Forwarded(next))
    }

    fn uplink_target(&self) -> Option<RadioAddress> {
        if self.config.coordinator {
            return None;
        }
        let board = self.config.board;
        let parent = board.parent()?;
        Some(parent.uplink_address(board.uplink_pipe()?))
    }

    fn dropped(&self, reason: DropReason) -> Delivery {
        match reason {
            DropReason::UnknownCommand(id) => warning!("home_space: unknown command {:x}", id),
            DropReason::LengthMismatch(id) => {
                warning!("home_space: wrong data length for command {:x}", id)
            }
            DropReason::NoRoute => warning!("home_space: no route from this node"),
            DropReason::Oversized(count) => {
                warning!("home_space: header announces {} data bytes", count)
            }
        }
        Delivery::Dropped(reason)
    }
}

fn peek_header<SPI, CE, CLK, const N: usize>(
    radio: &Nrf24<SPI, CE, CLK, N>,
    pipe: DataPipe,
) -> Option<Header>
where
    SPI: SpiDevice,
    CE: OutputPin,
    CLK: Clock,
{
    let mut bytes = [0u8; HEADER_LEN];
    for (offset, byte) in bytes.iter_mut().enumerate() {
        *byte = radio.peek_pipe(pipe, offset)?;
    }
    Some(Header::from_bytes(&bytes))
}
