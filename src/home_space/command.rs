//! Packet header and the command table.

use super::DropReason;
use super::address::TreeAddress;
use crate::consts::MAX_DATA_LEN_USIZE;
use core::fmt;
use heapless::Vec;
use thiserror::Error;

/// Bytes in a packet header: destination 3, source 3, command 2, count 1.
pub const HEADER_LEN: usize = 9;

/// Most command data one packet can carry: one frame minus the header.
pub const MAX_COMMAND_DATA: usize = MAX_DATA_LEN_USIZE - HEADER_LEN;

/// Command ids of the home automation network.
pub mod ids {
    /// Query a node's status.
    pub const GET_STATUS: u16 = 0x0000;
    /// Arm the alarm.
    pub const ACTIVATE_ALARM: u16 = 0x0001;
    /// Disarm the alarm.
    pub const DEACTIVATE_ALARM: u16 = 0x0002;
    /// Read the real time clock.
    pub const GET_CURRENT_TIME: u16 = 0x0003;
    /// Set the real time clock.
    pub const SET_TIME: u16 = 0x0004;
    /// Switch the LED strip on.
    pub const TURN_ON_LED_STRIP: u16 = 0x0005;
    /// Switch the LED strip off.
    pub const TURN_OFF_LED_STRIP: u16 = 0x0006;
    /// Read the LED strip hue.
    pub const GET_HUE_LED_STRIP: u16 = 0x0007;
    /// Set the LED strip hue.
    pub const SET_HUE_LED_STRIP: u16 = 0x0008;
    /// Read the LED strip brightness.
    pub const GET_BRIGHTNESS_LED_STRIP: u16 = 0x0009;
    /// Set the LED strip brightness.
    pub const SET_BRIGHTNESS_LED_STRIP: u16 = 0x000A;
    /// Read the LED strip saturation.
    pub const GET_SATURATION_LED_STRIP: u16 = 0x000B;
    /// Set the LED strip saturation.
    pub const SET_SATURATION_LED_STRIP: u16 = 0x000C;
    /// Read the LED strip colour.
    pub const GET_RGB_LED_STRIP: u16 = 0x000D;
    /// Set the LED strip colour.
    pub const SET_RGB_LED_STRIP: u16 = 0x000E;
    /// Switch one LED pixel on.
    pub const TURN_ON_LED_PIXEL: u16 = 0x000F;
    /// Switch one LED pixel off.
    pub const TURN_OFF_LED_PIXEL: u16 = 0x0010;
    /// Read a pixel's hue.
    pub const GET_HUE_LED_PIXEL: u16 = 0x0011;
    /// Set a pixel's hue.
    pub const SET_HUE_LED_PIXEL: u16 = 0x0012;
    /// Read a pixel's brightness.
    pub const GET_BRIGHTNESS_LED_PIXEL: u16 = 0x0013;
    /// Set a pixel's brightness.
    pub const SET_BRIGHTNESS_LED_PIXEL: u16 = 0x0014;
    /// Read a pixel's saturation.
    pub const GET_SATURATION_LED_PIXEL: u16 = 0x0015;
    /// Set a pixel's saturation.
    pub const SET_SATURATION_LED_PIXEL: u16 = 0x0016;
    /// Read a pixel's colour.
    pub const GET_RGB_LED_PIXEL: u16 = 0x0017;
    /// Set a pixel's colour.
    pub const SET_RGB_LED_PIXEL: u16 = 0x0018;
}

/// The header that starts every packet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Header {
    /// Final recipient.
    pub destination: TreeAddress,
    /// Originating node.
    pub source: TreeAddress,
    /// Command id.
    pub command: u16,
    /// Number of data bytes following the header.
    pub count: u8,
}

impl Header {
    /// Wire form: addresses and command big-endian.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let [d0, d1, d2] = self.destination.to_bytes();
        let [s0, s1, s2] = self.source.to_bytes();
        let [c0, c1] = self.command.to_be_bytes();
        [d0, d1, d2, s0, s1, s2, c0, c1, self.count]
    }

    /// Parses the wire form.
    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Self {
        Self {
            destination: TreeAddress::from_bytes([bytes[0], bytes[1], bytes[2]]),
            source: TreeAddress::from_bytes([bytes[3], bytes[4], bytes[5]]),
            command: u16::from_be_bytes([bytes[6], bytes[7]]),
            count: bytes[8],
        }
    }
}

/// Something that carries out a command addressed to this node.
pub trait CommandHandler {
    /// Runs the command sent by `source` with its `data`.
    fn handle(&mut self, source: TreeAddress, data: &[u8]);
}

impl<F> CommandHandler for F
where
    F: FnMut(TreeAddress, &[u8]),
{
    fn handle(&mut self, source: TreeAddress, data: &[u8]) {
        self(source, data)
    }
}

/// Errors raised while registering a command.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Every slot of the table is taken.
    #[error("command table is full")]
    TableFull,
    /// The id already has a handler.
    #[error("command {0:#06x} is already registered")]
    Duplicate(u16),
    /// The command expects more data than a packet can carry.
    #[error("command data of {0} bytes does not fit in one packet")]
    DataTooLong(u8),
}

struct Entry<'h> {
    id: u16,
    bytes_to_receive: u8,
    handler: &'h mut dyn CommandHandler,
}

/// Fixed capacity table of up to `C` commands, keyed by id.
pub struct CommandTable<'h, const C: usize> {
    entries: Vec<Entry<'h>, C>,
}

impl<const C: usize> fmt::Debug for CommandTable<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (e.id, e.bytes_to_receive)))
            .finish()
    }
}

impl<const C: usize> Default for CommandTable<'_, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h, const C: usize> CommandTable<'h, C> {
    /// Creates an empty table.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers `handler` for command `id`, which carries exactly `bytes_to_receive`
    /// data bytes.
    pub fn register(
        &mut self,
        id: u16,
        bytes_to_receive: u8,
        handler: &'h mut dyn CommandHandler,
    ) -> Result<(), CommandError> {
        if usize::from(bytes_to_receive) > MAX_COMMAND_DATA {
            return Err(CommandError::DataTooLong(bytes_to_receive));
        }
        if self.expected_len(id).is_some() {
            return Err(CommandError::Duplicate(id));
        }
        self.entries
            .push(Entry {
                id,
                bytes_to_receive,
                handler,
            })
            .map_err(|_| CommandError::TableFull)
    }

    /// Data length command `id` expects, `None` if it is not registered.
    pub fn expected_len(&self, id: u16) -> Option<u8> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.bytes_to_receive)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no command is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the handler of `id`.
    ///
    /// # Errors
    /// [`DropReason::UnknownCommand`] for an unregistered id,
    /// [`DropReason::LengthMismatch`] if `data` is not the registered length.
    pub fn dispatch(
        &mut self,
        id: u16,
        source: TreeAddress,
        data: &[u8],
    ) -> Result<(), DropReason> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(DropReason::UnknownCommand(id))?;
        if usize::from(entry.bytes_to_receive) != data.len() {
            return Err(DropReason::LengthMismatch(id));
        }
        entry.handler.handle(source, data);
        Ok(())
    }
}
