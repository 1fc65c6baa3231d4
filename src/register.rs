//! nRF24L01 register map, SPI command set and bit names.
//!
//! Pure data: every register access in [`crate::driver`] is expressed through these values.

/// Registers of the nRF24L01 memory map.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// Configuration register (power, mode, CRC, interrupt masks).
    CONFIG = 0x00,
    /// Enable auto acknowledgement per pipe.
    EN_AA = 0x01,
    /// Enabled receive pipes.
    EN_RXADDR = 0x02,
    /// Address width.
    SETUP_AW = 0x03,
    /// Automatic retransmission setup.
    SETUP_RETR = 0x04,
    /// RF channel.
    RF_CH = 0x05,
    /// RF setup (data rate, power).
    RF_SETUP = 0x06,
    /// Status register.
    STATUS = 0x07,
    /// Transmit observe register (lost packets, retransmits).
    OBSERVE_TX = 0x08,
    /// Carrier detect.
    CD = 0x09,
    /// Receive address pipe 0 (5 bytes).
    RX_ADDR_P0 = 0x0A,
    /// Receive address pipe 1 (5 bytes).
    RX_ADDR_P1 = 0x0B,
    /// Receive address pipe 2 (LSB only).
    RX_ADDR_P2 = 0x0C,
    /// Receive address pipe 3 (LSB only).
    RX_ADDR_P3 = 0x0D,
    /// Receive address pipe 4 (LSB only).
    RX_ADDR_P4 = 0x0E,
    /// Receive address pipe 5 (LSB only).
    RX_ADDR_P5 = 0x0F,
    /// Transmit address (5 bytes).
    TX_ADDR = 0x10,
    /// Payload width pipe 0.
    RX_PW_P0 = 0x11,
    /// Payload width pipe 1.
    RX_PW_P1 = 0x12,
    /// Payload width pipe 2.
    RX_PW_P2 = 0x13,
    /// Payload width pipe 3.
    RX_PW_P3 = 0x14,
    /// Payload width pipe 4.
    RX_PW_P4 = 0x15,
    /// Payload width pipe 5.
    RX_PW_P5 = 0x16,
    /// FIFO status.
    FIFO_STATUS = 0x17,
}

impl Register {
    /// Receive address registers, indexed by pipe.
    pub const RX_ADDR: [Register; 6] = [
        Register::RX_ADDR_P0,
        Register::RX_ADDR_P1,
        Register::RX_ADDR_P2,
        Register::RX_ADDR_P3,
        Register::RX_ADDR_P4,
        Register::RX_ADDR_P5,
    ];

    /// Payload width registers, indexed by pipe.
    pub const RX_PW: [Register; 6] = [
        Register::RX_PW_P0,
        Register::RX_PW_P1,
        Register::RX_PW_P2,
        Register::RX_PW_P3,
        Register::RX_PW_P4,
        Register::RX_PW_P5,
    ];

    /// Memory map address of the register.
    pub fn addr(&self) -> u8 {
        *self as u8
    }
}

/// SPI command opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Read registers. Last 5 bits are the memory map address.
    ReadRegister = 0b0000_0000,
    /// Write registers. Last 5 bits are the memory map address.
    WriteRegister = 0b0010_0000,
    /// Read RX payload, used in RX mode.
    ReadRxPayload = 0b0110_0001,
    /// Write TX payload, used in TX mode.
    WriteTxPayload = 0b1010_0000,
    /// Flush TX FIFO, used in TX mode.
    FlushTx = 0b1110_0001,
    /// Flush RX FIFO, used in RX mode.
    FlushRx = 0b1110_0010,
    /// Reuse last transmitted payload.
    ReuseTxPayload = 0b1110_0011,
    /// No operation. Used to read the status register.
    Nop = 0b1111_1111,
}

impl Command {
    /// Mask applied to a register address inside read/write register commands.
    pub const REGISTER_MASK: u8 = 0x1F;

    /// Opcode byte of the command.
    pub fn opcode(&self) -> u8 {
        *self as u8
    }

    /// Opcode byte for a read of `register`.
    pub fn read(register: Register) -> u8 {
        Command::ReadRegister.opcode() | (register.addr() & Self::REGISTER_MASK)
    }

    /// Opcode byte for a write of `register`.
    pub fn write(register: Register) -> u8 {
        Command::WriteRegister.opcode() | (register.addr() & Self::REGISTER_MASK)
    }
}

/// Bit masks of register fields.
pub mod bits {
    /// CONFIG: mask the data ready interrupt.
    pub const MASK_RX_DR: u8 = 1 << 6;
    /// CONFIG: mask the data sent interrupt.
    pub const MASK_TX_DS: u8 = 1 << 5;
    /// CONFIG: mask the max retransmits interrupt.
    pub const MASK_MAX_RT: u8 = 1 << 4;
    /// CONFIG: enable CRC.
    pub const EN_CRC: u8 = 1 << 3;
    /// CONFIG: two byte CRC.
    pub const CRCO: u8 = 1 << 2;
    /// CONFIG: power up.
    pub const PWR_UP: u8 = 1 << 1;
    /// CONFIG: primary receiver.
    pub const PRIM_RX: u8 = 1;

    /// STATUS: data ready in RX FIFO.
    pub const RX_DR: u8 = 1 << 6;
    /// STATUS: data sent.
    pub const TX_DS: u8 = 1 << 5;
    /// STATUS: maximum retransmits reached.
    pub const MAX_RT: u8 = 1 << 4;
    /// STATUS: shift of the 3 bit pipe number field.
    pub const RX_P_NO_SHIFT: u8 = 1;
    /// STATUS: TX FIFO full.
    pub const TX_FULL: u8 = 1;
    /// STATUS: every write-one-to-clear interrupt flag.
    pub const ALL_IRQ: u8 = RX_DR | TX_DS | MAX_RT;

    /// FIFO_STATUS: TX FIFO full.
    pub const FIFO_TX_FULL: u8 = 1 << 5;
    /// FIFO_STATUS: TX FIFO empty.
    pub const FIFO_TX_EMPTY: u8 = 1 << 4;
    /// FIFO_STATUS: RX FIFO full.
    pub const FIFO_RX_FULL: u8 = 1 << 1;
    /// FIFO_STATUS: RX FIFO empty.
    pub const FIFO_RX_EMPTY: u8 = 1;

    /// Value written to CONFIG in every powered mode: CRC on, one byte CRC, all
    /// interrupts routed to the IRQ line.
    pub const CONFIG_BASE: u8 = EN_CRC;
    /// CONFIG value for receive mode.
    pub const CONFIG_RX: u8 = CONFIG_BASE | PWR_UP | PRIM_RX;
    /// CONFIG value for transmit mode.
    pub const CONFIG_TX: u8 = CONFIG_BASE | PWR_UP;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_commands_carry_address() {
        assert_eq!(Command::write(Register::RF_CH), 0x25);
        assert_eq!(Command::read(Register::EN_RXADDR), 0x02);
        assert_eq!(Command::write(Register::TX_ADDR), 0x30);
    }

    #[test]
    fn test_config_values() {
        assert_eq!(bits::CONFIG_RX, 0x0B);
        assert_eq!(bits::CONFIG_TX, 0x0A);
    }

    #[test]
    fn test_pipe_register_tables() {
        assert_eq!(Register::RX_ADDR[5].addr(), 0x0F);
        assert_eq!(Register::RX_PW[0].addr(), 0x11);
    }
}
