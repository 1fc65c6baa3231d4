//! Views over the status and FIFO status bytes returned by the radio.

use crate::config::DataPipe;
use crate::register::bits;

/// The STATUS register, clocked out by the radio as the first byte of every SPI command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Status(u8);

impl Status {
    /// Raw register value.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// A payload is waiting in the RX FIFO.
    pub fn data_ready(&self) -> bool {
        self.0 & bits::RX_DR != 0
    }

    /// The last transmission completed.
    pub fn data_sent(&self) -> bool {
        self.0 & bits::TX_DS != 0
    }

    /// The last transmission gave up after the maximum number of retransmits.
    pub fn max_retransmits(&self) -> bool {
        self.0 & bits::MAX_RT != 0
    }

    /// The previous transmission concluded, successfully or not.
    pub fn tx_concluded(&self) -> bool {
        self.data_sent() || self.max_retransmits()
    }

    /// Raw 3 bit pipe number field: 0..=5 for a pipe, 7 when the RX FIFO is empty.
    pub fn pipe_number(&self) -> u8 {
        (self.0 >> bits::RX_P_NO_SHIFT) & 0b111
    }

    /// Pipe of the payload at the head of the RX FIFO, `None` when the field holds
    /// anything other than a valid pipe number.
    pub fn data_pipe(&self) -> Option<DataPipe> {
        DataPipe::try_from(self.pipe_number()).ok()
    }

    /// The TX FIFO is full.
    pub fn tx_full(&self) -> bool {
        self.0 & bits::TX_FULL != 0
    }
}

impl From<u8> for Status {
    fn from(t: u8) -> Self {
        Status(t)
    }
}

/// The FIFO_STATUS register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct FifoStatus(u8);

impl FifoStatus {
    /// Returns `true` if there are no free locations in the transmission queue.
    pub fn tx_full(&self) -> bool {
        self.0 & bits::FIFO_TX_FULL != 0
    }

    /// Returns `true` if the transmission queue is empty.
    pub fn tx_empty(&self) -> bool {
        self.0 & bits::FIFO_TX_EMPTY != 0
    }

    /// Returns `true` if there are no free locations in the receive queue.
    pub fn rx_full(&self) -> bool {
        self.0 & bits::FIFO_RX_FULL != 0
    }

    /// Returns `true` if the receive queue is empty.
    pub fn rx_empty(&self) -> bool {
        self.0 & bits::FIFO_RX_EMPTY != 0
    }
}

impl From<u8> for FifoStatus {
    fn from(t: u8) -> Self {
        FifoStatus(t)
    }
}

/// The OBSERVE_TX register: packet loss and retransmission counters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ObserveTx(u8);

impl ObserveTx {
    /// Lost packets. Saturates at 15, cleared by writing RF_CH.
    pub fn lost_packets(&self) -> u8 {
        self.0 >> 4
    }

    /// Retransmissions of the last packet.
    pub fn retransmits(&self) -> u8 {
        self.0 & 0x0F
    }
}

impl From<u8> for ObserveTx {
    fn from(t: u8) -> Self {
        ObserveTx(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_flags() {
        let status = Status::from(0b0110_0101);
        assert!(status.data_ready());
        assert!(status.data_sent());
        assert!(!status.max_retransmits());
        assert!(status.tx_concluded());
        assert!(status.tx_full());
        assert_eq!(status.pipe_number(), 2);
        assert_eq!(status.data_pipe(), Some(DataPipe::DP2));
    }

    #[test]
    fn test_empty_fifo_has_no_pipe() {
        let status = Status::from(0x0E);
        assert_eq!(status.pipe_number(), 7);
        assert_eq!(status.data_pipe(), None);
        assert_eq!(Status::from(0x0C).data_pipe(), None);
    }

    #[test]
    fn test_fifo_status() {
        let fifo = FifoStatus::from(0b0001_0001);
        assert!(fifo.tx_empty());
        assert!(fifo.rx_empty());
        assert!(!fifo.tx_full());
        assert!(!fifo.rx_full());
    }

    #[test]
    fn test_observe_tx_nibbles() {
        let observe = ObserveTx::from(0x3A);
        assert_eq!(observe.lost_packets(), 3);
        assert_eq!(observe.retransmits(), 10);
    }
}
