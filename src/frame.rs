//! Variable length frames inside the fixed 32 byte hardware payload.
//!
//! Layout: `[N, data[0..N], checksum, 0x00..]` where `N <= 30` and the checksum is the
//! bitwise complement of the byte sum of `N` and the data.

use crate::consts::{
    DATA_COUNT_INDEX, MAX_DATA_LEN, MAX_DATA_LEN_USIZE, PAYLOAD_FILLER, PAYLOAD_SIZE_USIZE,
};
use heapless::Vec;
use thiserror::Error;

/// Frame encoding errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The data does not fit in one frame.
    #[error("{0} bytes exceed the frame capacity")]
    TooLong(usize),
}

/// A received frame after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Length byte as received.
    pub len: u8,
    /// Data bytes. Empty when the length byte is out of range.
    pub data: Vec<u8, MAX_DATA_LEN_USIZE>,
    /// Whether the length byte is in range and the checksum matches.
    pub checksum_valid: bool,
}

/// Computes the checksum of a frame carrying `data`: `!(len + sum(data))` modulo 256.
pub fn checksum(data: &[u8]) -> u8 {
    let sum = data
        .iter()
        .fold(data.len() as u8, |acc, byte| acc.wrapping_add(*byte));
    !sum
}

/// Builds the 32 byte hardware payload for `data`.
///
/// # Errors
/// [`FrameError::TooLong`] if `data` is longer than 30 bytes.
pub fn encode_frame(data: &[u8]) -> Result<[u8; PAYLOAD_SIZE_USIZE], FrameError> {
    if data.len() > MAX_DATA_LEN_USIZE {
        return Err(FrameError::TooLong(data.len()));
    }
    let mut frame = [PAYLOAD_FILLER; PAYLOAD_SIZE_USIZE];
    frame[DATA_COUNT_INDEX] = data.len() as u8;
    frame[1..=data.len()].copy_from_slice(data);
    frame[data.len() + 1] = checksum(data);
    Ok(frame)
}

/// Parses a 32 byte hardware payload.
///
/// A length byte above 30 yields an invalid frame with no data.
pub fn decode_frame(frame: &[u8; PAYLOAD_SIZE_USIZE]) -> DecodedFrame {
    let len = frame[DATA_COUNT_INDEX];
    if len > MAX_DATA_LEN {
        return DecodedFrame {
            len,
            data: Vec::new(),
            checksum_valid: false,
        };
    }
    let end = len as usize + 1;
    let body = &frame[1..end];
    // body is at most 30 bytes, the capacity of the vec
    let data = Vec::from_slice(body).unwrap_or_default();
    DecodedFrame {
        len,
        checksum_valid: frame[end] == checksum(body),
        data,
    }
}

/// Splits `data` into frame sized chunks: every chunk but the last holds 30 bytes, the
/// last one holds the remainder. Empty input yields no chunks.
pub fn frame_chunks(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.chunks(MAX_DATA_LEN_USIZE)
}
