//! Bounded per-pipe receive queues.

use heapless::Deque;

/// A fixed capacity FIFO of received bytes for one pipe.
///
/// Filled from the interrupt handler, drained by the application. When the queue is full,
/// new bytes are rejected; bytes already queued are never overwritten.
#[derive(Debug)]
pub struct PipeQueue<const N: usize> {
    bytes: Deque<u8, N>,
}

impl<const N: usize> Default for PipeQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PipeQueue<N> {
    /// Creates an empty queue.
    pub const fn new() -> Self {
        Self {
            bytes: Deque::new(),
        }
    }

    /// Appends a byte. Returns `false` when the queue is full and the byte was dropped.
    pub fn push(&mut self, byte: u8) -> bool {
        self.bytes.push_back(byte).is_ok()
    }

    /// Removes the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }

    /// Returns the byte `offset` positions from the front without removing it.
    pub fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.iter().nth(offset).copied()
    }

    /// Moves up to `buf.len()` bytes into `buf`, returning how many were copied.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.bytes.pop_front() {
                Some(byte) => *slot = byte,
                None => break,
            }
            count += 1;
        }
        count
    }

    /// Number of queued bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the queue holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
