//! Growable byte accumulator used by the read side of a connection.
//!
//! [`GrowableBuffer`] keeps the bytes that have arrived from the transport but
//! have not been framed yet. Its logical length is tracked separately from the
//! physical capacity of the backing storage, and the capacity doubles (starting
//! from [`MIN_CAPACITY`]) whenever a push does not fit, so appending stays
//! amortized O(1) per byte no matter how small the pushed chunks are.
//!
//! Framers take complete frames off the front with [`GrowableBuffer::split_to`]
//! or [`GrowableBuffer::consume`]; the remaining bytes are shifted to the front
//! in place.

use bytes::Bytes;
use thiserror::Error;

use crate::ensure;

/// Smallest capacity allocated on the first growth.
pub const MIN_CAPACITY: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("consume {requested} bytes out of range, only {available} bytes buffered")]
    OutOfRange { requested: usize, available: usize },
}

impl BufferError {
    pub fn out_of_range(requested: usize, available: usize) -> Self {
        Self::OutOfRange { requested, available }
    }
}

/// An append-only byte accumulator with explicit doubling growth.
///
/// The storage vector's length is the logical length; its spare capacity is the
/// uninitialized tail and is never exposed through [`GrowableBuffer::view`].
#[derive(Debug, Default)]
pub struct GrowableBuffer {
    storage: Vec<u8>,
}

impl GrowableBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer whose first allocation holds at least `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { storage: Vec::with_capacity(capacity) }
    }

    /// Appends `data` after the current logical content.
    pub fn push(&mut self, data: &[u8]) {
        let required = self.storage.len() + data.len();
        if required > self.storage.capacity() {
            let mut capacity = self.storage.capacity().max(MIN_CAPACITY);
            while capacity < required {
                capacity *= 2;
            }
            // reserve_exact moves the logical bytes into the new allocation and frees the old one
            self.storage.reserve_exact(capacity - self.storage.len());
        }
        self.storage.extend_from_slice(data);
    }

    /// Removes the first `n` bytes, shifting the rest to the front.
    pub fn consume(&mut self, n: usize) -> Result<(), BufferError> {
        let len = self.storage.len();
        ensure!(n <= len, BufferError::out_of_range(n, len));

        self.storage.copy_within(n..len, 0);
        self.storage.truncate(len - n);
        Ok(())
    }

    /// Copies the first `n` bytes out as an owned frame and consumes them.
    pub fn split_to(&mut self, n: usize) -> Result<Bytes, BufferError> {
        let len = self.storage.len();
        ensure!(n <= len, BufferError::out_of_range(n, len));

        let frame = Bytes::copy_from_slice(&self.storage[..n]);
        self.consume(n)?;
        Ok(frame)
    }

    /// The logical content, never including the uninitialized tail.
    #[inline]
    pub fn view(&self) -> &[u8] {
        &self.storage
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_concatenation() {
        let mut buffer = GrowableBuffer::new();
        let mut expected = Vec::new();

        for i in 0..200u8 {
            let chunk = vec![i; usize::from(i % 7) + 1];
            buffer.push(&chunk);
            expected.extend_from_slice(&chunk);
            assert_eq!(buffer.view(), &expected[..]);
        }
        assert_eq!(buffer.len(), expected.len());
    }

    #[test]
    fn capacity_doubles_from_minimum() {
        let mut buffer = GrowableBuffer::new();
        assert_eq!(buffer.capacity(), 0);

        buffer.push(b"a");
        assert!(buffer.capacity() >= MIN_CAPACITY);

        let before = buffer.capacity();
        buffer.push(&vec![b'b'; before]);
        assert!(buffer.capacity() >= before * 2);
        assert_eq!(buffer.len(), before + 1);
    }

    #[test]
    fn push_empty_is_noop() {
        let mut buffer = GrowableBuffer::new();
        buffer.push(b"");
        assert!(buffer.is_empty());
        assert_eq!(buffer.view(), b"");
    }

    #[test]
    fn consume_shifts_remaining_bytes() {
        let mut buffer = GrowableBuffer::new();
        buffer.push(b"hello ");
        buffer.push(b"world");

        buffer.consume(6).unwrap();
        assert_eq!(buffer.view(), b"world");

        buffer.consume(0).unwrap();
        assert_eq!(buffer.view(), b"world");

        buffer.consume(5).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn consume_out_of_range() {
        let mut buffer = GrowableBuffer::new();
        buffer.push(b"abc");

        let err = buffer.consume(4).unwrap_err();
        assert_eq!(err, BufferError::out_of_range(4, 3));
        assert_eq!(buffer.view(), b"abc");
    }

    #[test]
    fn split_to_returns_frame() {
        let mut buffer = GrowableBuffer::new();
        buffer.push(b"line1\nline2\n");

        let frame = buffer.split_to(6).unwrap();
        assert_eq!(&frame[..], b"line1\n");
        assert_eq!(buffer.view(), b"line2\n");

        assert_eq!(buffer.split_to(7), Err(BufferError::out_of_range(7, 6)));
    }
}
