//! Growable byte buffer backing transient strings.
//!
//! The buffer keeps a NUL byte at `data[len]` at all times so that the
//! bytes can be handed to consumers expecting a terminated string. Growth
//! is amortized by rounding every requested size up to a multiple of the
//! buffer's growth increment.

use std::fmt;
use thiserror::Error;

/// Growth increment used when none is given.
pub const DEFAULT_INCREMENT: usize = 128;

/// `reset()` shrinks the storage once the capacity exceeds
/// `increment << SHRINK_SHIFT`.
const SHRINK_SHIFT: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("offset {offset} is past the end of the buffer (length {len})")]
    OffsetOutOfRange { offset: usize, len: usize },
}

/// Round `n` up to the next multiple of `increment`.
#[inline]
pub fn roundup(n: usize, increment: usize) -> usize {
    n.div_ceil(increment) * increment
}

/// A reusable, dynamically resizing byte buffer.
///
/// Invariant: `len() <= capacity()` and the byte after the content is NUL.
#[derive(Clone, PartialEq, Eq)]
pub struct GrowableBuffer {
    // Holds `len + 1` bytes; the last one is the terminating NUL.
    data: Vec<u8>,
    capacity: usize,
    increment: usize,
}

impl GrowableBuffer {
    /// Create an empty buffer growing by `increment` bytes at a time.
    pub fn new(increment: usize) -> Self {
        Self::with_capacity(0, increment)
    }

    /// Create a buffer able to hold `capacity` bytes without growing.
    pub fn with_capacity(capacity: usize, increment: usize) -> Self {
        let increment = if increment == 0 { DEFAULT_INCREMENT } else { increment };
        let capacity = roundup(capacity.max(1), increment);
        let mut data = Vec::with_capacity(capacity + 1);
        data.push(0);
        Self {
            data,
            capacity,
            increment,
        }
    }

    /// Adopt storage handed back by a [`BufferPool`](crate::BufferPool).
    pub(crate) fn from_storage(mut storage: Vec<u8>, increment: usize) -> Self {
        let increment = if increment == 0 { DEFAULT_INCREMENT } else { increment };
        storage.clear();
        storage.push(0);
        let capacity = storage.capacity().saturating_sub(1).max(1);
        Self {
            data: storage,
            capacity,
            increment,
        }
    }

    /// Give up the storage, e.g. to return it to a pool.
    pub(crate) fn into_storage(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn increment(&self) -> usize {
        self.increment
    }

    /// Make room for a content length of `needed` bytes.
    fn ensure(&mut self, needed: usize) {
        if needed <= self.capacity {
            return;
        }
        let new_capacity = roundup(needed, self.increment);
        self.data.reserve_exact(new_capacity + 1 - self.data.len());
        self.capacity = new_capacity;
    }

    /// Append `bytes`, returning the offset at which they were written.
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        let at = self.len();
        self.ensure(at + bytes.len());
        self.data.pop();
        self.data.extend_from_slice(bytes);
        self.data.push(0);
        at
    }

    /// Append a single byte, returning its offset.
    pub fn push(&mut self, byte: u8) -> usize {
        self.append(&[byte])
    }

    /// Append a UTF-8 string.
    pub fn append_str(&mut self, s: &str) -> usize {
        self.append(s.as_bytes())
    }

    /// Overwrite bytes starting at `offset`, extending the content when the
    /// write runs past the current end. Returns the new length.
    pub fn modify(&mut self, offset: usize, bytes: &[u8]) -> Result<usize, BufferError> {
        let len = self.len();
        if offset > len {
            return Err(BufferError::OffsetOutOfRange { offset, len });
        }
        let end = offset + bytes.len();
        self.ensure(end);
        if end > len {
            self.data.resize(end + 1, 0);
        }
        self.data[offset..end].copy_from_slice(bytes);
        Ok(self.len())
    }

    /// Shorten the content to `len` bytes. No-op when already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.data.truncate(len);
            self.data.push(0);
        }
    }

    /// Drop the content. Storage is released only past a large threshold.
    pub fn reset(&mut self) {
        self.data.clear();
        let threshold = self.increment << SHRINK_SHIFT;
        if self.capacity > threshold {
            self.capacity = threshold >> 1;
            self.data.shrink_to(self.capacity + 1);
        }
        self.data.push(0);
    }

    /// The content without the trailing NUL.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// The content including the trailing NUL.
    #[inline]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data
    }

    /// The content as UTF-8 text.
    pub fn as_str(&self) -> Result<&str, simdutf8::basic::Utf8Error> {
        simdutf8::basic::from_utf8(self.as_bytes())
    }

    /// Take the content out, leaving an empty buffer with the same increment.
    pub fn export(&mut self) -> Vec<u8> {
        let mut out = std::mem::replace(self, Self::new(self.increment)).data;
        out.pop();
        out
    }

    /// Hand the storage back to the process-wide free list.
    pub fn recycle(self) {
        crate::BufferPool::global().release(self);
    }
}

impl Default for GrowableBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_INCREMENT)
    }
}

impl fmt::Debug for GrowableBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("content", &String::from_utf8_lossy(self.as_bytes()))
            .field("capacity", &self.capacity)
            .field("increment", &self.increment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundup() {
        assert_eq!(roundup(0, 16), 0);
        assert_eq!(roundup(1, 16), 16);
        assert_eq!(roundup(16, 16), 16);
        assert_eq!(roundup(17, 16), 32);
    }

    #[test]
    fn test_append_keeps_nul() {
        let mut buf = GrowableBuffer::new(4);
        assert_eq!(buf.append(b"ab"), 0);
        assert_eq!(buf.append(b"cde"), 2);
        assert_eq!(buf.as_bytes(), b"abcde");
        assert_eq!(buf.as_bytes_with_nul(), b"abcde\0");
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn test_modify_overwrites_and_extends() {
        let mut buf = GrowableBuffer::new(8);
        buf.append(b"hello");
        assert_eq!(buf.modify(1, b"EL").unwrap(), 5);
        assert_eq!(buf.as_bytes(), b"hELlo");
        assert_eq!(buf.modify(4, b"O world").unwrap(), 11);
        assert_eq!(buf.as_bytes(), b"hELlO world");
        assert_eq!(*buf.as_bytes_with_nul().last().unwrap(), 0);
    }

    #[test]
    fn test_modify_past_end_fails() {
        let mut buf = GrowableBuffer::new(8);
        buf.append(b"ab");
        assert_eq!(
            buf.modify(3, b"x"),
            Err(BufferError::OffsetOutOfRange { offset: 3, len: 2 })
        );
    }

    #[test]
    fn test_reset_shrinks_only_past_threshold() {
        let mut buf = GrowableBuffer::new(2);
        buf.append(&[b'x'; 100]);
        let cap = buf.capacity();
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), cap);

        buf.append(&[b'y'; 600]);
        assert!(buf.capacity() > 2 << 8);
        buf.reset();
        assert_eq!(buf.capacity(), (2 << 8) >> 1);
        assert_eq!(buf.as_bytes_with_nul(), b"\0");
    }

    #[test]
    fn test_truncate_and_export() {
        let mut buf = GrowableBuffer::default();
        buf.append_str("keyword");
        buf.truncate(3);
        assert_eq!(buf.as_str().unwrap(), "key");
        let out = buf.export();
        assert_eq!(out, b"key");
        assert!(buf.is_empty());
        assert_eq!(buf.increment(), DEFAULT_INCREMENT);
    }

    #[test]
    fn test_as_str_rejects_invalid_utf8() {
        let mut buf = GrowableBuffer::default();
        buf.append(&[0xff, 0xfe]);
        assert!(buf.as_str().is_err());
    }
}
