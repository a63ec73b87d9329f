//! Capacity-bounded text buffer with an overrun guard.
//!
//! The buffer exposes `capacity` writable bytes. Behind them sits a guard
//! region filled with [`GUARD_BYTE`]; any change to the guard after a copy
//! means the writer went past the capacity it was given.
//!
//! ```text
//! [ payload: capacity bytes ][ guard: guard_len bytes of 'X' ]
//! ```

/// Fill pattern for the payload tail and the guard region.
pub const GUARD_BYTE: u8 = b'X';

#[derive(Clone, Debug)]
pub struct DisplayBuf {
    bytes: Vec<u8>,
    capacity: usize,
}

impl DisplayBuf {
    /// A buffer of `capacity` payload bytes followed by `guard_len` guard
    /// bytes. The payload starts as an empty string.
    pub fn new(capacity: usize, guard_len: usize) -> Self {
        let mut buf = Self {
            bytes: vec![GUARD_BYTE; capacity + guard_len],
            capacity,
        };
        buf.reset();
        buf
    }

    /// Refill the whole buffer with the pattern and terminate the payload at
    /// offset zero.
    pub fn reset(&mut self) {
        self.bytes.fill(GUARD_BYTE);
        if self.capacity > 0 {
            self.bytes[0] = 0;
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn guard_len(&self) -> usize {
        self.bytes.len() - self.capacity
    }

    /// The bytes a well-behaved writer may touch.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.capacity]
    }

    /// Payload and guard together. Only for writers that are being checked
    /// for overruns.
    pub fn backing_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Copy at most `capacity - 1` bytes of `src` and zero-fill the rest of
    /// the payload, so the payload is always terminated. Returns the number
    /// of bytes copied.
    pub fn write_truncated(&mut self, src: &[u8]) -> usize {
        let Some(room) = self.capacity.checked_sub(1) else {
            return 0;
        };
        let n = src.len().min(room);
        let payload = &mut self.bytes[..self.capacity];
        payload[..n].copy_from_slice(&src[..n]);
        payload[n..].fill(0);
        n
    }

    /// Payload up to its first NUL (or the whole payload if unterminated).
    pub fn as_bytes(&self) -> &[u8] {
        let payload = &self.bytes[..self.capacity];
        let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        &payload[..end]
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    /// Offset (relative to the guard start) of the first altered guard byte.
    pub fn first_overrun(&self) -> Option<usize> {
        self.bytes[self.capacity..]
            .iter()
            .position(|&b| b != GUARD_BYTE)
    }

    pub fn guard_intact(&self) -> bool {
        self.first_overrun().is_none()
    }
}
