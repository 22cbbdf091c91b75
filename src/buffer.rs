//! Owned byte buffer with a single read cursor.
//!
//! All primitive reads go through the file's byte order (see [`Endian`]) and
//! re-check the end-of-buffer invariant before the cursor moves, so the
//! cursor can never pass `len()`.
//!
//! [`ByteBuffer::replace_region`] is the only operation that changes the
//! buffer's length.  It is used by the inflator to splice decompressed bytes
//! over a compressed element; afterwards the cursor sits at the start of the
//! replaced region so the new bytes are decoded from their first header.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{DecodeError, Result};

/// Every data element starts on a multiple of this many bytes.
pub const ALIGNMENT: usize = 8;

/// Round `offset` up to the next multiple of [`ALIGNMENT`].
#[inline]
pub fn align_up(offset: usize) -> usize {
    (offset + (ALIGNMENT - 1)) & !(ALIGNMENT - 1)
}

/// Byte order declared by the file header's endianness indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    #[inline]
    pub fn u16(self, b: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(b),
            Endian::Big    => BigEndian::read_u16(b),
        }
    }

    #[inline]
    pub fn i16(self, b: &[u8]) -> i16 {
        match self {
            Endian::Little => LittleEndian::read_i16(b),
            Endian::Big    => BigEndian::read_i16(b),
        }
    }

    #[inline]
    pub fn u32(self, b: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(b),
            Endian::Big    => BigEndian::read_u32(b),
        }
    }

    #[inline]
    pub fn i32(self, b: &[u8]) -> i32 {
        match self {
            Endian::Little => LittleEndian::read_i32(b),
            Endian::Big    => BigEndian::read_i32(b),
        }
    }

    #[inline]
    pub fn u64(self, b: &[u8]) -> u64 {
        match self {
            Endian::Little => LittleEndian::read_u64(b),
            Endian::Big    => BigEndian::read_u64(b),
        }
    }

    #[inline]
    pub fn i64(self, b: &[u8]) -> i64 {
        match self {
            Endian::Little => LittleEndian::read_i64(b),
            Endian::Big    => BigEndian::read_i64(b),
        }
    }

    #[inline]
    pub fn f32(self, b: &[u8]) -> f32 {
        match self {
            Endian::Little => LittleEndian::read_f32(b),
            Endian::Big    => BigEndian::read_f32(b),
        }
    }

    #[inline]
    pub fn f64(self, b: &[u8]) -> f64 {
        match self {
            Endian::Little => LittleEndian::read_f64(b),
            Endian::Big    => BigEndian::read_f64(b),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ByteBuffer {
    data:   Vec<u8>,
    cursor: usize,
    endian: Endian,
}

impl ByteBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, cursor: 0, endian: Endian::Little }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.cursor == self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        match self.cursor.checked_add(needed) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(DecodeError::OutOfBounds {
                offset:    self.cursor,
                needed,
                available: self.remaining(),
            }),
        }
    }

    pub fn advance(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.cursor += n;
        Ok(())
    }

    /// Move the cursor up to the next 8-byte boundary (no-op when aligned).
    /// Fails if the boundary lies past the end of the buffer.
    pub fn align(&mut self) -> Result<()> {
        let aligned = align_up(self.cursor);
        self.advance(aligned - self.cursor)
    }

    /// Reposition the cursor.  Used to rewind after a splice and to jump
    /// past the declared end of an element whose body was fully decoded.
    pub(crate) fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(DecodeError::OutOfBounds {
                offset:    self.cursor,
                needed:    pos.saturating_sub(self.cursor),
                available: self.remaining(),
            });
        }
        self.cursor = pos;
        Ok(())
    }

    /// Borrow `n` bytes at the cursor and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.ensure(n)?;
        let start = self.cursor;
        self.cursor += n;
        Ok(&self.data[start..start + n])
    }

    /// Borrow `n` bytes at the cursor without moving it.
    pub fn peek_bytes(&self, n: usize) -> Result<&[u8]> {
        self.ensure(n)?;
        Ok(&self.data[self.cursor..self.cursor + n])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let e = self.endian;
        Ok(e.u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let e = self.endian;
        Ok(e.u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let e = self.endian;
        Ok(e.i32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let e = self.endian;
        Ok(e.u64(self.read_bytes(8)?))
    }

    pub fn peek_u32(&self) -> Result<u32> {
        Ok(self.endian.u32(self.peek_bytes(4)?))
    }

    /// Remove `old_len` bytes at `start` and insert `new_bytes` in their
    /// place, shifting everything after the region.  The cursor is left at
    /// `start`.
    pub fn replace_region(&mut self, start: usize, old_len: usize, new_bytes: &[u8]) -> Result<()> {
        let end = start
            .checked_add(old_len)
            .filter(|&end| end <= self.data.len())
            .ok_or(DecodeError::OutOfBounds {
                offset:    start,
                needed:    old_len,
                available: self.data.len().saturating_sub(start),
            })?;
        self.data.splice(start..end, new_bytes.iter().copied());
        self.cursor = start;
        Ok(())
    }
}
