//! Low-level byte access and alignment helpers shared by all codecs.
//!
//! Every read is bounds-checked up front and either returns exactly the bytes
//! it promises or fails with [`Error::OutOfBoundsRead`]. Nothing here indexes
//! a slice without checking first.

use crate::{Error, Result};

/// Every top-level WAD section starts on a multiple of this many bytes.
pub const SECTION_ALIGNMENT: usize = 0x40;

/// AES block size; content blocks are stored rounded up to it.
pub const CIPHER_BLOCK_SIZE: usize = 0x10;

/// Number of zero bytes needed to move `size` up to the next 64-byte boundary.
///
/// Returns 0 when `size` is already aligned (including 0).
#[inline]
pub fn align_padding(size: usize) -> usize {
    match size % SECTION_ALIGNMENT {
        0 => 0,
        leftover => SECTION_ALIGNMENT - leftover,
    }
}

/// Append zero bytes to `buf` until its length is 64-byte aligned.
#[inline]
pub fn pad_to_alignment(buf: &mut Vec<u8>) {
    let padding = align_padding(buf.len());
    buf.resize(buf.len() + padding, 0);
}

/// Round `size` up to a whole number of cipher blocks.
#[inline]
pub fn round_up_to_block(size: usize) -> Option<usize> {
    match size % CIPHER_BLOCK_SIZE {
        0 => Some(size),
        leftover => size.checked_add(CIPHER_BLOCK_SIZE - leftover),
    }
}

/// Borrow `len` bytes at `offset`, or fail with [`Error::OutOfBoundsRead`].
#[inline]
pub(crate) fn range(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or(Error::OutOfBoundsRead {
            offset,
            len,
            available: buf.len(),
        })
}

/// Offset-addressed big-endian reader over an in-memory buffer.
///
/// The position is an explicit value owned by the reader; independent
/// readers over independent buffers never share state.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Borrow the next `len` bytes and advance past them.
    #[inline]
    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = range(self.buf, self.pos, len)?;
        self.pos += len;
        Ok(bytes)
    }

    /// Read one byte.
    #[inline]
    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian `u16`.
    #[inline]
    pub(crate) fn be_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.bytesa()?))
    }

    /// Read a big-endian `u32`.
    #[inline]
    pub(crate) fn be_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.bytesa()?))
    }

    /// Read a big-endian `u64`.
    #[inline]
    pub(crate) fn be_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.bytesa()?))
    }

    /// Read exactly `N` bytes into a fixed-size array.
    #[inline]
    pub(crate) fn bytesa<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut b = [0u8; N];
        b.copy_from_slice(self.take(N)?);
        Ok(b)
    }
}
