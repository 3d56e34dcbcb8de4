//! Bounds-checked sequential reads over a byte buffer.

use thiserror::Error;

/// Byte order of multi-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// A read would run past the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Reading {needed} bytes at offset {offset} runs past the end of the data.")]
pub struct OutOfBounds {
    /// Absolute offset of the failed read.
    pub offset: usize,
    /// Number of bytes the read required.
    pub needed: usize,
}

/// Sequential reader over a fixed byte buffer.
///
/// Positions are reported relative to a base offset, so a cursor over a
/// sub-slice of a document reports document offsets.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    base: usize,
    i: usize,
}

macro_rules! read_number {
    ($(#[$attr:meta])* $name:ident, $t:ty) => {
        $(#[$attr])*
        pub fn $name(&mut self, endian: Endian) -> Result<$t, OutOfBounds> {
            let r = self.read_array()?;
            Ok(match endian {
                Endian::Little => <$t>::from_le_bytes(r),
                Endian::Big => <$t>::from_be_bytes(r),
            })
        }
    };
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    /// Create a cursor over `data`, which begins at offset `base` of a larger
    /// document.
    pub fn at(data: &'a [u8], base: usize) -> Self {
        Self { data, base, i: 0 }
    }

    /// Absolute offset of the next byte to be read.
    pub fn position(&self) -> usize {
        self.base + self.i
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.i
    }

    /// Take an exact number of bytes, advancing the cursor.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], OutOfBounds> {
        let out_of_bounds = OutOfBounds {
            offset: self.position(),
            needed: n,
        };

        let end = self.i.checked_add(n).ok_or(out_of_bounds)?;
        let bytes = self.data.get(self.i..end).ok_or(out_of_bounds)?;
        self.i = end;

        Ok(bytes)
    }

    /// Take a fixed-size array of bytes, advancing the cursor.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], OutOfBounds> {
        let mut r = [0; N];
        r.copy_from_slice(self.read_bytes(N)?);
        Ok(r)
    }

    /// Read a string field of `n` bytes.
    ///
    /// The string ends at the first NUL byte, or spans all `n` bytes if there
    /// is none. Invalid UTF-8 is replaced rather than rejected.
    pub fn read_string(&mut self, n: usize) -> Result<String, OutOfBounds> {
        let bytes = self.read_bytes(n)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        let [b] = self.read_array()?;
        Ok(b)
    }

    pub fn read_i8(&mut self) -> Result<i8, OutOfBounds> {
        let [b] = self.read_array()?;
        Ok(i8::from_le_bytes([b]))
    }

    read_number!(read_u16, u16);
    read_number!(read_u32, u32);
    read_number!(read_u64, u64);
    read_number!(read_i16, i16);
    read_number!(read_i32, i32);
    read_number!(read_i64, i64);
    read_number!(read_f32, f32);
    read_number!(read_f64, f64);
}
