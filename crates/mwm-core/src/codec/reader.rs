use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::error::{Error, Result};

use super::varint::{decode_varuint, zigzag_decode};

/// Forward cursor over the bytes of a single section.
///
/// The cursor can never leave `[0, len)` of the buffer it was created from:
/// fixed-width reads past the end fail with [`Error::TruncatedRecord`].
/// Varuints are the exception and are implicitly terminated by the end of
/// the data. Positions reported in errors are absolute file offsets.
#[derive(Debug, Clone)]
pub struct SectionReader {
    data: Bytes,
    pos: usize,
    base: u64,
}

impl SectionReader {
    /// Creates a reader over `data`, which starts at file offset `base`
    pub fn new(data: Bytes, base: u64) -> Self {
        Self { data, pos: 0, base }
    }

    /// Offset of the cursor relative to the start of the section
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Absolute file offset of the cursor
    pub fn position(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// Total length of the section
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the section is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the cursor and the end of the section
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true while the cursor is inside the section
    pub fn has_remaining(&self) -> bool {
        self.pos < self.data.len()
    }

    /// Moves the cursor to `offset` bytes after the section start
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::malformed(
                self.base + offset as u64,
                format!("seek beyond section end ({} bytes)", self.data.len()),
            ));
        }
        self.pos = offset;
        Ok(())
    }

    /// Reader over `[start, start + len)` of this section, with its cursor
    /// at the start of the range
    pub fn sub_reader(&self, start: usize, len: usize) -> Result<SectionReader> {
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                Error::malformed(
                    self.base + start as u64,
                    format!("range of {len} bytes exceeds section end ({} bytes)", self.data.len()),
                )
            })?;
        Ok(Self::new(self.data.slice(start..end), self.base + start as u64))
    }

    /// Moves the cursor back to the section start
    pub(crate) fn rewind(&mut self) {
        self.pos = 0;
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(Error::truncated(self.position(), n, self.remaining()));
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    /// Skips `n` bytes
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Reads a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a little-endian `u32`
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    /// Reads a little-endian `u64`
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    /// Reads a varuint; the end of the section terminates it
    pub fn read_varuint(&mut self) -> Result<u64> {
        let (value, len) = decode_varuint(&self.data[self.pos..])
            .map_err(|_| Error::malformed(self.position(), "varuint longer than 10 bytes"))?;
        self.pos += len;
        Ok(value)
    }

    /// Reads a zigzag-encoded varint
    pub fn read_varint(&mut self) -> Result<i64> {
        Ok(zigzag_decode(self.read_varuint()?))
    }

    /// Reads a varuint that must fit a `usize` length
    pub fn read_len(&mut self) -> Result<usize> {
        let at = self.position();
        let value = self.read_varuint()?;
        usize::try_from(value).map_err(|_| Error::malformed(at, format!("length {value} too large")))
    }

    /// Returns the next `n` bytes without copying
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        if self.remaining() < n {
            return Err(Error::truncated(self.position(), n, self.remaining()));
        }
        let slice = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(slice)
    }

    /// Reads `n` bytes of UTF-8 text
    pub fn read_utf8(&mut self, n: usize) -> Result<String> {
        let at = self.position();
        let bytes = self.take(n)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidText { offset: at })
    }

    /// Reads a string prefixed by its exact byte length (`varuint n`, n bytes)
    pub fn read_plain_string(&mut self) -> Result<String> {
        let n = self.read_len()?;
        self.read_utf8(n)
    }

    /// Reads the raw payload of a non-empty length-prefixed string
    /// (`varuint n`, n + 1 bytes)
    pub fn read_string_bytes(&mut self) -> Result<Bytes> {
        let n = self.read_len()?;
        let n = n
            .checked_add(1)
            .ok_or_else(|| Error::malformed(self.position(), "string length overflow"))?;
        self.read_bytes(n)
    }

    /// Reads a non-empty length-prefixed string (`varuint n`, n + 1 bytes)
    pub fn read_string(&mut self) -> Result<String> {
        let at = self.position();
        let bytes = self.read_string_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidText { offset: at })
    }

    /// Reads a varuint count followed by that many varuints
    pub fn read_varuint_array(&mut self) -> Result<Vec<u64>> {
        let count = self.read_len()?;
        // Every element takes at least one byte
        let mut values = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            values.push(self.read_varuint()?);
        }
        Ok(values)
    }

    /// Reads a "numeric string": small integers are stored inline in the
    /// varuint, anything else as explicit bytes
    pub fn read_numeric_string(&mut self) -> Result<String> {
        let value = self.read_varuint()?;
        if value & 1 != 0 {
            return Ok((value >> 1).to_string());
        }
        let n = usize::try_from((value >> 1) + 1)
            .map_err(|_| Error::malformed(self.position(), "numeric string too long"))?;
        self.read_utf8(n)
    }
}
