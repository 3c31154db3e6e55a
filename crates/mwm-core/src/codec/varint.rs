//! Variable-length integer decoding.
//!
//! Unsigned values are stored little-endian in base 128: each byte carries
//! 7 payload bits and the top bit flags that another byte follows.
//!
//! Signed values use this format's own zigzag flavour: the magnitude is
//! `u >> 1` and the value is negated when `u & 1` is set. Note that this is
//! not the protobuf mapping (`(u >> 1) ^ -(u & 1)`); an odd `u` decodes to
//! `-(u >> 1)`, not `-(u >> 1) - 1`.

use std::io::{ErrorKind, Read};

use crate::error::{Error, Result};

/// A 64-bit value never needs more than 10 bytes
pub const MAX_VARUINT_LEN: usize = 10;

/// Decode a varuint from the given bytes.
///
/// Returns the decoded value and the number of bytes consumed. Running out
/// of data before a terminating byte is not an error: the bytes seen so far
/// form the value (an empty slice decodes to `0`). Only an encoding longer
/// than [`MAX_VARUINT_LEN`] bytes is rejected.
pub fn decode_varuint(data: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in data.iter().enumerate() {
        if i >= MAX_VARUINT_LEN {
            return Err(Error::malformed(i as u64, "varuint longer than 10 bytes"));
        }

        result |= ((byte & 0x7F) as u64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Ok((result, data.len()))
}

/// Decode a varuint from a byte stream, with the same lenient handling of
/// the end of data as [`decode_varuint`]
pub fn read_varuint<R: Read>(reader: &mut R) -> Result<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;
    let mut byte = [0u8; 1];

    for _ in 0..MAX_VARUINT_LEN {
        match reader.read_exact(&mut byte) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(result),
            Err(e) => return Err(e.into()),
        }

        result |= ((byte[0] & 0x7F) as u64) << shift;
        shift += 7;

        if byte[0] & 0x80 == 0 {
            return Ok(result);
        }
    }

    Err(Error::malformed(0, "varuint longer than 10 bytes"))
}

/// Map an unsigned varuint payload back to a signed value
pub fn zigzag_decode(value: u64) -> i64 {
    let magnitude = (value >> 1) as i64;
    if value & 1 == 0 {
        magnitude
    } else {
        -magnitude
    }
}
