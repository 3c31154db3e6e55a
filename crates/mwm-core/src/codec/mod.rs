//! Bit-level primitives shared by every section decoder.
//!
//! - [`varint`]: base-128 variable-length integers and the zigzag mapping
//! - [`bits`]: Z-order (Morton) de-interleaving of packed points
//! - [`SectionReader`]: a cursor bounded to one section's bytes

pub mod bits;
mod reader;
pub mod varint;

pub use bits::{bitwise_split, decode_delta, unshuffle};
pub use reader::SectionReader;
pub use varint::{decode_varuint, read_varuint, zigzag_decode, MAX_VARUINT_LEN};
