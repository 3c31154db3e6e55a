//! Z-order bit interleaving.
//!
//! Points are stored as a single 64-bit integer whose bits interleave the two
//! 32-bit axes, so that nearby points produce numerically close values and
//! small varuints. Each half of the value is de-interleaved independently and
//! the two halves are then recombined into `(x, y)`.

use crate::geo::Point;

use super::varint::zigzag_decode;

/// Inverse of the encoder's perfect shuffle for one 32-bit half.
///
/// Every round swaps two adjacent bit groups, at 2-, 4-, 8- and 16-bit
/// granularity. Masks keep all shifted bits inside 32 bits.
pub fn unshuffle(mut x: u32) -> u32 {
    x = ((x & 0x2222_2222) << 1) | ((x >> 1) & 0x2222_2222) | (x & 0x9999_9999);
    x = ((x & 0x0C0C_0C0C) << 2) | ((x >> 2) & 0x0C0C_0C0C) | (x & 0xC3C3_C3C3);
    x = ((x & 0x00F0_00F0) << 4) | ((x >> 4) & 0x00F0_00F0) | (x & 0xF00F_F00F);
    x = ((x & 0x0000_FF00) << 8) | ((x >> 8) & 0x0000_FF00) | (x & 0xFF00_00FF);
    x
}

/// Split an interleaved 64-bit value into its `(x, y)` axes
pub fn bitwise_split(value: u64) -> (u32, u32) {
    let hi = unshuffle((value >> 32) as u32);
    let lo = unshuffle(value as u32);
    let x = ((hi & 0xFFFF) << 16) | (lo & 0xFFFF);
    let y = (hi & 0xFFFF_0000) | (lo >> 16);
    (x, y)
}

/// Decode a point stored as a zigzagged per-axis delta from `base`
pub fn decode_delta(value: u64, base: Point) -> Point {
    let (dx, dy) = bitwise_split(value);
    Point::new(
        base.x + zigzag_decode(dx as u64),
        base.y + zigzag_decode(dy as u64),
    )
}
