//! Encode-side helpers for crafting fixtures in unit tests.

use crate::geo::Point;

pub(crate) fn put_varuint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

pub(crate) fn zigzag_encode(value: i64) -> u64 {
    if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        (value as u64) << 1
    }
}

pub(crate) fn put_varint(buf: &mut Vec<u8>, value: i64) {
    put_varuint(buf, zigzag_encode(value));
}

/// `varuint (len - 1)` followed by the bytes; `s` must not be empty
pub(crate) fn put_string(buf: &mut Vec<u8>, s: &str) {
    put_string_bytes(buf, s.as_bytes());
}

pub(crate) fn put_string_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    assert!(!bytes.is_empty(), "length-prefixed strings cannot be empty");
    put_varuint(buf, bytes.len() as u64 - 1);
    buf.extend_from_slice(bytes);
}

pub(crate) fn put_plain_string(buf: &mut Vec<u8>, s: &str) {
    put_varuint(buf, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

pub(crate) fn shuffle(mut x: u32) -> u32 {
    x = ((x & 0x0000_FF00) << 8) | ((x >> 8) & 0x0000_FF00) | (x & 0xFF00_00FF);
    x = ((x & 0x00F0_00F0) << 4) | ((x >> 4) & 0x00F0_00F0) | (x & 0xF00F_F00F);
    x = ((x & 0x0C0C_0C0C) << 2) | ((x >> 2) & 0x0C0C_0C0C) | (x & 0xC3C3_C3C3);
    x = ((x & 0x2222_2222) << 1) | ((x >> 1) & 0x2222_2222) | (x & 0x9999_9999);
    x
}

pub(crate) fn bitwise_merge(x: u32, y: u32) -> u64 {
    let hi = (y & 0xFFFF_0000) | (x >> 16);
    let lo = ((y & 0xFFFF) << 16) | (x & 0xFFFF);
    ((shuffle(hi) as u64) << 32) | shuffle(lo) as u64
}

pub(crate) fn encode_delta(point: Point, base: Point) -> u64 {
    let dx = zigzag_encode(point.x - base.x) as u32;
    let dy = zigzag_encode(point.y - base.y) as u32;
    bitwise_merge(dx, dy)
}

/// Lays out sections back to back after the 8-byte directory pointer and
/// appends the directory.
#[derive(Default)]
pub(crate) struct ContainerBuilder {
    sections: Vec<(String, Vec<u8>)>,
}

impl ContainerBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn section(mut self, name: &str, data: Vec<u8>) -> Self {
        self.sections.push((name.to_string(), data));
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut out = vec![0u8; 8];
        let mut entries = Vec::new();
        for (name, data) in &self.sections {
            entries.push((name.clone(), out.len() as u64, data.len() as u64));
            out.extend_from_slice(data);
        }
        let dir_offset = out.len() as u64;
        out[..8].copy_from_slice(&dir_offset.to_le_bytes());
        put_varuint(&mut out, entries.len() as u64);
        for (name, offset, len) in entries {
            put_plain_string(&mut out, &name);
            put_varuint(&mut out, offset);
            put_varuint(&mut out, len);
        }
        out
    }
}

/// `version` section: 4-byte prologue, `format - 1`, stored date value
pub(crate) fn version_section(format: u32, value: u64) -> Vec<u8> {
    let mut buf = b"MWM\0".to_vec();
    put_varuint(&mut buf, format as u64 - 1);
    put_varuint(&mut buf, value);
    buf
}

/// `header` section with the given coordinate bits and base point
pub(crate) fn header_section(coord_bits: u64, base: (u32, u32), map_type: i64) -> Vec<u8> {
    let mut buf = Vec::new();
    put_varuint(&mut buf, coord_bits);
    put_varuint(&mut buf, bitwise_merge(base.0, base.1));
    put_varint(&mut buf, bitwise_merge(0, 0) as i64);
    put_varint(&mut buf, bitwise_merge(1 << 20, 1 << 20) as i64);
    put_varuint(&mut buf, 0);
    put_varuint(&mut buf, 0);
    put_varint(&mut buf, map_type);
    buf
}
