//! Ordered-walk metadata layout (formats up to 9).
//!
//! The index is an unordered sequence of little-endian `u32` pairs
//! `(feature id, block offset)`. Blocks in the data section carry no
//! length, so their boundaries only emerge from decoding them in physical
//! order. The index is sorted by offset and merged against the walk: each
//! non-empty block is attached to the pair whose offset equals the block's
//! start.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::codec::SectionReader;
use crate::error::Result;

use super::{decode_block, BlockEncoding, MetadataRecord};

/// Last container format using this layout
pub const MAX_FORMAT: u32 = 9;

/// Reads the index pairs as `(offset, feature id)`, sorted by offset
fn read_pairs(mut index: SectionReader) -> Result<Vec<(u32, u32)>> {
    let mut pairs = Vec::with_capacity(index.len() / 8);
    while index.has_remaining() {
        let feature_id = index.read_u32()?;
        let offset = index.read_u32()?;
        pairs.push((offset, feature_id));
    }
    pairs.sort_by_key(|&(offset, _)| offset);
    Ok(pairs)
}

/// Decodes every block and matches it to its feature
pub fn build(
    index: SectionReader,
    mut data: SectionReader,
    encoding: BlockEncoding,
) -> Result<HashMap<u32, MetadataRecord>> {
    let pairs = read_pairs(index)?;
    let mut records = HashMap::with_capacity(pairs.len());
    let mut next = 0;

    while data.has_remaining() {
        let start = data.offset() as u64;
        let record = decode_block(&mut data, encoding)?;
        if record.is_empty() {
            continue;
        }

        while next < pairs.len() && (pairs[next].0 as u64) < start {
            next += 1;
        }
        match pairs.get(next) {
            Some(&(offset, feature_id)) if offset as u64 == start => {
                records.insert(feature_id, record);
            }
            _ => trace!("Metadata block at {} has no index entry", start),
        }
    }

    debug!(
        "Matched {} metadata blocks against {} index entries",
        records.len(),
        pairs.len()
    );
    Ok(records)
}
