//! Direct-lookup metadata layout (formats 10 and 11).
//!
//! The index is a flat array of fixed-size little-endian `u32` pairs
//! `(feature id, block offset)` sorted by feature id. Blocks use the
//! counted encoding and are decoded only when looked up.

use tracing::debug;

use crate::codec::SectionReader;
use crate::error::{Error, Result};

use super::{decode_block, BlockEncoding, MetadataRecord};

/// First container format using this layout
pub const MIN_FORMAT: u32 = 10;

/// Last container format using this layout
pub const MAX_FORMAT: u32 = 11;

const ENTRY_LEN: usize = 8;

/// Sorted `(feature id, offset)` pairs over the `meta` section
#[derive(Debug, Clone)]
pub struct FlatIndex {
    entries: Vec<(u32, u32)>,
    data: SectionReader,
}

impl FlatIndex {
    /// Reads the index array
    pub fn parse(mut index: SectionReader, data: SectionReader) -> Result<Self> {
        if index.len() % ENTRY_LEN != 0 {
            return Err(Error::malformed(
                index.position(),
                format!("metadata index length {} is not a multiple of {ENTRY_LEN}", index.len()),
            ));
        }

        let mut entries = Vec::with_capacity(index.len() / ENTRY_LEN);
        while index.has_remaining() {
            let feature_id = index.read_u32()?;
            let offset = index.read_u32()?;
            if offset as usize >= data.len() {
                return Err(Error::malformed(
                    index.position(),
                    format!("metadata offset {offset} outside data section"),
                ));
            }
            entries.push((feature_id, offset));
        }

        if !entries.windows(2).all(|w| w[0].0 <= w[1].0) {
            debug!("Metadata index not sorted by feature id, sorting");
            entries.sort_by_key(|&(feature_id, _)| feature_id);
        }

        Ok(Self { entries, data })
    }

    /// Decodes the block of `feature_id`; blocks without fields count as
    /// no metadata
    pub fn get(&self, feature_id: u32) -> Result<Option<MetadataRecord>> {
        let Ok(i) = self.entries.binary_search_by_key(&feature_id, |&(id, _)| id) else {
            return Ok(None);
        };
        let mut reader = self.data.clone();
        reader.seek(self.entries[i].1 as usize)?;
        let record = decode_block(&mut reader, BlockEncoding::Counted)?;
        Ok((!record.is_empty()).then_some(record))
    }

    /// Feature ids with metadata, ascending
    pub fn feature_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|&(id, _)| id)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
