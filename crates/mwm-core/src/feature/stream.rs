use std::iter::FusedIterator;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::codec::SectionReader;
use crate::error::{Error, Result};
use crate::geo::CoordSpace;
use crate::metadata::MetadataIndex;
use crate::tables::TypeTable;
use crate::version::MwmVersion;

use super::{decode_record, Feature};

/// Last container format whose records start at the beginning of `dat`
pub const LAST_PLAIN_FORMAT: u32 = 10;

/// Container format whose `dat` section opens with a sub-header
pub const HEADED_FORMAT: u32 = 11;

/// The only known sub-header version
const SUB_HEADER_VERSION: u8 = 0;

/// Where the records of a `dat` section start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureLayout {
    /// Records start at the first byte
    Plain,
    /// `u8 version, u32 offset, u32 size` precede the records, which occupy
    /// `[offset, offset + size)` of the section
    Headed,
}

impl FeatureLayout {
    /// Selects the layout for a container; without a version section the
    /// records are assumed to start immediately
    pub fn for_version(version: Option<&MwmVersion>) -> Result<Self> {
        match version.map(|v| v.format) {
            None | Some(0..=LAST_PLAIN_FORMAT) => Ok(Self::Plain),
            Some(HEADED_FORMAT) => Ok(Self::Headed),
            Some(format) => Err(Error::unsupported("feature section", format)),
        }
    }
}

/// Lazy forward-only sequence of the features in a `dat` section.
///
/// Records are decoded one at a time as the iterator advances. The stream
/// stops after the first error; [`FeatureStream::rewind`] starts it over
/// from the first record.
#[derive(Debug, Clone)]
pub struct FeatureStream {
    records: SectionReader,
    types: Arc<TypeTable>,
    space: CoordSpace,
    metadata: Option<MetadataIndex>,
    next_index: u32,
    failed: bool,
}

impl FeatureStream {
    /// Creates a stream over a `dat` section
    pub fn new(
        mut section: SectionReader,
        layout: FeatureLayout,
        types: Arc<TypeTable>,
        space: CoordSpace,
        metadata: Option<MetadataIndex>,
    ) -> Result<Self> {
        let records = match layout {
            FeatureLayout::Plain => section,
            FeatureLayout::Headed => {
                let version = section.read_u8()?;
                if version != SUB_HEADER_VERSION {
                    return Err(Error::unsupported("feature section header", version as u32));
                }
                let offset = section.read_u32()? as usize;
                let size = section.read_u32()? as usize;
                debug!("Feature records at {}+{} of dat", offset, size);
                section.sub_reader(offset, size)?
            }
        };

        Ok(Self {
            records,
            types,
            space,
            metadata,
            next_index: 0,
            failed: false,
        })
    }

    /// Restarts the stream at the first record
    pub fn rewind(&mut self) {
        self.records.rewind();
        self.next_index = 0;
        self.failed = false;
    }

    /// Index the next feature will have
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Returns true if metadata is attached to the yielded features
    pub fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    /// Decodes every remaining feature
    pub fn collect_all(self) -> Result<Vec<Feature>> {
        self.collect()
    }

    fn decode_next(&mut self) -> Result<Feature> {
        let index = self.next_index;
        let mut feature = decode_record(&mut self.records, index, &self.types, &self.space)?;
        if let Some(metadata) = &self.metadata {
            feature.metadata = metadata.get(index)?;
        }
        trace!(
            "Feature {} ({}, {} types, {} bytes)",
            index,
            feature.kind,
            feature.types.len(),
            feature.size
        );
        self.next_index += 1;
        Ok(feature)
    }
}

impl Iterator for FeatureStream {
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.records.has_remaining() {
            return None;
        }

        let result = self.decode_next();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

impl FusedIterator for FeatureStream {}
