//! Top-level section directory.
//!
//! ```text
//! [8 bytes]  directory offset (little-endian u64), at file position 0
//! ...        section payloads, in no guaranteed order
//! directory: varuint count
//!            count x (plain string name, varuint offset, varuint length)
//! ```

use tracing::{debug, trace};

use crate::codec::SectionReader;
use crate::error::{Error, Result};

/// Size of the directory pointer at the start of the file
pub const DIRECTORY_POINTER_LEN: u64 = 8;

/// One named byte range of the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    /// Section name
    pub name: String,
    /// Absolute start offset
    pub offset: u64,
    /// Length in bytes
    pub size: u64,
}

impl SectionInfo {
    /// Absolute offset one past the last byte
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// All sections of a container, in directory order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    sections: Vec<SectionInfo>,
}

impl Directory {
    /// Parses the directory and checks every range against `file_len`
    pub fn parse(reader: &mut SectionReader, file_len: u64) -> Result<Self> {
        let count = reader.read_len()?;
        debug!("Directory lists {} sections", count);

        let mut sections = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let at = reader.position();
            let name = reader.read_plain_string()?;
            let offset = reader.read_varuint()?;
            let size = reader.read_varuint()?;

            let fits = offset
                .checked_add(size)
                .is_some_and(|end| end <= file_len);
            if !fits {
                return Err(Error::SectionOutOfBounds {
                    name,
                    offset,
                    size,
                    file_len,
                });
            }
            if offset < DIRECTORY_POINTER_LEN && size > 0 {
                return Err(Error::malformed(
                    at,
                    format!("section '{name}' overlaps the directory pointer"),
                ));
            }

            trace!("Section '{}' at {}+{}", name, offset, size);
            sections.push(SectionInfo { name, offset, size });
        }

        Ok(Self { sections })
    }

    /// All entries in directory order
    pub fn sections(&self) -> &[SectionInfo] {
        &self.sections
    }

    /// Looks up a section by name; a repeated name resolves to its last entry
    pub fn get(&self, name: &str) -> Option<&SectionInfo> {
        self.sections.iter().rev().find(|s| s.name == name)
    }

    /// Returns true if the section is listed with a non-zero length
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some_and(|s| s.size > 0)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if the directory has no entries
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
