//! Id-mapping side file (`<tile>.mwm.osm2ft`): feature index to OSM id.
//!
//! Two layouts exist and are told apart by the first four bytes:
//!
//! ```text
//! legacy     varuint count
//!            count x (u64 osm id, u32 feature id, u32 filler)
//!
//! versioned  u32 0xFFFFFFFF, u8 version
//!   v1       varuint count
//!            count x (u64 osm id, u64 secondary id, u32 feature id, u32 filler)
//! ```
//!
//! All fixed-width fields are little-endian.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, trace};

use crate::codec::read_varuint;
use crate::error::{Error, Result};

/// First four bytes of a versioned id map
pub const VERSIONED_SENTINEL: u32 = u32::MAX;

const NODE_TAG: u64 = 0x4000_0000_0000_0000;
const WAY_TAG: u64 = 0x8000_0000_0000_0000;
const RELATION_TAG: u64 = 0xC000_0000_0000_0000;

const LEGACY_RECORD_LEN: u64 = 16;
const V1_RECORD_LEN: u64 = 24;

/// OSM element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OsmKind {
    /// Node
    Node,
    /// Way
    Way,
    /// Relation
    Relation,
}

impl OsmKind {
    /// One-letter prefix used in OSM id strings
    pub fn prefix(self) -> char {
        match self {
            Self::Node => 'n',
            Self::Way => 'w',
            Self::Relation => 'r',
        }
    }
}

/// An OSM element reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OsmId {
    /// Element kind
    pub kind: OsmKind,
    /// Element id without the kind tag
    pub id: u64,
}

impl OsmId {
    /// Decodes a tagged 64-bit OSM id; untagged values yield `None`
    pub fn decode(code: u64) -> Option<Self> {
        let kind = if code & RELATION_TAG == RELATION_TAG {
            OsmKind::Relation
        } else if code & NODE_TAG == NODE_TAG {
            OsmKind::Node
        } else if code & WAY_TAG == WAY_TAG {
            OsmKind::Way
        } else {
            return None;
        };
        Some(Self {
            kind,
            id: code & !RELATION_TAG,
        })
    }
}

impl fmt::Display for OsmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.id)
    }
}

/// One decoded record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdMapEntry {
    /// Index of the feature in its container
    pub feature_id: u32,
    /// The OSM element the feature was built from
    pub osm: OsmId,
}

/// Physical layout of an id-map file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMapLayout {
    /// No sentinel; 16-byte records
    Legacy,
    /// Sentinel plus version 1; 24-byte records
    V1,
}

/// Decoded id-map file with lookups in both directions.
///
/// When several records share a key the last one wins.
#[derive(Debug, Clone)]
pub struct IdMap {
    layout: IdMapLayout,
    entries: Vec<IdMapEntry>,
    by_feature: HashMap<u32, OsmId>,
    by_osm: HashMap<OsmId, u32>,
}

impl IdMap {
    /// Loads the id map at `path`
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        let map = Self::from_reader(BufReader::new(file))?;
        debug!("Loaded {} id map entries from {}", map.len(), path.display());
        Ok(map)
    }

    /// Decodes an id map from the start of `reader`
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let layout = match read_u32_or_eof(&mut reader)? {
            Some(VERSIONED_SENTINEL) => match reader.read_u8().map_err(|e| eof_at(e, 4, 1))? {
                1 => IdMapLayout::V1,
                version => return Err(Error::unsupported("id map", version as u32)),
            },
            _ => {
                reader.seek(SeekFrom::Start(0))?;
                IdMapLayout::Legacy
            }
        };

        let count = read_varuint(&mut reader)?;
        let mut pos = reader.stream_position()?;
        debug!("Id map layout {:?} with {} records", layout, count);

        let mut map = Self {
            layout,
            // The count is untrusted; let the vector grow past this
            entries: Vec::with_capacity(count.min(1 << 16) as usize),
            by_feature: HashMap::new(),
            by_osm: HashMap::new(),
        };

        for _ in 0..count {
            let (code, feature_id) = match layout {
                IdMapLayout::Legacy => read_legacy_record(&mut reader),
                IdMapLayout::V1 => read_v1_record(&mut reader),
            }
            .map_err(|e| eof_at(e, pos, layout.record_len()))?;
            pos += layout.record_len();

            match OsmId::decode(code) {
                Some(osm) => map.insert(IdMapEntry { feature_id, osm }),
                None => trace!("Dropping id map record with untagged id {:#x}", code),
            }
        }

        Ok(map)
    }

    fn insert(&mut self, entry: IdMapEntry) {
        if let Some(previous) = self.by_feature.insert(entry.feature_id, entry.osm) {
            debug!(
                "Feature {} mapped twice ({} then {})",
                entry.feature_id, previous, entry.osm
            );
        }
        if let Some(previous) = self.by_osm.insert(entry.osm, entry.feature_id) {
            debug!(
                "{} mapped twice (feature {} then {})",
                entry.osm, previous, entry.feature_id
            );
        }
        self.entries.push(entry);
    }

    /// Layout the file was stored in
    pub fn layout(&self) -> IdMapLayout {
        self.layout
    }

    /// OSM element of a feature
    pub fn osm_id(&self, feature_id: u32) -> Option<OsmId> {
        self.by_feature.get(&feature_id).copied()
    }

    /// Feature built from an OSM element
    pub fn feature_id(&self, osm: OsmId) -> Option<u32> {
        self.by_osm.get(&osm).copied()
    }

    /// Feature index to OSM id table
    pub fn feature_to_osm(&self) -> &HashMap<u32, OsmId> {
        &self.by_feature
    }

    /// OSM id to feature index table
    pub fn osm_to_feature(&self) -> &HashMap<OsmId, u32> {
        &self.by_osm
    }

    /// Records with a recognised OSM kind, in file order
    pub fn entries(&self) -> &[IdMapEntry] {
        &self.entries
    }

    /// Number of kept records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no record was kept
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IdMapLayout {
    fn record_len(self) -> u64 {
        match self {
            Self::Legacy => LEGACY_RECORD_LEN,
            Self::V1 => V1_RECORD_LEN,
        }
    }
}

/// Loads the id map at `path`
pub fn read_id_map(path: impl AsRef<Path>) -> Result<IdMap> {
    IdMap::from_path(path)
}

fn read_u32_or_eof<R: Read>(reader: &mut R) -> Result<Option<u32>> {
    match reader.read_u32::<LittleEndian>() {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn read_legacy_record<R: Read>(reader: &mut R) -> io::Result<(u64, u32)> {
    let code = reader.read_u64::<LittleEndian>()?;
    let feature_id = reader.read_u32::<LittleEndian>()?;
    let _filler = reader.read_u32::<LittleEndian>()?;
    Ok((code, feature_id))
}

fn read_v1_record<R: Read>(reader: &mut R) -> io::Result<(u64, u32)> {
    let code = reader.read_u64::<LittleEndian>()?;
    let _secondary = reader.read_u64::<LittleEndian>()?;
    let feature_id = reader.read_u32::<LittleEndian>()?;
    let _filler = reader.read_u32::<LittleEndian>()?;
    Ok((code, feature_id))
}

fn eof_at(e: io::Error, offset: u64, needed: u64) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::truncated(offset, needed as usize, 0)
    } else {
        e.into()
    }
}
