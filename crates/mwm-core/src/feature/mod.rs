//! Feature records of the `dat` section.
//!
//! ## Record layout
//!
//! ```text
//! varuint   record length (bytes after this prefix)
//! u8        header bits
//!             0..=2  type count - 1
//!             3      has name
//!             4      has layer
//!             5..=6  geometry kind
//!             7      has additional info
//! varuint[] type ids (type count of them)
//! string    packed names             (if has name)
//! u8        layer                    (if has layer)
//! ...       additional info          (if has additional info)
//!             POINT          u8 rank
//!             LINE           string road number
//!             AREA/POINT_EX  numeric string house number
//! varuint   center point delta       (POINT/POINT_EX)
//! ...       undecoded geometry up to the record end
//! ```
//!
//! Line and area geometry is kept as an opaque payload and not decoded.

mod names;
mod stream;

use std::fmt;

use bytes::Bytes;

use crate::codec::{decode_delta, SectionReader};
use crate::error::{Error, Result};
use crate::geo::{CoordSpace, LatLon, Point};
use crate::metadata::MetadataRecord;
use crate::tables::{Language, TypeTable};

pub use names::{decode as decode_names, Names};
pub use stream::{FeatureLayout, FeatureStream};

/// Name of the section
pub const SECTION: &str = "dat";

const TYPE_COUNT_MASK: u8 = 0x07;
const HAS_NAME: u8 = 0x08;
const HAS_LAYER: u8 = 0x10;
const GEOM_MASK: u8 = 0x60;
const HAS_ADDINFO: u8 = 0x80;

/// Geometry kind of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeomKind {
    /// Single point
    Point,
    /// Polyline
    Line,
    /// Polygon
    Area,
    /// Point carrying a house number
    PointEx,
}

impl GeomKind {
    /// Kind encoded in a record's header bits
    pub fn from_header(bits: u8) -> Self {
        match bits & GEOM_MASK {
            0x00 => Self::Point,
            0x20 => Self::Line,
            0x40 => Self::Area,
            _ => Self::PointEx,
        }
    }

    /// Returns true for kinds with a decoded center point
    pub fn is_point(self) -> bool {
        matches!(self, Self::Point | Self::PointEx)
    }

    /// GeoJSON geometry type name
    pub fn geometry_type(self) -> &'static str {
        match self {
            Self::Point | Self::PointEx => "Point",
            Self::Line => "LineString",
            Self::Area => "Polygon",
        }
    }
}

impl fmt::Display for GeomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Point => "POINT",
            Self::Line => "LINE",
            Self::Area => "AREA",
            Self::PointEx => "POINT_EX",
        })
    }
}

/// Geometry-kind dependent extra field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addinfo {
    /// Display rank of a point
    Rank(u8),
    /// Road reference of a line
    RoadNumber(String),
    /// House number of an area or extended point
    HouseNumber(String),
}

/// A classification type of a feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureType {
    /// Stored type id
    pub id: u64,
    /// Dotted type name, or `id + 1` when the id is not in the type table
    pub name: String,
}

/// One decoded feature record
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Position of the record in the section, counting from 0
    pub index: u32,
    /// Declared record length
    pub size: usize,
    /// Geometry kind
    pub kind: GeomKind,
    /// Classification types
    pub types: Vec<FeatureType>,
    /// Names by language
    pub names: Names,
    /// Drawing layer
    pub layer: Option<i8>,
    /// Rank, road number or house number
    pub addinfo: Option<Addinfo>,
    /// Raw center of point features
    pub center: Option<Point>,
    /// Projected center of point features
    pub position: Option<LatLon>,
    /// Undecoded bytes between the last decoded field and the record end
    pub geometry_payload: Bytes,
    /// Metadata attached by feature index
    pub metadata: Option<MetadataRecord>,
}

impl Feature {
    /// Name in the given language code
    pub fn name(&self, code: &str) -> Option<&str> {
        let lang = Language::from_code(code)?;
        self.names.get(&lang).map(String::as_str)
    }

    /// Untranslated local name
    pub fn default_name(&self) -> Option<&str> {
        self.names.get(&Language::DEFAULT).map(String::as_str)
    }

    /// Rank of a point feature
    pub fn rank(&self) -> Option<u8> {
        match self.addinfo {
            Some(Addinfo::Rank(rank)) => Some(rank),
            _ => None,
        }
    }

    /// Road number of a line feature
    pub fn road_number(&self) -> Option<&str> {
        match &self.addinfo {
            Some(Addinfo::RoadNumber(number)) => Some(number),
            _ => None,
        }
    }

    /// House number of an area or extended point
    pub fn house_number(&self) -> Option<&str> {
        match &self.addinfo {
            Some(Addinfo::HouseNumber(number)) => Some(number),
            _ => None,
        }
    }

    /// Returns true if any type has the given name
    pub fn has_type(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.name == name)
    }
}

/// Decodes the record at the reader's position.
///
/// The cursor ends exactly on the record's declared end on success.
pub(crate) fn decode_record(
    reader: &mut SectionReader,
    index: u32,
    types: &TypeTable,
    space: &CoordSpace,
) -> Result<Feature> {
    let at = reader.position();
    let size = reader.read_len()?;
    let end = reader
        .offset()
        .checked_add(size)
        .filter(|&end| end <= reader.len())
        .ok_or_else(|| {
            Error::malformed(at, format!("feature {index} of {size} bytes crosses the section end"))
        })?;
    let declared_end = reader.position() + size as u64;

    let bits = reader.read_u8()?;
    let kind = GeomKind::from_header(bits);

    let type_count = (bits & TYPE_COUNT_MASK) as usize + 1;
    let mut feature_types = Vec::with_capacity(type_count);
    for _ in 0..type_count {
        let id = reader.read_varuint()?;
        feature_types.push(FeatureType {
            id,
            name: types.resolve(id),
        });
    }

    let names = if bits & HAS_NAME != 0 {
        let at = reader.position();
        let block = reader.read_string_bytes()?;
        names::decode(&block, at)?
    } else {
        Names::new()
    };

    let layer = if bits & HAS_LAYER != 0 {
        Some(reader.read_u8()? as i8)
    } else {
        None
    };

    let addinfo = if bits & HAS_ADDINFO != 0 {
        Some(match kind {
            GeomKind::Point => Addinfo::Rank(reader.read_u8()?),
            GeomKind::Line => Addinfo::RoadNumber(reader.read_string()?),
            GeomKind::Area | GeomKind::PointEx => {
                Addinfo::HouseNumber(reader.read_numeric_string()?)
            }
        })
    } else {
        None
    };

    let center = if kind.is_point() {
        Some(decode_delta(reader.read_varuint()?, space.base_point()))
    } else {
        None
    };

    if reader.offset() > end {
        return Err(Error::RecordOverrun {
            index,
            declared_end,
            position: reader.position(),
        });
    }
    let geometry_payload = reader.read_bytes(end - reader.offset())?;

    Ok(Feature {
        index,
        size,
        kind,
        types: feature_types,
        names,
        layer,
        addinfo,
        position: center.map(|p| space.to_4326(p)),
        center,
        geometry_payload,
        metadata: None,
    })
}
