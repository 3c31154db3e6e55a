//! `header` section: coordinate scale, base point, bounds, zoom scales,
//! languages and map kind.
//!
//! Fields are order dependent:
//!
//! ```text
//! varuint   coordBits
//! varuint   basePoint   (interleaved, kept raw)
//! varint    bounds min  (interleaved)
//! varint    bounds max  (interleaved)
//! varuint[] scales
//! varuint[] languages
//! varint    mapType
//! ```

use std::fmt;

use crate::codec::{bitwise_split, SectionReader};
use crate::error::{Error, Result};
use crate::geo::{CoordSpace, LatLon, Point, Rect};
use crate::tables::Language;

/// Name of the section
pub const SECTION: &str = "header";

/// Kind of map a container holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapType {
    /// Low-detail world overview
    World,
    /// World coastlines
    WorldCoasts,
    /// A regular country or region tile
    Country,
    /// Any other stored value
    Unknown(i64),
}

impl From<i64> for MapType {
    fn from(value: i64) -> Self {
        match value {
            0 => MapType::World,
            1 => MapType::WorldCoasts,
            2 => MapType::Country,
            n => MapType::Unknown(n),
        }
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapType::World => f.write_str("world"),
            MapType::WorldCoasts => f.write_str("worldcoasts"),
            MapType::Country => f.write_str("country"),
            MapType::Unknown(n) => write!(f, "unknown:{n}"),
        }
    }
}

/// Decoded `header` section
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Scale and base point for every coordinate in the container
    pub coord_space: CoordSpace,
    /// Base point projected to WGS84
    pub base_point: LatLon,
    /// Projected bounds of the tile
    pub bounds: Rect,
    /// Zoom scales the geometry was generated for
    pub scales: Vec<u32>,
    /// Languages present in the name blocks
    pub languages: Vec<Language>,
    /// Map kind
    pub map_type: MapType,
}

impl Header {
    /// Decodes a header section
    pub fn parse(reader: &mut SectionReader) -> Result<Self> {
        let at = reader.position();
        let coord_bits = reader.read_varuint()?;
        if !(1..=63).contains(&coord_bits) {
            return Err(Error::malformed(at, format!("invalid coordinate bits {coord_bits}")));
        }

        let base = Point::from(bitwise_split(reader.read_varuint()?));
        let coord_space = CoordSpace::new(coord_bits as u32, base);

        // Bounds are stored as signed varints of the interleaved value
        let min = Point::from(bitwise_split(reader.read_varint()? as u64));
        let max = Point::from(bitwise_split(reader.read_varint()? as u64));
        let bounds = Rect {
            left_bottom: coord_space.to_4326(min),
            right_top: coord_space.to_4326(max),
        };

        let at = reader.position();
        let scales = reader
            .read_varuint_array()?
            .into_iter()
            .map(u32::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::malformed(at, "scale out of range"))?;

        let languages = reader
            .read_varuint_array()?
            .into_iter()
            .map(Language::new)
            .collect();

        let map_type = MapType::from(reader.read_varint()?);

        Ok(Self {
            base_point: coord_space.to_4326(base),
            coord_space,
            bounds,
            scales,
            languages,
            map_type,
        })
    }
}
