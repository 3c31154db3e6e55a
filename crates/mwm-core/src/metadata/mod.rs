//! Per-feature metadata: the `metaidx` index and the `meta` blocks.
//!
//! Two physical layouts exist, selected once from the container format:
//!
//! - formats 1..=9: an unordered list of `(feature id, block offset)` pairs
//!   over blocks without length prefixes, matched by an ordered walk
//!   ([`legacy`])
//! - formats 10..=11: the same pairs as a flat array sorted by feature id,
//!   read by direct lookup ([`flat`])
//!
//! Any other format fails with [`Error::UnsupportedSchema`].

pub mod flat;
pub mod legacy;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::debug;

use crate::codec::SectionReader;
use crate::error::{Error, Result};
use crate::version::MwmVersion;

/// Name of the index section
pub const INDEX_SECTION: &str = "metaidx";

/// Name of the data section
pub const DATA_SECTION: &str = "meta";

/// Separator between the values of a list field
pub const LIST_SEPARATOR: char = '\u{1}';

const FIELD_NAMES: [&str; 32] = [
    "0",
    "cuisine",
    "open_hours",
    "phone_number",
    "fax_number",
    "stars",
    "operator",
    "url",
    "website",
    "internet",
    "ele",
    "turn_lanes",
    "turn_lanes_forward",
    "turn_lanes_backward",
    "email",
    "postcode",
    "wikipedia",
    "maxspeed",
    "flats",
    "height",
    "min_height",
    "denomination",
    "building_levels",
    "test_id",
    "ref:sponsored",
    "price_rate",
    "rating",
    "banner_url",
    "level",
    "iata",
    "brand",
    "fuel",
];

/// A metadata field code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetadataField(u64);

impl MetadataField {
    /// Cuisine of a food place
    pub const CUISINE: Self = Self(1);
    /// Opening hours
    pub const OPEN_HOURS: Self = Self(2);
    /// Phone number
    pub const PHONE_NUMBER: Self = Self(3);
    /// Website
    pub const WEBSITE: Self = Self(8);
    /// Postcode
    pub const POSTCODE: Self = Self(15);
    /// Wikipedia article
    pub const WIKIPEDIA: Self = Self(16);
    /// Brand
    pub const BRAND: Self = Self(30);
    /// Fuel types, the only list-valued field
    pub const FUEL: Self = Self(31);

    /// Wraps a stored code
    pub const fn new(code: u64) -> Self {
        Self(code)
    }

    /// Looks up a field by name
    pub fn from_name(name: &str) -> Option<Self> {
        FIELD_NAMES
            .iter()
            .skip(1)
            .position(|&n| n == name)
            .map(|i| Self(i as u64 + 1))
    }

    /// Stored code
    pub fn code(self) -> u64 {
        self.0
    }

    /// Field name, if the code is known
    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => None,
            n => FIELD_NAMES.get(n as usize).copied(),
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Value of one metadata field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    /// Plain text
    Text(String),
    /// Several values of a list field
    List(Vec<String>),
}

/// All metadata of one feature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    fields: BTreeMap<MetadataField, MetadataValue>,
}

impl MetadataRecord {
    /// Looks up a field
    pub fn get(&self, field: MetadataField) -> Option<&MetadataValue> {
        self.fields.get(&field)
    }

    /// Text value of a field
    pub fn text(&self, field: MetadataField) -> Option<&str> {
        match self.get(field)? {
            MetadataValue::Text(text) => Some(text),
            MetadataValue::List(_) => None,
        }
    }

    /// Iterates over all fields in code order
    pub fn iter(&self) -> impl Iterator<Item = (&MetadataField, &MetadataValue)> {
        self.fields.iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// How a single metadata block is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEncoding {
    /// Format 8 and later: varuint field count, then
    /// `(varuint code, string)` pairs
    Counted,
    /// Before format 8: chain of `(code byte, length byte, bytes)` where the
    /// top bit of the code byte marks the last field
    Chained,
}

impl BlockEncoding {
    /// Encoding used by a container format
    pub fn for_format(format: u32) -> Self {
        if format >= 8 {
            Self::Counted
        } else {
            Self::Chained
        }
    }
}

/// Decodes one metadata block at the reader's position
pub fn decode_block(reader: &mut SectionReader, encoding: BlockEncoding) -> Result<MetadataRecord> {
    let mut fields = BTreeMap::new();

    match encoding {
        BlockEncoding::Counted => {
            let count = reader.read_len()?;
            for _ in 0..count {
                let field = MetadataField::new(reader.read_varuint()?);
                let text = reader.read_string()?;
                let value = if field == MetadataField::FUEL {
                    MetadataValue::List(text.split(LIST_SEPARATOR).map(str::to_owned).collect())
                } else {
                    MetadataValue::Text(text)
                };
                fields.insert(field, value);
            }
        }
        BlockEncoding::Chained => loop {
            let tag = reader.read_u8()?;
            let field = MetadataField::new((tag & 0x7F) as u64);
            let len = reader.read_u8()? as usize;
            fields.insert(field, MetadataValue::Text(reader.read_utf8(len)?));
            if tag & 0x80 != 0 {
                break;
            }
        },
    }

    Ok(MetadataRecord { fields })
}

/// Physical layout of the metadata index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Unordered pairs matched by an ordered walk over the blocks
    Ordered(BlockEncoding),
    /// Flat pairs sorted by feature id
    Flat,
}

impl Scheme {
    /// Selects the layout for a container format
    pub fn for_format(format: u32) -> Result<Self> {
        match format {
            1..=legacy::MAX_FORMAT => Ok(Self::Ordered(BlockEncoding::for_format(format))),
            flat::MIN_FORMAT..=flat::MAX_FORMAT => Ok(Self::Flat),
            _ => Err(Error::unsupported("metadata", format)),
        }
    }
}

/// Association of feature ids with their metadata
#[derive(Debug, Clone)]
pub enum MetadataIndex {
    /// Every block decoded up front
    Ordered(HashMap<u32, MetadataRecord>),
    /// Blocks decoded on lookup
    Flat(flat::FlatIndex),
}

impl MetadataIndex {
    /// Builds the index from the `metaidx` and `meta` sections
    pub fn load(index: SectionReader, data: SectionReader, version: &MwmVersion) -> Result<Self> {
        let scheme = Scheme::for_format(version.format)?;
        debug!("Metadata scheme {:?} for format {}", scheme, version.format);

        Ok(match scheme {
            Scheme::Ordered(encoding) => Self::Ordered(legacy::build(index, data, encoding)?),
            Scheme::Flat => Self::Flat(flat::FlatIndex::parse(index, data)?),
        })
    }

    /// Metadata of the feature with index `feature_id`
    pub fn get(&self, feature_id: u32) -> Result<Option<MetadataRecord>> {
        match self {
            Self::Ordered(records) => Ok(records.get(&feature_id).cloned()),
            Self::Flat(index) => index.get(feature_id),
        }
    }

    /// Number of features with metadata
    pub fn len(&self) -> usize {
        match self {
            Self::Ordered(records) => records.len(),
            Self::Flat(index) => index.len(),
        }
    }

    /// Returns true if no feature has metadata
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{put_string, put_varuint};
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    fn reader(data: Vec<u8>) -> SectionReader {
        SectionReader::new(Bytes::from(data), 0)
    }

    #[test]
    fn test_field_names() {
        assert_eq!(MetadataField::new(3).to_string(), "phone_number");
        assert_eq!(MetadataField::new(24).to_string(), "ref:sponsored");
        assert_eq!(MetadataField::FUEL.to_string(), "fuel");
        assert_eq!(MetadataField::new(0).to_string(), "0");
        assert_eq!(MetadataField::new(77).to_string(), "77");
        assert_eq!(MetadataField::from_name("brand"), Some(MetadataField::BRAND));
        assert_eq!(MetadataField::from_name("0"), None);
    }

    #[test]
    fn test_counted_block() {
        let mut buf = Vec::new();
        put_varuint(&mut buf, 2);
        put_varuint(&mut buf, 3);
        put_string(&mut buf, "+7 495");
        put_varuint(&mut buf, 31);
        put_string(&mut buf, "diesel\u{1}lpg");

        let record = decode_block(&mut reader(buf), BlockEncoding::Counted).unwrap();
        assert_eq!(record.text(MetadataField::PHONE_NUMBER), Some("+7 495"));
        assert_eq!(
            record.get(MetadataField::FUEL),
            Some(&MetadataValue::List(vec!["diesel".into(), "lpg".into()]))
        );
    }

    #[test]
    fn test_chained_block() {
        let mut buf = vec![1, 5];
        buf.extend_from_slice(b"pizza");
        buf.extend_from_slice(&[0x80 | 8, 3]);
        buf.extend_from_slice(b"a.b");
        buf.push(0xFF); // belongs to the next block

        let mut r = reader(buf);
        let record = decode_block(&mut r, BlockEncoding::Chained).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.text(MetadataField::CUISINE), Some("pizza"));
        assert_eq!(record.text(MetadataField::WEBSITE), Some("a.b"));
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn test_chained_block_truncated() {
        let err = decode_block(&mut reader(vec![1, 9, b'x']), BlockEncoding::Chained).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedRecord);
    }

    #[test]
    fn test_scheme_selection() {
        assert_eq!(
            Scheme::for_format(7).unwrap(),
            Scheme::Ordered(BlockEncoding::Chained)
        );
        assert_eq!(
            Scheme::for_format(8).unwrap(),
            Scheme::Ordered(BlockEncoding::Counted)
        );
        assert_eq!(Scheme::for_format(10).unwrap(), Scheme::Flat);
        assert_eq!(
            Scheme::for_format(12).unwrap_err().kind(),
            ErrorKind::UnsupportedSchema
        );
    }
}
