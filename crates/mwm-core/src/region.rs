//! `rgninfo` section: locale data for the tile's region.

use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use crate::codec::SectionReader;
use crate::error::Result;
use crate::tables::Language;

/// Name of the section
pub const SECTION: &str = "rgninfo";

/// Region metadata field code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegionField {
    /// Languages spoken in the region
    Languages,
    /// Driving side
    Driving,
    /// Time zone
    Timezone,
    /// Address format
    AddressFormat,
    /// Phone number format
    PhoneFormat,
    /// Postcode format
    PostcodeFormat,
    /// Public holidays
    Holidays,
    /// House naming convention
    HouseNames,
    /// Code without a known meaning
    Unknown(u64),
}

impl RegionField {
    /// Maps a stored code to its field
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Self::Languages,
            1 => Self::Driving,
            2 => Self::Timezone,
            3 => Self::AddressFormat,
            4 => Self::PhoneFormat,
            5 => Self::PostcodeFormat,
            6 => Self::Holidays,
            7 => Self::HouseNames,
            n => Self::Unknown(n),
        }
    }

    /// Short field name
    pub fn name(&self) -> Option<&'static str> {
        Some(match self {
            Self::Languages => "languages",
            Self::Driving => "driving",
            Self::Timezone => "timezone",
            Self::AddressFormat => "addr_fmt",
            Self::PhoneFormat => "phone_fmt",
            Self::PostcodeFormat => "postcode_fmt",
            Self::Holidays => "holidays",
            Self::HouseNames => "housenames",
            Self::Unknown(_) => return None,
        })
    }
}

impl fmt::Display for RegionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Self::Unknown(n) = self {
            return write!(f, "{n}");
        }
        f.write_str(self.name().unwrap_or_default())
    }
}

/// Value of one region field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionValue {
    /// Plain text
    Text(String),
    /// One language index per stored byte
    Languages(Vec<Language>),
}

/// Decoded `rgninfo` section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionInfo {
    fields: BTreeMap<RegionField, RegionValue>,
}

impl RegionInfo {
    /// Decodes a region info section
    pub fn parse(reader: &mut SectionReader) -> Result<Self> {
        let count = reader.read_len()?;
        let mut fields = BTreeMap::new();

        for _ in 0..count {
            let field = RegionField::from_code(reader.read_varuint()?);
            let value = if field == RegionField::Languages {
                let bytes = reader.read_string_bytes()?;
                RegionValue::Languages(bytes.iter().map(|&b| Language::from(b)).collect())
            } else {
                RegionValue::Text(reader.read_string()?)
            };
            trace!("Region field {}: {:?}", field, value);
            fields.insert(field, value);
        }

        Ok(Self { fields })
    }

    /// Looks up a field
    pub fn get(&self, field: RegionField) -> Option<&RegionValue> {
        self.fields.get(&field)
    }

    /// Text value of a field
    pub fn text(&self, field: RegionField) -> Option<&str> {
        match self.get(field)? {
            RegionValue::Text(text) => Some(text),
            RegionValue::Languages(_) => None,
        }
    }

    /// Languages of the region
    pub fn languages(&self) -> &[Language] {
        match self.get(RegionField::Languages) {
            Some(RegionValue::Languages(langs)) => langs,
            _ => &[],
        }
    }

    /// Iterates over all fields in code order
    pub fn iter(&self) -> impl Iterator<Item = (&RegionField, &RegionValue)> {
        self.fields.iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the region has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
