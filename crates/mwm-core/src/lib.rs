//! # mwm-core
//!
//! A read-only decoder for MWM offline map containers.
//!
//! A container is one file holding every section of a map tile: the header
//! with its coordinate space, the feature records with their multilingual
//! names and classification types, per-feature metadata, region locale data
//! and the cross-tile routing context. This crate turns those sections into
//! typed values; it never writes or modifies a container.
//!
//! ## Architecture
//!
//! - [`codec`]: varuints, zigzag deltas, Z-order points and the bounded
//!   section cursor every decoder reads through
//! - [`container`]: the section directory and the [`Container`] handle
//! - [`header`], [`version`], [`region`]: small fixed sections
//! - [`metadata`]: the two version-gated metadata index layouts
//! - [`feature`]: feature records and the lazy [`FeatureStream`]
//! - [`routing`]: the cross-tile routing graph
//! - [`idmap`]: the `.osm2ft` side file mapping features to OSM ids
//! - [`tables`]: language and classificator tables
//! - [`error`]: error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mwm_core::{Container, ContainerConfig, TypeTable};
//!
//! let types = Arc::new(TypeTable::from_path("data/types.txt")?);
//! let mut container = Container::open_with_config(
//!     "Germany_Berlin.mwm",
//!     ContainerConfig::new().type_table(types),
//! )?;
//!
//! let metadata = container.open_metadata_index()?;
//! for feature in container.features(metadata)? {
//!     let feature = feature?;
//!     if let (Some(name), Some(position)) = (feature.default_name(), feature.position) {
//!         println!("{name} at {position}");
//!     }
//! }
//! # Ok::<(), mwm_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod codec;
pub mod container;
pub mod error;
pub mod feature;
pub mod geo;
pub mod header;
pub mod idmap;
pub mod metadata;
pub mod region;
pub mod routing;
pub mod tables;
pub mod version;

#[cfg(test)]
mod test_support;

// Re-export primary types for convenience
pub use container::{Container, ContainerConfig, SectionInfo};
pub use error::{Error, ErrorKind, Result};
pub use feature::{Feature, FeatureStream, GeomKind};
pub use geo::{CoordSpace, LatLon, Point, Rect};
pub use header::{Header, MapType};
pub use idmap::{read_id_map, IdMap, OsmId, OsmKind};
pub use metadata::{MetadataField, MetadataIndex, MetadataRecord};
pub use region::{RegionField, RegionInfo};
pub use routing::CrossTileGraph;
pub use tables::{Language, TypeTable};
pub use version::MwmVersion;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
