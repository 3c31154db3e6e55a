//! Opening a container and reading its sections.
//!
//! A [`Container`] owns one seekable reader. Section bytes are loaded on
//! demand into [`SectionReader`]s, so a decoder can never read past the
//! range its directory entry declares. The header is decoded when the
//! container is opened, since every coordinate depends on it.

mod directory;

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Bytes;
use tracing::debug;

use crate::codec::SectionReader;
use crate::error::{Error, Result};
use crate::feature::{self, FeatureLayout, FeatureStream};
use crate::geo::CoordSpace;
use crate::header::{self, Header};
use crate::metadata::{self, MetadataIndex};
use crate::region::{self, RegionInfo};
use crate::routing::{self, CrossTileGraph};
use crate::tables::TypeTable;
use crate::version::{self, MwmVersion};

pub use directory::{Directory, SectionInfo, DIRECTORY_POINTER_LEN};

/// Largest section loaded by default (1 GiB)
pub const DEFAULT_MAX_SECTION_SIZE: u64 = 1 << 30;

/// Configuration for opening containers
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Classificator used to name feature types
    pub type_table: Arc<TypeTable>,
    /// Sections longer than this are rejected before they are loaded
    pub max_section_size: u64,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            type_table: Arc::new(TypeTable::new()),
            max_section_size: DEFAULT_MAX_SECTION_SIZE,
        }
    }
}

impl ContainerConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the classificator
    pub fn type_table(mut self, table: Arc<TypeTable>) -> Self {
        self.type_table = table;
        self
    }

    /// Sets the section size limit
    pub fn max_section_size(mut self, size: u64) -> Self {
        self.max_section_size = size;
        self
    }
}

/// An open container file.
///
/// Every read moves the single underlying cursor, so one `Container` must
/// not be shared between threads; open one per thread instead.
#[derive(Debug)]
pub struct Container<R = BufReader<File>> {
    reader: R,
    file_len: u64,
    directory: Directory,
    header: Option<Header>,
    coord_space: CoordSpace,
    version: Option<Option<MwmVersion>>,
    config: ContainerConfig,
}

impl Container {
    /// Opens the container at `path` with the default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, ContainerConfig::default())
    }

    /// Opens the container at `path`
    pub fn open_with_config(path: impl AsRef<Path>, config: ContainerConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        debug!("Opening container {}", path.display());
        Self::from_reader(BufReader::new(file), config)
    }
}

impl<R: Read + Seek> Container<R> {
    /// Reads the directory and header from any seekable source
    pub fn from_reader(mut reader: R, config: ContainerConfig) -> Result<Self> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let dir_offset = reader
            .read_u64::<LittleEndian>()
            .map_err(|e| eof_as_malformed(e, 0, "file shorter than the directory pointer"))?;
        if dir_offset < DIRECTORY_POINTER_LEN || dir_offset > file_len {
            return Err(Error::malformed(
                0,
                format!("directory offset {dir_offset} outside file of {file_len} bytes"),
            ));
        }

        let dir_len = file_len - dir_offset;
        if dir_len > config.max_section_size {
            return Err(Error::malformed(
                dir_offset,
                format!("directory of {dir_len} bytes exceeds the section size limit"),
            ));
        }
        let bytes = read_range(&mut reader, dir_offset, dir_len)?;
        let directory = Directory::parse(&mut SectionReader::new(bytes, dir_offset), file_len)?;

        let mut container = Self {
            reader,
            file_len,
            directory,
            header: None,
            coord_space: CoordSpace::default(),
            version: None,
            config,
        };

        if let Some(mut section) = container.read_section(header::SECTION)? {
            let header = Header::parse(&mut section)?;
            debug!(
                "Header: {} coordinate bits, {} map, {} scales",
                header.coord_space.coord_bits(),
                header.map_type,
                header.scales.len()
            );
            container.coord_space = header.coord_space;
            container.header = Some(header);
        } else {
            debug!("No header section, using the default coordinate space");
        }

        Ok(container)
    }

    /// Length of the underlying file
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// The section directory
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// All directory entries, including sections this crate does not decode
    pub fn sections(&self) -> &[SectionInfo] {
        self.directory.sections()
    }

    /// Looks up a directory entry
    pub fn section(&self, name: &str) -> Option<&SectionInfo> {
        self.directory.get(name)
    }

    /// Returns true if the section is listed with a non-zero length
    pub fn has_section(&self, name: &str) -> bool {
        self.directory.contains(name)
    }

    /// Decoded header; `None` for containers without one
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Coordinate scale and base point of every point in the container
    pub fn coord_space(&self) -> &CoordSpace {
        &self.coord_space
    }

    /// Classificator used for feature types
    pub fn type_table(&self) -> &Arc<TypeTable> {
        &self.config.type_table
    }

    /// Loads a section; `None` if it is absent or empty
    pub fn read_section(&mut self, name: &str) -> Result<Option<SectionReader>> {
        let Some(info) = self.directory.get(name).filter(|s| s.size > 0) else {
            return Ok(None);
        };
        if info.size > self.config.max_section_size {
            return Err(Error::malformed(
                info.offset,
                format!(
                    "section '{}' of {} bytes exceeds the limit of {}",
                    name, info.size, self.config.max_section_size
                ),
            ));
        }

        let (offset, size) = (info.offset, info.size);
        debug!("Loading section '{}' ({} bytes at {})", name, size, offset);
        let bytes = read_range(&mut self.reader, offset, size)?;
        Ok(Some(SectionReader::new(bytes, offset)))
    }

    /// Decodes the `version` section once and caches it
    pub fn read_version(&mut self) -> Result<Option<MwmVersion>> {
        if let Some(version) = self.version {
            return Ok(version);
        }
        let version = match self.read_section(version::SECTION)? {
            Some(mut section) => {
                let version = MwmVersion::parse(&mut section)?;
                debug!("Format {}, version {}", version.format, version.version);
                Some(version)
            }
            None => None,
        };
        self.version = Some(version);
        Ok(version)
    }

    /// Decodes the `rgninfo` section; empty when the section is absent
    pub fn read_region_info(&mut self) -> Result<RegionInfo> {
        match self.read_section(region::SECTION)? {
            Some(mut section) => RegionInfo::parse(&mut section),
            None => Ok(RegionInfo::default()),
        }
    }

    /// Builds the metadata index; `None` when the container has no `metaidx`
    pub fn open_metadata_index(&mut self) -> Result<Option<MetadataIndex>> {
        let Some(index) = self.read_section(metadata::INDEX_SECTION)? else {
            return Ok(None);
        };
        let Some(version) = self.read_version()? else {
            return Err(Error::unsupported("metadata", 0));
        };
        let data = match self.read_section(metadata::DATA_SECTION)? {
            Some(data) => data,
            None => SectionReader::new(Bytes::new(), 0),
        };

        let index = MetadataIndex::load(index, data, &version)?;
        debug!("Metadata for {} features", index.len());
        Ok(Some(index))
    }

    /// Starts a lazy walk over the `dat` section, attaching metadata from
    /// `metadata` by feature index
    pub fn features(&mut self, metadata: Option<MetadataIndex>) -> Result<FeatureStream> {
        let version = self.read_version()?;
        let layout = FeatureLayout::for_version(version.as_ref())?;
        // Without a section there is no sub-header to skip either
        let (section, layout) = match self.read_section(feature::SECTION)? {
            Some(section) => (section, layout),
            None => (SectionReader::new(Bytes::new(), 0), FeatureLayout::Plain),
        };
        FeatureStream::new(
            section,
            layout,
            Arc::clone(&self.config.type_table),
            self.coord_space,
            metadata,
        )
    }

    /// Decodes the cross-tile routing graph; `None` for non-routable tiles
    pub fn read_cross_tile_graph(&mut self) -> Result<Option<CrossTileGraph>> {
        match self.read_section(routing::SECTION)? {
            Some(mut section) => CrossTileGraph::parse(&mut section, &self.coord_space).map(Some),
            None => Ok(None),
        }
    }

    /// Gives back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn read_range<R: Read + Seek>(reader: &mut R, offset: u64, len: u64) -> Result<Bytes> {
    let len = usize::try_from(len)
        .map_err(|_| Error::malformed(offset, format!("range of {len} bytes too large")))?;
    reader.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::truncated(offset, len, 0)
        } else {
            e.into()
        }
    })?;
    Ok(Bytes::from(buf))
}

fn eof_as_malformed(e: io::Error, offset: u64, details: &str) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::malformed(offset, details)
    } else {
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::geo::{LatLon, Point};
    use crate::header::MapType;
    use crate::metadata::MetadataField;
    use crate::region::RegionField;
    use crate::test_support::{
        header_section, put_plain_string, put_string, put_varuint, version_section,
        ContainerBuilder,
    };
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    const MAX_LAT: f64 = 85.051_128_779_806_59;

    fn open(bytes: Vec<u8>) -> Result<Container<Cursor<Vec<u8>>>> {
        Container::from_reader(Cursor::new(bytes), ContainerConfig::default())
    }

    fn assert_close(actual: LatLon, lon: f64, lat: f64) {
        assert!((actual.lon - lon).abs() < 1e-9, "lon {} != {}", actual.lon, lon);
        assert!((actual.lat - lat).abs() < 1e-9, "lat {} != {}", actual.lat, lat);
    }

    // POINT record of type `type_id` centred on the base point
    fn point_record(buf: &mut Vec<u8>, type_id: u64) {
        let mut body = vec![0x00];
        put_varuint(&mut body, type_id);
        put_varuint(&mut body, 0);
        put_varuint(buf, body.len() as u64);
        buf.extend_from_slice(&body);
    }

    #[test]
    fn test_open_and_read_header() {
        let bytes = ContainerBuilder::new()
            .section("header", header_section(30, (0, 0), 2))
            .build();
        let container = open(bytes).unwrap();

        let header = container.header().unwrap();
        assert_eq!(header.coord_space.coord_bits(), 30);
        assert_eq!(header.coord_space.coord_size(), (1 << 30) - 1);
        assert_eq!(header.map_type, MapType::Country);
        assert_eq!(header.map_type.to_string(), "country");
        assert_close(header.base_point, -180.0, -MAX_LAT);
        assert_close(header.bounds.left_bottom, -180.0, -MAX_LAT);

        // (1 << 20) * 360 / (2^30 - 1) - 180
        let lin = (1u64 << 20) as f64 * 360.0 / ((1u64 << 30) - 1) as f64 - 180.0;
        assert!((lin - -179.648_437_5).abs() < 1e-6);
        let lat = 360.0 * (lin * std::f64::consts::PI / 360.0).tanh().atan() / std::f64::consts::PI;
        assert_close(header.bounds.right_top, lin, lat);
        assert!(header.bounds.right_top.lat > -MAX_LAT);
    }

    #[test]
    fn test_sections_are_located_by_name() {
        let bytes = ContainerBuilder::new()
            .section("geom0", vec![1, 2, 3])
            .section("version", version_section(8, 150_312))
            .section("empty", Vec::new())
            .section("header", header_section(30, (0, 0), 0))
            .build();
        let mut container = open(bytes).unwrap();

        let names: Vec<_> = container.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["geom0", "version", "empty", "header"]);
        assert!(container.has_section("geom0"));
        assert!(!container.has_section("empty"));
        assert!(container.section("empty").is_some());
        assert!(container.read_section("empty").unwrap().is_none());

        let geom = container.read_section("geom0").unwrap().unwrap();
        assert_eq!(geom.position(), container.section("geom0").unwrap().offset);
        assert_eq!(geom.len(), 3);

        let version = container.read_version().unwrap().unwrap();
        assert_eq!(version.format, 8);
        assert_eq!(version.seconds_since_epoch, 1_426_118_400);
        assert_eq!(container.header().unwrap().map_type, MapType::World);
    }

    #[test]
    fn test_section_past_end_of_file() {
        let mut bytes = 8u64.to_le_bytes().to_vec();
        put_varuint(&mut bytes, 1);
        put_plain_string(&mut bytes, "dat");
        put_varuint(&mut bytes, 8);
        put_varuint(&mut bytes, 1000);

        let err = open(bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedContainer);
        assert!(matches!(err, Error::SectionOutOfBounds { ref name, .. } if name == "dat"));
    }

    #[test]
    fn test_bad_directory_pointer() {
        assert_eq!(open(vec![1, 2, 3]).unwrap_err().kind(), ErrorKind::MalformedContainer);

        let bytes = 9_999u64.to_le_bytes().to_vec();
        assert_eq!(open(bytes).unwrap_err().kind(), ErrorKind::MalformedContainer);
    }

    #[test]
    fn test_header_less_container() {
        let bytes = ContainerBuilder::new().section("chrysler", vec![0; 12]).build();
        let mut container = open(bytes).unwrap();
        assert!(container.header().is_none());
        assert_eq!(container.coord_space(), &CoordSpace::default());
        assert_eq!(container.coord_space().base_point(), Point::default());

        let graph = container.read_cross_tile_graph().unwrap().unwrap();
        assert!(graph.incoming.is_empty());
        assert!(container.read_version().unwrap().is_none());
        assert!(container.read_region_info().unwrap().is_empty());
        assert!(container.open_metadata_index().unwrap().is_none());
        assert_eq!(container.features(None).unwrap().count(), 0);
    }

    #[test]
    fn test_without_routing_section() {
        let bytes = ContainerBuilder::new()
            .section("header", header_section(30, (0, 0), 1))
            .build();
        assert!(open(bytes).unwrap().read_cross_tile_graph().unwrap().is_none());
    }

    #[test]
    fn test_section_size_limit() {
        let bytes = ContainerBuilder::new().section("dat", vec![0; 64]).build();
        let config = ContainerConfig::new().max_section_size(32);
        let mut container = Container::from_reader(Cursor::new(bytes), config).unwrap();
        let err = container.read_section("dat").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedContainer);
    }

    #[test]
    fn test_region_info() {
        let mut rgn = Vec::new();
        put_varuint(&mut rgn, 1);
        put_varuint(&mut rgn, 2);
        put_string(&mut rgn, "Europe/Berlin");
        let bytes = ContainerBuilder::new().section("rgninfo", rgn).build();
        let info = open(bytes).unwrap().read_region_info().unwrap();
        assert_eq!(info.text(RegionField::Timezone), Some("Europe/Berlin"));
    }

    #[test]
    fn test_metadata_without_version() {
        let bytes = ContainerBuilder::new().section("metaidx", vec![0; 8]).build();
        let err = open(bytes).unwrap().open_metadata_index().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSchema);
    }

    #[test]
    fn test_features_with_metadata() {
        let mut meta = Vec::new();
        put_varuint(&mut meta, 1);
        put_varuint(&mut meta, MetadataField::WEBSITE.code());
        put_string(&mut meta, "https://example.org");

        let mut metaidx = 2u32.to_le_bytes().to_vec();
        metaidx.extend_from_slice(&0u32.to_le_bytes());

        let mut records = Vec::new();
        for type_id in [0, 1, 2] {
            point_record(&mut records, type_id);
        }
        let mut dat = vec![0];
        dat.extend_from_slice(&9u32.to_le_bytes());
        dat.extend_from_slice(&(records.len() as u32).to_le_bytes());
        dat.extend_from_slice(&records);

        let bytes = ContainerBuilder::new()
            .section("header", header_section(30, (1 << 29, 1 << 29), 2))
            .section("version", version_section(11, 1_500_000_000))
            .section("dat", dat)
            .section("metaidx", metaidx)
            .section("meta", meta)
            .build();

        let types = Arc::new(TypeTable::parse("amenity|cafe\nshop\nplace|town\n"));
        let config = ContainerConfig::new().type_table(types);
        let mut container = Container::from_reader(Cursor::new(bytes), config).unwrap();

        let index = container.open_metadata_index().unwrap();
        assert_eq!(index.as_ref().map(MetadataIndex::len), Some(1));
        let features = container.features(index).unwrap().collect_all().unwrap();

        assert_eq!(features.len(), 3);
        assert!(features[0].has_type("amenity-cafe"));
        assert!(features[2].has_type("place-town"));
        assert_eq!(features[0].center, Some(Point::new(1 << 29, 1 << 29)));
        assert!(features[0].metadata.is_none());
        assert_eq!(
            features[2]
                .metadata
                .as_ref()
                .and_then(|m| m.text(MetadataField::WEBSITE)),
            Some("https://example.org")
        );
    }

    #[test]
    fn test_headed_format_without_feature_section() {
        let bytes = ContainerBuilder::new()
            .section("header", header_section(30, (0, 0), 2))
            .section("version", version_section(11, 1_500_000_000))
            .build();
        let mut features = open(bytes).unwrap().features(None).unwrap();
        assert!(features.next().is_none());
    }

    #[test]
    fn test_unsupported_feature_format() {
        let bytes = ContainerBuilder::new()
            .section("version", version_section(12, 150_312))
            .section("dat", vec![0; 4])
            .build();
        let err = open(bytes).unwrap().features(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSchema);
    }

    #[test]
    fn test_open_from_path() {
        let mut records = Vec::new();
        point_record(&mut records, 0);
        let bytes = ContainerBuilder::new()
            .section("header", header_section(30, (0, 0), 2))
            .section("dat", records)
            .build();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        let mut container = Container::open(file.path()).unwrap();
        assert_eq!(container.file_len(), bytes.len() as u64);
        let feature = container.features(None).unwrap().next().unwrap().unwrap();
        assert_eq!(feature.types[0].name, "1");

        let err = Container::open(file.path().with_extension("missing")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
