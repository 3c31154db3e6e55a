use std::io::BufRead;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Classificator: feature type id to dotted type name.
///
/// Built from a text file with one type per line. Lines are trimmed and
/// blank lines skipped, so the id is the position among non-blank lines.
/// `|` separators are normalised to `-`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTable {
    names: Vec<String>,
}

impl TypeTable {
    /// Creates an empty table; every id falls back to its numeric form
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses classificator text
    pub fn parse(text: &str) -> Self {
        Self {
            names: text.lines().filter_map(normalize).collect(),
        }
    }

    /// Reads classificator lines from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut names = Vec::new();
        for line in reader.lines() {
            if let Some(name) = normalize(&line?) {
                names.push(name);
            }
        }
        Ok(Self { names })
    }

    /// Loads the classificator file at `path`
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        let table = Self::parse(&text);
        debug!("Loaded {} types from {}", table.len(), path.display());
        Ok(table)
    }

    /// Number of known types
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no types are known
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Looks up the name of a type id
    pub fn get(&self, id: u64) -> Option<&str> {
        let index = usize::try_from(id).ok()?;
        self.names.get(index).map(String::as_str)
    }

    /// Resolves a type id, falling back to `id + 1` in decimal.
    ///
    /// The fallback matches the 1-based numbering of the external type
    /// mapping tables.
    pub fn resolve(&self, id: u64) -> String {
        match self.get(id) {
            Some(name) => name.to_string(),
            None => (id as u128 + 1).to_string(),
        }
    }
}

fn normalize(line: &str) -> Option<String> {
    let line = line.trim();
    (!line.is_empty()).then(|| line.replace('|', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_blank_lines() {
        let table = TypeTable::parse("building\n\n  amenity|cafe  \nhighway|primary|bridge\n");
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), Some("building"));
        assert_eq!(table.get(1), Some("amenity-cafe"));
        assert_eq!(table.get(2), Some("highway-primary-bridge"));
    }

    #[test]
    fn test_resolve_fallback() {
        let table = TypeTable::parse("building\n");
        assert_eq!(table.resolve(0), "building");
        assert_eq!(table.resolve(7), "8");
        assert_eq!(TypeTable::new().resolve(0), "1");
        assert_eq!(table.resolve(1 << 33), "8589934593");
        assert_eq!(table.resolve(u64::MAX), "18446744073709551616");
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "natural|water").unwrap();
        writeln!(file, "place|city").unwrap();
        let table = TypeTable::from_path(file.path()).unwrap();
        assert_eq!(table.get(1), Some("place-city"));
    }

    #[test]
    fn test_from_reader() {
        let table = TypeTable::from_reader("a\nb\n".as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
    }
}
