//! Packed multilingual name block.
//!
//! Names in all languages are concatenated into one byte string. Each span
//! starts with a marker byte whose low 6 bits are the language index and
//! whose top bits are `10`, the pattern of a UTF-8 continuation byte. A
//! continuation byte found where a character should start therefore marks
//! the next span.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::{Error, Result};
use crate::tables::Language;

/// Names of a feature by language
pub type Names = BTreeMap<Language, String>;

/// Offset of the marker byte of the span following the one at `start`
fn next_span(block: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < block.len() {
        let c = block[i];
        if c & 0xC0 == 0x80 {
            break;
        }
        // Skip the continuation bytes announced by the lead byte
        i += 1 + match c {
            c if c & 0x80 == 0 => 0,
            c if c & 0xFE == 0xFE => 6,
            c if c & 0xFC == 0xFC => 5,
            c if c & 0xF8 == 0xF8 => 4,
            c if c & 0xF0 == 0xF0 => 3,
            c if c & 0xE0 == 0xE0 => 2,
            _ => 1,
        };
    }
    i
}

/// Decodes a name block located at absolute offset `at`.
///
/// Spans whose language index is not in the language table are dropped.
pub fn decode(block: &[u8], at: u64) -> Result<Names> {
    let mut names = Names::new();
    let mut i = 0;

    while i < block.len() {
        let next = next_span(block, i);
        let lang = Language::new((block[i] & 0x3F) as u64);
        let text = &block[i + 1..next.min(block.len())];
        let text = std::str::from_utf8(text).map_err(|_| Error::InvalidText {
            offset: at + i as u64 + 1,
        })?;

        if lang.is_known() {
            names.insert(lang, text.to_string());
        } else {
            trace!("Dropping name in unknown language {}", lang);
        }
        i = next;
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn marker(lang: &str) -> u8 {
        0x80 | Language::from_code(lang).unwrap().index() as u8
    }

    #[test]
    fn test_two_spans_with_multibyte_boundary() {
        let mut block = vec![marker("default")];
        block.extend_from_slice("Москва".as_bytes());
        block.push(marker("en"));
        block.extend_from_slice(b"Moscow");

        let names = decode(&block, 0).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[&Language::DEFAULT], "Москва");
        assert_eq!(names[&Language::from_code("en").unwrap()], "Moscow");
    }

    #[test]
    fn test_four_byte_characters() {
        let mut block = vec![marker("ja")];
        block.extend_from_slice("東京🗼".as_bytes());
        block.push(marker("fr"));
        block.extend_from_slice("Tōkyō".as_bytes());

        let names = decode(&block, 0).unwrap();
        assert_eq!(names[&Language::from_code("ja").unwrap()], "東京🗼");
        assert_eq!(names[&Language::from_code("fr").unwrap()], "Tōkyō");
    }

    #[test]
    fn test_single_span() {
        let mut block = vec![marker("de")];
        block.extend_from_slice("Köln".as_bytes());
        let names = decode(&block, 0).unwrap();
        assert_eq!(names.values().collect::<Vec<_>>(), vec!["Köln"]);
    }

    #[test]
    fn test_empty_span() {
        let block = vec![marker("default"), marker("en"), b'X'];
        let names = decode(&block, 0).unwrap();
        assert_eq!(names[&Language::DEFAULT], "");
        assert_eq!(names[&Language::from_code("en").unwrap()], "X");
    }

    #[test]
    fn test_invalid_utf8() {
        // A lone lead byte at the end of the block
        let block = vec![marker("default"), b'a', 0xE0];
        assert!(matches!(
            decode(&block, 40).unwrap_err(),
            Error::InvalidText { offset: 41 }
        ));
    }
}
