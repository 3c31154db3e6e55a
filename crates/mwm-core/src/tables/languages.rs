use std::fmt;

/// Language codes in on-disk order; the index is the stored code
pub const LANGUAGES: [&str; 64] = [
    "default", "en", "ja", "fr", "ko_rm", "ar", "de", "int_name", "ru", "sv", "zh", "fi", "be",
    "ka", "ko", "he", "nl", "ga", "ja_rm", "el", "it", "es", "zh_pinyin", "th", "cy", "sr", "uk",
    "ca", "hu", "hsb", "eu", "fa", "br", "pl", "hy", "kn", "sl", "ro", "sq", "am", "fy", "cs",
    "gd", "sk", "af", "ja_kana", "lb", "pt", "hr", "fur", "vi", "tr", "bg", "eo", "lt", "la",
    "kk", "gsw", "et", "ku", "mn", "mk", "lv", "hi",
];

/// A stored language index.
///
/// Indices outside [`LANGUAGES`] are kept as-is: [`Language::code`] returns
/// `None` for them and they display as their number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Language(u64);

impl Language {
    /// The untranslated local name
    pub const DEFAULT: Language = Language(0);

    /// Wraps a raw index
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    /// Looks up the index of a language code
    pub fn from_code(code: &str) -> Option<Self> {
        LANGUAGES
            .iter()
            .position(|&c| c == code)
            .map(|i| Self(i as u64))
    }

    /// Raw index
    pub fn index(self) -> u64 {
        self.0
    }

    /// Language code, if the index is known
    pub fn code(self) -> Option<&'static str> {
        usize::try_from(self.0)
            .ok()
            .and_then(|i| LANGUAGES.get(i))
            .copied()
    }

    /// Returns true if the index is listed in [`LANGUAGES`]
    pub fn is_known(self) -> bool {
        self.code().is_some()
    }
}

impl From<u8> for Language {
    fn from(index: u8) -> Self {
        Self(index as u64)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => f.write_str(code),
            None => write!(f, "{}", self.0),
        }
    }
}
