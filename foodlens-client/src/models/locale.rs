//! Request locale and the display language derived from it

use serde::{Deserialize, Serialize};

/// Display language for fallback texts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    English,
    Korean,
}

impl Locale {
    /// Derive the display language from a BCP 47 tag ("ko-KR", "en_US", "ko")
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if primary == "ko" {
            Locale::Korean
        } else {
            Locale::English
        }
    }

    /// Suffix used by the server for localized fields (`raw_result_ko`)
    pub fn field_suffix(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Korean => "ko",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Locale::English => Locale::Korean,
            Locale::Korean => Locale::English,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Locale::from_tag("ko-KR"), Locale::Korean);
        assert_eq!(Locale::from_tag("KO"), Locale::Korean);
        assert_eq!(Locale::from_tag("ko_KR"), Locale::Korean);
        assert_eq!(Locale::from_tag("en-US"), Locale::English);
        assert_eq!(Locale::from_tag("ja-JP"), Locale::English);
        assert_eq!(Locale::from_tag(""), Locale::English);
    }
}
