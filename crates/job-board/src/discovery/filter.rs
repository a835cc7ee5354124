//! Accent-insensitive filtering and date ordering over offer views.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::view::OfferView;

/// Lowercase, decompose, drop combining marks (U+0300..=U+036F), trim.
pub fn normalize_text(value: &str) -> String {
    value
        .to_lowercase()
        .nfd()
        .filter(|ch| !('\u{0300}'..='\u{036f}').contains(ch))
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Same ordering as `Newest`; kept distinct so a UI can tell "unset" apart.
    #[default]
    Default,
    Newest,
    Oldest,
}

impl SortMode {
    pub const fn label(self) -> &'static str {
        match self {
            SortMode::Default => "default",
            SortMode::Newest => "newest",
            SortMode::Oldest => "oldest",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortMode(pub String);

impl fmt::Display for UnknownSortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort mode '{}' (expected newest, oldest or default)", self.0)
    }
}

impl std::error::Error for UnknownSortMode {}

impl FromStr for SortMode {
    type Err = UnknownSortMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Ok(SortMode::Default),
            "newest" => Ok(SortMode::Newest),
            "oldest" => Ok(SortMode::Oldest),
            other => Err(UnknownSortMode(other.to_string())),
        }
    }
}

/// Raw filter input as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferCriteria {
    pub organization: String,
    pub title: String,
    pub sort: SortMode,
}

impl OfferCriteria {
    pub fn normalized(&self) -> NormalizedCriteria {
        NormalizedCriteria {
            organization: normalize_text(&self.organization),
            title: normalize_text(&self.title),
            sort: self.sort,
        }
    }
}

/// Criteria after normalization. The visible window resets whenever this changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedCriteria {
    pub organization: String,
    pub title: String,
    pub sort: SortMode,
}

impl NormalizedCriteria {
    pub fn matches(&self, offer: &OfferView) -> bool {
        (self.organization.is_empty()
            || normalize_text(&offer.organization_name).contains(&self.organization))
            && (self.title.is_empty() || normalize_text(&offer.title).contains(&self.title))
    }

    /// Filtered, sorted copy. The input slice is never reordered.
    pub fn apply<'a>(&self, offers: &'a [OfferView]) -> Vec<&'a OfferView> {
        let mut selected: Vec<&OfferView> =
            offers.iter().filter(|offer| self.matches(offer)).collect();
        match self.sort {
            SortMode::Default | SortMode::Newest => {
                selected.sort_by(|a, b| b.sort_key.cmp(&a.sort_key))
            }
            SortMode::Oldest => selected.sort_by(|a, b| a.sort_key.cmp(&b.sort_key)),
        }
        selected
    }
}

/// Parses the date shapes the backend has been seen to emit.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Milliseconds since the epoch; anything unparseable sorts as 0.
pub fn sort_key(raw: Option<&str>) -> i64 {
    raw.and_then(parse_timestamp)
        .map(|timestamp| timestamp.and_utc().timestamp_millis())
        .unwrap_or(0)
}
