use chrono::Locale;
use serde::Serialize;

use super::filter::{parse_timestamp, sort_key};
use crate::api::{OfferId, OfferRecord};

pub const ORGANIZATION_PLACEHOLDER: &str = "Organization";
pub const DATE_PLACEHOLDER: &str = "Not available";
pub const POSTED_PLACEHOLDER: &str = "Published";

/// Display-ready offer with its organization name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferView {
    pub id: OfferId,
    pub title: String,
    pub organization_id: String,
    pub organization_name: String,
    pub location: String,
    pub contract_type: String,
    pub posted: String,
    pub description: String,
    pub requirements: String,
    pub salary: String,
    pub closes: String,
    pub status: Option<String>,
    pub published_at: Option<String>,
    #[serde(skip)]
    pub sort_key: i64,
}

impl OfferView {
    pub fn from_record(record: OfferRecord, organization_name: String) -> Self {
        Self {
            posted: posted_label(record.published_at.as_deref()),
            closes: format_date(record.closes_at.as_deref()),
            sort_key: sort_key(record.published_at.as_deref()),
            id: record.id,
            title: record.title,
            organization_id: record.organization_id,
            organization_name,
            location: record.location,
            contract_type: record.contract_type,
            description: record.description,
            requirements: record.requirements,
            salary: record.salary,
            status: record.status,
            published_at: record.published_at,
        }
    }

    #[cfg(test)]
    pub(crate) fn placeholder(id: OfferId) -> Self {
        Self {
            id,
            title: String::new(),
            organization_id: String::new(),
            organization_name: ORGANIZATION_PLACEHOLDER.to_string(),
            location: String::new(),
            contract_type: String::new(),
            posted: POSTED_PLACEHOLDER.to_string(),
            description: String::new(),
            requirements: String::new(),
            salary: String::new(),
            closes: DATE_PLACEHOLDER.to_string(),
            status: None,
            published_at: None,
            sort_key: 0,
        }
    }
}

/// `05 mar 2025` style date, or the placeholder when missing or unparseable.
pub fn format_date(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|timestamp| {
            timestamp
                .date()
                .format_localized("%d %b %Y", Locale::es_CO)
                .to_string()
        })
        .unwrap_or_else(|| DATE_PLACEHOLDER.to_string())
}

pub fn posted_label(raw: Option<&str>) -> String {
    match raw.and_then(parse_timestamp) {
        Some(_) => format!("Published on {}", format_date(raw)),
        None => POSTED_PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_invalid_dates_use_placeholders() {
        assert_eq!(format_date(None), DATE_PLACEHOLDER);
        assert_eq!(format_date(Some("pronto")), DATE_PLACEHOLDER);
        assert_eq!(posted_label(Some("")), POSTED_PLACEHOLDER);
    }

    #[test]
    fn valid_dates_are_day_month_year() {
        let formatted = format_date(Some("2025-03-05T10:00:00.000Z"));
        assert!(formatted.starts_with("05 "), "{formatted}");
        assert!(formatted.ends_with(" 2025"), "{formatted}");
        assert!(posted_label(Some("2025-03-05")).starts_with("Published on 05 "));
    }
}
