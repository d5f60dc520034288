//! Canonical record model shared by every source.
//!
//! Every adapter funnels its wire format through [`RecordBuilder`], which owns the
//! normalization rules: default filling, description truncation and date trimming.

use serde::{Deserialize, Serialize};

/// Maximum number of characters kept from a description before the ellipsis
pub const DESCRIPTION_LIMIT: usize = 500;

/// Marker appended to truncated descriptions
pub const ELLIPSIS: &str = "...";

/// Title used when a source omits one
pub const DEFAULT_TITLE: &str = "Untitled";

/// Creator used when a source lists no authors or owner
pub const DEFAULT_CREATOR: &str = "Unknown";

/// Placeholder description for sources that always describe their items
pub const NO_DESCRIPTION: &str = "No description";

/// A single metadata record ready for Dublin Core serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// `<source>:<native-id>`, e.g. `zenodo:8186638`
    pub identifier: String,

    /// Publication or creation date as `YYYY-MM-DD`
    pub datestamp: String,

    pub title: String,

    /// Author or owner names joined with `"; "`
    pub creator: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Record {
    /// Split the creator field back into individual names
    pub fn creator_list(&self) -> Vec<&str> {
        self.creator
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Builder applying the canonical defaults to partially populated source data
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    identifier: String,
    datestamp: Option<String>,
    title: Option<String>,
    creators: Vec<String>,
    description: Option<String>,
    description_fallback: &'static str,
    doi: Option<String>,
    url: Option<String>,
}

impl RecordBuilder {
    /// Start a record for `<source>:<native_id>`
    pub fn new(source: &str, native_id: impl AsRef<str>) -> Self {
        Self {
            identifier: format!("{}:{}", source, native_id.as_ref().trim()),
            datestamp: None,
            title: None,
            creators: Vec::new(),
            description: None,
            description_fallback: "",
            doi: None,
            url: None,
        }
    }

    /// Set the date; timestamps are cut to `YYYY-MM-DD`, partial dates (`2023`,
    /// `2023-07`) fall on the first day, anything unparseable becomes today
    pub fn datestamp(mut self, date: impl Into<String>) -> Self {
        self.datestamp = non_blank(date.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = non_blank(collapse_whitespace(&title.into()));
        self
    }

    /// Add one author/owner name; blank names are ignored
    pub fn creator(mut self, name: impl Into<String>) -> Self {
        if let Some(name) = non_blank(name.into()) {
            self.creators.push(name);
        }
        self
    }

    pub fn creators<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |builder, name| builder.creator(name))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(description.into().trim().to_string());
        self
    }

    /// Text used when no description was supplied
    pub fn description_fallback(mut self, fallback: &'static str) -> Self {
        self.description_fallback = fallback;
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = non_blank(doi.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = non_blank(url.into());
        self
    }

    /// Build the record, filling every missing field with its default
    pub fn build(self) -> Record {
        let datestamp = self
            .datestamp
            .and_then(|d| normalize_date(&d))
            .unwrap_or_else(today);

        let creator = if self.creators.is_empty() {
            DEFAULT_CREATOR.to_string()
        } else {
            self.creators.join("; ")
        };

        let description = self
            .description
            .unwrap_or_else(|| self.description_fallback.to_string());

        Record {
            identifier: self.identifier,
            datestamp,
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            creator,
            description: truncate_description(&description),
            doi: self.doi.map(|d| d.trim().to_string()),
            url: self.url.map(|u| u.trim().to_string()),
        }
    }
}

/// Truncate to [`DESCRIPTION_LIMIT`] characters, appending [`ELLIPSIS`] when shortened
pub fn truncate_description(text: &str) -> String {
    if text.chars().count() > DESCRIPTION_LIMIT {
        let mut out = truncate_chars(text, DESCRIPTION_LIMIT);
        out.push_str(ELLIPSIS);
        out
    } else {
        text.to_string()
    }
}

/// Keep at most `max` characters; never splits a UTF-8 sequence
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Current UTC date as `YYYY-MM-DD`
pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Calendar date as `YYYY-MM-DD`, padding year or year-month precision
fn normalize_date(raw: &str) -> Option<String> {
    let head = truncate_chars(raw.trim(), 10);
    let candidate = match head.len() {
        4 => format!("{}-01-01", head),
        7 => format!("{}-01", head),
        _ => head,
    };
    chrono::NaiveDate::parse_from_str(&candidate, "%Y-%m-%d")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder_defaults() {
        let record = RecordBuilder::new("zenodo", "42").build();

        assert_eq!(record.identifier, "zenodo:42");
        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(record.creator, DEFAULT_CREATOR);
        assert_eq!(record.description, "");
        assert_eq!(record.datestamp, today());
        assert!(record.doi.is_none());
        assert!(record.url.is_none());
    }

    #[test]
    fn test_record_builder_full() {
        let record = RecordBuilder::new("arxiv", "2301.07041")
            .title("  Attention\n   Is All You Need ")
            .creators(["Ashish Vaswani", "", "Noam Shazeer"])
            .description("  An abstract.  ")
            .datestamp("2017-06-12T17:57:34Z")
            .doi("10.1234/abc")
            .url("https://arxiv.org/abs/2301.07041")
            .build();

        assert_eq!(record.title, "Attention Is All You Need");
        assert_eq!(record.creator, "Ashish Vaswani; Noam Shazeer");
        assert_eq!(record.creator_list(), vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(record.description, "An abstract.");
        assert_eq!(record.datestamp, "2017-06-12");
        assert_eq!(record.doi.as_deref(), Some("10.1234/abc"));
    }

    #[test]
    fn test_empty_optional_fields_are_absent() {
        let record = RecordBuilder::new("zenodo", "1").doi("").url("   ").build();
        assert!(record.doi.is_none());
        assert!(record.url.is_none());
    }

    #[test]
    fn test_description_fallback() {
        let record = RecordBuilder::new("github:repo", "1")
            .description_fallback(NO_DESCRIPTION)
            .build();
        assert_eq!(record.description, NO_DESCRIPTION);
    }

    #[test]
    fn test_truncate_description() {
        let exact = "a".repeat(DESCRIPTION_LIMIT);
        assert_eq!(truncate_description(&exact), exact);

        let long = "b".repeat(DESCRIPTION_LIMIT + 37);
        let truncated = truncate_description(&long);
        assert_eq!(truncated.chars().count(), DESCRIPTION_LIMIT + ELLIPSIS.len());
        assert!(truncated.ends_with(ELLIPSIS));
        assert!(truncated.starts_with(&"b".repeat(DESCRIPTION_LIMIT)));
    }

    #[test]
    fn test_truncate_multibyte() {
        let greek = "α".repeat(DESCRIPTION_LIMIT + 1);
        let truncated = truncate_description(&greek);
        assert_eq!(truncated.chars().count(), DESCRIPTION_LIMIT + 3);

        assert_eq!(truncate_chars("ünïcödé", 3), "ünï");
        assert_eq!(truncate_chars("short", 80), "short");
    }

    #[test]
    fn test_partial_dates_are_padded() {
        let date = |raw: &str| RecordBuilder::new("zenodo", "1").datestamp(raw).build().datestamp;

        assert_eq!(date("2023"), "2023-01-01");
        assert_eq!(date("2023-07"), "2023-07-01");
        assert_eq!(date("2023-07-26"), "2023-07-26");
        assert_eq!(date(" 2023-07-26T10:00:00+00:00 "), "2023-07-26");
    }

    #[test]
    fn test_unparseable_dates_become_today() {
        let date = |raw: &str| RecordBuilder::new("zenodo", "1").datestamp(raw).build().datestamp;

        assert_eq!(date("2023-13"), today());
        assert_eq!(date("circa 1900"), today());
        assert_eq!(date("2023-02-30"), today());
    }
}
