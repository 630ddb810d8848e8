//! Raw records as delivered by the news source.

use serde::{Deserialize, Deserializer, Serialize};

/// One article from the source feed.
///
/// The upstream API sends `null` for missing strings and lists; those
/// deserialize to empty values here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Headline.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Summary paragraph.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Full body text, when the plan exposes it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Declared region codes, most relevant first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: Vec<String>,
    /// Language code.
    #[serde(default, deserialize_with = "null_as_default")]
    pub language: String,
    /// Publication timestamp as sent by the source.
    #[serde(rename = "pubDate", default, deserialize_with = "null_as_default")]
    pub pub_date: String,
}

impl SourceRecord {
    /// The text to classify: content, then summary, then title.
    ///
    /// Returns `None` when all three are blank.
    pub fn extract_text(&self) -> Option<&str> {
        [&self.content, &self.description, &self.title]
            .into_iter()
            .map(String::as_str)
            .find(|text| !text.trim().is_empty())
    }

    /// The first declared region code, if any.
    pub fn primary_region(&self) -> Option<&str> {
        self.country
            .first()
            .map(String::as_str)
            .filter(|code| !code.trim().is_empty())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str, description: &str, title: &str) -> SourceRecord {
        SourceRecord {
            title: title.to_owned(),
            description: description.to_owned(),
            content: content.to_owned(),
            ..SourceRecord::default()
        }
    }

    #[test]
    fn content_wins() {
        assert_eq!(record("A", "B", "C").extract_text(), Some("A"));
    }

    #[test]
    fn summary_when_content_empty() {
        assert_eq!(record("", "B", "C").extract_text(), Some("B"));
    }

    #[test]
    fn title_when_content_and_summary_empty() {
        assert_eq!(record("", "", "C").extract_text(), Some("C"));
    }

    #[test]
    fn all_empty_is_none() {
        assert_eq!(record("", "", "").extract_text(), None);
        assert_eq!(record("  ", "\n", "").extract_text(), None);
    }

    #[test]
    fn nulls_deserialize_to_empty() {
        let raw = r#"{"title":"Hello","description":null,"content":null,"country":null,"pubDate":"2025-01-01 10:00:00"}"#;
        let parsed: SourceRecord = serde_json::from_str(raw).unwrap_or_default();
        assert_eq!(parsed.title, "Hello");
        assert!(parsed.description.is_empty());
        assert!(parsed.country.is_empty());
        assert_eq!(parsed.pub_date, "2025-01-01 10:00:00");
        assert_eq!(parsed.extract_text(), Some("Hello"));
    }

    #[test]
    fn primary_region_is_first_code() {
        let mut rec = record("", "", "t");
        assert_eq!(rec.primary_region(), None);
        rec.country = vec!["cr".to_owned(), "us".to_owned()];
        assert_eq!(rec.primary_region(), Some("cr"));
    }
}
