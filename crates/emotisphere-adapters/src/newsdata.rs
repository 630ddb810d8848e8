//! newsdata.io client implementing [`RecordSource`].

use std::time::Duration;

use emotisphere_core::{AdapterError, RecordSource};
use emotisphere_types::region;
use emotisphere_types::{MAX_REGIONS, RegionCode, SourceRecord};
use serde::Deserialize;
use tracing::debug;

use crate::config::NEWSDATA_API_KEY;

const ENDPOINT: &str = "https://newsdata.io/api/1/news";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches top English-language headlines for up to five regions.
#[derive(Debug, Clone)]
pub struct NewsDataClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl NewsDataClient {
    /// Build a client with a 30 second request timeout.
    pub fn new(api_key: Option<String>) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| AdapterError::Http(format!("news client build failed: {e}")))?;
        Ok(Self { client, api_key })
    }
}

impl RecordSource for NewsDataClient {
    async fn fetch(&self, regions: &[RegionCode]) -> Result<Vec<SourceRecord>, AdapterError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AdapterError::MissingCredential(NEWSDATA_API_KEY))?;
        let regions = regions.get(..MAX_REGIONS).unwrap_or(regions);

        let response = self
            .client
            .get(ENDPOINT)
            .query(&query_params(api_key, regions))
            .send()
            .await
            .map_err(|e| AdapterError::Http(format!("news request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::Http(format!("news body read failed: {e}")))?;
        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let records = parse_news_response(&body)?;
        debug!(regions = %region::join(regions), count = records.len(), "news fetched");
        Ok(records)
    }
}

/// Query string for one request. `country` is omitted when no regions are given.
fn query_params(api_key: &str, regions: &[RegionCode]) -> Vec<(&'static str, String)> {
    let mut params = vec![("apikey", api_key.to_owned()), ("language", "en".to_owned())];
    if !regions.is_empty() {
        params.push(("country", region::join(regions)));
    }
    params.push(("category", "top".to_owned()));
    params
}

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(default)]
    status: String,
    // On error responses this is an object, so decode lazily.
    #[serde(default)]
    results: Option<serde_json::Value>,
}

/// Decode a response body. A payload whose `status` is not `"success"`
/// yields an empty list rather than an error.
pub fn parse_news_response(body: &str) -> Result<Vec<SourceRecord>, AdapterError> {
    let response: NewsResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::Decode(format!("news response: {e}")))?;

    if response.status != "success" {
        debug!(status = %response.status, "news source reported non-success, treating as empty");
        return Ok(Vec::new());
    }

    match response.results {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(results) => serde_json::from_value(results)
            .map_err(|e| AdapterError::Decode(format!("news results: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_payload_yields_records() {
        let body = r#"{
            "status": "success",
            "totalResults": 2,
            "results": [
                {"title": "One", "description": null, "content": "Body one", "country": ["costa rica"], "pubDate": "2024-01-01 10:00:00"},
                {"title": "Two", "country": ["us"]}
            ]
        }"#;
        let records = parse_news_response(body).unwrap_or_default();
        assert_eq!(records.len(), 2);
        assert_eq!(records.first().and_then(SourceRecord::extract_text), Some("Body one"));
        assert_eq!(records.get(1).map(|r| r.title.as_str()), Some("Two"));
    }

    #[test]
    fn error_status_is_empty_not_failure() {
        let body = r#"{"status": "error", "results": {"message": "rate limited", "code": "RateLimitExceeded"}}"#;
        assert!(matches!(parse_news_response(body), Ok(records) if records.is_empty()));
    }

    #[test]
    fn malformed_body_is_decode_error() {
        assert!(matches!(
            parse_news_response("<html>"),
            Err(AdapterError::Decode(_))
        ));
    }

    #[test]
    fn query_joins_regions_and_omits_empty_country() {
        let regions = RegionCode::parse_list("us, br");
        let params = query_params("k", &regions);
        assert!(params.contains(&("country", "us,br".to_owned())));
        assert!(params.contains(&("category", "top".to_owned())));

        let bare = query_params("k", &[]);
        assert!(bare.iter().all(|(name, _)| *name != "country"));
    }
}
