//! Region codes used to filter the source feed.
//!
//! The source API accepts at most [`MAX_REGIONS`] codes per request on
//! the free tier. Callers may pass more; everything past the limit is
//! dropped silently by [`RegionCode::clamp`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Maximum number of region codes per source request.
pub const MAX_REGIONS: usize = 5;

/// Regions used when none are specified: USA, Costa Rica, Brazil, Bolivia, Spain.
pub const DEFAULT_REGIONS: [&str; MAX_REGIONS] = ["us", "cr", "br", "bo", "es"];

/// Display name used when a record declares no region at all.
pub const FALLBACK_COUNTRY: &str = "United States";

/// A lower-cased, trimmed region code such as `us` or `br`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct RegionCode(String);

impl RegionCode {
    /// Normalize a raw code. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_ascii_lowercase()))
        }
    }

    /// Parse a comma-separated list, dropping blanks and anything past
    /// [`MAX_REGIONS`].
    pub fn parse_list(raw: &str) -> Vec<Self> {
        Self::clamp(raw.split(',').filter_map(Self::parse))
    }

    /// Keep the first [`MAX_REGIONS`] codes, in order.
    pub fn clamp(regions: impl IntoIterator<Item = Self>) -> Vec<Self> {
        regions.into_iter().take(MAX_REGIONS).collect()
    }

    /// The default region set.
    pub fn defaults() -> Vec<Self> {
        DEFAULT_REGIONS
            .iter()
            .map(|code| Self((*code).to_owned()))
            .collect()
    }

    /// The code as sent to the source.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name for the code, or the code itself when unknown.
    pub fn country_name(&self) -> &str {
        country_name(&self.0)
    }
}

impl core::fmt::Display for RegionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Look up the display name for a region code (case-insensitive).
///
/// Unknown codes are returned unchanged.
pub fn country_name(code: &str) -> &str {
    match code.trim().to_ascii_lowercase().as_str() {
        "us" => "United States",
        "cr" => "Costa Rica",
        "br" => "Brazil",
        "bo" => "Bolivia",
        "es" => "Spain",
        "gb" => "United Kingdom",
        "jp" => "Japan",
        "ca" => "Canada",
        "au" => "Australia",
        "de" => "Germany",
        "fr" => "France",
        "it" => "Italy",
        "mx" => "Mexico",
        "in" => "India",
        "cn" => "China",
        "ru" => "Russia",
        "kr" => "South Korea",
        _ => code,
    }
}

/// Join codes the way the source query string expects (`us,cr,br`).
pub fn join(regions: &[RegionCode]) -> String {
    regions
        .iter()
        .map(RegionCode::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
