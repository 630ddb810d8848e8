//! The enriched event produced for each successfully processed record.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::emotion::{Classification, Emotion};

/// Maximum number of characters kept from the source text.
pub const MAX_EXCERPT_CHARS: usize = 100;

/// A resolved point on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// One classified, geolocated record, ready for broadcast.
///
/// Built once by the pipeline and never mutated afterwards; the fields
/// are private and only exposed through accessors. Serializes to the
/// `emotion` payload of the subscriber protocol:
/// `{ city, country, emotion, intensity, lat, lng, text? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EnrichedEvent {
    city: String,
    country: String,
    emotion: Emotion,
    intensity: f64,
    #[serde(rename = "lat")]
    latitude: f64,
    #[serde(rename = "lng")]
    longitude: f64,
    #[serde(rename = "text", default, skip_serializing_if = "String::is_empty")]
    text_excerpt: String,
}

impl EnrichedEvent {
    /// Assemble an event.
    ///
    /// The classifier confidence becomes the intensity, clamped into
    /// `[0, 1]` (non-finite values become `0`). The text is cut to
    /// [`MAX_EXCERPT_CHARS`] characters.
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
        classification: Classification,
        coordinates: Coordinates,
        text: &str,
    ) -> Self {
        let intensity = if classification.confidence.is_finite() {
            classification.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            city: city.into(),
            country: country.into(),
            emotion: classification.emotion,
            intensity,
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            text_excerpt: excerpt(text),
        }
    }

    /// City name, possibly empty when only the country is known.
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Country display name.
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Dominant emotion.
    pub const fn emotion(&self) -> Emotion {
        self.emotion
    }

    /// Emotion intensity in `[0, 1]`.
    pub const fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Resolved coordinates.
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Leading excerpt of the source text.
    pub fn text_excerpt(&self) -> &str {
        &self.text_excerpt
    }
}

/// Take at most [`MAX_EXCERPT_CHARS`] characters, never splitting a code point.
fn excerpt(text: &str) -> String {
    text.chars().take(MAX_EXCERPT_CHARS).collect()
}
