//! `OpenStreetMap` Nominatim client implementing [`Geocoder`].

use std::time::Duration;

use emotisphere_core::{AdapterError, Geocoder};
use emotisphere_types::Coordinates;
use serde::Deserialize;

const ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Emotisphere/1.0";

/// Free-text place search against the public Nominatim instance.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
}

impl NominatimClient {
    /// Build a client with a 10 second timeout and an identifying user agent.
    pub fn new() -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AdapterError::Http(format!("geocoder client build failed: {e}")))?;
        Ok(Self { client })
    }
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, city: &str, country: &str) -> Result<Coordinates, AdapterError> {
        let query = build_query(city, country).ok_or_else(|| {
            AdapterError::InvalidInput("both city and country are empty".to_owned())
        })?;

        let response = self
            .client
            .get(ENDPOINT)
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AdapterError::Http(format!("geocode request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::Http(format!("geocode body read failed: {e}")))?;
        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_search_response(&body, &query)
    }
}

/// `"city, country"`, or whichever of the two is present.
pub fn build_query(city: &str, country: &str) -> Option<String> {
    match (city.trim(), country.trim()) {
        ("", "") => None,
        (city, "") => Some(city.to_owned()),
        ("", country) => Some(country.to_owned()),
        (city, country) => Some(format!("{city}, {country}")),
    }
}

#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Take the first hit of a search response. Coordinates arrive as strings.
pub fn parse_search_response(body: &str, query: &str) -> Result<Coordinates, AdapterError> {
    let places: Vec<Place> = serde_json::from_str(body)
        .map_err(|e| AdapterError::Decode(format!("geocode response: {e}")))?;
    let place = places
        .first()
        .ok_or_else(|| AdapterError::NotFound(query.to_owned()))?;

    let latitude = parse_coordinate(&place.lat, "latitude")?;
    let longitude = parse_coordinate(&place.lon, "longitude")?;
    Ok(Coordinates {
        latitude,
        longitude,
    })
}

fn parse_coordinate(raw: &str, what: &str) -> Result<f64, AdapterError> {
    raw.trim()
        .parse()
        .map_err(|e| AdapterError::Decode(format!("invalid {what} {raw:?}: {e}")))
}
