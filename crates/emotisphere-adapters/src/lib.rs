//! HTTP adapters for the three upstream services the pipeline depends on.
//!
//! Each client implements one of the core adapter traits over `reqwest`:
//!
//! - [`newsdata`] -- [`NewsDataClient`], the record source (newsdata.io)
//! - [`huggingface`] -- [`HuggingFaceClient`], the emotion classifier
//! - [`nominatim`] -- [`NominatimClient`], the geocoder (`OpenStreetMap`)
//! - [`config`] -- [`AdapterConfig`], credentials loaded from the environment

pub mod config;
pub mod huggingface;
pub mod newsdata;
pub mod nominatim;

pub use config::{AdapterConfig, ConfigError};
pub use huggingface::HuggingFaceClient;
pub use newsdata::NewsDataClient;
pub use nominatim::NominatimClient;

use emotisphere_core::AdapterError;

/// The three production clients, built from one config.
#[derive(Debug, Clone)]
pub struct Adapters {
    /// Record source.
    pub source: NewsDataClient,
    /// Emotion classifier.
    pub classifier: HuggingFaceClient,
    /// Geocoder.
    pub geocoder: NominatimClient,
}

impl Adapters {
    /// Build every client. Missing keys are not an error here; calls made
    /// without them fail with [`AdapterError::MissingCredential`].
    pub fn from_config(config: &AdapterConfig) -> Result<Self, AdapterError> {
        Ok(Self {
            source: NewsDataClient::new(config.newsdata_api_key.clone())?,
            classifier: HuggingFaceClient::new(
                config.huggingface_api_key.clone(),
                &config.huggingface_model,
            )?,
            geocoder: NominatimClient::new()?,
        })
    }
}
