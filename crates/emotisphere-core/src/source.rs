//! Adapter traits for the three external collaborators.
//!
//! The pipeline talks to the outside world only through these traits.
//! Concrete HTTP clients live in `emotisphere-adapters`; tests plug in
//! in-memory fakes. Methods return `impl Future + Send` so the pipeline
//! can be driven from spawned tasks without boxing.

use std::future::Future;

use emotisphere_types::{Classification, Coordinates, RegionCode, SourceRecord};

/// Errors reported by adapters.
///
/// Every variant is recoverable from the pipeline's point of view: the
/// affected region or record is skipped and the batch carries on.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The HTTP request could not be sent or timed out.
    #[error("request failed: {0}")]
    Http(String),

    /// The upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The call was rejected before going on the wire.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The upstream had no result for the query.
    #[error("no result for: {0}")]
    NotFound(String),

    /// The inference backend is still warming up.
    #[error("model is loading (503)")]
    ModelLoading,

    /// Every endpoint variant was tried and none succeeded.
    #[error("all endpoint attempts failed, last error: {0}")]
    Exhausted(Box<AdapterError>),

    /// A required API key is not configured.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Fetches batches of raw records from the news source.
pub trait RecordSource: Send + Sync + 'static {
    /// Fetch records for up to five regions in a single request.
    ///
    /// A non-success status *inside* a well-formed payload is reported as
    /// an empty result, not an error, so the caller can keep trying
    /// other regions.
    fn fetch(
        &self,
        regions: &[RegionCode],
    ) -> impl Future<Output = Result<Vec<SourceRecord>, AdapterError>> + Send;
}

/// Classifies the dominant emotion of a piece of text.
pub trait EmotionClassifier: Send + Sync + 'static {
    /// Classify `text`, returning the normalized emotion and its confidence.
    fn classify(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Classification, AdapterError>> + Send;
}

/// Resolves a place name to coordinates.
pub trait Geocoder: Send + Sync + 'static {
    /// Look up `city, country`. Fails when both are empty.
    fn geocode(
        &self,
        city: &str,
        country: &str,
    ) -> impl Future<Output = Result<Coordinates, AdapterError>> + Send;
}
