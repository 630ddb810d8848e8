//! Shared type definitions for the Emotisphere live emotion map.
//!
//! This crate is the single source of truth for the values that flow
//! through the pipeline and over the subscriber `WebSocket`. Wire types
//! are exported to `TypeScript` via `ts-rs` for the browser dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers (subscriber identity)
//! - [`emotion`] -- Canonical emotion enum and provider label normalization
//! - [`event`] -- The enriched event produced once per processed record
//! - [`envelope`] -- Tagged wrapper for everything placed on the broadcast path
//! - [`record`] -- Raw source records and text extraction
//! - [`region`] -- Region codes, clamping, and display-name lookup

pub mod emotion;
pub mod envelope;
pub mod event;
pub mod ids;
pub mod record;
pub mod region;

// Re-export all public types at crate root for convenience.
pub use emotion::{Classification, Emotion};
pub use envelope::{Envelope, ErrorInfo, InfoMessage};
pub use event::{Coordinates, EnrichedEvent, MAX_EXCERPT_CHARS};
pub use ids::SubscriberId;
pub use record::SourceRecord;
pub use region::{DEFAULT_REGIONS, MAX_REGIONS, RegionCode};
