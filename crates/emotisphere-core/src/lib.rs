//! Broadcast hub, enrichment pipeline, and scheduler for Emotisphere.
//!
//! This crate owns the parts of the system with real coordination
//! concerns: fanning envelopes out to live subscribers without ever
//! blocking, and running the fetch -> classify -> geocode -> publish
//! cycle on a timer with per-step fallback.
//!
//! # Modules
//!
//! - [`source`] -- Adapter traits ([`RecordSource`], [`EmotionClassifier`],
//!   [`Geocoder`]) and the shared [`AdapterError`].
//! - [`hub`] -- Single-writer broadcast hub and subscriber mailboxes.
//! - [`pipeline`] -- One batch cycle and per-record enrichment.
//! - [`scheduler`] -- Interval-driven start/stop control over the pipeline.
//! - [`config`] -- Timing constants and pipeline tuning.
//!
//! [`RecordSource`]: source::RecordSource
//! [`EmotionClassifier`]: source::EmotionClassifier
//! [`Geocoder`]: source::Geocoder
//! [`AdapterError`]: source::AdapterError

pub mod config;
pub mod hub;
pub mod pipeline;
pub mod scheduler;
pub mod source;

pub use config::PipelineConfig;
pub use hub::{Hub, HubHandle, MAILBOX_CAPACITY, Mailbox, PublishError, Subscriber};
pub use pipeline::{BatchProcessor, BatchReport, Pipeline, RecordOutcome, SkipReason};
pub use scheduler::{PipelineControl, RunConfig, Scheduler, SchedulerStatus, StartOutcome, StopOutcome};
pub use source::{AdapterError, EmotionClassifier, Geocoder, RecordSource};
