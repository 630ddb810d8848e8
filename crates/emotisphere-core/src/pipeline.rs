//! The enrichment pipeline: one batch cycle and per-record processing.
//!
//! A cycle fetches records for all regions in one request, falling back
//! to one request per region if that fails. Every record is then
//! processed concurrently but staggered, record `k` starting `k *
//! stagger` after the first, to stay under third-party rate limits.
//!
//! Per record: extract text, classify, derive a display location from
//! the declared region, geocode, publish. Any failing step drops that
//! record only. Nothing is retried within a cycle.

use std::future::Future;

use emotisphere_types::region::{self, FALLBACK_COUNTRY, country_name};
use emotisphere_types::{EnrichedEvent, MAX_REGIONS, RegionCode, SourceRecord};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::hub::{HubHandle, PublishError};
use crate::source::{AdapterError, EmotionClassifier, Geocoder, RecordSource};

/// Something the scheduler can run once per interval.
pub trait BatchProcessor: Send + Sync + 'static {
    /// Run one full cycle for `regions`.
    fn process_batch(&self, regions: &[RegionCode]) -> impl Future<Output = BatchReport> + Send;
}

/// Summary of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Records returned by the source (after fallback).
    pub fetched: usize,
    /// Records that made it onto the broadcast path.
    pub published: usize,
    /// Records dropped at some step.
    pub skipped: usize,
}

/// Why a record produced no event.
#[derive(Debug)]
pub enum SkipReason {
    /// Content, summary, and title were all blank.
    NoText,
    /// The classifier failed.
    Classification(AdapterError),
    /// The geocoder failed.
    Geocoding(AdapterError),
    /// The hub refused the envelope.
    Publish(PublishError),
}

/// Result of processing one record.
#[derive(Debug)]
pub enum RecordOutcome {
    /// An event was handed to the hub.
    Published,
    /// The record was dropped.
    Skipped(SkipReason),
}

impl RecordOutcome {
    /// Whether an event was published.
    pub const fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

/// Fetch -> classify -> geocode -> publish, over pluggable adapters.
#[derive(Debug)]
pub struct Pipeline<S, C, G> {
    source: S,
    classifier: C,
    geocoder: G,
    hub: HubHandle,
    config: PipelineConfig,
}

impl<S, C, G> Pipeline<S, C, G>
where
    S: RecordSource,
    C: EmotionClassifier,
    G: Geocoder,
{
    /// Assemble a pipeline that publishes to `hub`.
    pub const fn new(
        source: S,
        classifier: C,
        geocoder: G,
        hub: HubHandle,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            classifier,
            geocoder,
            hub,
            config,
        }
    }

    /// Fetch records for `regions` (first five only).
    ///
    /// Tries one combined request first. If that fails outright, each
    /// region is fetched on its own and whatever succeeds is concatenated
    /// in region order.
    pub async fn fetch_records(&self, regions: &[RegionCode]) -> Vec<SourceRecord> {
        let regions = regions.get(..MAX_REGIONS).unwrap_or(regions);

        match self.source.fetch(regions).await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    error = %e,
                    regions = %region::join(regions),
                    "combined fetch failed, trying regions one at a time"
                );
                let mut records = Vec::new();
                for code in regions {
                    match self.source.fetch(std::slice::from_ref(code)).await {
                        Ok(found) if !found.is_empty() => {
                            info!(region = %code, count = found.len(), "fetched region");
                            records.extend(found);
                        }
                        Ok(_) => debug!(region = %code, "region returned no records"),
                        Err(e) => warn!(region = %code, error = %e, "region fetch failed"),
                    }
                }
                records
            }
        }
    }

    /// Enrich one record and publish it.
    pub async fn process_record(&self, record: &SourceRecord) -> RecordOutcome {
        let Some(text) = record.extract_text() else {
            return RecordOutcome::Skipped(SkipReason::NoText);
        };

        let classification = match self.classifier.classify(text).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "emotion classification failed, skipping record");
                return RecordOutcome::Skipped(SkipReason::Classification(e));
            }
        };

        let (city, country) = resolve_location(record);

        let coordinates = match self.geocoder.geocode(&city, &country).await {
            Ok(c) => c,
            Err(e) => {
                warn!(%city, %country, error = %e, "geocoding failed, skipping record");
                return RecordOutcome::Skipped(SkipReason::Geocoding(e));
            }
        };

        let event = EnrichedEvent::new(city, country, classification, coordinates, text);
        info!(
            emotion = %event.emotion(),
            intensity = event.intensity(),
            country = event.country(),
            "record enriched"
        );

        match self.hub.publish(event.into()) {
            Ok(()) => RecordOutcome::Published,
            Err(e) => {
                warn!(error = %e, "publish failed");
                RecordOutcome::Skipped(SkipReason::Publish(e))
            }
        }
    }
}

impl<S, C, G> BatchProcessor for Pipeline<S, C, G>
where
    S: RecordSource,
    C: EmotionClassifier,
    G: Geocoder,
{
    async fn process_batch(&self, regions: &[RegionCode]) -> BatchReport {
        info!(regions = %region::join(regions), "fetching records");
        let records = self.fetch_records(regions).await;
        if records.is_empty() {
            info!("no records fetched for any region");
            return BatchReport::default();
        }

        info!(count = records.len(), "processing records");
        let stagger = self.config.stagger;
        let outcomes = join_all(records.iter().enumerate().map(|(index, record)| async move {
            let delay = stagger.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.process_record(record).await
        }))
        .await;

        let published = outcomes.iter().filter(|o| o.is_published()).count();
        let report = BatchReport {
            fetched: records.len(),
            published,
            skipped: records.len().saturating_sub(published),
        };
        info!(
            fetched = report.fetched,
            published = report.published,
            skipped = report.skipped,
            "cycle finished"
        );
        report
    }
}

/// Derive `(city, country)` for a record from its first declared region.
///
/// Only the country is known at this level; the city is left empty.
/// Records with no region fall back to [`FALLBACK_COUNTRY`].
pub fn resolve_location(record: &SourceRecord) -> (String, String) {
    let country = record
        .primary_region()
        .map_or(FALLBACK_COUNTRY, country_name);
    (String::new(), country.to_owned())
}
