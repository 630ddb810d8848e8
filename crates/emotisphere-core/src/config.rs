//! Timing constants and pipeline tuning.

use std::time::Duration;

/// Delay between the starts of successive records within one cycle.
pub const DEFAULT_STAGGER: Duration = Duration::from_secs(2);

/// Interval used by the control surface when none is given.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Interval used when the pipeline starts itself at boot.
pub const AUTO_START_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Shortest interval the scheduler accepts. Anything lower is raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Tuning knobs for [`Pipeline`](crate::pipeline::Pipeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Record `k` of a cycle waits `k * stagger` before it starts.
    pub stagger: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stagger: DEFAULT_STAGGER,
        }
    }
}
