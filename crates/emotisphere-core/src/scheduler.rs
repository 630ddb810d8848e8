//! Interval-driven start/stop control over a [`BatchProcessor`].
//!
//! State machine `Idle -> Running -> Idle`, held behind one mutex so
//! start/start and stop/stop races resolve to a single transition.
//! Stopping cancels a [`CancellationToken`] and never waits on the run
//! loop. A single-permit semaphore is the cycle slot: a tick that fires
//! while a cycle still holds it is skipped. The first tick of a run is the
//! exception and waits for the slot, so a restart always gets its
//! immediate cycle.
//!
//! Stop affects only future cycles. A cycle already in progress keeps its
//! permit and runs to completion.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use emotisphere_types::RegionCode;
use emotisphere_types::region;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MIN_INTERVAL;
use crate::pipeline::BatchProcessor;

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    interval: Duration,
    regions: Vec<RegionCode>,
}

impl RunConfig {
    /// Build a run config. Regions past the fifth are dropped and the
    /// interval is raised to at least one second.
    pub fn new(interval: Duration, regions: Vec<RegionCode>) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            regions: RegionCode::clamp(regions),
        }
    }

    /// Time between cycle starts.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Regions passed to every cycle.
    pub fn regions(&self) -> &[RegionCode] {
        &self.regions
    }
}

/// Result of [`PipelineControl::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The scheduler went from idle to running.
    Started,
    /// It was already running; nothing changed.
    AlreadyRunning,
}

/// Result of [`PipelineControl::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The run loop was cancelled.
    Stopped,
    /// It was already idle; nothing changed.
    NotRunning,
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    /// Whether a run loop is active.
    pub running: bool,
    /// Interval of the current run, in seconds.
    pub interval_secs: Option<u64>,
    /// Regions of the current run.
    pub regions: Vec<RegionCode>,
    /// When the current run started.
    pub started_at: Option<DateTime<Utc>>,
    /// Cycles finished since the process started.
    pub cycles_completed: u64,
    /// Whether a cycle currently holds the slot.
    pub cycle_active: bool,
}

/// Control surface used by the HTTP layer.
///
/// Object-safe so the server state can hold `Arc<dyn PipelineControl>`
/// without knowing the concrete adapters.
pub trait PipelineControl: Send + Sync + 'static {
    /// Begin scheduled processing. Must be called within a Tokio runtime.
    fn start(&self, config: RunConfig) -> StartOutcome;

    /// Cancel future cycles. Never blocks.
    fn stop(&self) -> StopOutcome;

    /// Current state.
    fn status(&self) -> SchedulerStatus;
}

#[derive(Debug)]
enum RunState {
    Idle,
    Running {
        cancel: CancellationToken,
        config: RunConfig,
        started_at: DateTime<Utc>,
    },
}

/// Runs a [`BatchProcessor`] on a fixed interval.
#[derive(Debug)]
pub struct Scheduler<P> {
    processor: Arc<P>,
    state: Mutex<RunState>,
    cycle_slot: Arc<Semaphore>,
    cycles_completed: Arc<AtomicU64>,
}

impl<P: BatchProcessor> Scheduler<P> {
    /// Create an idle scheduler around `processor`.
    pub fn new(processor: Arc<P>) -> Self {
        Self {
            processor,
            state: Mutex::new(RunState::Idle),
            cycle_slot: Arc::new(Semaphore::new(1)),
            cycles_completed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Whether a run loop is active.
    pub fn is_running(&self) -> bool {
        matches!(*self.lock_state(), RunState::Running { .. })
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_loop(
        processor: Arc<P>,
        config: RunConfig,
        cancel: CancellationToken,
        cycle_slot: Arc<Semaphore>,
        cycles_completed: Arc<AtomicU64>,
    ) {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut first_tick = true;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // The immediate cycle waits out a cycle left over from a previous
            // run; later ticks skip instead.
            let permit = if std::mem::take(&mut first_tick) {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    permit = Arc::clone(&cycle_slot).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(e) => {
                            warn!("cycle slot closed: {e}");
                            break;
                        }
                    },
                }
            } else {
                let Ok(permit) = Arc::clone(&cycle_slot).try_acquire_owned() else {
                    warn!("previous cycle still active, skipping tick");
                    continue;
                };
                permit
            };

            let processor = Arc::clone(&processor);
            let regions = config.regions.clone();
            let cycles_completed = Arc::clone(&cycles_completed);
            tokio::spawn(async move {
                let report = processor.process_batch(&regions).await;
                let total = cycles_completed.fetch_add(1, Ordering::Relaxed).saturating_add(1);
                debug!(?report, cycles_completed = total, "cycle released slot");
                drop(permit);
            });
        }

        info!("scheduler run loop stopped");
    }
}

impl<P: BatchProcessor> PipelineControl for Scheduler<P> {
    fn start(&self, config: RunConfig) -> StartOutcome {
        let mut state = self.lock_state();
        if let RunState::Running { .. } = *state {
            info!("pipeline already running, ignoring start");
            return StartOutcome::AlreadyRunning;
        }

        let cancel = CancellationToken::new();
        info!(
            interval_secs = config.interval.as_secs(),
            regions = %region::join(&config.regions),
            "starting pipeline"
        );
        tokio::spawn(Self::run_loop(
            Arc::clone(&self.processor),
            config.clone(),
            cancel.clone(),
            Arc::clone(&self.cycle_slot),
            Arc::clone(&self.cycles_completed),
        ));

        *state = RunState::Running {
            cancel,
            config,
            started_at: Utc::now(),
        };
        StartOutcome::Started
    }

    fn stop(&self) -> StopOutcome {
        let mut state = self.lock_state();
        match std::mem::replace(&mut *state, RunState::Idle) {
            RunState::Running { cancel, .. } => {
                cancel.cancel();
                info!("pipeline stopped");
                StopOutcome::Stopped
            }
            RunState::Idle => {
                debug!("pipeline not running, ignoring stop");
                StopOutcome::NotRunning
            }
        }
    }

    fn status(&self) -> SchedulerStatus {
        let cycles_completed = self.cycles_completed.load(Ordering::Relaxed);
        let cycle_active = self.cycle_slot.available_permits() == 0;
        match &*self.lock_state() {
            RunState::Idle => SchedulerStatus {
                running: false,
                interval_secs: None,
                regions: Vec::new(),
                started_at: None,
                cycles_completed,
                cycle_active,
            },
            RunState::Running {
                config, started_at, ..
            } => SchedulerStatus {
                running: true,
                interval_secs: Some(config.interval.as_secs()),
                regions: config.regions.clone(),
                started_at: Some(*started_at),
                cycles_completed,
                cycle_active,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::pipeline::BatchReport;

    /// Counts calls and tracks how many batches overlap.
    #[derive(Default)]
    struct CountingProcessor {
        work: Duration,
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl CountingProcessor {
        fn taking(work: Duration) -> Arc<Self> {
            Arc::new(Self {
                work,
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl BatchProcessor for CountingProcessor {
        async fn process_batch(&self, _regions: &[RegionCode]) -> BatchReport {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst).saturating_add(1);
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.work).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            BatchReport::default()
        }
    }

    fn run(interval_secs: u64) -> RunConfig {
        RunConfig::new(Duration::from_secs(interval_secs), RegionCode::defaults())
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_runs_first_cycle_immediately() {
        let processor = CountingProcessor::taking(Duration::ZERO);
        let scheduler = Scheduler::new(Arc::clone(&processor));

        assert_eq!(scheduler.start(run(300)), StartOutcome::Started);
        settle().await;

        assert_eq!(processor.calls(), 1);
        assert!(scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn one_cycle_per_interval() {
        let processor = CountingProcessor::taking(Duration::ZERO);
        let scheduler = Scheduler::new(Arc::clone(&processor));

        scheduler.start(run(60));
        tokio::time::sleep(Duration::from_secs(120)).await;
        settle().await;

        assert_eq!(processor.calls(), 3);
        assert_eq!(scheduler.status().cycles_completed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_a_noop() {
        let processor = CountingProcessor::taking(Duration::ZERO);
        let scheduler = Scheduler::new(Arc::clone(&processor));

        assert_eq!(scheduler.start(run(300)), StartOutcome::Started);
        assert_eq!(scheduler.start(run(5)), StartOutcome::AlreadyRunning);
        settle().await;

        assert_eq!(processor.calls(), 1);
        assert_eq!(scheduler.status().interval_secs, Some(300));
    }

    #[tokio::test(start_paused = true)]
    async fn cycles_never_overlap() {
        // Each batch outlasts two intervals.
        let processor = CountingProcessor::taking(Duration::from_secs(150));
        let scheduler = Scheduler::new(Arc::clone(&processor));

        scheduler.start(run(60));
        tokio::time::sleep(Duration::from_secs(400)).await;

        assert_eq!(processor.max_active.load(Ordering::SeqCst), 1);
        assert!(processor.calls() < 7);
        assert!(processor.calls() >= 2);
    }

    #[tokio::test]
    async fn stop_when_idle_is_a_noop() {
        let scheduler = Scheduler::new(CountingProcessor::taking(Duration::ZERO));

        assert_eq!(scheduler.stop(), StopOutcome::NotRunning);
        assert_eq!(scheduler.stop(), StopOutcome::NotRunning);
        assert!(!scheduler.status().running);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_future_cycles() {
        let processor = CountingProcessor::taking(Duration::ZERO);
        let scheduler = Scheduler::new(Arc::clone(&processor));

        scheduler.start(run(60));
        settle().await;
        assert_eq!(scheduler.stop(), StopOutcome::Stopped);
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(processor.calls(), 1);
        let status = scheduler.status();
        assert!(!status.running);
        assert!(status.regions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_lets_in_flight_cycle_finish() {
        let processor = CountingProcessor::taking(Duration::from_secs(30));
        let scheduler = Scheduler::new(Arc::clone(&processor));

        scheduler.start(run(300));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(scheduler.status().cycle_active);

        scheduler.stop();
        tokio::time::sleep(Duration::from_secs(60)).await;

        let status = scheduler.status();
        assert_eq!(status.cycles_completed, 1);
        assert!(!status.cycle_active);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_runs_again() {
        let processor = CountingProcessor::taking(Duration::ZERO);
        let scheduler = Scheduler::new(Arc::clone(&processor));

        scheduler.start(run(300));
        settle().await;
        scheduler.stop();
        assert_eq!(scheduler.start(run(300)), StartOutcome::Started);
        settle().await;

        assert_eq!(processor.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_during_cycle_runs_once_slot_frees() {
        let processor = CountingProcessor::taking(Duration::from_secs(30));
        let scheduler = Scheduler::new(Arc::clone(&processor));

        scheduler.start(run(600));
        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.stop();
        assert_eq!(scheduler.start(run(600)), StartOutcome::Started);

        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(processor.calls(), 2);
        assert_eq!(processor.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.status().cycles_completed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_waiting_for_slot_skips_cycle() {
        let processor = CountingProcessor::taking(Duration::from_secs(30));
        let scheduler = Scheduler::new(Arc::clone(&processor));

        scheduler.start(run(600));
        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.stop();
        scheduler.start(run(600));
        settle().await;
        scheduler.stop();

        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(processor.calls(), 1);
    }

    #[test]
    fn run_config_clamps_inputs() {
        let regions = RegionCode::parse_list("us,cr,br,bo,es,gb,jp");
        let config = RunConfig::new(Duration::ZERO, regions);

        assert_eq!(config.interval(), MIN_INTERVAL);
        assert_eq!(config.regions().len(), 5);
    }
}
