//! Clock synchronization engine

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use meridian_core::{MeridianResult, Property, SyncState, TimeSample, TimeSource};
use meridian_sntp::SntpResolver;

use crate::RegionalZone;

/// Clock engine configuration
#[derive(Clone, Debug)]
pub struct ClockConfig {
    /// Display recompute cadence
    pub tick_interval: Duration,
    /// Periodic resync cadence
    pub resync_interval: Duration,
    /// How long a network offset stays trusted
    pub sync_validity: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            tick_interval: Duration::from_secs(1),
            resync_interval: Duration::from_secs(300),
            sync_validity: Duration::from_secs(3600),
        }
    }
}

/// Clock synchronization engine
///
/// Cheap to clone; clones share one underlying engine. The engine is the
/// single writer of its published properties; network results are committed
/// together with the synchronized flag so observers never see them split.
#[derive(Clone)]
pub struct ClockEngine {
    inner: Arc<ClockInner>,
}

struct ClockInner {
    time: Arc<dyn TimeSource>,
    resolver: Arc<SntpResolver>,
    config: ClockConfig,
    zone: RegionalZone,
    /// Offset state; the synchronized property is set under this lock so
    /// flag and offset move together
    sync: Mutex<Option<SyncState>>,
    /// Bumped by stop_sync(); in-flight resolver results carrying a stale
    /// generation are dropped instead of committed
    generation: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,

    local: Property<DateTime<Local>>,
    utc: Property<DateTime<Utc>>,
    regional: Property<DateTime<FixedOffset>>,
    synchronized: Property<bool>,
}

impl ClockEngine {
    /// Create an engine with the default JST regional reading
    pub fn new(time: Arc<dyn TimeSource>, resolver: SntpResolver, config: ClockConfig) -> Self {
        Self::with_zone(time, resolver, config, RegionalZone::jst())
    }

    /// Create an engine with a custom regional zone chain
    pub fn with_zone(
        time: Arc<dyn TimeSource>,
        resolver: SntpResolver,
        config: ClockConfig,
        zone: RegionalZone,
    ) -> Self {
        let now = Utc::now();
        let regional = zone.convert(now);

        ClockEngine {
            inner: Arc::new(ClockInner {
                time,
                resolver: Arc::new(resolver),
                config,
                zone,
                sync: Mutex::new(None),
                generation: AtomicU64::new(0),
                tasks: Mutex::new(Vec::new()),
                local: Property::new(now.with_timezone(&Local)),
                utc: Property::new(now),
                regional: Property::new(regional),
                synchronized: Property::new(false),
            }),
        }
    }

    /// Current local time
    pub fn local(&self) -> &Property<DateTime<Local>> {
        &self.inner.local
    }

    /// Current UTC time
    pub fn utc(&self) -> &Property<DateTime<Utc>> {
        &self.inner.utc
    }

    /// Current regional time
    pub fn regional(&self) -> &Property<DateTime<FixedOffset>> {
        &self.inner.regional
    }

    /// Whether the last sync attempt succeeded
    pub fn synchronized(&self) -> &Property<bool> {
        &self.inner.synchronized
    }

    /// Snapshot of the committed offset state, if any
    pub fn sync_state(&self) -> Option<SyncState> {
        *self.inner.sync.lock()
    }

    /// Start the sync loops: one immediate sync, a display tick, and a
    /// periodic resync
    ///
    /// Idempotent - an already-running loop is torn down first. Must be
    /// called from within a tokio runtime.
    pub fn start_sync(&self) {
        self.stop_sync();
        self.force_sync();

        let inner = self.inner.clone();
        let tick = tokio::spawn(async move {
            let mut interval = tokio::time::interval(inner.config.tick_interval);
            loop {
                interval.tick().await;
                inner.refresh();
            }
        });

        let inner = self.inner.clone();
        let resync = tokio::spawn(async move {
            let period = inner.config.resync_interval;
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                ClockInner::spawn_sync(&inner);
            }
        });

        self.inner.tasks.lock().extend([tick, resync]);
    }

    /// Cancel the sync loops, leaving the last-known state intact
    pub fn stop_sync(&self) {
        // Invalidate in-flight resolver callbacks before tearing down
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        for task in self.inner.tasks.lock().drain(..) {
            task.abort();
        }
    }

    /// Kick off one asynchronous resync
    ///
    /// Never fails from the caller's perspective; the outcome lands in the
    /// synchronized flag. Must be called from within a tokio runtime.
    pub fn force_sync(&self) {
        ClockInner::spawn_sync(&self.inner);
    }

    /// Perform one resync inline and commit its outcome
    pub async fn sync_once(&self) {
        self.inner.sync_once().await;
    }

    /// Recompute the published local/UTC/regional readings now
    pub fn refresh(&self) {
        self.inner.refresh();
    }

    /// Monotonic-anchored UTC estimate with the trusted offset applied
    ///
    /// Reverts to the plain system clock once the offset expires or when no
    /// sync has succeeded yet.
    pub fn current_utc(&self) -> DateTime<Utc> {
        self.inner.current_utc()
    }
}

impl ClockInner {
    fn spawn_sync(inner: &Arc<ClockInner>) {
        let inner = inner.clone();
        tokio::spawn(async move {
            inner.sync_once().await;
        });
    }

    async fn sync_once(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        let result = self.resolver.resolve(self.time.as_ref()).await;
        self.commit(generation, result);
    }

    fn commit(&self, generation: u64, result: MeridianResult<TimeSample>) {
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("dropping stale sync result");
            return;
        }

        {
            let mut sync = self.sync.lock();
            match result {
                Ok(sample) => {
                    let offset = sample.offset_from(Utc::now());
                    *sync = Some(SyncState::new(
                        offset,
                        sample.captured_at,
                        self.config.sync_validity,
                    ));
                    self.synchronized.set(true);
                }
                Err(error) => {
                    // Prior offset stays in place until it expires on its own
                    self.synchronized.set(false);
                    tracing::warn!(%error, "network sync failed, staying on system time");
                }
            }
        }

        self.refresh();
    }

    fn current_utc(&self) -> DateTime<Utc> {
        let now = self.time.now();
        let system = Utc::now();
        match self.sync.lock().and_then(|state| state.offset_at(now)) {
            Some(offset) => system + offset,
            None => system,
        }
    }

    fn refresh(&self) {
        let utc = self.current_utc();
        self.utc.set(utc);
        self.local.set(utc.with_timezone(&Local));
        self.regional.set(self.zone.convert(utc));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use meridian_core::{ManualTimeSource, MeridianError, Monotonic};
    use meridian_sntp::ResolverConfig;

    use super::*;

    fn unreachable_resolver() -> SntpResolver {
        SntpResolver::with_config(ResolverConfig {
            servers: vec!["name-that-does-not-resolve.invalid".to_string()],
            attempt_timeout: Duration::from_millis(50),
            ..ResolverConfig::default()
        })
    }

    #[tokio::test]
    async fn test_failed_sync_degrades_to_system_time() {
        let source = Arc::new(ManualTimeSource::new());
        let engine = ClockEngine::new(source, unreachable_resolver(), ClockConfig::default());

        engine.sync_once().await;

        assert!(!engine.synchronized().get());
        assert!(engine.sync_state().is_none());

        let drift = (engine.current_utc() - Utc::now()).num_milliseconds().abs();
        assert!(drift < 100, "expected system time, drifted {drift}ms");
    }

    #[tokio::test]
    async fn test_committed_offset_expires() {
        let source = Arc::new(ManualTimeSource::new());
        let engine = ClockEngine::new(
            source.clone(),
            unreachable_resolver(),
            ClockConfig {
                sync_validity: Duration::from_secs(60),
                ..ClockConfig::default()
            },
        );

        // Commit a two-minute offset directly, as a successful sync would
        let sample = TimeSample::network(Utc::now() + chrono::Duration::seconds(120), source.now());
        engine.inner.commit(0, Ok(sample));
        assert!(engine.synchronized().get());

        let skew = (engine.current_utc() - Utc::now()).num_seconds();
        assert!((118..=122).contains(&skew), "offset not applied: {skew}s");

        // Once the validity window passes, readings silently revert
        source.advance(Duration::from_secs(61));
        let skew = (engine.current_utc() - Utc::now()).num_seconds();
        assert!(skew.abs() < 2, "offset survived expiry: {skew}s");
    }

    #[tokio::test]
    async fn test_stale_result_dropped_after_stop() {
        let source = Arc::new(ManualTimeSource::new());
        let engine = ClockEngine::new(source.clone(), unreachable_resolver(), ClockConfig::default());

        let generation = engine.inner.generation.load(Ordering::SeqCst);
        engine.stop_sync();

        // A response captured before stop_sync() must not commit
        let sample = TimeSample::network(Utc::now() + chrono::Duration::seconds(120), source.now());
        engine.inner.commit(generation, Ok(sample));

        assert!(!engine.synchronized().get());
        assert!(engine.sync_state().is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_prior_offset() {
        let source = Arc::new(ManualTimeSource::new());
        let engine = ClockEngine::new(source.clone(), unreachable_resolver(), ClockConfig::default());

        let sample = TimeSample::network(Utc::now() + chrono::Duration::seconds(120), source.now());
        engine.inner.commit(0, Ok(sample));

        // A later failure flips the flag but leaves the offset trusted
        engine.inner.commit(0, Err(MeridianError::Unavailable));

        assert!(!engine.synchronized().get());
        let skew = (engine.current_utc() - Utc::now()).num_seconds();
        assert!((118..=122).contains(&skew), "prior offset lost: {skew}s");
    }

    #[tokio::test]
    async fn test_start_sync_is_idempotent() {
        let source = Arc::new(ManualTimeSource::starting_at(Monotonic::from_secs(1)));
        let engine = ClockEngine::new(source, unreachable_resolver(), ClockConfig::default());

        engine.start_sync();
        engine.start_sync();

        // The restart tears the first pair of loops down
        assert_eq!(engine.inner.tasks.lock().len(), 2);
        engine.stop_sync();
        assert!(engine.inner.tasks.lock().is_empty());
    }
}
