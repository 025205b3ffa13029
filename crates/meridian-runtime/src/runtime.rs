//! Application runtime - owns the engines and the scheduler tick

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use meridian_clock::{ClockConfig, ClockEngine};
use meridian_core::{LapRecord, Monotonic, SystemTimeSource, TimeSource, TimerPhase};
use meridian_sntp::SntpResolver;
use meridian_stopwatch::{StopwatchConfig, StopwatchEngine};
use meridian_timer::TimerEngine;

/// Runtime configuration
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Cadence of the shared stopwatch/timer recompute tick
    pub tick_interval: Duration,
    pub clock: ClockConfig,
    pub stopwatch: StopwatchConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            tick_interval: Duration::from_millis(10),
            clock: ClockConfig::default(),
            stopwatch: StopwatchConfig::default(),
        }
    }
}

/// Clock application runtime
///
/// Presentation code talks to this type only: commands are synchronous and
/// fire-and-forget, queries are snapshots of the published properties, and
/// nothing here ever blocks on network I/O.
pub struct ClockRuntime {
    time: Arc<dyn TimeSource>,
    clock: ClockEngine,
    stopwatch: Arc<StopwatchEngine>,
    timer: Arc<TimerEngine>,
    config: RuntimeConfig,
    scheduler: Mutex<Option<JoinHandle<()>>>,
    suspended_at: Mutex<Option<Monotonic>>,
}

impl ClockRuntime {
    /// Create a runtime on the OS clock and the default resolver
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_parts(
            Arc::new(SystemTimeSource::new()),
            SntpResolver::new(),
            config,
        )
    }

    /// Create a runtime from explicit parts (custom source or resolver)
    pub fn with_parts(
        time: Arc<dyn TimeSource>,
        resolver: SntpResolver,
        config: RuntimeConfig,
    ) -> Self {
        let clock = ClockEngine::new(time.clone(), resolver, config.clock.clone());
        let stopwatch = Arc::new(StopwatchEngine::with_config(
            time.clone(),
            config.stopwatch.clone(),
        ));
        let timer = Arc::new(TimerEngine::new(time.clone()));

        ClockRuntime {
            time,
            clock,
            stopwatch,
            timer,
            config,
            scheduler: Mutex::new(None),
            suspended_at: Mutex::new(None),
        }
    }

    pub fn clock(&self) -> &ClockEngine {
        &self.clock
    }

    pub fn stopwatch(&self) -> &StopwatchEngine {
        &self.stopwatch
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    /// Start the clock sync loops and the shared scheduler tick
    ///
    /// Idempotent; must be called from within a tokio runtime.
    pub fn start(&self) {
        self.clock.start_sync();

        let stopwatch = self.stopwatch.clone();
        let timer = self.timer.clone();
        let period = self.config.tick_interval;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                stopwatch.tick();
                timer.tick();
            }
        });

        if let Some(previous) = self.scheduler.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stop the scheduler and the sync loops; engine state stays intact
    pub fn shutdown(&self) {
        self.clock.stop_sync();
        if let Some(handle) = self.scheduler.lock().take() {
            handle.abort();
        }
    }

    /// Host signal: the application is moving to the background
    pub fn suspend(&self) {
        *self.suspended_at.lock() = Some(self.time.now());
        tracing::debug!("runtime suspended");
    }

    /// Host signal: the application returned to the foreground
    ///
    /// Computes the suspension gap and fans it out to the engines that
    /// compensate for it.
    pub fn resume(&self) {
        let Some(at) = self.suspended_at.lock().take() else {
            return;
        };
        let gap = self.time.now() - at;
        tracing::debug!(?gap, "runtime resumed");

        self.stopwatch.on_resume(gap);
        self.timer.on_resume(gap);
    }

    // Commands

    pub fn start_stopwatch(&self) {
        self.stopwatch.start();
    }

    pub fn stop_stopwatch(&self) {
        self.stopwatch.stop();
    }

    pub fn reset_stopwatch(&self) {
        self.stopwatch.reset();
    }

    pub fn record_lap(&self) {
        self.stopwatch.record_lap();
    }

    /// Set a target and arm the countdown in one call
    pub fn start_timer(&self, duration: Duration) {
        self.timer.set_duration(duration);
        self.timer.start();
    }

    pub fn set_timer_duration(&self, duration: Duration) {
        self.timer.set_duration(duration);
    }

    pub fn pause_timer(&self) {
        self.timer.pause();
    }

    pub fn stop_timer(&self) {
        self.timer.stop();
    }

    pub fn reset_timer(&self) {
        self.timer.reset();
    }

    /// Kick off one asynchronous resync
    pub fn force_sync(&self) {
        self.clock.force_sync();
    }

    // Queries

    pub fn current_time(&self) -> DateTime<Local> {
        self.clock.local().get()
    }

    pub fn utc_time(&self) -> DateTime<Utc> {
        self.clock.utc().get()
    }

    pub fn regional_time(&self) -> DateTime<FixedOffset> {
        self.clock.regional().get()
    }

    pub fn is_synchronized(&self) -> bool {
        self.clock.synchronized().get()
    }

    pub fn stopwatch_elapsed(&self) -> Duration {
        self.stopwatch.elapsed().get()
    }

    pub fn stopwatch_running(&self) -> bool {
        self.stopwatch.running().get()
    }

    pub fn lap_times(&self) -> Vec<LapRecord> {
        self.stopwatch.laps().get()
    }

    pub fn timer_remaining(&self) -> Duration {
        self.timer.remaining().get()
    }

    pub fn timer_phase(&self) -> TimerPhase {
        self.timer.phase().get()
    }
}

#[cfg(test)]
mod tests {
    use meridian_core::ManualTimeSource;
    use meridian_sntp::ResolverConfig;

    use super::*;

    fn offline_resolver() -> SntpResolver {
        SntpResolver::with_config(ResolverConfig {
            servers: vec!["name-that-does-not-resolve.invalid".to_string()],
            attempt_timeout: Duration::from_millis(50),
            ..ResolverConfig::default()
        })
    }

    fn rig() -> (Arc<ManualTimeSource>, ClockRuntime) {
        // Away from zero so timer anchor shifts cannot saturate
        let source = Arc::new(ManualTimeSource::starting_at(Monotonic::from_secs(1_000)));
        let runtime = ClockRuntime::with_parts(
            source.clone(),
            offline_resolver(),
            RuntimeConfig::default(),
        );
        (source, runtime)
    }

    #[tokio::test]
    async fn test_suspend_resume_fans_out_gap() {
        let (source, runtime) = rig();

        runtime.start_stopwatch();
        runtime.start_timer(Duration::from_secs(60));

        runtime.suspend();
        source.advance(Duration::from_secs(25));
        runtime.resume();

        // Stopwatch caught up with the suspended interval immediately
        assert_eq!(runtime.stopwatch_elapsed(), Duration::from_secs(25));
        // Timer anchor shifted back by the gap on top of what the source
        // already observed: backgrounding is "time kept passing"
        assert_eq!(runtime.timer_remaining(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_resume_without_suspend_is_noop() {
        let (source, runtime) = rig();

        runtime.start_stopwatch();
        source.advance(Duration::from_secs(5));
        runtime.resume();
        runtime.stopwatch().tick();

        assert_eq!(runtime.stopwatch_elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_start_timer_convenience_arms_and_runs() {
        let (source, runtime) = rig();

        runtime.start_timer(Duration::from_secs(90));
        assert_eq!(runtime.timer_phase(), TimerPhase::Running);

        source.advance(Duration::from_secs(90));
        runtime.timer().tick();
        assert_eq!(runtime.timer_phase(), TimerPhase::Completed);
    }

    #[tokio::test]
    async fn test_scheduler_drives_engines() {
        let runtime = ClockRuntime::with_parts(
            Arc::new(SystemTimeSource::new()),
            offline_resolver(),
            RuntimeConfig {
                tick_interval: Duration::from_millis(5),
                ..RuntimeConfig::default()
            },
        );

        runtime.start();
        runtime.start_stopwatch();

        tokio::time::sleep(Duration::from_millis(100)).await;
        runtime.shutdown();

        assert!(runtime.stopwatch_elapsed() > Duration::ZERO);
    }
}
