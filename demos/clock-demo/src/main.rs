//! Meridian demo application
//!
//! Runs a short interactive-free session: starts clock synchronization,
//! runs a stopwatch with laps and a five-second timer, and prints every
//! published reading once per second.

use std::time::Duration;

use meridian_core::{format_elapsed, format_lap, format_remaining, format_wall};
use meridian_runtime::{ClockEvent, ClockRuntime, EventBroker, RuntimeConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("Meridian clock demo");
    println!("-------------------");

    let runtime = ClockRuntime::new(RuntimeConfig::default());
    let broker = EventBroker::attach(&runtime);
    broker.events().subscribe(|event: &ClockEvent| {
        tracing::info!(?event.kind, "application event");
    });

    runtime.start();

    runtime.start_stopwatch();
    runtime.start_timer(Duration::from_secs(5));

    for second in 1..=8u32 {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let sync = if runtime.is_synchronized() { "ntp" } else { "sys" };
        println!(
            "[{second}] local {} | utc {} | jst {} ({sync})",
            format_wall(&runtime.current_time()),
            format_wall(&runtime.utc_time()),
            format_wall(&runtime.regional_time()),
        );
        println!(
            "    stopwatch {} | timer {} ({:?})",
            format_elapsed(runtime.stopwatch_elapsed()),
            format_remaining(runtime.timer_remaining()),
            runtime.timer_phase(),
        );

        if second == 3 {
            runtime.record_lap();
        }
    }

    for lap in runtime.lap_times() {
        println!("    {}", format_lap(&lap));
    }

    runtime.shutdown();
}
