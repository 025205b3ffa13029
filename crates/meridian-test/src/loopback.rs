//! Loopback SNTP responders with scripted behaviors

use std::net::SocketAddr;

use chrono::Utc;
use tokio::net::UdpSocket;

use meridian_sntp::wire::server_response;

/// What a loopback time server does with each request
#[derive(Clone, Copy, Debug)]
pub enum ServerBehavior {
    /// Reply with the current time shifted by a fixed skew (seconds)
    Valid { skew_secs: i64 },
    /// Accept the request, never answer
    Silent,
    /// Reply with fewer bytes than a full packet
    Undersized,
    /// Reply with a full packet whose timestamp decodes to the year 1900
    Garbage,
    /// Ignore the first `failures` requests, then answer like `Valid`
    FlakyThenValid { failures: u32 },
}

/// Spawn a loopback server; serves requests until the test runtime drops
pub async fn spawn_server(behavior: ServerBehavior) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = [0u8; 128];
        let mut requests_seen = 0u32;
        while let Ok((_, from)) = socket.recv_from(&mut buf).await {
            requests_seen += 1;
            match behavior {
                ServerBehavior::Valid { skew_secs } => {
                    let reply = server_response(Utc::now() + chrono::Duration::seconds(skew_secs));
                    let _ = socket.send_to(&reply, from).await;
                }
                ServerBehavior::Silent => {}
                ServerBehavior::Undersized => {
                    let _ = socket.send_to(&[0u8; 12], from).await;
                }
                ServerBehavior::Garbage => {
                    let _ = socket.send_to(&[0u8; 48], from).await;
                }
                ServerBehavior::FlakyThenValid { failures } => {
                    if requests_seen > failures {
                        let reply = server_response(Utc::now());
                        let _ = socket.send_to(&reply, from).await;
                    }
                }
            }
        }
    });

    addr
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use meridian_clock::{ClockConfig, ClockEngine};
    use meridian_core::{ManualTimeSource, MeridianError, SampleOrigin};
    use meridian_sntp::{ResolverConfig, SntpResolver};

    use super::*;

    fn resolver_for(servers: Vec<SocketAddr>) -> SntpResolver {
        SntpResolver::with_config(ResolverConfig {
            servers: servers.iter().map(|addr| addr.to_string()).collect(),
            attempt_timeout: Duration::from_millis(200),
            ..ResolverConfig::default()
        })
    }

    #[tokio::test]
    async fn test_fallback_chain_reaches_the_healthy_candidate() {
        // Silent, undersized, and garbage candidates are each skipped
        let servers = vec![
            spawn_server(ServerBehavior::Silent).await,
            spawn_server(ServerBehavior::Undersized).await,
            spawn_server(ServerBehavior::Garbage).await,
            spawn_server(ServerBehavior::Valid { skew_secs: 0 }).await,
        ];

        let source = ManualTimeSource::new();
        let sample = resolver_for(servers).resolve(&source).await.unwrap();

        assert_eq!(sample.origin, SampleOrigin::Network);
        assert!((sample.utc - Utc::now()).num_seconds().abs() < 2);
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_unavailable() {
        let servers = vec![
            spawn_server(ServerBehavior::Undersized).await,
            spawn_server(ServerBehavior::Garbage).await,
        ];

        let source = ManualTimeSource::new();
        let result = resolver_for(servers).resolve(&source).await;

        assert!(matches!(result, Err(MeridianError::Unavailable)));
    }

    #[tokio::test]
    async fn test_sync_engine_applies_and_expires_network_offset() {
        let server = spawn_server(ServerBehavior::Valid { skew_secs: 120 }).await;
        let source = Arc::new(ManualTimeSource::new());
        let engine = ClockEngine::new(
            source.clone(),
            resolver_for(vec![server]),
            ClockConfig {
                sync_validity: Duration::from_secs(60),
                ..ClockConfig::default()
            },
        );

        engine.sync_once().await;
        assert!(engine.synchronized().get());

        let skew = (engine.current_utc() - Utc::now()).num_seconds();
        assert!((118..=122).contains(&skew), "offset not applied: {skew}s");

        // Past the validity window the engine silently reverts to system time
        source.advance(Duration::from_secs(61));
        let skew = (engine.current_utc() - Utc::now()).num_seconds();
        assert!(skew.abs() < 2, "offset survived expiry: {skew}s");
    }

    #[tokio::test]
    async fn test_sync_engine_degrades_when_every_candidate_fails() {
        let server = spawn_server(ServerBehavior::Silent).await;
        let source = Arc::new(ManualTimeSource::new());
        let engine = ClockEngine::new(
            source,
            resolver_for(vec![server]),
            ClockConfig::default(),
        );

        engine.sync_once().await;

        assert!(!engine.synchronized().get());
        let skew = (engine.current_utc() - Utc::now()).num_milliseconds().abs();
        assert!(skew < 100, "expected system time, drifted {skew}ms");
    }

    #[tokio::test]
    async fn test_resync_recovers_after_outage() {
        let flaky = spawn_server(ServerBehavior::FlakyThenValid { failures: 1 }).await;

        let source = Arc::new(ManualTimeSource::new());
        let engine = ClockEngine::new(
            source.clone(),
            resolver_for(vec![flaky]),
            ClockConfig::default(),
        );

        engine.sync_once().await;
        assert!(!engine.synchronized().get());

        // The next periodic resync finds the server healthy again
        engine.sync_once().await;
        assert!(engine.synchronized().get());
    }
}
