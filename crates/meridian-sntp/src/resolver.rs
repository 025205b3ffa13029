//! Ranked-candidate SNTP resolver
//!
//! Walks a fixed, ordered list of time servers; the first structurally
//! valid and plausible response wins. Every per-candidate failure (DNS,
//! socket, timeout, undersized or implausible reply) is logged and the
//! next candidate is tried; exhaustion yields `Unavailable` and the caller
//! falls back to system time.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;

use meridian_core::{MeridianError, MeridianResult, TimeSample, TimeSource};

use crate::wire::{client_request, parse_transmit_timestamp};

/// Resolver configuration
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Candidate servers, tried in order. A bare hostname gets `port`
    /// appended; a `host:port` entry is used as-is.
    pub servers: Vec<String>,
    /// Destination UDP port for bare hostnames
    pub port: u16,
    /// Per-candidate round-trip timeout
    pub attempt_timeout: Duration,
    /// Maximum believable distance from the system clock
    pub max_skew: chrono::Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            servers: vec![
                "time.google.com".to_string(),
                "time.windows.com".to_string(),
                "pool.ntp.org".to_string(),
                "time.nist.gov".to_string(),
            ],
            port: 123,
            attempt_timeout: Duration::from_secs(3),
            max_skew: chrono::Duration::days(365),
        }
    }
}

/// SNTP resolver over an ordered candidate list
pub struct SntpResolver {
    config: ResolverConfig,
}

impl SntpResolver {
    /// Create a resolver with the default candidate list
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a resolver with custom configuration
    pub fn with_config(config: ResolverConfig) -> Self {
        SntpResolver { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve an authoritative wall-clock sample
    ///
    /// Fails with `Unavailable` only after every candidate has been tried.
    pub async fn resolve(&self, source: &dyn TimeSource) -> MeridianResult<TimeSample> {
        for server in &self.config.servers {
            match self.query(server).await {
                Ok(utc) => {
                    tracing::info!(server = %server, "synchronized with time server");
                    return Ok(TimeSample::network(utc, source.now()));
                }
                Err(error) => {
                    tracing::warn!(server = %server, %error, "time server candidate failed");
                }
            }
        }

        Err(MeridianError::Unavailable)
    }

    /// One round-trip against a single candidate
    async fn query(&self, server: &str) -> MeridianResult<DateTime<Utc>> {
        let addr = self.resolve_addr(server).await?;

        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| MeridianError::Transport(e.to_string()))?;

        socket
            .send_to(&client_request(), addr)
            .await
            .map_err(|e| MeridianError::Transport(e.to_string()))?;

        // Responses with appended authenticators can exceed 48 bytes
        let mut buf = [0u8; 128];
        let (len, _from) = timeout(self.config.attempt_timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| {
                MeridianError::Transport(format!(
                    "no response within {:?}",
                    self.config.attempt_timeout
                ))
            })?
            .map_err(|e| MeridianError::Transport(e.to_string()))?;

        let utc = parse_transmit_timestamp(&buf[..len])?;

        // Guard against corrupt or garbage responses
        let skew = utc - Utc::now();
        if skew.abs() > self.config.max_skew {
            return Err(MeridianError::ImplausibleTime {
                days: skew.num_days(),
            });
        }

        Ok(utc)
    }

    async fn resolve_addr(&self, server: &str) -> MeridianResult<SocketAddr> {
        let target = if server.contains(':') {
            server.to_string()
        } else {
            format!("{}:{}", server, self.config.port)
        };

        let result = lookup_host(&target)
            .await
            .map_err(|e| MeridianError::NameResolution(format!("{server}: {e}")))?
            .next()
            .ok_or_else(|| MeridianError::NameResolution(server.to_string()));
        result
    }
}

impl Default for SntpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use meridian_core::{ManualTimeSource, Monotonic, SampleOrigin};

    use crate::wire::server_response;

    use super::*;

    async fn spawn_valid_server(skew: chrono::Duration) -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 128];
            while let Ok((_, from)) = socket.recv_from(&mut buf).await {
                let reply = server_response(Utc::now() + skew);
                let _ = socket.send_to(&reply, from).await;
            }
        });

        addr
    }

    fn config_for(servers: Vec<String>) -> ResolverConfig {
        ResolverConfig {
            servers,
            attempt_timeout: Duration::from_millis(200),
            ..ResolverConfig::default()
        }
    }

    #[tokio::test]
    async fn test_resolve_first_candidate() {
        let addr = spawn_valid_server(chrono::Duration::zero()).await;
        let resolver = SntpResolver::with_config(config_for(vec![addr.to_string()]));

        let source = Arc::new(ManualTimeSource::starting_at(Monotonic::from_secs(5)));
        let sample = resolver.resolve(source.as_ref()).await.unwrap();

        assert_eq!(sample.origin, SampleOrigin::Network);
        assert_eq!(sample.captured_at, Monotonic::from_secs(5));
        assert!((sample.utc - Utc::now()).num_seconds().abs() < 2);
    }

    #[tokio::test]
    async fn test_resolve_falls_through_to_second_candidate() {
        // First candidate never answers; second does
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let silent_addr = silent.local_addr().unwrap();
        let addr = spawn_valid_server(chrono::Duration::zero()).await;

        let resolver =
            SntpResolver::with_config(config_for(vec![silent_addr.to_string(), addr.to_string()]));

        let source = ManualTimeSource::new();
        let sample = resolver.resolve(&source).await.unwrap();
        assert_eq!(sample.origin, SampleOrigin::Network);
    }

    #[tokio::test]
    async fn test_resolve_unavailable_when_all_fail() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let silent_addr = silent.local_addr().unwrap();

        let resolver = SntpResolver::with_config(config_for(vec![
            silent_addr.to_string(),
            "name-that-does-not-resolve.invalid".to_string(),
        ]));

        let source = ManualTimeSource::new();
        let result = resolver.resolve(&source).await;
        assert!(matches!(result, Err(MeridianError::Unavailable)));
    }

    #[tokio::test]
    async fn test_implausible_reply_rejected() {
        // All-zero timestamp decodes to the year 1900
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 128];
            while let Ok((_, from)) = socket.recv_from(&mut buf).await {
                let _ = socket.send_to(&[0u8; 48], from).await;
            }
        });

        let resolver = SntpResolver::with_config(config_for(vec![addr.to_string()]));
        let source = ManualTimeSource::new();

        let result = resolver.resolve(&source).await;
        assert!(matches!(result, Err(MeridianError::Unavailable)));
    }
}
