//! Dialing bootstrap peers.
//!
//! Addresses are accepted as libp2p multiaddrs (`/ip4/1.2.3.4/tcp/4001`,
//! optionally followed by `/p2p/<id>`) or as plain `host:port`.

use async_trait::async_trait;
use libp2p::multiaddr::Protocol;
use libp2p::Multiaddr;
use log::{info, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinSet;

use super::error::{NetworkError, NetworkResult};

/// Default time allowed for a single bootstrap dial.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// A host and TCP port extracted from a bootstrap address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialTarget {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for DialTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Parses a bootstrap address into something that can be dialed.
pub fn parse_peer_addr(addr: &str) -> NetworkResult<DialTarget> {
    if addr.starts_with('/') {
        let multiaddr =
            Multiaddr::from_str(addr).map_err(|e| NetworkError::invalid(addr, e.to_string()))?;
        return target_from_multiaddr(addr, &multiaddr);
    }

    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| NetworkError::invalid(addr, "expected a multiaddr or host:port"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(NetworkError::invalid(addr, "missing host"));
    }
    let port = port
        .parse::<u16>()
        .map_err(|e| NetworkError::invalid(addr, format!("bad port: {e}")))?;
    Ok(DialTarget {
        host: host.to_string(),
        port,
    })
}

fn target_from_multiaddr(addr: &str, multiaddr: &Multiaddr) -> NetworkResult<DialTarget> {
    let mut host = None;
    let mut port = None;
    for protocol in multiaddr.iter() {
        match protocol {
            Protocol::Ip4(ip) if host.is_none() => host = Some(ip.to_string()),
            Protocol::Ip6(ip) if host.is_none() => host = Some(ip.to_string()),
            Protocol::Dns(name) | Protocol::Dns4(name) | Protocol::Dns6(name) if host.is_none() => {
                host = Some(name.to_string())
            }
            Protocol::Tcp(p) if port.is_none() => port = Some(p),
            _ => {}
        }
    }

    match (host, port) {
        (Some(host), Some(port)) => Ok(DialTarget { host, port }),
        (None, _) => Err(NetworkError::invalid(addr, "no ip or dns component")),
        (_, None) => Err(NetworkError::invalid(addr, "no tcp component")),
    }
}

/// Opens connections to peers.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(&self, target: &DialTarget) -> NetworkResult<()>;
}

/// Checks that peers accept TCP connections.
///
/// The stream is closed as soon as it opens; no peer protocol is spoken.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    timeout: Duration,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DIAL_TIMEOUT)
    }
}

impl TcpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl PeerConnector for TcpConnector {
    async fn connect(&self, target: &DialTarget) -> NetworkResult<()> {
        let addr = (target.host.as_str(), target.port);
        match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(NetworkError::ConnectionError(e)),
            Err(_) => Err(NetworkError::TimeoutError(self.timeout)),
        }
    }
}

/// Checks once that every bootstrap peer is reachable.
pub struct PeerBootstrapper {
    targets: Vec<DialTarget>,
    connector: Arc<dyn PeerConnector>,
}

impl PeerBootstrapper {
    pub fn new(targets: Vec<DialTarget>, connector: Arc<dyn PeerConnector>) -> Self {
        Self { targets, connector }
    }

    /// Dials all targets concurrently and returns how many were reachable.
    ///
    /// Failed dials are logged and otherwise ignored.
    pub async fn run(self) -> usize {
        let mut dials = JoinSet::new();
        for target in self.targets {
            let connector = Arc::clone(&self.connector);
            dials.spawn(async move {
                let result = connector.connect(&target).await;
                (target, result)
            });
        }

        let mut reachable = 0;
        while let Some(joined) = dials.join_next().await {
            match joined {
                Ok((target, Ok(()))) => {
                    info!("Bootstrap peer {} is reachable", target);
                    reachable += 1;
                }
                Ok((target, Err(e))) => warn!("Failed to reach bootstrap peer {}: {}", target, e),
                Err(e) => warn!("Bootstrap dial task failed: {}", e),
            }
        }
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn parses_multiaddrs() {
        let target = parse_peer_addr("/ip4/104.131.131.82/tcp/4001").unwrap();
        assert_eq!(target, DialTarget { host: "104.131.131.82".into(), port: 4001 });

        let target = parse_peer_addr("/dns4/bootstrap.example.org/tcp/4001").unwrap();
        assert_eq!(target.host, "bootstrap.example.org");

        let target = parse_peer_addr("/ip6/::1/tcp/4001").unwrap();
        assert_eq!(target.to_string(), "[::1]:4001");
    }

    #[test]
    fn parses_host_port() {
        assert_eq!(
            parse_peer_addr("localhost:4001").unwrap(),
            DialTarget { host: "localhost".into(), port: 4001 }
        );
        assert_eq!(parse_peer_addr("[::1]:4001").unwrap().host, "::1");
    }

    #[test]
    fn rejects_bad_addresses() {
        let bad = [
            "",
            "not an address",
            "/ip4/1.2.3.4",
            "/tcp/4001",
            "/ip4/999.0.0.1/tcp/1",
            "host:http",
            ":4001",
        ];
        for addr in bad {
            assert!(
                matches!(parse_peer_addr(addr), Err(NetworkError::InvalidAddress { .. })),
                "{addr} should be rejected"
            );
        }
    }

    #[derive(Default)]
    struct Recording {
        dialed: Mutex<Vec<DialTarget>>,
    }

    #[async_trait]
    impl PeerConnector for Recording {
        async fn connect(&self, target: &DialTarget) -> NetworkResult<()> {
            self.dialed.lock().unwrap().push(target.clone());
            if target.port == 1 {
                Err(NetworkError::TimeoutError(Duration::from_millis(1)))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn dials_each_target_once() {
        let recording = Arc::new(Recording::default());
        let targets = vec![
            DialTarget { host: "a".into(), port: 1 },
            DialTarget { host: "b".into(), port: 2 },
        ];

        let reachable = PeerBootstrapper::new(targets, recording.clone()).run().await;

        assert_eq!(reachable, 1);
        let mut hosts: Vec<String> =
            recording.dialed.lock().unwrap().iter().map(|t| t.host.clone()).collect();
        hosts.sort();
        assert_eq!(hosts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn tcp_connector_reaches_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let target = DialTarget { host: "127.0.0.1".into(), port };

        TcpConnector::default().connect(&target).await.unwrap();
    }

    #[tokio::test]
    async fn tcp_connector_does_not_keep_the_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let target = DialTarget { host: "127.0.0.1".into(), port };

        TcpConnector::default().connect(&target).await.unwrap();
        let (mut accepted, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 8];
        let read = tokio::time::timeout(Duration::from_secs(5), accepted.read(&mut buf))
            .await
            .expect("peer connection left open")
            .unwrap();
        assert_eq!(read, 0);
    }
}
