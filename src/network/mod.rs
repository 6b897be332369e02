//! Peer networking used while the API service runs online.

pub mod bootstrap;
pub mod error;

pub use bootstrap::{
    parse_peer_addr, DialTarget, PeerBootstrapper, PeerConnector, TcpConnector, DIAL_TIMEOUT,
};
pub use error::{NetworkError, NetworkResult};
