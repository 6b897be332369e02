use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::header::HeaderValue;
use actix_web::http::Uri;
use actix_web::{web, App, HttpServer};
use log::{info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use super::error::ServiceStartError;
use super::routes::{self, AppState};
use crate::config::Config;
use crate::network::{parse_peer_addr, DialTarget, PeerBootstrapper, PeerConnector, TcpConnector};
use crate::repo::Repository;

/// Host the API listens on unless told otherwise.
pub const DEFAULT_API_HOST: &str = "127.0.0.1";

/// Options the API service is started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiOptions {
    pub host: String,
    pub port: u16,
    /// Dial bootstrap peers at startup.
    pub online: bool,
    /// The repository is expected to be memory backed.
    pub mem_only: bool,
    pub bootstrap_addrs: Vec<String>,
    pub read_only: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ApiOptions {
    /// Options taken from an already merged configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: DEFAULT_API_HOST.to_string(),
            port: config.api.port,
            online: config.p2p.enabled,
            mem_only: config.repo.is_mem(),
            bootstrap_addrs: config.p2p.bootstrap_addrs.clone(),
            read_only: config.api.read_only,
            allowed_origins: config.api.allowed_origins.clone(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    pub fn with_bootstrap_addrs(mut self, addrs: Vec<String>) -> Self {
        self.bootstrap_addrs = addrs;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Address the HTTP listener binds to.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// The local HTTP API plus peer bootstrap, ready to start.
///
/// Construction only checks options; nothing is opened until
/// [`bind`](Self::bind).
pub struct ApiServer {
    repo: Repository,
    options: ApiOptions,
    targets: Vec<DialTarget>,
    connector: Arc<dyn PeerConnector>,
}

impl ApiServer {
    pub fn new(repo: Repository, options: ApiOptions) -> Result<Self, ServiceStartError> {
        if options.host.is_empty() {
            return Err(ServiceStartError::invalid_option("host", "must not be empty"));
        }
        if options.mem_only != repo.backend().is_memory() {
            return Err(ServiceStartError::invalid_option(
                "mem_only",
                format!(
                    "requested {} but the repository is {}",
                    if options.mem_only { "memory only" } else { "persistent" },
                    repo.backend().label()
                ),
            ));
        }
        for origin in options.allowed_origins.iter().filter(|o| o.as_str() != "*") {
            // actix-cors parses each origin as a URI and then as a header value.
            if Uri::try_from(origin.as_str()).is_err() || HeaderValue::from_str(origin).is_err() {
                return Err(ServiceStartError::invalid_option(
                    "allowed_origins",
                    format!("'{origin}' is not a valid origin"),
                ));
            }
        }
        let targets = options
            .bootstrap_addrs
            .iter()
            .map(|addr| parse_peer_addr(addr))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServiceStartError::invalid_option("bootstrap_addrs", e))?;

        Ok(Self {
            repo,
            options,
            targets,
            connector: Arc::new(TcpConnector::default()),
        })
    }

    /// Replaces the connector used to dial bootstrap peers.
    pub fn with_connector(mut self, connector: Arc<dyn PeerConnector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn options(&self) -> &ApiOptions {
        &self.options
    }

    /// Opens the listener. Must be called from within a tokio runtime.
    pub async fn bind(self) -> Result<RunningServer, ServiceStartError> {
        let state = web::Data::new(AppState {
            repo: self.repo,
            online: self.options.online,
            read_only: self.options.read_only,
        });
        let origins = self.options.allowed_origins.clone();

        let address = self.options.bind_address();
        let server = HttpServer::new(move || {
            let cors = origins
                .iter()
                .fold(Cors::default(), |cors, origin| {
                    if origin == "*" {
                        cors.allow_any_origin()
                    } else {
                        cors.allowed_origin(origin)
                    }
                })
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(state.clone())
                .configure(routes::configure)
        })
        .disable_signals()
        .bind(&address)
        .map_err(|source| ServiceStartError::Bind {
            address: address.clone(),
            source,
        })?;

        let local_addrs = server.addrs();
        info!("HTTP server listening on {:?}", local_addrs);

        let peers = if self.options.online {
            Some(PeerBootstrapper::new(self.targets, self.connector))
        } else {
            info!("Running offline, not dialing bootstrap peers");
            None
        };

        Ok(RunningServer {
            local_addrs,
            server: server.run(),
            peers,
        })
    }

    /// Binds and serves until Ctrl-C.
    pub async fn serve(self) -> Result<(), ServiceStartError> {
        let running = self.bind().await?;
        running
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await
    }
}

/// A bound API server that has not started serving yet.
pub struct RunningServer {
    local_addrs: Vec<SocketAddr>,
    server: Server,
    peers: Option<PeerBootstrapper>,
}

impl RunningServer {
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// Serves until the server fails or `shutdown` completes.
    ///
    /// The HTTP server is stopped and peer dialing aborted on every exit path.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServiceStartError>
    where
        F: Future<Output = ()>,
    {
        let handle = self.server.handle();
        let peers = self.peers.map(|peers| tokio::spawn(peers.run()));
        let server = self.server;
        tokio::pin!(server);

        let finished = tokio::select! {
            result = &mut server => Some(result),
            _ = shutdown => None,
        };
        let result = match finished {
            Some(result) => result,
            None => {
                info!("Shutting down HTTP server");
                // The stop command is processed by the server future itself.
                let ((), result) = tokio::join!(handle.stop(true), &mut server);
                result
            }
        };

        if let Some(peers) = peers {
            peers.abort();
        }
        result.map_err(ServiceStartError::Server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{Backend, MapStore, Profile};
    use std::time::Duration;

    fn memory_repo() -> Repository {
        Repository::new(Backend::Memory, Arc::new(MapStore::new()), Profile::placeholder(), None)
    }

    fn memory_options() -> ApiOptions {
        let mut config = Config::default();
        config.repo.kind = crate::config::REPO_TYPE_MEM.to_string();
        ApiOptions::from_config(&config)
    }

    #[test]
    fn options_follow_config() {
        let mut config = Config::default();
        config.api.port = 4567;
        config.p2p.enabled = false;
        let options = ApiOptions::from_config(&config);
        assert_eq!(options.port, 4567);
        assert!(!options.online);
        assert!(!options.mem_only);
        assert_eq!(options.bind_address(), "127.0.0.1:4567");
        assert_eq!(options.with_host("::1").bind_address(), "[::1]:4567");
    }

    #[test]
    fn default_options_are_accepted() {
        assert!(ApiServer::new(memory_repo(), memory_options()).is_ok());
    }

    #[test]
    fn bad_bootstrap_address_is_rejected() {
        let options = memory_options().with_bootstrap_addrs(vec![
            "/ip4/127.0.0.1/tcp/4001".into(),
            "definitely not an address".into(),
        ]);
        let err = ApiServer::new(memory_repo(), options).err().unwrap();
        assert!(matches!(
            err,
            ServiceStartError::InvalidOption { ref option, .. } if option == "bootstrap_addrs"
        ));
    }

    #[test]
    fn mem_only_must_match_repository() {
        let options = ApiOptions {
            mem_only: false,
            ..memory_options()
        };
        assert!(matches!(
            ApiServer::new(memory_repo(), options),
            Err(ServiceStartError::InvalidOption { .. })
        ));
    }

    #[test]
    fn bad_origin_is_rejected() {
        for origin in ["http://bad\norigin", "http://bad origin"] {
            let mut options = memory_options();
            options.allowed_origins = vec![origin.into()];
            let err = ApiServer::new(memory_repo(), options).err();
            assert!(
                matches!(
                    err,
                    Some(ServiceStartError::InvalidOption { ref option, .. })
                        if option == "allowed_origins"
                ),
                "{origin:?} should be rejected"
            );
        }
    }

    #[test]
    fn wildcard_and_plain_origins_are_accepted() {
        let mut options = memory_options();
        options.allowed_origins = vec!["*".into(), "https://app.example.org".into()];
        assert!(ApiServer::new(memory_repo(), options).is_ok());
    }

    #[tokio::test]
    async fn immediate_shutdown_returns() {
        let options = memory_options().with_port(0).with_online(false);
        let running = ApiServer::new(memory_repo(), options).unwrap().bind().await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), running.run_until(async {}))
            .await
            .expect("server did not stop after shutdown");
        assert!(result.is_ok());
    }
}
