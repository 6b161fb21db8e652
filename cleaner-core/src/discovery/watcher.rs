use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::discovery::DiscoverySettings;
use crate::discovery::{ResolvedEndpoint, StateProvider, WatcherState};
use crate::discovery::net_addrs::NetAddrs;
use crate::error::{Error, Result};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Keeps track of one reachable consul server.
///
/// The refresh loop resolves the configured address expression, sticks with
/// the current server while it stays resolvable and answers on the gRPC port,
/// and otherwise fails over to the first reachable candidate in random order.
#[derive(Debug)]
pub struct AddressWatcher {
    inner: Arc<WatcherInner>,
    parent: CancellationToken,
    task: Mutex<Option<WatcherTask>>,
}

#[derive(Debug)]
struct WatcherTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
struct WatcherInner {
    settings: DiscoverySettings,
    addrs: NetAddrs,
    state: ArcSwapOption<WatcherState>,
}

impl AddressWatcher {
    pub fn new(settings: DiscoverySettings) -> Result<Self> {
        Self::with_cancellation(settings, CancellationToken::new())
    }

    /// The watcher stops by itself once `parent` is cancelled and cannot be
    /// started again afterwards.
    pub fn with_cancellation(settings: DiscoverySettings, parent: CancellationToken) -> Result<Self> {
        let addrs = NetAddrs::parse(&settings.addresses)?;
        let inner = WatcherInner {
            settings,
            addrs,
            state: ArcSwapOption::new(None),
        };
        let watcher = Self {
            inner: inner.into(),
            parent,
            task: Mutex::new(None),
        };
        Ok(watcher)
    }

    /// Spawns the refresh loop. A watcher stopped with [`AddressWatcher::stop`]
    /// can be started again.
    pub fn start(&self) {
        if self.parent.is_cancelled() {
            warn!("consul server watcher not started, already shut down");
            return;
        }
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            warn!("consul server watcher already started");
            return;
        }
        let cancel = self.parent.child_token();
        let handle = tokio::spawn(self.inner.clone().run(cancel.clone()));
        *task = Some(WatcherTask { cancel, handle });
        debug!("consul server watcher started with {:?}", self.inner.addrs);
    }

    pub async fn stop(&self) {
        let task = self.task.lock().take();
        if let Some(WatcherTask { cancel, handle }) = task {
            cancel.cancel();
            if let Err(error) = handle.await {
                warn!("consul server watcher task failed {:?}", error);
            }
        }
        self.inner.state.store(None);
    }

    pub async fn refresh(&self) -> anyhow::Result<WatcherState> {
        self.inner.refresh().await
    }
}

impl StateProvider for AddressWatcher {
    fn state(&self) -> Result<WatcherState> {
        match self.inner.state.load_full() {
            None => Err(Error::DiscoveryUnavailable("no reachable consul server resolved".to_string())),
            Some(state) => Ok(state.as_ref().clone()),
        }
    }
}

impl WatcherInner {
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let max_delay = self.settings.refresh_interval();
        let mut backoff = INITIAL_BACKOFF.min(max_delay);
        loop {
            let refresh = tokio::select! {
                _ = cancel.cancelled() => break,
                refresh = self.refresh() => refresh,
            };
            let delay = match refresh {
                Ok(state) => {
                    trace!("consul server {} of {:?}", state.address, state.servers);
                    backoff = INITIAL_BACKOFF.min(max_delay);
                    max_delay
                }
                Err(error) => {
                    warn!("refresh consul servers failed: {:#}, retry in {:?}", error, backoff);
                    let delay = backoff;
                    backoff = (backoff * 2).min(max_delay);
                    delay
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        debug!("consul server watcher stopped");
    }

    async fn refresh(&self) -> anyhow::Result<WatcherState> {
        let resolve_timeout = self.settings.refresh_interval();
        let servers = tokio::time::timeout(resolve_timeout, self.addrs.resolve())
            .await
            .map_err(|_| anyhow!("resolve consul servers timed out after {:?}", resolve_timeout))??;
        if let Some(current) = self.state.load_full() {
            let ip = current.address.ip;
            if servers.contains(&ip) && self.probe(ip).await {
                let state = WatcherState { address: current.address, servers };
                self.state.store(Some(Arc::new(state.clone())));
                return Ok(state);
            }
            info!("consul server {} no longer usable, looking for another one", ip);
        }
        let mut candidates = servers.clone();
        candidates.shuffle(&mut rand::thread_rng());
        for ip in candidates {
            if self.probe(ip).await {
                info!("use consul server {}", ip);
                let state = WatcherState { address: ResolvedEndpoint::new(ip), servers };
                self.state.store(Some(Arc::new(state.clone())));
                return Ok(state);
            }
            debug!("consul server {} unreachable on port {}", ip, self.settings.grpc_port);
        }
        self.state.store(None);
        Err(anyhow!("none of {:?} reachable on port {}", servers, self.settings.grpc_port))
    }

    async fn probe(&self, ip: IpAddr) -> bool {
        let addr = SocketAddr::new(ip, self.settings.grpc_port);
        matches!(tokio::time::timeout(self.settings.probe_timeout(), TcpStream::connect(addr)).await, Ok(Ok(_)))
    }
}
