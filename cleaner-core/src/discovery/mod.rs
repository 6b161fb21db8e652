use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::Result;

pub mod net_addrs;
pub mod watcher;

/// A consul server address picked by the watcher at a point in time.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ResolvedEndpoint {
    pub ip: IpAddr,
    pub resolved_at: SystemTime,
}

impl ResolvedEndpoint {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            resolved_at: SystemTime::now(),
        }
    }
}

impl Display for ResolvedEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ip)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WatcherState {
    pub address: ResolvedEndpoint,
    pub servers: Vec<IpAddr>,
}

/// Read side of server discovery. Implementations hand out a consistent
/// snapshot and may be called concurrently with their own refreshes.
pub trait StateProvider: Send + Sync {
    fn state(&self) -> Result<WatcherState>;
}

impl<P> StateProvider for Arc<P> where P: StateProvider + ?Sized {
    fn state(&self) -> Result<WatcherState> {
        (**self).state()
    }
}
