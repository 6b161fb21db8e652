use cleaner_core::config::admin::AdminSettings;
use cleaner_core::discovery::{ResolvedEndpoint, StateProvider};
use cleaner_core::error::Result;
use cleaner_core::supplier::ConnectionSupplier;

use crate::client::ConsulClient;

pub mod client;
mod model;

pub type ConnectFn = fn(&AdminSettings, &ResolvedEndpoint) -> Result<ConsulClient>;

pub type ConsulSupplier<P> = ConnectionSupplier<P, ConnectFn>;

/// Supplier handing out a fresh [`ConsulClient`] bound to the server
/// `provider` currently reports.
pub fn consul_supplier<P>(settings: AdminSettings, provider: P) -> ConsulSupplier<P> where P: StateProvider {
    ConnectionSupplier::new(settings, provider, ConsulClient::connect as ConnectFn)
}

#[cfg(test)]
pub(crate) mod canned;
