use tracing::trace;

use crate::admin::AdminApi;
use crate::config::admin::AdminSettings;
use crate::discovery::{ResolvedEndpoint, StateProvider};
use crate::error::Result;

/// Hands out an administrative client for exactly one sub-pass.
pub trait ClientSupplier: Send + Sync {
    type Client: AdminApi;

    fn acquire(&self) -> Result<Self::Client>;
}

/// Builds a new client against whatever server the provider reports right
/// now. Clients are never cached, a server failover is picked up by the next
/// acquisition.
pub struct ConnectionSupplier<P, B> {
    settings: AdminSettings,
    provider: P,
    builder: B,
}

impl<P, B> ConnectionSupplier<P, B> {
    pub fn new(settings: AdminSettings, provider: P, builder: B) -> Self {
        Self {
            settings,
            provider,
            builder,
        }
    }

    pub fn settings(&self) -> &AdminSettings {
        &self.settings
    }
}

impl<P, B, C> ClientSupplier for ConnectionSupplier<P, B>
    where
        P: StateProvider,
        B: Fn(&AdminSettings, &ResolvedEndpoint) -> Result<C> + Send + Sync,
        C: AdminApi,
{
    type Client = C;

    fn acquire(&self) -> Result<C> {
        let state = self.provider.state()?;
        trace!("build admin client for {}:{}", state.address, self.settings.http_port);
        (self.builder)(&self.settings, &state.address)
    }
}
