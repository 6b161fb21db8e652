use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct DiscoverySettings {
    /// go-netaddrs style expression, either `exec=<command>` or hostnames/IPs.
    #[builder(setter(into))]
    pub addresses: String,
    #[serde(rename = "grpc-port")]
    #[builder(default = 8502)]
    pub grpc_port: u16,
    #[serde(rename = "refresh-interval")]
    #[builder(default = 30)]
    pub refresh_interval: u64,
    #[serde(rename = "probe-timeout")]
    #[builder(default = 2)]
    pub probe_timeout: u64,
}

impl DiscoverySettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }
}
