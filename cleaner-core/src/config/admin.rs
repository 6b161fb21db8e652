use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct AdminSettings {
    #[builder(default = "http".to_string(), setter(into))]
    pub scheme: String,
    #[serde(rename = "http-port")]
    #[builder(default = 8500)]
    pub http_port: u16,
    /// Per request timeout in seconds.
    #[builder(default = 5)]
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    pub token: Option<String>,
}

impl AdminSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}
