use config::{File, FileFormat, Source, Value};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};

use crate::config::admin::AdminSettings;
use crate::config::discovery::DiscoverySettings;
use crate::config::reconcile::ReconcileSettings;
use crate::error::{Error, Result};
use crate::REFERENCE;

pub mod admin;
pub mod discovery;
pub mod reconcile;

/// Upper bound in seconds for every interval and timeout.
pub const MAX_DURATION_SECS: u64 = 24 * 60 * 60;

/// Immutable process settings, assembled once at startup and handed to the
/// watcher, the connection supplier and the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub discovery: DiscoverySettings,
    pub admin: AdminSettings,
    pub reconcile: ReconcileSettings,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.discovery.addresses.trim().is_empty() {
            return Err(Error::Config("consul addresses is required".to_string()));
        }
        Self::check_duration("admin.timeout", self.admin.timeout)?;
        Self::check_duration("reconcile.interval", self.reconcile.interval)?;
        Self::check_duration("discovery.refresh-interval", self.discovery.refresh_interval)?;
        Self::check_duration("discovery.probe-timeout", self.discovery.probe_timeout)?;
        match self.admin.scheme.as_str() {
            "http" | "https" => Ok(()),
            other => Err(Error::Config(format!("unsupported admin scheme {}", other))),
        }
    }

    fn check_duration(key: &str, secs: u64) -> Result<()> {
        if secs == 0 || secs > MAX_DURATION_SECS {
            return Err(Error::Config(format!("{} must be between 1 and {} seconds, got {}", key, MAX_DURATION_SECS, secs)));
        }
        Ok(())
    }
}

/// Layers sources over the embedded reference: reference first, then every
/// added source in order, then overrides.
#[derive(Debug)]
pub struct SettingsBuilder {
    builder: config::ConfigBuilder<DefaultState>,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        let builder = config::Config::builder().add_source(File::from_str(REFERENCE, FileFormat::Toml));
        Self { builder }
    }
}

impl SettingsBuilder {
    pub fn add_source<T>(self, source: T) -> Self where T: Source + Send + Sync + 'static {
        Self { builder: self.builder.add_source(source) }
    }

    pub fn set_override_option<T>(self, key: &str, value: Option<T>) -> Result<Self> where T: Into<Value> {
        Ok(Self { builder: self.builder.set_override_option(key, value)? })
    }

    pub fn build(self) -> Result<Settings> {
        let settings = self.builder.build()?.try_deserialize::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }
}
