use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct ReconcileSettings {
    /// Seconds between two reconciliation passes.
    #[builder(default = 20)]
    pub interval: u64,
}

impl ReconcileSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}
