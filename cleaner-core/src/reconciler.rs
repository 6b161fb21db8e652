use itertools::Itertools;
use tracing::{error, info};

use crate::catalog::deregister_empty_nodes;
use crate::error::Result;
use crate::membership::prune_failed_members;
use crate::outcome::{PassReport, PruneOutcome};
use crate::supplier::ClientSupplier;

/// One reconciliation pass: prune failed gossip members, then deregister
/// catalog nodes without services. Each sub-pass acquires its own client and
/// a failure in one never keeps the other from running.
#[derive(Debug)]
pub struct Reconciler<S> {
    supplier: S,
}

impl<S> Reconciler<S> where S: ClientSupplier {
    pub fn new(supplier: S) -> Self {
        Self { supplier }
    }

    pub fn supplier(&self) -> &S {
        &self.supplier
    }

    pub async fn run_pass(&self) -> PassReport {
        let membership = self.membership_pass().await;
        match &membership {
            Ok(outcomes) => Self::log_pass("pruned members", outcomes),
            Err(error) => error!("consul get failed members: {}", error),
        }
        let catalog = self.catalog_pass().await;
        match &catalog {
            Ok(outcomes) => Self::log_pass("deregistered nodes", outcomes),
            Err(error) => error!("consul get empty nodes: {}", error),
        }
        PassReport { membership, catalog }
    }

    async fn membership_pass(&self) -> Result<Vec<PruneOutcome>> {
        let client = self.supplier.acquire()?;
        prune_failed_members(&client).await
    }

    async fn catalog_pass(&self) -> Result<Vec<PruneOutcome>> {
        let client = self.supplier.acquire()?;
        deregister_empty_nodes(&client).await
    }

    fn log_pass(what: &str, outcomes: &[PruneOutcome]) {
        let done = outcomes.iter().filter(|o| o.is_success()).map(|o| &o.action.target).join(", ");
        if !done.is_empty() {
            info!("{} [{}]", what, done);
        }
    }
}
