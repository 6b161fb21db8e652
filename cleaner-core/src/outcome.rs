use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PruneKind {
    ForceLeavePrune,
    Deregister,
    /// Looking up the services of a catalog node failed, the node was skipped.
    Lookup,
}

impl Display for PruneKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneKind::ForceLeavePrune => write!(f, "force-leave-prune"),
            PruneKind::Deregister => write!(f, "deregister"),
            PruneKind::Lookup => write!(f, "lookup"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PruneAction {
    pub kind: PruneKind,
    pub target: String,
}

#[derive(Debug)]
pub struct PruneOutcome {
    pub action: PruneAction,
    pub result: Result<()>,
}

impl PruneOutcome {
    pub fn new(kind: PruneKind, target: impl Into<String>, result: Result<()>) -> Self {
        Self {
            action: PruneAction { kind, target: target.into() },
            result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}

/// Everything one reconciliation pass did. Each sub-pass either failed to list
/// its candidates or produced one outcome per candidate.
#[derive(Debug)]
pub struct PassReport {
    pub membership: Result<Vec<PruneOutcome>>,
    pub catalog: Result<Vec<PruneOutcome>>,
}

impl PassReport {
    /// Members that were force-left and pruned in this pass.
    pub fn pruned(&self) -> Vec<&str> {
        Self::succeeded(&self.membership)
    }

    pub fn deregistered(&self) -> Vec<&str> {
        Self::succeeded(&self.catalog)
    }

    /// Number of failed listings plus failed items, skipped lookups included.
    pub fn failures(&self) -> usize {
        [&self.membership, &self.catalog]
            .into_iter()
            .map(|pass| match pass {
                Ok(outcomes) => outcomes.iter().filter(|o| !o.is_success()).count(),
                Err(_) => 1,
            })
            .sum()
    }

    fn succeeded(pass: &Result<Vec<PruneOutcome>>) -> Vec<&str> {
        match pass {
            Ok(outcomes) => outcomes.iter().filter(|o| o.is_success()).map(|o| o.action.target.as_str()).collect(),
            Err(_) => vec![],
        }
    }
}

impl Display for PassReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "pruned {} members, deregistered {} nodes, {} failures", self.pruned().len(), self.deregistered().len(), self.failures())
    }
}
