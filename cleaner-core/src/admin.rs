use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Gossip lifecycle status as reported by serf, ordered by progression.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum MemberStatus {
    None,
    Alive,
    Leaving,
    Left,
    Failed,
    Unknown(u8),
}

impl MemberStatus {
    /// Left and failed members, plus anything newer serf may report past them.
    pub fn is_prunable(&self) -> bool {
        *self > MemberStatus::Leaving
    }
}

impl From<u8> for MemberStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => MemberStatus::None,
            1 => MemberStatus::Alive,
            2 => MemberStatus::Leaving,
            3 => MemberStatus::Left,
            4 => MemberStatus::Failed,
            other => MemberStatus::Unknown(other),
        }
    }
}

impl From<MemberStatus> for u8 {
    fn from(value: MemberStatus) -> Self {
        match value {
            MemberStatus::None => 0,
            MemberStatus::Alive => 1,
            MemberStatus::Leaving => 2,
            MemberStatus::Left => 3,
            MemberStatus::Failed => 4,
            MemberStatus::Unknown(other) => other,
        }
    }
}

impl Display for MemberStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberStatus::None => write!(f, "none"),
            MemberStatus::Alive => write!(f, "alive"),
            MemberStatus::Leaving => write!(f, "leaving"),
            MemberStatus::Left => write!(f, "left"),
            MemberStatus::Failed => write!(f, "failed"),
            MemberStatus::Unknown(s) => write!(f, "unknown({s})"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Member {
    pub name: String,
    pub addr: String,
    pub status: MemberStatus,
}

impl Member {
    pub fn new(name: impl Into<String>, addr: impl Into<String>, status: MemberStatus) -> Self {
        Self {
            name: name.into(),
            addr: addr.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CatalogNode {
    pub name: String,
    /// Registered service IDs, healthy or not.
    pub services: Vec<String>,
}

impl CatalogNode {
    pub fn new(name: impl Into<String>, services: Vec<String>) -> Self {
        Self {
            name: name.into(),
            services,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// The slice of the consul administrative API the reconciler depends on.
///
/// Every call is bounded by the client's request timeout. Removing a target
/// that is already gone must not be reported as a failure where the server
/// lets the client tell the difference.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn members(&self, wan: bool) -> Result<Vec<Member>>;

    async fn force_leave_prune(&self, node: &str) -> Result<()>;

    async fn catalog_nodes(&self) -> Result<Vec<String>>;

    /// `None` when the catalog does not know the node (anymore).
    async fn catalog_node(&self, node: &str) -> Result<Option<CatalogNode>>;

    async fn deregister_node(&self, node: &str) -> Result<()>;
}
