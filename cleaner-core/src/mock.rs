use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::admin::{AdminApi, CatalogNode, Member, MemberStatus};
use crate::error::{Error, Result};
use crate::supplier::ClientSupplier;

/// In-memory stand-in for a consul cluster that records every call.
#[derive(Debug, Default)]
pub(crate) struct MockCluster {
    members: Mutex<Vec<Member>>,
    nodes: Mutex<Vec<CatalogNode>>,
    failing: Mutex<HashSet<String>>,
    failing_lookups: Mutex<HashSet<String>>,
    fail_members: AtomicBool,
    fail_nodes: AtomicBool,
    members_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockCluster {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_members(self: &Arc<Self>, members: Vec<(&str, MemberStatus)>) -> Arc<Self> {
        *self.members.lock() = members.into_iter().map(|(name, status)| Member::new(name, "10.0.0.1", status)).collect();
        self.clone()
    }

    pub(crate) fn with_nodes(self: &Arc<Self>, nodes: Vec<(&str, Vec<&str>)>) -> Arc<Self> {
        *self.nodes.lock() = nodes
            .into_iter()
            .map(|(name, services)| CatalogNode::new(name, services.into_iter().map(str::to_string).collect()))
            .collect();
        self.clone()
    }

    /// Force-leave and deregister calls for `target` fail.
    pub(crate) fn fail_target(&self, target: &str) {
        self.failing.lock().insert(target.to_string());
    }

    pub(crate) fn fail_lookup(&self, target: &str) {
        self.failing_lookups.lock().insert(target.to_string());
    }

    pub(crate) fn fail_member_listing(&self) {
        self.fail_members.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_node_listing(&self) {
        self.fail_nodes.store(true, Ordering::SeqCst);
    }

    pub(crate) fn delay_member_listing(&self, delay: Duration) {
        *self.members_delay.lock() = Some(delay);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(crate) fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn check(&self, operation: &'static str, target: &str) -> Result<()> {
        if self.failing.lock().contains(target) {
            Err(Error::admin_call_on(operation, target, anyhow!("unexpected response code: 500")))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockClient {
    cluster: Arc<MockCluster>,
}

impl MockClient {
    pub(crate) fn new(cluster: Arc<MockCluster>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl AdminApi for MockClient {
    async fn members(&self, wan: bool) -> Result<Vec<Member>> {
        let cluster = &self.cluster;
        cluster.record(format!("members wan={}", wan));
        let active = cluster.active.fetch_add(1, Ordering::SeqCst) + 1;
        cluster.max_active.fetch_max(active, Ordering::SeqCst);
        let delay = *cluster.members_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        cluster.active.fetch_sub(1, Ordering::SeqCst);
        if cluster.fail_members.load(Ordering::SeqCst) {
            return Err(Error::admin_call("list members", anyhow!("connection refused")));
        }
        Ok(cluster.members.lock().clone())
    }

    async fn force_leave_prune(&self, node: &str) -> Result<()> {
        self.cluster.record(format!("force-leave {}", node));
        self.cluster.check("force-leave", node)?;
        self.cluster.members.lock().retain(|m| m.name != node);
        Ok(())
    }

    async fn catalog_nodes(&self) -> Result<Vec<String>> {
        self.cluster.record("catalog nodes".to_string());
        if self.cluster.fail_nodes.load(Ordering::SeqCst) {
            return Err(Error::admin_call("list catalog nodes", anyhow!("timed out")));
        }
        Ok(self.cluster.nodes.lock().iter().map(|n| n.name.clone()).collect())
    }

    async fn catalog_node(&self, node: &str) -> Result<Option<CatalogNode>> {
        self.cluster.record(format!("catalog node {}", node));
        if self.cluster.failing_lookups.lock().contains(node) {
            return Err(Error::admin_call_on("catalog node", node, anyhow!("unexpected response code: 403")));
        }
        Ok(self.cluster.nodes.lock().iter().find(|n| n.name == node).cloned())
    }

    async fn deregister_node(&self, node: &str) -> Result<()> {
        self.cluster.record(format!("deregister {}", node));
        self.cluster.check("deregister", node)?;
        self.cluster.nodes.lock().retain(|n| n.name != node);
        Ok(())
    }
}

/// Supplier whose discovery can be switched off, counting acquisitions.
#[derive(Debug)]
pub(crate) struct MockSupplier {
    cluster: Arc<MockCluster>,
    available: AtomicBool,
    acquired: AtomicUsize,
}

impl MockSupplier {
    pub(crate) fn new(cluster: Arc<MockCluster>) -> Self {
        Self {
            cluster,
            available: AtomicBool::new(true),
            acquired: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub(crate) fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

impl ClientSupplier for MockSupplier {
    type Client = MockClient;

    fn acquire(&self) -> Result<MockClient> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(Error::DiscoveryUnavailable("no reachable consul server resolved".to_string()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(MockClient::new(self.cluster.clone()))
    }
}
