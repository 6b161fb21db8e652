use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cleaner_core::admin::{CatalogNode, Member, MemberStatus};

#[derive(Debug, Deserialize)]
pub(crate) struct AgentMember {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Addr", default)]
    pub addr: String,
    #[serde(rename = "Status")]
    pub status: MemberStatus,
}

impl From<AgentMember> for Member {
    fn from(value: AgentMember) -> Self {
        Member::new(value.name, value.addr, value.status)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeEntry {
    #[serde(rename = "Node")]
    pub node: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceEntry {
    #[serde(rename = "ID", default)]
    pub id: String,
}

/// Body of `/v1/catalog/node/{node}`, services are keyed by instance ID.
#[derive(Debug, Deserialize)]
pub(crate) struct NodeServices {
    #[serde(rename = "Node")]
    pub node: NodeEntry,
    #[serde(rename = "Services", default)]
    pub services: Option<BTreeMap<String, ServiceEntry>>,
}

impl From<NodeServices> for CatalogNode {
    fn from(value: NodeServices) -> Self {
        let services = value
            .services
            .unwrap_or_default()
            .into_iter()
            .map(|(key, service)| if service.id.is_empty() { key } else { service.id })
            .collect();
        CatalogNode::new(value.node.node, services)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CatalogDeregistration<'a> {
    #[serde(rename = "Node")]
    pub node: &'a str,
}
