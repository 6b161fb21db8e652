use std::fmt::{Debug, Formatter};
use std::net::SocketAddr;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use cleaner_core::admin::{AdminApi, CatalogNode, Member};
use cleaner_core::config::admin::AdminSettings;
use cleaner_core::discovery::ResolvedEndpoint;
use cleaner_core::error::{Error, Result};

use crate::model::{AgentMember, CatalogDeregistration, NodeEntry, NodeServices};

const TOKEN_HEADER: &str = "X-Consul-Token";

/// Consul HTTP API client bound to a single server.
#[derive(Clone)]
pub struct ConsulClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl Debug for ConsulClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsulClient")
            .field("base", &self.base.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl ConsulClient {
    /// Does no I/O, an unreachable endpoint only shows up on the first call.
    pub fn connect(settings: &AdminSettings, endpoint: &ResolvedEndpoint) -> Result<Self> {
        let addr = SocketAddr::new(endpoint.ip, settings.http_port);
        let base = Url::parse(&format!("{}://{}/", settings.scheme, addr)).map_err(|e| Error::admin_call("build client", e))?;
        Self::with_base(base, settings)
    }

    pub fn with_base(base: Url, settings: &AdminSettings) -> Result<Self> {
        if base.cannot_be_a_base() {
            return Err(Error::admin_call("build client", anyhow!("{} cannot be a base url", base)));
        }
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| Error::admin_call("build client", e))?;
        let client = Self {
            http,
            base,
            token: settings.token().map(str::to_string),
        };
        Ok(client)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            None => builder,
            Some(token) => builder.header(TOKEN_HEADER, token),
        }
    }

    /// Sends the request and checks the status. A 404 on a call about a
    /// specific target comes back as `None`.
    async fn send(&self, operation: &'static str, target: Option<&str>, request: RequestBuilder) -> Result<Option<Response>> {
        let error = |e: anyhow::Error| match target {
            None => Error::admin_call(operation, e),
            Some(target) => Error::admin_call_on(operation, target, e),
        };
        let response = request.send().await.map_err(|e| error(e.into()))?;
        let status = response.status();
        trace!("{} {} {}", operation, response.url(), status);
        if status == StatusCode::NOT_FOUND && target.is_some() {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error(anyhow!("unexpected response code: {} ({})", status.as_u16(), body.trim())));
        }
        Ok(Some(response))
    }

    async fn decode<T>(operation: &'static str, target: Option<&str>, response: Response) -> Result<T> where T: DeserializeOwned {
        response.json::<T>().await.map_err(|e| match target {
            None => Error::admin_call(operation, e),
            Some(target) => Error::admin_call_on(operation, target, e),
        })
    }
}

#[async_trait]
impl AdminApi for ConsulClient {
    async fn members(&self, wan: bool) -> Result<Vec<Member>> {
        let mut url = self.url(&["v1", "agent", "members"]);
        if wan {
            url.query_pairs_mut().append_pair("wan", "1");
        }
        let operation = "list members";
        let response = self.send(operation, None, self.request(Method::GET, url)).await?.ok_or_else(|| Error::admin_call(operation, anyhow!("empty response")))?;
        let members = Self::decode::<Vec<AgentMember>>(operation, None, response).await?;
        Ok(members.into_iter().map(Member::from).collect())
    }

    async fn force_leave_prune(&self, node: &str) -> Result<()> {
        let mut url = self.url(&["v1", "agent", "force-leave", node]);
        url.query_pairs_mut().append_pair("prune", "1");
        if self.send("force-leave", Some(node), self.request(Method::PUT, url)).await?.is_none() {
            debug!("member {} already gone", node);
        }
        Ok(())
    }

    async fn catalog_nodes(&self) -> Result<Vec<String>> {
        let url = self.url(&["v1", "catalog", "nodes"]);
        let operation = "list catalog nodes";
        let response = self.send(operation, None, self.request(Method::GET, url)).await?.ok_or_else(|| Error::admin_call(operation, anyhow!("empty response")))?;
        let nodes = Self::decode::<Vec<NodeEntry>>(operation, None, response).await?;
        Ok(nodes.into_iter().map(|n| n.node).collect())
    }

    async fn catalog_node(&self, node: &str) -> Result<Option<CatalogNode>> {
        let url = self.url(&["v1", "catalog", "node", node]);
        let operation = "catalog node";
        match self.send(operation, Some(node), self.request(Method::GET, url)).await? {
            None => Ok(None),
            Some(response) => {
                let services = Self::decode::<Option<NodeServices>>(operation, Some(node), response).await?;
                Ok(services.map(CatalogNode::from))
            }
        }
    }

    async fn deregister_node(&self, node: &str) -> Result<()> {
        let url = self.url(&["v1", "catalog", "deregister"]);
        let request = self.request(Method::PUT, url).json(&CatalogDeregistration { node });
        if self.send("deregister", Some(node), request).await?.is_none() {
            debug!("catalog node {} already gone", node);
        }
        Ok(())
    }
}
