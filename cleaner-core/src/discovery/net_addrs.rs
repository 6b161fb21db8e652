use std::net::IpAddr;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use itertools::Itertools;
use tokio::process::Command;
use tracing::trace;

use crate::error::{Error, Result};

const EXEC_PREFIX: &str = "exec=";

/// Parsed go-netaddrs expression: either a command printing whitespace
/// separated IPs, or a list of hostnames and IP literals.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NetAddrs {
    Exec(String),
    Hosts(Vec<String>),
}

impl NetAddrs {
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        if let Some(command) = expr.strip_prefix(EXEC_PREFIX) {
            let command = command.trim();
            if command.is_empty() {
                return Err(Error::Config("exec= expression without a command".to_string()));
            }
            return Ok(NetAddrs::Exec(command.to_string()));
        }
        let hosts = expr.split_whitespace().map(str::to_string).collect_vec();
        if hosts.is_empty() {
            return Err(Error::Config("consul addresses is required".to_string()));
        }
        Ok(NetAddrs::Hosts(hosts))
    }

    /// Resolves the expression into a deduplicated candidate list, preserving
    /// the order in which addresses were produced.
    pub async fn resolve(&self) -> anyhow::Result<Vec<IpAddr>> {
        let addrs = match self {
            NetAddrs::Exec(command) => Self::exec(command).await?,
            NetAddrs::Hosts(hosts) => {
                let mut addrs = vec![];
                for host in hosts {
                    addrs.extend(Self::lookup(host).await?);
                }
                addrs
            }
        };
        let addrs = addrs.into_iter().unique().collect_vec();
        if addrs.is_empty() {
            return Err(anyhow!("no address resolved"));
        }
        trace!("resolved consul servers {:?}", addrs);
        Ok(addrs)
    }

    async fn exec(command: &str) -> anyhow::Result<Vec<IpAddr>> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("run {}", command))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("{} exited with {}: {}", command, output.status, stderr.trim()));
        }
        let stdout = String::from_utf8(output.stdout).context("exec output is not utf-8")?;
        stdout
            .split_whitespace()
            .map(|s| IpAddr::from_str(s).with_context(|| format!("invalid address {} from {}", s, command)))
            .collect()
    }

    async fn lookup(host: &str) -> anyhow::Result<Vec<IpAddr>> {
        if let Ok(ip) = IpAddr::from_str(host) {
            return Ok(vec![ip]);
        }
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .with_context(|| format!("lookup {}", host))?
            .map(|addr| addr.ip())
            .collect_vec();
        Ok(addrs)
    }
}
