use futures::StreamExt;
use futures::stream;
use tracing::{debug, error, info, trace, warn};

use crate::admin::AdminApi;
use crate::error::Result;
use crate::outcome::{PruneKind, PruneOutcome};

/// Catalog nodes without a single registered service instance, health is not
/// taken into account. A node whose lookup fails is left alone this pass.
pub async fn list_empty_nodes<C>(client: &C) -> Result<Vec<String>> where C: AdminApi + ?Sized {
    let (empty, _) = scan_nodes(client).await?;
    Ok(empty)
}

/// Splits the catalog into empty nodes and the lookups that failed.
async fn scan_nodes<C>(client: &C) -> Result<(Vec<String>, Vec<PruneOutcome>)> where C: AdminApi + ?Sized {
    let names = client.catalog_nodes().await?;
    let mut empty = vec![];
    let mut failed = vec![];
    for name in names {
        match client.catalog_node(&name).await {
            Ok(Some(node)) if node.is_empty() => {
                debug!("catalog node {} has no services", name);
                empty.push(name);
            }
            Ok(Some(node)) => {
                trace!("catalog node {} hosts {:?}", name, node.services);
            }
            Ok(None) => {
                debug!("catalog node {} vanished before lookup", name);
            }
            Err(error) => {
                warn!(node = %name, "lookup services failed, skip it: {}", error);
                failed.push(PruneOutcome::new(PruneKind::Lookup, name, Err(error)));
            }
        }
    }
    Ok((empty, failed))
}

/// Removes `name` and its remaining checks from the catalog.
pub async fn deregister_node<C>(client: &C, name: &str) -> Result<()> where C: AdminApi + ?Sized {
    client.deregister_node(name).await
}

/// Deregisters every empty node one after another. Failed lookups lead the
/// outcomes so the pass report counts them.
pub async fn deregister_empty_nodes<C>(client: &C) -> Result<Vec<PruneOutcome>> where C: AdminApi + ?Sized {
    let (names, mut outcomes) = scan_nodes(client).await?;
    let deregistered = stream::iter(names)
        .then(move |name| async move {
            info!(node = %name, "deregistering from catalog");
            let result = deregister_node(client, &name).await;
            if let Err(error) = &result {
                error!(node = %name, "deregistering from catalog failed: {}", error);
            }
            PruneOutcome::new(PruneKind::Deregister, name, result)
        })
        .collect::<Vec<_>>()
        .await;
    outcomes.extend(deregistered);
    Ok(outcomes)
}
