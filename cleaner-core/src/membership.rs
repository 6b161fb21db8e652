use futures::StreamExt;
use futures::stream;
use tracing::{debug, error, info};

use crate::admin::AdminApi;
use crate::error::Result;
use crate::outcome::{PruneKind, PruneOutcome};

/// Names of the LAN members serf reports as left or failed, in the order the
/// agent returned them.
pub async fn list_failed_members<C>(client: &C) -> Result<Vec<String>> where C: AdminApi + ?Sized {
    let members = client.members(false).await?;
    let failed = members
        .into_iter()
        .filter(|member| member.status.is_prunable())
        .map(|member| {
            debug!("member {} at {} is {}", member.name, member.addr, member.status);
            member.name
        })
        .collect();
    Ok(failed)
}

/// Force-leaves `name` and prunes it from the member list for good.
pub async fn prune_member<C>(client: &C, name: &str) -> Result<()> where C: AdminApi + ?Sized {
    client.force_leave_prune(name).await
}

/// Prunes every failed member one after another. A member that cannot be
/// pruned is reported in its outcome and does not stop the others.
pub async fn prune_failed_members<C>(client: &C) -> Result<Vec<PruneOutcome>> where C: AdminApi + ?Sized {
    let names = list_failed_members(client).await?;
    let outcomes = stream::iter(names)
        .then(move |name| async move {
            info!(member = %name, "pruning");
            let result = prune_member(client, &name).await;
            if let Err(error) = &result {
                error!(member = %name, "pruning failed: {}", error);
            }
            PruneOutcome::new(PruneKind::ForceLeavePrune, name, result)
        })
        .collect::<Vec<_>>()
        .await;
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use crate::admin::MemberStatus;
    use crate::error::Error;
    use crate::membership::{list_failed_members, prune_failed_members, prune_member};
    use crate::mock::{MockClient, MockCluster};

    #[tokio::test]
    async fn test_list_failed_members_keeps_source_order() -> anyhow::Result<()> {
        let cluster = MockCluster::new().with_members(vec![
            ("n5", MemberStatus::Failed),
            ("n1", MemberStatus::Alive),
            ("n4", MemberStatus::Leaving),
            ("n3", MemberStatus::Left),
            ("n0", MemberStatus::None),
            ("n2", MemberStatus::Failed),
        ]);
        let client = MockClient::new(cluster.clone());
        assert_eq!(list_failed_members(&client).await?, vec!["n5", "n3", "n2"]);
        assert_eq!(cluster.calls(), vec!["members wan=false"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_prune_failed_and_left() -> anyhow::Result<()> {
        let cluster = MockCluster::new().with_members(vec![
            ("n1", MemberStatus::Alive),
            ("n2", MemberStatus::Failed),
            ("n3", MemberStatus::Left),
        ]);
        let client = MockClient::new(cluster.clone());
        let outcomes = prune_failed_members(&client).await?;
        let pruned = outcomes.iter().filter(|o| o.is_success()).map(|o| o.action.target.as_str()).collect::<Vec<_>>();
        assert_eq!(pruned, vec!["n2", "n3"]);
        assert!(!cluster.calls().contains(&"force-leave n1".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_the_rest() -> anyhow::Result<()> {
        let cluster = MockCluster::new().with_members(vec![
            ("a", MemberStatus::Failed),
            ("b", MemberStatus::Failed),
        ]);
        cluster.fail_target("a");
        let client = MockClient::new(cluster.clone());
        let outcomes = prune_failed_members(&client).await?;
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0].error(), Some(Error::AdministrativeCall { .. })));
        assert!(outcomes[1].is_success());
        assert_eq!(cluster.calls(), vec!["members wan=false", "force-leave a", "force-leave b"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_failure_prunes_nothing() {
        let cluster = MockCluster::new().with_members(vec![("n2", MemberStatus::Failed)]);
        cluster.fail_member_listing();
        let client = MockClient::new(cluster.clone());
        assert!(prune_failed_members(&client).await.is_err());
        assert_eq!(cluster.calls(), vec!["members wan=false"]);
    }

    #[tokio::test]
    async fn test_prune_absent_member_twice() -> anyhow::Result<()> {
        let cluster = MockCluster::new().with_members(vec![("n2", MemberStatus::Failed)]);
        let client = MockClient::new(cluster.clone());
        prune_member(&client, "n2").await?;
        prune_member(&client, "n2").await?;
        assert!(list_failed_members(&client).await?.is_empty());
        Ok(())
    }
}
