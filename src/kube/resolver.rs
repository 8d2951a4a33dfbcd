//! Owner resolution: immediate owner reference -> top-level workload.
//!
//! StatefulSets own their pods directly. ReplicaSets are followed one level
//! up to their Deployment, and Jobs to their CronJob when they were spawned by
//! one. Every lookup goes to the cluster; nothing is cached between pods.

use async_trait::async_trait;

use crate::error::TopologyError;

use super::api::ObjectMeta;
use super::{GroupKind, OwnerKind};

/// Name-based lookups against the cluster API.
///
/// Both methods return `Ok(None)` when no object with that name exists.
#[async_trait]
pub trait OwnerLookup: Send + Sync {
    async fn replica_set(&self, name: &str) -> Result<Option<ObjectMeta>, TopologyError>;
    async fn job(&self, name: &str) -> Result<Option<ObjectMeta>, TopologyError>;
}

/// Top-level owner a pod is grouped under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOwner {
    pub kind: GroupKind,
    pub name: String,
}

impl ResolvedOwner {
    pub fn new(kind: GroupKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Resolve a pod's immediate owner to the workload it is grouped under.
///
/// Returns `Ok(None)` for owner kinds the roll-up does not follow.
pub async fn resolve<L>(
    lookup: &L,
    owner_kind: &OwnerKind,
    owner_name: &str,
) -> Result<Option<ResolvedOwner>, TopologyError>
where
    L: OwnerLookup + ?Sized,
{
    match owner_kind {
        OwnerKind::StatefulSet => Ok(Some(ResolvedOwner::new(GroupKind::StatefulSet, owner_name))),
        OwnerKind::ReplicaSet => {
            let meta = lookup
                .replica_set(owner_name)
                .await?
                .ok_or_else(|| TopologyError::Lookup {
                    kind: "ReplicaSet",
                    name: owner_name.to_string(),
                })?;
            let deployment = meta.owner().ok_or_else(|| {
                TopologyError::MalformedInput(format!(
                    "ReplicaSet {owner_name} has no owner reference"
                ))
            })?;
            Ok(Some(ResolvedOwner::new(
                GroupKind::Deployment,
                deployment.name.as_str(),
            )))
        }
        OwnerKind::Job => {
            let meta = lookup
                .job(owner_name)
                .await?
                .ok_or_else(|| TopologyError::Lookup {
                    kind: "Job",
                    name: owner_name.to_string(),
                })?;
            match meta.owner() {
                Some(cron_job) => Ok(Some(ResolvedOwner::new(
                    GroupKind::CronJob,
                    cron_job.name.as_str(),
                ))),
                None => Ok(Some(ResolvedOwner::new(GroupKind::Job, owner_name))),
            }
        }
        OwnerKind::Other(_) => Ok(None),
    }
}
