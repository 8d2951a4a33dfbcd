//! Kubernetes workload topology and status roll-up.
//!
//! This module contains the data types for pod observations and owner groups,
//! plus the logic that reconstructs the owner hierarchy from per-pod owner
//! references and rolls pod health up to the owning workload.
//!
//! Key re-exports:
//! - [`ClusterClient`] - Cluster API client that produces a [`ClusterTopology`]
//! - [`build`] / [`evaluate`] - Topology reconstruction and roll-up

pub mod api;
mod client;
mod resolver;
mod rollup;
mod topology;

pub use client::ClusterClient;
pub use resolver::{resolve, OwnerLookup, ResolvedOwner};
pub use rollup::{evaluate, rollup_status};
pub use topology::build;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::TopologyError;

/// Health of a single pod, derived from its container statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PodStatus {
    Ok,
    /// A container is neither ready nor running
    Down,
    /// A container last terminated for a reason other than completion
    Error,
}

impl PodStatus {
    pub fn is_ok(self) -> bool {
        self == PodStatus::Ok
    }
}

/// Kind of a pod's immediate owner, as declared in its owner reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerKind {
    ReplicaSet,
    Job,
    StatefulSet,
    /// Any kind the roll-up does not follow (DaemonSet, Node, ...)
    Other(String),
}

impl OwnerKind {
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "ReplicaSet" => OwnerKind::ReplicaSet,
            "Job" => OwnerKind::Job,
            "StatefulSet" => OwnerKind::StatefulSet,
            other => OwnerKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKind::ReplicaSet => write!(f, "ReplicaSet"),
            OwnerKind::Job => write!(f, "Job"),
            OwnerKind::StatefulSet => write!(f, "StatefulSet"),
            OwnerKind::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// One pod as seen in a single cluster fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodObservation {
    pub name: String,
    pub status: PodStatus,
    pub owner_kind: OwnerKind,
    pub owner_name: String,
}

impl PodObservation {
    pub fn new(
        name: impl Into<String>,
        status: PodStatus,
        owner_kind: OwnerKind,
        owner_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            owner_kind,
            owner_name: owner_name.into(),
        }
    }
}

/// Roll-up status of a top-level owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    #[default]
    Ok,
    Fail,
}

/// A top-level owner and the pods beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OwnerGroup {
    pub status: GroupStatus,
    /// Pod name -> pod status. Re-observing a pod overwrites its entry.
    pub pods: BTreeMap<String, PodStatus>,
}

/// The collection a top-level owner is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Deployment,
    StatefulSet,
    Job,
    CronJob,
}

impl GroupKind {
    pub const ALL: [GroupKind; 4] = [
        GroupKind::Deployment,
        GroupKind::StatefulSet,
        GroupKind::Job,
        GroupKind::CronJob,
    ];
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKind::Deployment => write!(f, "Deployment"),
            GroupKind::StatefulSet => write!(f, "StatefulSet"),
            GroupKind::Job => write!(f, "Job"),
            GroupKind::CronJob => write!(f, "CronJob"),
        }
    }
}

/// Workloads in the namespace, grouped by top-level owner kind.
///
/// Built from scratch every cycle and published as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ClusterTopology {
    #[serde(rename = "Deployment")]
    pub deployments: BTreeMap<String, OwnerGroup>,
    #[serde(rename = "StatefulSet")]
    pub stateful_sets: BTreeMap<String, OwnerGroup>,
    #[serde(rename = "Job")]
    pub jobs: BTreeMap<String, OwnerGroup>,
    #[serde(rename = "CronJob")]
    pub cron_jobs: BTreeMap<String, OwnerGroup>,
}

impl ClusterTopology {
    pub fn groups(&self, kind: GroupKind) -> &BTreeMap<String, OwnerGroup> {
        match kind {
            GroupKind::Deployment => &self.deployments,
            GroupKind::StatefulSet => &self.stateful_sets,
            GroupKind::Job => &self.jobs,
            GroupKind::CronJob => &self.cron_jobs,
        }
    }

    pub fn groups_mut(&mut self, kind: GroupKind) -> &mut BTreeMap<String, OwnerGroup> {
        match kind {
            GroupKind::Deployment => &mut self.deployments,
            GroupKind::StatefulSet => &mut self.stateful_sets,
            GroupKind::Job => &mut self.jobs,
            GroupKind::CronJob => &mut self.cron_jobs,
        }
    }

    /// Record a pod under its top-level owner, creating the group on first sight.
    pub fn insert_pod(&mut self, owner: &ResolvedOwner, pod: &str, status: PodStatus) {
        self.groups_mut(owner.kind)
            .entry(owner.name.clone())
            .or_default()
            .pods
            .insert(pod.to_string(), status);
    }

    pub fn group(&self, kind: GroupKind, owner: &str) -> Option<&OwnerGroup> {
        self.groups(kind).get(owner)
    }

    /// Every group across all four collections
    pub fn all_groups_mut(&mut self) -> impl Iterator<Item = &mut OwnerGroup> {
        self.deployments
            .values_mut()
            .chain(self.stateful_sets.values_mut())
            .chain(self.jobs.values_mut())
            .chain(self.cron_jobs.values_mut())
    }

    pub fn group_count(&self) -> usize {
        GroupKind::ALL.iter().map(|k| self.groups(*k).len()).sum()
    }

    pub fn pod_count(&self) -> usize {
        GroupKind::ALL
            .iter()
            .flat_map(|k| self.groups(*k).values())
            .map(|g| g.pods.len())
            .sum()
    }

    pub fn failed_groups(&self) -> usize {
        GroupKind::ALL
            .iter()
            .flat_map(|k| self.groups(*k).values())
            .filter(|g| g.status == GroupStatus::Fail)
            .count()
    }
}

/// Source of a fresh, evaluated topology for each cycle.
#[async_trait]
pub trait TopologySource: Send + Sync {
    async fn fetch_topology(&self) -> Result<ClusterTopology, TopologyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_kind_from_kind() {
        assert_eq!(OwnerKind::from_kind("ReplicaSet"), OwnerKind::ReplicaSet);
        assert_eq!(OwnerKind::from_kind("Job"), OwnerKind::Job);
        assert_eq!(OwnerKind::from_kind("StatefulSet"), OwnerKind::StatefulSet);
        assert_eq!(
            OwnerKind::from_kind("DaemonSet"),
            OwnerKind::Other("DaemonSet".to_string())
        );
        assert_eq!(OwnerKind::from_kind("DaemonSet").to_string(), "DaemonSet");
    }

    #[test]
    fn test_insert_pod_overwrites_by_name() {
        let mut topology = ClusterTopology::default();
        let owner = ResolvedOwner::new(GroupKind::Deployment, "web");
        topology.insert_pod(&owner, "web-1", PodStatus::Ok);
        topology.insert_pod(&owner, "web-1", PodStatus::Down);

        let group = topology.group(GroupKind::Deployment, "web").unwrap();
        assert_eq!(group.pods.len(), 1);
        assert_eq!(group.pods["web-1"], PodStatus::Down);
        assert_eq!(group.status, GroupStatus::Ok);
    }

    #[test]
    fn test_counts() {
        let mut topology = ClusterTopology::default();
        topology.insert_pod(
            &ResolvedOwner::new(GroupKind::Deployment, "web"),
            "web-1",
            PodStatus::Ok,
        );
        topology.insert_pod(
            &ResolvedOwner::new(GroupKind::CronJob, "nightly"),
            "nightly-1",
            PodStatus::Error,
        );
        topology.insert_pod(
            &ResolvedOwner::new(GroupKind::CronJob, "nightly"),
            "nightly-2",
            PodStatus::Ok,
        );
        assert_eq!(topology.group_count(), 2);
        assert_eq!(topology.pod_count(), 3);
        assert_eq!(topology.failed_groups(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let mut topology = ClusterTopology::default();
        topology.insert_pod(
            &ResolvedOwner::new(GroupKind::StatefulSet, "db"),
            "db-0",
            PodStatus::Error,
        );
        topology.stateful_sets.get_mut("db").unwrap().status = GroupStatus::Fail;

        let json = serde_json::to_value(&topology).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Deployment": {},
                "StatefulSet": {
                    "db": { "status": "fail", "pods": { "db-0": "error" } }
                },
                "Job": {},
                "CronJob": {}
            })
        );
    }
}
