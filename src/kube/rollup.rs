//! Roll-up of pod health to the owning workload.

use std::collections::BTreeMap;

use super::{ClusterTopology, GroupStatus, PodStatus};

/// A workload fails only when every one of its pods is unhealthy.
///
/// A group without pods (e.g. a Deployment scaled to zero) stays `Ok`.
pub fn rollup_status(pods: &BTreeMap<String, PodStatus>) -> GroupStatus {
    let unhealthy = pods.values().filter(|s| !s.is_ok()).count();
    if !pods.is_empty() && unhealthy == pods.len() {
        GroupStatus::Fail
    } else {
        GroupStatus::Ok
    }
}

/// Recompute the status of every group in all four collections.
///
/// Status is derived from the pods alone, so evaluating twice is a no-op.
pub fn evaluate(topology: &mut ClusterTopology) {
    for group in topology.all_groups_mut() {
        group.status = rollup_status(&group.pods);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::{GroupKind, OwnerGroup, ResolvedOwner};

    fn pods(entries: &[(&str, PodStatus)]) -> BTreeMap<String, PodStatus> {
        entries
            .iter()
            .map(|(name, status)| (name.to_string(), *status))
            .collect()
    }

    #[test]
    fn test_all_unhealthy_fails() {
        let p = pods(&[("a", PodStatus::Down), ("b", PodStatus::Error)]);
        assert_eq!(rollup_status(&p), GroupStatus::Fail);
    }

    #[test]
    fn test_one_healthy_pod_keeps_group_ok() {
        let p = pods(&[("a", PodStatus::Down), ("b", PodStatus::Ok)]);
        assert_eq!(rollup_status(&p), GroupStatus::Ok);
    }

    #[test]
    fn test_single_healthy_pod_is_ok() {
        assert_eq!(rollup_status(&pods(&[("a", PodStatus::Ok)])), GroupStatus::Ok);
    }

    #[test]
    fn test_single_unhealthy_pod_fails() {
        assert_eq!(
            rollup_status(&pods(&[("a", PodStatus::Error)])),
            GroupStatus::Fail
        );
    }

    #[test]
    fn test_empty_group_is_ok() {
        assert_eq!(rollup_status(&BTreeMap::new()), GroupStatus::Ok);
    }

    fn sample() -> ClusterTopology {
        let mut topology = ClusterTopology::default();
        let web = ResolvedOwner::new(GroupKind::Deployment, "web");
        topology.insert_pod(&web, "web-a", PodStatus::Down);
        topology.insert_pod(&web, "web-b", PodStatus::Error);
        let db = ResolvedOwner::new(GroupKind::StatefulSet, "db");
        topology.insert_pod(&db, "db-0", PodStatus::Ok);
        topology.insert_pod(&db, "db-1", PodStatus::Down);
        let nightly = ResolvedOwner::new(GroupKind::CronJob, "nightly");
        topology.insert_pod(&nightly, "nightly-x", PodStatus::Error);
        let migrate = ResolvedOwner::new(GroupKind::Job, "migrate");
        topology.insert_pod(&migrate, "migrate-x", PodStatus::Ok);
        topology
            .deployments
            .insert("scaled-down".to_string(), OwnerGroup::default());
        topology
    }

    #[test]
    fn test_evaluate_covers_all_collections() {
        let mut topology = sample();
        evaluate(&mut topology);

        assert_eq!(topology.deployments["web"].status, GroupStatus::Fail);
        assert_eq!(topology.deployments["scaled-down"].status, GroupStatus::Ok);
        assert_eq!(topology.stateful_sets["db"].status, GroupStatus::Ok);
        assert_eq!(topology.cron_jobs["nightly"].status, GroupStatus::Fail);
        assert_eq!(topology.jobs["migrate"].status, GroupStatus::Ok);
        assert_eq!(topology.failed_groups(), 2);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut once = sample();
        evaluate(&mut once);
        let mut twice = once.clone();
        evaluate(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_evaluate_recovers_stale_fail() {
        let mut topology = sample();
        topology.stateful_sets.get_mut("db").unwrap().status = GroupStatus::Fail;
        evaluate(&mut topology);
        assert_eq!(topology.stateful_sets["db"].status, GroupStatus::Ok);
    }
}
