//! Shared application state for request handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use tokio::sync::watch;

use crate::kube::ClusterTopology;
use crate::probe::ServiceStatus;

/// Result of one polling cycle, published as a single unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Service name -> verdict
    pub resources: BTreeMap<String, ServiceStatus>,
    /// Last successfully rebuilt workload topology
    pub kubernetes: ClusterTopology,
    /// Completion time of the cycle, empty until the first one finishes
    pub last_check: String,
}

impl Snapshot {
    /// Snapshot served before the first cycle completes: every service `ok`.
    pub fn initial<'a>(services: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            resources: services
                .into_iter()
                .map(|name| (name.to_string(), ServiceStatus::Ok))
                .collect(),
            ..Default::default()
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.resources.values().all(|s| s.is_ok())
    }
}

/// Writer half of the snapshot channel, owned by the poller.
pub type SnapshotPublisher = watch::Sender<Arc<Snapshot>>;

/// Create the snapshot channel seeded with `initial`
pub fn snapshot_channel(initial: Snapshot) -> (SnapshotPublisher, watch::Receiver<Arc<Snapshot>>) {
    watch::channel(Arc::new(initial))
}

/// Shared application state, cloneable across handlers.
///
/// Handlers only ever see whole snapshots: the poller swaps in a new `Arc`
/// and readers clone the current one without holding the channel lock.
#[derive(Clone)]
pub struct AppState {
    snapshot: watch::Receiver<Arc<Snapshot>>,
    /// Status code for the snapshot route when any service is down
    pub unhealthy_status: StatusCode,
}

impl AppState {
    pub fn new(snapshot: watch::Receiver<Arc<Snapshot>>, unhealthy_status: StatusCode) -> Self {
        Self {
            snapshot,
            unhealthy_status,
        }
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }
}
