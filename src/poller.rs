//! Background polling loop.
//!
//! A single task runs one full cycle at a time: every service probe in
//! order, then the cluster topology. It publishes the resulting snapshot,
//! sleeps for the configured interval and starts over. A slow cycle pushes
//! the next one back rather than overlapping it.
//!
//! Probe failures only mark their own service down. A failed topology
//! rebuild keeps the previous topology in the snapshot until a later cycle
//! succeeds.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::instrument;

use crate::kube::TopologySource;
use crate::probe::{run_probe, Probe};
use crate::state::{Snapshot, SnapshotPublisher};

pub struct Poller {
    probes: Vec<Box<dyn Probe>>,
    cluster: Option<Box<dyn TopologySource>>,
    interval: Duration,
    publisher: SnapshotPublisher,
}

impl Poller {
    pub fn new(
        probes: Vec<Box<dyn Probe>>,
        cluster: Option<Box<dyn TopologySource>>,
        interval: Duration,
        publisher: SnapshotPublisher,
    ) -> Self {
        Self {
            probes,
            cluster,
            interval,
            publisher,
        }
    }

    /// Run cycles until `shutdown` flips to true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            probes = self.probes.len(),
            cluster = self.cluster.is_some(),
            interval_secs = self.interval.as_secs(),
            "Poller starting"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Poller stopped");
    }

    /// Run one complete cycle and publish its snapshot.
    #[instrument(name = "poller.cycle", skip(self), fields(duration_ms, healthy))]
    pub async fn cycle(&self) -> Arc<Snapshot> {
        let start = Instant::now();

        let mut resources = BTreeMap::new();
        for probe in &self.probes {
            let status = run_probe(probe.as_ref()).await;
            resources.insert(probe.name().to_string(), status);
        }

        let previous = self.publisher.borrow().kubernetes.clone();
        let kubernetes = match &self.cluster {
            Some(cluster) => match cluster.fetch_topology().await {
                Ok(topology) => topology,
                Err(e) => {
                    tracing::error!(error = %e, "Cluster topology rebuild failed, keeping previous");
                    previous
                }
            },
            None => previous,
        };

        let snapshot = Arc::new(Snapshot {
            resources,
            kubernetes,
            last_check: chrono::Local::now().to_rfc3339(),
        });
        self.publisher.send_replace(snapshot.clone());

        let duration_ms = start.elapsed().as_millis() as u64;
        let span = tracing::Span::current();
        span.record("duration_ms", duration_ms);
        span.record("healthy", snapshot.is_healthy());
        tracing::info!(
            healthy = snapshot.is_healthy(),
            failed_workloads = snapshot.kubernetes.failed_groups(),
            duration_ms,
            "Cycle complete"
        );

        snapshot
    }
}
