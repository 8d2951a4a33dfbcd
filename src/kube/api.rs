//! Typed subset of the Kubernetes API objects the roll-up reads.
//!
//! Only the fields needed to group pods and derive their health are decoded;
//! everything else in the payload is ignored.

use serde::Deserialize;

use crate::error::TopologyError;

use super::{OwnerKind, PodObservation, PodStatus};

/// Reason reported for containers that exited successfully
const REASON_COMPLETED: &str = "Completed";

/// `{"items": [...]}` envelope returned by list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: Option<String>,
    #[serde(default)]
    pub owner_references: Vec<OwnerReference>,
}

impl ObjectMeta {
    /// The controlling owner, falling back to the first reference listed
    pub fn owner(&self) -> Option<&OwnerReference> {
        self.owner_references
            .iter()
            .find(|r| r.controller)
            .or_else(|| self.owner_references.first())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub controller: bool,
}

/// ReplicaSet or Job; only the owner references matter
#[derive(Debug, Clone, Deserialize)]
pub struct OwnedObject {
    #[serde(default)]
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pod {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: Option<ApiPodStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPodStatus {
    #[serde(default)]
    pub container_statuses: Vec<ContainerStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub state: ContainerState,
    #[serde(default)]
    pub last_state: ContainerState,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerState {
    pub running: Option<serde_json::Value>,
    pub terminated: Option<TerminatedState>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TerminatedState {
    pub reason: Option<String>,
}

impl PodStatus {
    /// Derive pod health from its containers.
    ///
    /// A container that is neither ready nor running makes the pod `Down`; a
    /// container whose previous run terminated for any reason other than
    /// `Completed` makes it `Error`, which takes precedence. A pod without
    /// container statuses has not started yet and counts as `Down`.
    pub fn from_container_statuses(statuses: &[ContainerStatus]) -> Self {
        if statuses.is_empty() {
            return PodStatus::Down;
        }

        let mut status = PodStatus::Ok;
        for container in statuses {
            if !container.ready && container.state.running.is_none() && status == PodStatus::Ok {
                status = PodStatus::Down;
            }

            if let Some(terminated) = &container.last_state.terminated {
                if terminated.reason.as_deref() != Some(REASON_COMPLETED) {
                    status = PodStatus::Error;
                }
            }
        }
        status
    }
}

impl Pod {
    /// Convert into an observation. Returns `Ok(None)` for bare pods without
    /// an owner, which have no workload to be grouped under.
    pub fn into_observation(self) -> Result<Option<PodObservation>, TopologyError> {
        let name = self
            .metadata
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| TopologyError::MalformedInput("pod without metadata.name".to_string()))?;

        let Some(owner) = self.metadata.owner() else {
            tracing::debug!(pod = %name, "Skipping pod without owner reference");
            return Ok(None);
        };

        let statuses = self
            .status
            .as_ref()
            .map(|s| s.container_statuses.as_slice())
            .unwrap_or_default();

        Ok(Some(PodObservation {
            status: PodStatus::from_container_statuses(statuses),
            owner_kind: OwnerKind::from_kind(&owner.kind),
            owner_name: owner.name.clone(),
            name,
        }))
    }
}
