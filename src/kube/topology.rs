//! Topology reconstruction from a flat list of pod observations.

use tracing::instrument;

use crate::error::TopologyError;

use super::resolver::{resolve, OwnerLookup};
use super::{ClusterTopology, PodObservation};

/// Group every observation under its top-level owner.
///
/// Observations are processed in input order, one owner lookup each. The
/// first lookup failure aborts the build and no partial topology is
/// returned. Groups start out `ok`; run [`super::evaluate`] afterwards to roll
/// pod health up.
#[instrument(name = "kube.topology.build", skip_all, fields(pods = observations.len(), groups))]
pub async fn build<L>(
    lookup: &L,
    observations: &[PodObservation],
) -> Result<ClusterTopology, TopologyError>
where
    L: OwnerLookup + ?Sized,
{
    let mut topology = ClusterTopology::default();

    for obs in observations {
        if obs.name.is_empty() {
            return Err(TopologyError::MalformedInput(
                "pod observation without a name".to_string(),
            ));
        }
        if obs.owner_name.is_empty() {
            return Err(TopologyError::MalformedInput(format!(
                "pod {} has an owner reference without a name",
                obs.name
            )));
        }

        match resolve(lookup, &obs.owner_kind, &obs.owner_name).await? {
            Some(owner) => topology.insert_pod(&owner, &obs.name, obs.status),
            None => {
                tracing::debug!(
                    pod = %obs.name,
                    owner_kind = %obs.owner_kind,
                    owner = %obs.owner_name,
                    "Ignoring pod with unsupported owner kind"
                );
            }
        }
    }

    tracing::Span::current().record("groups", topology.group_count());
    Ok(topology)
}
