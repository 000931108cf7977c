//! Station grouping engine.
//!
//! Clusters a flat list of traces into station groups. Two traces belong to
//! the same cluster iff their network, station, instrument code, and
//! free-field status all match, so connected components reduce to
//! order-preserving key buckets; membership does not depend on input order.
//! Networks that overload the location code get a second partitioning pass,
//! one sub-group per distinct location.

use indexmap::IndexMap;

use crate::constants::grouping::NETWORKS_USING_LOCATION;
use crate::group::StationGroup;
use crate::trace::StationTrace;
use crate::types::LocationCode;

/// Whether `network` distinguishes co-installed sensors by location code.
pub fn uses_location_codes(network: &str) -> bool {
    NETWORKS_USING_LOCATION.contains(&network)
}

#[derive(Clone, Hash, PartialEq, Eq)]
struct ClusterKey {
    network: String,
    station: String,
    instrument: String,
    free_field: bool,
}

impl ClusterKey {
    fn of(trace: &StationTrace) -> Self {
        Self {
            network: trace.network.clone(),
            station: trace.station.clone(),
            instrument: trace.instrument(),
            free_field: trace.free_field(),
        }
    }
}

/// Cluster traces into station groups.
///
/// Singleton clusters become their own group. The returned groups carry no
/// tag or parameters; the collection reattaches carried-over state after a
/// rebuild.
pub fn group_traces(traces: Vec<StationTrace>) -> Vec<StationGroup> {
    let mut clusters: IndexMap<ClusterKey, Vec<StationTrace>> = IndexMap::new();
    for trace in traces {
        clusters
            .entry(ClusterKey::of(&trace))
            .or_default()
            .push(trace);
    }

    let mut groups = Vec::with_capacity(clusters.len());
    for (key, members) in clusters {
        if uses_location_codes(&key.network) {
            let mut by_location: IndexMap<LocationCode, Vec<StationTrace>> = IndexMap::new();
            for trace in members {
                by_location
                    .entry(trace.location.clone())
                    .or_default()
                    .push(trace);
            }
            for (_, sub_members) in by_location {
                groups.push(StationGroup::from_members(sub_members));
            }
        } else {
            groups.push(StationGroup::from_members(members));
        }
    }
    groups
}
