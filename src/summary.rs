use indexmap::IndexMap;

use crate::collection::StreamCollection;
use crate::types::NetworkCode;

/// Aggregate pass/fail metrics for a grouped collection.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionSummary {
    pub groups: usize,
    pub traces: usize,
    pub passed: usize,
    pub failed: usize,
    pub per_network: Vec<NetworkShare>,
}

/// Per-network share of a collection's groups.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkShare {
    pub network: NetworkCode,
    pub groups: usize,
    pub share: f64,
}

/// Compute aggregate metrics over a collection's groups.
///
/// Returns `None` for an empty collection. Shares are fractions of the
/// total group count, sorted by descending count and then network code.
pub fn collection_summary(collection: &StreamCollection) -> Option<CollectionSummary> {
    if collection.is_empty() {
        return None;
    }
    let groups = collection.len();
    let traces: usize = collection.iter().map(|group| group.len()).sum();
    let passed = collection.n_passed();

    let mut counts: IndexMap<NetworkCode, usize> = IndexMap::new();
    for group in collection {
        *counts.entry(group.network().to_string()).or_default() += 1;
    }
    let mut per_network: Vec<NetworkShare> = counts
        .into_iter()
        .map(|(network, count)| NetworkShare {
            network,
            groups: count,
            share: count as f64 / groups as f64,
        })
        .collect();
    per_network.sort_by(|a, b| {
        b.groups
            .cmp(&a.groups)
            .then_with(|| a.network.cmp(&b.network))
    });

    Some(CollectionSummary {
        groups,
        traces,
        passed,
        failed: groups - passed,
        per_network,
    })
}
