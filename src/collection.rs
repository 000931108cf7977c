use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::CollateConfig;
use crate::constants::colocated;
use crate::dedup::{Preferred, are_duplicates, preferred_of};
use crate::errors::CollateError;
use crate::group::StationGroup;
use crate::grouping::group_traces;
use crate::trace::{ParamValue, StationTrace};
use crate::types::{GroupId, ParamKey, TagLabel};
use crate::utils::glob_match;

/// Snapshot of group-level metadata taken before a flatten/rebuild cycle.
#[derive(Clone, Debug)]
struct GroupState {
    tag: Option<String>,
    parameters: IndexMap<ParamKey, ParamValue>,
}

/// The ordered set of station groups for one processing run.
///
/// Construction runs the full lifecycle: ingest (optionally dropping
/// non-free-field groups), duplicate resolution, regrouping, and
/// validation. Group tags and parameters survive the flatten/rebuild
/// cycles through a carry-over snapshot keyed by canonical group id.
///
/// Failed traces stay in the collection with a recorded reason; nothing is
/// silently deleted.
#[derive(Clone, Debug)]
pub struct StreamCollection {
    groups: Vec<StationGroup>,
    config: CollateConfig,
}

impl StreamCollection {
    /// Build a collection from pre-assembled groups.
    pub fn new(groups: Vec<StationGroup>, config: CollateConfig) -> Result<Self, CollateError> {
        let mut kept = Vec::with_capacity(groups.len());
        for group in groups {
            debug!(group_id = %group.id(), "ingesting station group");
            if config.drop_non_free && !group.first().is_some_and(StationTrace::free_field) {
                debug!(group_id = %group.id(), "dropping non-free-field group");
                continue;
            }
            kept.push(group);
        }

        let mut collection = Self {
            groups: kept,
            config,
        };
        if collection.config.handle_duplicates && !collection.groups.is_empty() {
            collection.handle_duplicates()?;
        }
        collection.regroup()?;
        Ok(collection)
    }

    /// Build a collection from individual traces.
    pub fn from_traces(
        traces: Vec<StationTrace>,
        config: CollateConfig,
    ) -> Result<Self, CollateError> {
        let groups = traces.into_iter().map(StationGroup::from).collect();
        Self::new(groups, config)
    }

    /// Resolve duplicate traces, keeping one survivor per duplicate set.
    ///
    /// Flattens every group, scans traces in order against the kept list,
    /// and resolves each collision with the preference cascade. Losing
    /// traces are logged and discarded; this is an accepted lossy merge,
    /// not an error. Survivors are regrouped by the caller.
    fn handle_duplicates(&mut self) -> Result<(), CollateError> {
        let snapshot = gather_group_state(&mut self.groups);
        let traces: Vec<StationTrace> = self
            .groups
            .drain(..)
            .flat_map(StationGroup::into_traces)
            .collect();

        let mut kept: Vec<StationTrace> = Vec::with_capacity(traces.len());
        for incoming in traces {
            let mut collision = None;
            for (idx, existing) in kept.iter().enumerate() {
                if are_duplicates(&incoming, existing, self.config.max_dist_tolerance)? {
                    collision = Some(idx);
                    break;
                }
            }
            let Some(idx) = collision else {
                kept.push(incoming);
                continue;
            };
            match preferred_of(
                &incoming,
                &kept[idx],
                &self.config.process_level_preference,
                &self.config.format_preference,
            )? {
                Preferred::First => {
                    let dropped = kept.remove(idx);
                    info!(
                        trace_id = %dropped.id(),
                        format = %dropped.source_format,
                        "duplicate trace removed from collection"
                    );
                    kept.push(incoming);
                }
                Preferred::Second => {
                    info!(
                        trace_id = %incoming.id(),
                        format = %incoming.source_format,
                        "duplicate trace removed from collection"
                    );
                }
            }
        }

        let mut groups: Vec<StationGroup> = kept.into_iter().map(StationGroup::from).collect();
        restore_group_state(&mut groups, &snapshot);
        self.groups = groups;
        Ok(())
    }

    /// Re-derive station groups from the current membership.
    ///
    /// Flattens, re-clusters, restores carried-over tags and parameters,
    /// and validates. Also useful after externally modifying membership.
    pub fn regroup(&mut self) -> Result<(), CollateError> {
        let snapshot = gather_group_state(&mut self.groups);
        let traces: Vec<StationTrace> = self
            .groups
            .drain(..)
            .flat_map(StationGroup::into_traces)
            .collect();
        let mut groups = group_traces(traces);
        restore_group_state(&mut groups, &snapshot);
        self.groups = groups;
        self.validate()
    }

    /// Check cross-group consistency.
    ///
    /// At most one distinct tag label may appear across the collection;
    /// untagged groups contribute the empty label.
    pub fn validate(&self) -> Result<(), CollateError> {
        let mut labels: Vec<TagLabel> = Vec::new();
        for group in &self.groups {
            let label = match group.tag() {
                Some(tag) => tag_label(tag)?,
                None => TagLabel::new(),
            };
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        if labels.len() > 1 {
            return Err(CollateError::InconsistentTags(labels));
        }
        Ok(())
    }

    /// Select the preferred instrument among colocated groups.
    ///
    /// Groups sharing network and station but carrying different instrument
    /// types are clustered; in each cluster of two or more, the first
    /// preference pattern that matches any instrument selects the first
    /// matching group, and every other group in the cluster is failed with
    /// a reason naming the winner. When no pattern matches, the whole
    /// cluster is failed. Nothing is removed.
    pub fn select_colocated(&mut self) {
        let preference = self.config.colocated_preference.clone();
        let mut clusters: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (idx, group) in self.groups.iter().enumerate() {
            clusters.entry(group.net_sta()).or_default().push(idx);
        }

        for (net_sta, cluster) in clusters {
            if cluster.len() < 2 {
                continue;
            }
            let mut winner = None;
            'patterns: for pattern in &preference {
                for &idx in &cluster {
                    if instrument_matches(pattern, &self.groups[idx].instrument()) {
                        winner = Some(idx);
                        break 'patterns;
                    }
                }
            }
            match winner {
                Some(keep_idx) => {
                    let keep_inst = self.groups[keep_idx].instrument();
                    debug!(
                        cluster = %net_sta,
                        instrument = %keep_inst,
                        "selected colocated instrument"
                    );
                    let reason = format!("colocated with {keep_inst} instrument");
                    for &idx in &cluster {
                        if idx == keep_idx {
                            continue;
                        }
                        for trace in self.groups[idx].traces_mut() {
                            trace.fail(reason.as_str());
                        }
                    }
                }
                None => {
                    for &idx in &cluster {
                        for trace in self.groups[idx].traces_mut() {
                            trace.fail(colocated::NO_PREFERENCE_MATCH_REASON);
                        }
                    }
                }
            }
        }
    }

    /// Groups matching the given glob filters, in collection order.
    ///
    /// `None` filters match everything; matching is case-insensitive.
    pub fn select(
        &self,
        network: Option<&str>,
        station: Option<&str>,
        instrument: Option<&str>,
    ) -> Vec<&StationGroup> {
        self.groups
            .iter()
            .filter(|group| {
                network.is_none_or(|pattern| glob_match(pattern, group.network()))
                    && station.is_none_or(|pattern| glob_match(pattern, group.station()))
                    && instrument.is_none_or(|pattern| glob_match(pattern, &group.instrument()))
            })
            .collect()
    }

    /// Merge two collections, re-running deduplication across both.
    pub fn merged(self, other: StreamCollection) -> Result<StreamCollection, CollateError> {
        let config = self.config;
        let mut groups = self.groups;
        groups.extend(other.groups);
        StreamCollection::new(groups, config)
    }

    /// Add one group and re-derive the grouping.
    pub fn append(&mut self, group: StationGroup) -> Result<(), CollateError> {
        self.groups.push(group);
        if self.config.handle_duplicates {
            self.handle_duplicates()?;
        }
        self.regroup()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the collection holds no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of groups whose traces all pass.
    pub fn n_passed(&self) -> usize {
        self.groups.iter().filter(|group| group.passed()).count()
    }

    /// Number of groups with at least one failed trace.
    pub fn n_failed(&self) -> usize {
        self.len() - self.n_passed()
    }

    /// Iterate over groups in order.
    pub fn iter(&self) -> std::slice::Iter<'_, StationGroup> {
        self.groups.iter()
    }

    /// Groups in order.
    pub fn groups(&self) -> &[StationGroup] {
        &self.groups
    }

    /// The configuration this collection was built with.
    pub fn config(&self) -> &CollateConfig {
        &self.config
    }
}

impl<'a> IntoIterator for &'a StreamCollection {
    type Item = &'a StationGroup;
    type IntoIter = std::slice::Iter<'a, StationGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for StreamCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} station group(s) in collection:", self.len())?;
        writeln!(f, "    {} group(s) passed checks.", self.n_passed())?;
        write!(f, "    {} group(s) failed checks.", self.n_failed())
    }
}

/// Extract the label component of an `event_station_label` tag.
fn tag_label(tag: &str) -> Result<TagLabel, CollateError> {
    let mut parts = tag.split('_');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(_), Some(label), None) => Ok(label.to_string()),
        _ => Err(CollateError::MalformedTag(tag.to_string())),
    }
}

/// Whether the two-character prefix of a preference pattern matches an
/// instrument code.
fn instrument_matches(pattern: &str, instrument: &str) -> bool {
    let prefix: String = pattern.chars().take(2).collect();
    glob_match(&prefix, instrument)
}

/// Snapshot tags and parameters before a flatten/rebuild cycle.
///
/// The tag is additionally stamped onto every member trace so it rides
/// through the rebuild even when the group's canonical id changes.
fn gather_group_state(groups: &mut [StationGroup]) -> IndexMap<GroupId, GroupState> {
    let mut snapshot = IndexMap::new();
    for group in groups.iter_mut() {
        if group.is_empty() {
            continue;
        }
        if group.tag().is_some() || !group.parameters().is_empty() {
            snapshot.insert(
                group.id(),
                GroupState {
                    tag: group.tag().map(str::to_string),
                    parameters: group.parameters().clone(),
                },
            );
        }
        let tag = group.tag().map(str::to_string);
        for trace in group.traces_mut() {
            trace.tag = tag.clone();
        }
    }
    snapshot
}

/// Reattach snapshotted state to rebuilt groups.
///
/// Matching is by canonical group id; the per-trace tag stamp is the
/// fallback for ids the snapshot never saw.
fn restore_group_state(groups: &mut [StationGroup], snapshot: &IndexMap<GroupId, GroupState>) {
    for group in groups.iter_mut() {
        if group.is_empty() {
            continue;
        }
        if let Some(state) = snapshot.get(&group.id()) {
            if !state.parameters.is_empty() {
                group.set_parameters(state.parameters.clone());
            }
            if let Some(tag) = &state.tag {
                group.set_tag(tag.clone());
                continue;
            }
        }
        if let Some(tag) = group.first().and_then(|trace| trace.tag.clone()) {
            group.set_tag(tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_trace(network: &str, station: &str, channel: &str) -> StationTrace {
        StationTrace {
            network: network.to_string(),
            station: station.to_string(),
            channel: channel.to_string(),
            location: "--".to_string(),
            latitude: 35.525,
            longitude: -117.605,
            sample_count: 2000,
            sampling_rate: 100.0,
            process_level: crate::trace::ProcessLevel::UncorrectedUnits,
            source_format: "cosmos".to_string(),
            ..StationTrace::default()
        }
    }

    fn make_group(network: &str, station: &str, channels: &[&str]) -> StationGroup {
        StationGroup::new(
            channels
                .iter()
                .map(|channel| make_trace(network, station, channel))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn heterogeneous_tag_labels_are_a_consistency_error() {
        let groups = vec![
            make_group("CI", "CCC", &["HNZ"]).with_tag("evt_sta_A"),
            make_group("CI", "TOW", &["HNZ"]).with_tag("evt_sta_B"),
        ];
        let err = StreamCollection::new(groups, CollateConfig::default()).unwrap_err();
        assert!(matches!(err, CollateError::InconsistentTags(_)));
    }

    #[test]
    fn untagged_groups_conflict_with_tagged_ones() {
        let groups = vec![
            make_group("CI", "CCC", &["HNZ"]).with_tag("evt_sta_A"),
            make_group("CI", "TOW", &["HNZ"]),
        ];
        let err = StreamCollection::new(groups, CollateConfig::default()).unwrap_err();
        assert!(matches!(err, CollateError::InconsistentTags(_)));
    }

    #[test]
    fn malformed_tags_are_rejected() {
        let groups = vec![make_group("CI", "CCC", &["HNZ"]).with_tag("no-separators")];
        let err = StreamCollection::new(groups, CollateConfig::default()).unwrap_err();
        assert!(matches!(err, CollateError::MalformedTag(_)));
    }

    #[test]
    fn select_filters_by_glob_patterns() {
        let collection = StreamCollection::new(
            vec![
                make_group("CI", "CCC", &["HNZ", "HNE"]),
                make_group("CI", "TOW", &["HNZ"]),
                make_group("NC", "J051", &["BHZ"]),
            ],
            CollateConfig::default(),
        )
        .unwrap();

        assert_eq!(collection.select(Some("CI"), None, None).len(), 2);
        assert_eq!(collection.select(Some("N?"), None, None).len(), 1);
        assert_eq!(collection.select(None, Some("*C*"), None).len(), 1);
        assert_eq!(collection.select(None, None, Some("hn")).len(), 2);
        assert_eq!(collection.select(Some("XX"), None, None).len(), 0);
    }

    #[test]
    fn colocated_clusters_of_one_are_untouched() {
        let mut collection = StreamCollection::new(
            vec![make_group("CI", "CCC", &["HNZ", "HNE", "HNN"])],
            CollateConfig::default(),
        )
        .unwrap();
        collection.select_colocated();
        assert_eq!(collection.n_passed(), 1);
        assert_eq!(collection.n_failed(), 0);
    }

    #[test]
    fn colocated_without_preference_match_fails_whole_cluster() {
        let mut collection = StreamCollection::new(
            vec![
                make_group("CI", "CCC", &["ENZ", "ENE"]),
                make_group("CI", "CCC", &["EHZ"]),
            ],
            CollateConfig::default(),
        )
        .unwrap();
        collection.select_colocated();
        assert_eq!(collection.n_failed(), 2);
        for group in &collection {
            for trace in group {
                assert_eq!(
                    trace.failure_reason(),
                    Some(colocated::NO_PREFERENCE_MATCH_REASON)
                );
            }
        }
    }

    #[test]
    fn append_merges_into_existing_groups() {
        let mut collection = StreamCollection::new(
            vec![make_group("CI", "CCC", &["HNZ", "HNE"])],
            CollateConfig::default(),
        )
        .unwrap();
        collection
            .append(StationGroup::from(make_trace("CI", "CCC", "HNN")))
            .unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.groups()[0].len(), 3);
    }

    #[test]
    fn display_reports_pass_and_fail_counts() {
        let mut collection = StreamCollection::new(
            vec![
                make_group("CI", "CCC", &["HNZ"]),
                make_group("CI", "TOW", &["BNZ"]),
            ],
            CollateConfig::default(),
        )
        .unwrap();
        collection.groups[1].traces_mut()[0].fail("test");
        let rendered = collection.to_string();
        assert!(rendered.contains("2 station group(s) in collection:"));
        assert!(rendered.contains("1 group(s) passed checks."));
        assert!(rendered.contains("1 group(s) failed checks."));
    }

    #[test]
    fn tag_label_requires_three_components() {
        assert_eq!(tag_label("evt_CCC_default").unwrap(), "default");
        assert!(tag_label("evt_CCC").is_err());
        assert!(tag_label("evt_CCC_default_extra").is_err());
    }

    #[test]
    fn instrument_matching_uses_pattern_prefix() {
        assert!(instrument_matches("HN?", "HN"));
        assert!(instrument_matches("hn?", "HN"));
        assert!(instrument_matches("H??", "HN"));
        assert!(!instrument_matches("BN?", "HN"));
    }
}
