use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::CollateError;
use crate::grouping::uses_location_codes;
use crate::trace::{ParamValue, StationTrace};
use crate::types::{GroupId, InstrumentCode, ParamKey};

/// An ordered set of traces from one station/instrument deployment.
///
/// All members share network, station, instrument code, and free-field
/// status; for networks that overload the location code, the location code
/// as well. Groups also carry metadata that belongs to the deployment rather
/// than any single trace: an optional tag and a group-scoped parameter map,
/// both preserved by the collection across regroup cycles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StationGroup {
    traces: Vec<StationTrace>,
    tag: Option<String>,
    parameters: IndexMap<ParamKey, ParamValue>,
}

impl StationGroup {
    /// Build a group from traces, validating the shared-identity invariant.
    pub fn new(traces: Vec<StationTrace>) -> Result<Self, CollateError> {
        let first = traces.first().ok_or(CollateError::EmptyGroup)?;
        let instrument = first.instrument();
        let free_field = first.free_field();
        for trace in &traces[1..] {
            if trace.network != first.network
                || trace.station != first.station
                || trace.instrument() != instrument
                || trace.free_field() != free_field
            {
                return Err(CollateError::MixedGroup(format!(
                    "trace '{}' does not belong with '{}'",
                    trace.id(),
                    first.id()
                )));
            }
            if uses_location_codes(&first.network) && trace.location != first.location {
                return Err(CollateError::MixedGroup(format!(
                    "network '{}' separates sensors by location code, '{}' and '{}' differ",
                    first.network,
                    trace.id(),
                    first.id()
                )));
            }
        }
        Ok(Self::from_members(traces))
    }

    /// Internal constructor for members already known to share identity.
    pub(crate) fn from_members(traces: Vec<StationTrace>) -> Self {
        debug_assert!(!traces.is_empty(), "groups are never empty");
        Self {
            traces,
            tag: None,
            parameters: IndexMap::new(),
        }
    }

    /// Attach a tag, builder style.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Canonical group identifier.
    ///
    /// `NET.STA.INST`, with the location code appended for networks that
    /// distinguish co-installed sensors by location so split sub-groups
    /// keep distinct identities.
    pub fn id(&self) -> GroupId {
        let Some(first) = self.traces.first() else {
            return GroupId::new();
        };
        let mut id = format!("{}.{}.{}", first.network, first.station, first.instrument());
        if uses_location_codes(&first.network) {
            id.push('.');
            id.push_str(&first.location);
        }
        id
    }

    /// Network and station identity, `NET.STA`.
    pub fn net_sta(&self) -> String {
        self.traces
            .first()
            .map(|trace| format!("{}.{}", trace.network, trace.station))
            .unwrap_or_default()
    }

    /// Network code shared by all members.
    pub fn network(&self) -> &str {
        self.traces.first().map(|t| t.network.as_str()).unwrap_or("")
    }

    /// Station code shared by all members.
    pub fn station(&self) -> &str {
        self.traces.first().map(|t| t.station.as_str()).unwrap_or("")
    }

    /// Instrument code shared by all members.
    pub fn instrument(&self) -> InstrumentCode {
        self.traces
            .first()
            .map(StationTrace::instrument)
            .unwrap_or_default()
    }

    /// Whether every member trace is free of failure annotations.
    pub fn passed(&self) -> bool {
        !self.traces.iter().any(StationTrace::failed)
    }

    /// The group tag, if set.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Set or replace the group tag.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = Some(tag.into());
    }

    /// Group-scoped parameters in insertion order.
    pub fn parameters(&self) -> &IndexMap<ParamKey, ParamValue> {
        &self.parameters
    }

    /// Set a group-scoped parameter.
    pub fn set_parameter(&mut self, key: impl Into<ParamKey>, value: impl Into<ParamValue>) {
        self.parameters.insert(key.into(), value.into());
    }

    /// Look up a group-scoped parameter.
    pub fn parameter(&self, key: &str) -> Option<&ParamValue> {
        self.parameters.get(key)
    }

    pub(crate) fn set_parameters(&mut self, parameters: IndexMap<ParamKey, ParamValue>) {
        self.parameters = parameters;
    }

    /// Number of member traces.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Whether the group has no members. Never true for constructed groups.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// First member trace.
    pub fn first(&self) -> Option<&StationTrace> {
        self.traces.first()
    }

    /// Iterate over member traces in order.
    pub fn iter(&self) -> std::slice::Iter<'_, StationTrace> {
        self.traces.iter()
    }

    /// Member traces in order.
    pub fn traces(&self) -> &[StationTrace] {
        &self.traces
    }

    /// Mutable access to member traces for annotation.
    ///
    /// Membership itself can only change through the grouping engine.
    pub fn traces_mut(&mut self) -> &mut [StationTrace] {
        &mut self.traces
    }

    /// Consume the group, yielding its traces.
    pub fn into_traces(self) -> Vec<StationTrace> {
        self.traces
    }
}

impl From<StationTrace> for StationGroup {
    fn from(trace: StationTrace) -> Self {
        Self::from_members(vec![trace])
    }
}

impl<'a> IntoIterator for &'a StationGroup {
    type Item = &'a StationTrace;
    type IntoIter = std::slice::Iter<'a, StationTrace>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_trace(network: &str, station: &str, channel: &str, location: &str) -> StationTrace {
        StationTrace {
            network: network.to_string(),
            station: station.to_string(),
            channel: channel.to_string(),
            location: location.to_string(),
            sampling_rate: 100.0,
            sample_count: 2000,
            ..StationTrace::default()
        }
    }

    #[test]
    fn new_accepts_matching_members() {
        let group = StationGroup::new(vec![
            make_trace("CI", "CCC", "HNZ", "--"),
            make_trace("CI", "CCC", "HNE", "--"),
            make_trace("CI", "CCC", "HNN", "--"),
        ])
        .unwrap();
        assert_eq!(group.len(), 3);
        assert_eq!(group.id(), "CI.CCC.HN");
        assert_eq!(group.net_sta(), "CI.CCC");
        assert_eq!(group.instrument(), "HN");
        assert!(group.passed());
    }

    #[test]
    fn new_rejects_empty_and_mixed_members() {
        assert!(matches!(
            StationGroup::new(Vec::new()),
            Err(CollateError::EmptyGroup)
        ));
        let mixed = StationGroup::new(vec![
            make_trace("CI", "CCC", "HNZ", "--"),
            make_trace("CI", "CCC", "BNZ", "--"),
        ]);
        assert!(matches!(mixed, Err(CollateError::MixedGroup(_))));
    }

    #[test]
    fn new_rejects_mixed_free_field_members() {
        let mut housed = make_trace("CI", "CCC", "HNE", "--");
        housed.structure_type = "building".to_string();
        let mixed = StationGroup::new(vec![make_trace("CI", "CCC", "HNZ", "--"), housed]);
        assert!(matches!(mixed, Err(CollateError::MixedGroup(_))));
    }

    #[test]
    fn location_codes_split_identity_only_for_exception_networks() {
        // RE overloads location codes; mixing them in one group is an error.
        let split = StationGroup::new(vec![
            make_trace("RE", "1737", "HNZ", "10"),
            make_trace("RE", "1737", "HNE", "20"),
        ]);
        assert!(matches!(split, Err(CollateError::MixedGroup(_))));

        let re_group = StationGroup::new(vec![
            make_trace("RE", "1737", "HNZ", "10"),
            make_trace("RE", "1737", "HNE", "10"),
        ])
        .unwrap();
        assert_eq!(re_group.id(), "RE.1737.HN.10");

        // Other networks may mix location codes within a group.
        let ci_group = StationGroup::new(vec![
            make_trace("CI", "CCC", "HNZ", "10"),
            make_trace("CI", "CCC", "HNE", "20"),
        ])
        .unwrap();
        assert_eq!(ci_group.id(), "CI.CCC.HN");
    }

    #[test]
    fn passed_reflects_member_failures() {
        let mut group = StationGroup::new(vec![
            make_trace("CI", "CCC", "HNZ", "--"),
            make_trace("CI", "CCC", "HNE", "--"),
        ])
        .unwrap();
        assert!(group.passed());
        group.traces_mut()[1].fail("clipped");
        assert!(!group.passed());
    }

    #[test]
    fn tag_and_parameters_are_group_scoped() {
        let mut group = StationGroup::from(make_trace("CI", "CCC", "HNZ", "--"))
            .with_tag("evt01_CCC_default");
        assert_eq!(group.tag(), Some("evt01_CCC_default"));

        group.set_parameter("reviewed", true);
        assert_eq!(group.parameter("reviewed"), Some(&ParamValue::Bool(true)));
        assert!(group.first().unwrap().parameters.is_empty());
    }
}
