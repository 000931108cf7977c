use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{params, station};
use crate::types::{
    ChannelCode, FormatName, InstrumentCode, LocationCode, NetworkCode, ParamKey, StationCode,
};

/// Coarse processing maturity of an ingested recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessLevel {
    /// Raw digitizer counts (V0).
    RawCounts,
    /// Uncorrected physical units (V1).
    UncorrectedUnits,
    /// Corrected physical units (V2).
    CorrectedUnits,
    /// Derived time series such as spectra (V3).
    DerivedSeries,
}

impl ProcessLevel {
    /// Short archive code for this level.
    pub const fn code(self) -> &'static str {
        match self {
            ProcessLevel::RawCounts => "V0",
            ProcessLevel::UncorrectedUnits => "V1",
            ProcessLevel::CorrectedUnits => "V2",
            ProcessLevel::DerivedSeries => "V3",
        }
    }

    /// Parse a short archive code (`V0`..`V3`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "V0" => Some(ProcessLevel::RawCounts),
            "V1" => Some(ProcessLevel::UncorrectedUnits),
            "V2" => Some(ProcessLevel::CorrectedUnits),
            "V3" => Some(ProcessLevel::DerivedSeries),
            _ => None,
        }
    }

    /// Human-readable description of this level.
    pub const fn description(self) -> &'static str {
        match self {
            ProcessLevel::RawCounts => "raw counts",
            ProcessLevel::UncorrectedUnits => "uncorrected physical units",
            ProcessLevel::CorrectedUnits => "corrected physical units",
            ProcessLevel::DerivedSeries => "derived time series",
        }
    }
}

impl fmt::Display for ProcessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Annotation value stored in a trace or group parameter store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Free-form text, e.g. a failure reason.
    Text(String),
}

impl ParamValue {
    /// Return the text payload when this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// A single-channel waveform recording with identity, physical attributes,
/// and an annotation store.
///
/// Waveform samples themselves live with the ingestion layer; this record
/// carries what grouping, deduplication, and downstream metric selection
/// need to know about the recording.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StationTrace {
    /// Network code.
    pub network: NetworkCode,
    /// Station code.
    pub station: StationCode,
    /// Channel code; the first two characters identify the instrument.
    pub channel: ChannelCode,
    /// Location code.
    pub location: LocationCode,
    /// Station latitude in degrees.
    pub latitude: f64,
    /// Station longitude in degrees.
    pub longitude: f64,
    /// Number of samples in the recording.
    pub sample_count: u64,
    /// Sampling rate in Hz.
    pub sampling_rate: f64,
    /// Recording start time; the Unix epoch is the "unset" sentinel.
    pub start_time: DateTime<Utc>,
    /// Processing maturity of the recording.
    pub process_level: ProcessLevel,
    /// Name of the ingestion format that produced this record.
    pub source_format: FormatName,
    /// Structure the sensor is mounted on; empty means free-field.
    pub structure_type: String,
    /// Tag stamped by the collection before a flatten/regroup cycle so the
    /// group tag survives the rebuild. Not meaningful outside that cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Arbitrary annotations, including the failure marker.
    #[serde(default)]
    pub parameters: IndexMap<ParamKey, ParamValue>,
}

impl Default for StationTrace {
    fn default() -> Self {
        Self {
            network: String::new(),
            station: String::new(),
            channel: String::new(),
            location: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            sample_count: 0,
            sampling_rate: 0.0,
            start_time: DateTime::<Utc>::UNIX_EPOCH,
            process_level: ProcessLevel::RawCounts,
            source_format: String::new(),
            structure_type: String::new(),
            tag: None,
            parameters: IndexMap::new(),
        }
    }
}

impl StationTrace {
    /// Full channel identifier, `NET.STA.LOC.CHA`.
    pub fn id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }

    /// Instrument code: the first two characters of the channel code.
    pub fn instrument(&self) -> InstrumentCode {
        self.channel.chars().take(2).collect()
    }

    /// Whether this sensor is free-field.
    ///
    /// A sensor mounted on or in a structure that can distort ground motion
    /// is not free-field. Unknown or empty structure types default to
    /// free-field.
    pub fn free_field(&self) -> bool {
        let structure = self.structure_type.to_lowercase();
        !station::NON_FREE_STRUCTURES
            .iter()
            .any(|word| structure.contains(word))
    }

    /// Set an annotation, replacing any previous value under the same key.
    pub fn set_parameter(&mut self, key: impl Into<ParamKey>, value: impl Into<ParamValue>) {
        self.parameters.insert(key.into(), value.into());
    }

    /// Look up an annotation by key.
    pub fn parameter(&self, key: &str) -> Option<&ParamValue> {
        self.parameters.get(key)
    }

    /// Whether an annotation is set under `key`.
    pub fn has_parameter(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    /// Annotation keys in insertion order.
    pub fn parameter_keys(&self) -> Vec<&str> {
        self.parameters.keys().map(String::as_str).collect()
    }

    /// Mark this trace as failed for `reason`.
    ///
    /// The trace stays in its collection; downstream consumers skip failed
    /// traces and can inspect the reason.
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        info!(trace_id = %self.id(), %reason, "trace failed check");
        self.parameters
            .insert(params::FAILURE_KEY.to_string(), ParamValue::Text(reason));
    }

    /// Whether this trace carries a failure annotation.
    pub fn failed(&self) -> bool {
        self.has_parameter(params::FAILURE_KEY)
    }

    /// The recorded failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        self.parameter(params::FAILURE_KEY)
            .and_then(ParamValue::as_text)
    }
}

impl fmt::Display for StationTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {:.1} Hz, {} samples ({})",
            self.id(),
            self.sampling_rate,
            self.sample_count,
            if self.failed() { "failed" } else { "passed" }
        )
    }
}
