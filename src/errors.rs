use thiserror::Error;

use crate::types::TagLabel;

/// Error type for group construction, configuration, and consistency failures.
#[derive(Debug, Error)]
pub enum CollateError {
    #[error("station group requires at least one trace")]
    EmptyGroup,
    #[error("station group members mix identities: {0}")]
    MixedGroup(String),
    #[error("only one tag label allowed within a collection, found {0:?}")]
    InconsistentTags(Vec<TagLabel>),
    #[error("malformed tag '{0}': expected 'event_station_label'")]
    MalformedTag(String),
    #[error("process level '{level}' of trace '{trace_id}' is not in the preference list")]
    UnrankedProcessLevel { trace_id: String, level: String },
    #[error("trace '{trace_id}' has non-finite coordinates")]
    BadCoordinates { trace_id: String },
}
