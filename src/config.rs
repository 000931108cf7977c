use crate::constants::{colocated, dedup};
use crate::trace::ProcessLevel;
use crate::types::FormatName;

/// Collation behavior supplied to a collection at construction time.
///
/// There is no ambient fallback: the collection keeps the config it was
/// given and every pass reads from it.
#[derive(Clone, Debug)]
pub struct CollateConfig {
    /// Drop groups whose first trace is not free-field during ingest.
    pub drop_non_free: bool,
    /// Detect and resolve duplicate traces during construction.
    pub handle_duplicates: bool,
    /// Maximum surface distance in meters at which two traces with matching
    /// channel codes are considered recordings of the same physical channel.
    pub max_dist_tolerance: f64,
    /// Process levels ranked most preferred first.
    ///
    /// Every level that reaches preference resolution must appear here;
    /// an unranked level is surfaced as a configuration error.
    pub process_level_preference: Vec<ProcessLevel>,
    /// Source formats ranked most preferred first. Formats may be omitted;
    /// the format stage is skipped unless both candidates are ranked.
    pub format_preference: Vec<FormatName>,
    /// Instrument glob patterns ranked most preferred first, used when
    /// selecting among colocated instruments.
    pub colocated_preference: Vec<String>,
}

impl Default for CollateConfig {
    fn default() -> Self {
        Self {
            drop_non_free: true,
            handle_duplicates: true,
            max_dist_tolerance: dedup::DEFAULT_MAX_DIST_TOLERANCE_M,
            process_level_preference: dedup::DEFAULT_PROCESS_LEVEL_PREFERENCE.to_vec(),
            format_preference: dedup::DEFAULT_FORMAT_PREFERENCE
                .iter()
                .map(|format| format.to_string())
                .collect(),
            colocated_preference: colocated::DEFAULT_PREFERENCE
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
        }
    }
}
