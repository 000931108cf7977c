use crate::trace::ProcessLevel;

/// Constants used by the station grouping engine.
pub mod grouping {
    /// Networks that overload the location code to distinguish independent
    /// co-installed sensors (e.g. Bureau of Reclamation). Clusters from these
    /// networks are split into one group per distinct location code.
    pub const NETWORKS_USING_LOCATION: [&str; 1] = ["RE"];
}

/// Constants used by duplicate detection and preference resolution defaults.
pub mod dedup {
    use super::ProcessLevel;

    /// Default maximum surface distance in meters for near-duplicate matches.
    pub const DEFAULT_MAX_DIST_TOLERANCE_M: f64 = 500.0;
    /// Default process level ranking, most preferred first.
    pub const DEFAULT_PROCESS_LEVEL_PREFERENCE: [ProcessLevel; 3] = [
        ProcessLevel::UncorrectedUnits,
        ProcessLevel::RawCounts,
        ProcessLevel::CorrectedUnits,
    ];
    /// Default source format ranking, most preferred first.
    pub const DEFAULT_FORMAT_PREFERENCE: [&str; 2] = ["cosmos", "dmg"];
}

/// Constants used by colocated instrument selection.
pub mod colocated {
    /// Default instrument preference patterns, most preferred first.
    pub const DEFAULT_PREFERENCE: [&str; 4] = ["HN?", "BN?", "HH?", "BH?"];
    /// Failure reason used when no preference pattern matches a cluster.
    pub const NO_PREFERENCE_MATCH_REASON: &str =
        "no instruments match entries in the colocated instrument preference list for this station";
}

/// Constants used by trace annotation stores.
pub mod params {
    /// Annotation key that marks a trace as failed and stores the reason.
    pub const FAILURE_KEY: &str = "failure";
}

/// Constants used by free-field classification.
pub mod station {
    /// Structure-type words that disqualify a sensor from free-field status.
    pub const NON_FREE_STRUCTURES: [&str; 11] = [
        "building",
        "bridge",
        "dam",
        "borehole",
        "hole",
        "crest",
        "toe",
        "foundation",
        "body",
        "roof",
        "floor",
    ];
}
