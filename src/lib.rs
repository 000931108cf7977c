#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Collection container and lifecycle orchestration.
pub mod collection;
/// Collation configuration types.
pub mod config;
/// Centralized constants used across grouping, dedup, and colocated selection.
pub mod constants;
/// Duplicate detection and preference resolution.
pub mod dedup;
/// Station group container and invariants.
pub mod group;
/// Station grouping engine.
pub mod grouping;
/// Aggregate collection metrics helpers.
pub mod summary;
/// Trace record and annotation types.
pub mod trace;
/// Shared type aliases.
pub mod types;
/// Pattern matching helpers.
pub mod utils;

mod errors;

pub use collection::StreamCollection;
pub use config::CollateConfig;
pub use dedup::{Preferred, are_duplicates, choose_preferred, preferred_of, surface_distance_m};
pub use errors::CollateError;
pub use group::StationGroup;
pub use grouping::{group_traces, uses_location_codes};
pub use summary::{CollectionSummary, NetworkShare, collection_summary};
pub use trace::{ParamValue, ProcessLevel, StationTrace};
pub use types::{
    ChannelCode, FormatName, GroupId, InstrumentCode, LocationCode, NetworkCode, ParamKey,
    StationCode, TagLabel,
};
