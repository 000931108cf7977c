//! Duplicate detection and preference resolution.
//!
//! Duplicate recordings of one physical channel arrive through different
//! ingestion paths, typically from another agency or in another file
//! format. Detection is by exact identity or by identical channel codes
//! within a surface-distance tolerance; resolution is a deterministic
//! cascade that always keeps exactly one of the two candidates.

use chrono::{DateTime, Utc};
use geo::{Distance, Haversine, Point};

use crate::errors::CollateError;
use crate::trace::{ProcessLevel, StationTrace};
use crate::types::FormatName;

/// Which of two candidate traces survives preference resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preferred {
    /// The first argument survives.
    First,
    /// The second argument survives.
    Second,
}

/// Great-circle surface distance between two trace sites, in meters.
///
/// Non-finite coordinates are a hard error rather than a silent
/// non-match; bad site metadata must surface, not shape dedup decisions.
pub fn surface_distance_m(a: &StationTrace, b: &StationTrace) -> Result<f64, CollateError> {
    for trace in [a, b] {
        if !trace.latitude.is_finite() || !trace.longitude.is_finite() {
            return Err(CollateError::BadCoordinates {
                trace_id: trace.id(),
            });
        }
    }
    let site_a = Point::new(a.longitude, a.latitude);
    let site_b = Point::new(b.longitude, b.latitude);
    Ok(Haversine::distance(site_a, site_b))
}

/// Whether two traces record the same physical channel.
///
/// True when the full identity tuples match, or when station, location, and
/// channel codes all match and the sites lie within `max_dist_tolerance`
/// meters of each other. The distance path propagates coordinate errors.
pub fn are_duplicates(
    a: &StationTrace,
    b: &StationTrace,
    max_dist_tolerance: f64,
) -> Result<bool, CollateError> {
    if a.id() == b.id() {
        return Ok(true);
    }
    let distance = surface_distance_m(a, b)?;
    Ok(a.station == b.station
        && a.location == b.location
        && a.channel == b.channel
        && distance < max_dist_tolerance)
}

fn process_level_rank(
    trace: &StationTrace,
    preference: &[ProcessLevel],
) -> Result<usize, CollateError> {
    preference
        .iter()
        .position(|level| *level == trace.process_level)
        .ok_or_else(|| CollateError::UnrankedProcessLevel {
            trace_id: trace.id(),
            level: trace.process_level.code().to_string(),
        })
}

/// Decide which of two duplicate candidates survives.
///
/// Cascade, each stage consulted only on an exact tie of the previous one:
/// process level rank, source format rank (only when both formats are
/// ranked), epoch-zero start-time sentinel, sample count, sampling rate.
/// A full tie keeps the first argument. The decision does not depend on
/// argument order: swapping the arguments swaps the answer.
pub fn preferred_of(
    a: &StationTrace,
    b: &StationTrace,
    process_level_preference: &[ProcessLevel],
    format_preference: &[FormatName],
) -> Result<Preferred, CollateError> {
    let a_level = process_level_rank(a, process_level_preference)?;
    let b_level = process_level_rank(b, process_level_preference)?;
    if a_level < b_level {
        return Ok(Preferred::First);
    }
    if a_level > b_level {
        return Ok(Preferred::Second);
    }

    let a_format = format_preference
        .iter()
        .position(|format| *format == a.source_format);
    let b_format = format_preference
        .iter()
        .position(|format| *format == b.source_format);
    if let (Some(a_rank), Some(b_rank)) = (a_format, b_format) {
        if a_rank < b_rank {
            return Ok(Preferred::First);
        }
        if a_rank > b_rank {
            return Ok(Preferred::Second);
        }
    }

    // An epoch-zero start time means the field was never set.
    let epoch = DateTime::<Utc>::UNIX_EPOCH;
    match (a.start_time == epoch, b.start_time == epoch) {
        (true, false) => return Ok(Preferred::Second),
        (false, true) => return Ok(Preferred::First),
        _ => {}
    }

    if a.sample_count > b.sample_count {
        return Ok(Preferred::First);
    }
    if b.sample_count > a.sample_count {
        return Ok(Preferred::Second);
    }

    if b.sampling_rate > a.sampling_rate {
        Ok(Preferred::Second)
    } else {
        Ok(Preferred::First)
    }
}

/// Decide which of two duplicate candidates survives, returning the trace.
///
/// Always returns one of the two inputs.
pub fn choose_preferred<'a>(
    a: &'a StationTrace,
    b: &'a StationTrace,
    process_level_preference: &[ProcessLevel],
    format_preference: &[FormatName],
) -> Result<&'a StationTrace, CollateError> {
    Ok(
        match preferred_of(a, b, process_level_preference, format_preference)? {
            Preferred::First => a,
            Preferred::Second => b,
        },
    )
}
