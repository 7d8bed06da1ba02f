//! Single-point offset strategy.
//!
//! Each point is pushed along the left normal of its local tangent
//! (`next - prev`) by `offset_step * count`, where `count` is how many times
//! the point's key has been visited up to and including this step. A point
//! revisited three times therefore lands on three different parallel lanes.

use log::debug;

use crate::error::{ensure_len, Result};
use crate::geo_utils::{displace, left_normal};
use crate::keys::{PositionKey, VisitCounter};
use crate::{OffsetConfig, Position};

/// Offset every point by its running visit count.
///
/// The output has the same length as the input. Points whose neighbourhood
/// has zero length (an isolated point, or prev == next) are returned
/// unchanged and do not advance the visit count.
///
/// Returns an error for an empty trace.
///
/// # Example
/// ```
/// use trace_deoverlap::{Position, OffsetConfig, single_point_offset};
///
/// let trace = vec![
///     Position::new(0.0, 0.0),
///     Position::new(1.0, 0.0),
///     Position::new(1.0, 0.0),
///     Position::new(0.0, 0.0),
/// ];
/// let out = single_point_offset(&trace, &OffsetConfig::default()).unwrap();
/// assert_eq!(out.len(), 4);
/// // The repeated [1, 0] lands on two different lanes
/// assert_ne!(out[1], out[2]);
/// ```
pub fn single_point_offset(points: &[Position], config: &OffsetConfig) -> Result<Vec<Position>> {
    ensure_len(points, 1)?;

    let mut visits = VisitCounter::new();
    let last = points.len() - 1;

    let result: Vec<Position> = points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let prev = if i == 0 { point } else { &points[i - 1] };
            let next = if i == last { point } else { &points[i + 1] };

            let Some(normal) = left_normal(
                next.longitude - prev.longitude,
                next.latitude - prev.latitude,
            ) else {
                return point.clone();
            };

            let count = visits.visit(PositionKey::of(point));
            displace(point, normal, config.offset_step * count as f64)
        })
        .collect();

    debug!(
        "single point offset: {} points, {} distinct",
        points.len(),
        visits.distinct()
    );

    Ok(result)
}
