//! Edge-based offset strategies.
//!
//! [`pair_offset`] treats every consecutive pair of points as its own
//! two-point line and shifts it by the running count of its directed edge.
//! Shared vertices are duplicated, so the result is `n - 1` independent
//! segments.
//!
//! [`averaged_pair_offset`] starts from the same segments and stitches them
//! back into one continuous line: each interior vertex becomes the midpoint of
//! the two offsets its incident edges proposed for it.

use log::debug;

use crate::error::{ensure_len, Result};
use crate::geo_utils::{displace, left_normal, midpoint};
use crate::keys::{EdgeKey, VisitCounter};
use crate::{OffsetConfig, Position};

/// A two-point line produced by [`pair_offset`].
pub type Segment = [Position; 2];

/// Offset every edge by its running traversal count.
///
/// Every edge advances the count of its key, but zero-length edges are
/// emitted unmodified. An edge shorter than the key precision shares its key
/// with the zero-length edge before it and lands one lane further out.
/// Requires at least two points.
///
/// # Example
/// ```
/// use trace_deoverlap::{Position, OffsetConfig, pair_offset};
///
/// let trace = vec![
///     Position::new(0.0, 0.0),
///     Position::new(1.0, 0.0),
///     Position::new(0.0, 0.0),
///     Position::new(1.0, 0.0),
/// ];
/// let segments = pair_offset(&trace, &OffsetConfig::default()).unwrap();
/// assert_eq!(segments.len(), 3);
/// // Second eastward traversal sits two steps to the left
/// assert!(segments[2][0].latitude > segments[0][0].latitude);
/// ```
pub fn pair_offset(points: &[Position], config: &OffsetConfig) -> Result<Vec<Segment>> {
    ensure_len(points, 2)?;

    let mut visits = VisitCounter::new();

    let segments: Vec<Segment> = points
        .windows(2)
        .map(|w| {
            let (start, end) = (&w[0], &w[1]);
            let count = visits.visit(EdgeKey::of(start, end));

            let Some(normal) = left_normal(
                end.longitude - start.longitude,
                end.latitude - start.latitude,
            ) else {
                return [start.clone(), end.clone()];
            };

            let offset = config.offset_step * count as f64;
            [displace(start, normal, offset), displace(end, normal, offset)]
        })
        .collect();

    debug!(
        "pair offset: {} segments, {} distinct edges",
        segments.len(),
        visits.distinct()
    );

    Ok(segments)
}

/// Offset every edge, then reconcile shared vertices into one continuous line.
///
/// Output length equals input length. The first and last points are the outer
/// endpoints of the first and last edge segments; every interior point is the
/// midpoint of the end of its incoming segment and the start of its outgoing
/// segment. Requires at least two points.
pub fn averaged_pair_offset(points: &[Position], config: &OffsetConfig) -> Result<Vec<Position>> {
    let segments = pair_offset(points, config)?;

    let mut result = Vec::with_capacity(points.len());
    result.push(segments[0][0].clone());
    result.extend(
        segments
            .windows(2)
            .map(|pair| midpoint(&pair[0][1], &pair[1][0])),
    );
    result.push(segments[segments.len() - 1][1].clone());

    Ok(result)
}
