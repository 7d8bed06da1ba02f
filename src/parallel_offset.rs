//! Polyline parallel offset.
//!
//! Wraps cavalier_contours' open-polyline offset: the result is the one-sided
//! buffer boundary of the input at the requested distance, with round joins at
//! convex vertices (arcs are flattened back to line segments) and
//! self-intersections of the raw offset trimmed away.
//!
//! Coordinates are degrees; cavalier's fuzzy epsilons assume unit-scale
//! geometry, so the line is moved to a local origin and uniformly scaled to
//! roughly meters before offsetting, and mapped back afterwards. Uniform
//! scaling keeps the shape and the distance ratio exact.

use cavalier_contours::polyline::{
    PlineOffsetOptions, PlineSource, PlineSourceMut, PlineVertex, Polyline,
};
use geo::{Coord, LineString};
use log::debug;

use crate::error::{DeoverlapError, Result};

/// Degrees to local planar units (meters per degree at the equator).
const PLANAR_SCALE: f64 = 111_320.0;

/// Maximum distance between a flattened join and the true arc, local units.
const ARC_ERROR_DISTANCE: f64 = 0.01;

/// Vertices closer than this (local units) are merged before offsetting.
const VERTEX_MERGE_EPS: f64 = 1e-6;

/// Offset `line` by `distance` degrees; positive is to the left of travel.
///
/// Returns [`DeoverlapError::DegenerateGeometry`] when the line has fewer than
/// two distinct vertices and [`DeoverlapError::OffsetFailure`] when the offset
/// produces no curve. When the trimmed offset falls apart into several pieces
/// they are concatenated in the order cavalier reports them.
///
/// ```
/// use geo::{Coord, LineString};
/// use trace_deoverlap::parallel_offset::offset_line_string;
///
/// let line = LineString::from(vec![(0.0, 0.0), (0.001, 0.0)]);
/// let offset = offset_line_string(&line, 0.0001).unwrap();
/// assert!(offset.0.iter().all(|c: &Coord| (c.y - 0.0001).abs() < 1e-9));
/// ```
pub fn offset_line_string(line: &LineString, distance: f64) -> Result<LineString> {
    let Some(origin) = line.0.first().copied() else {
        return Err(DeoverlapError::DegenerateGeometry);
    };

    let mut polyline: Polyline<f64> = Polyline::new();
    for c in line.coords() {
        let x = (c.x - origin.x) * PLANAR_SCALE;
        let y = (c.y - origin.y) * PLANAR_SCALE;
        if let Some(last) = polyline.last() {
            if (last.x - x).hypot(last.y - y) <= VERTEX_MERGE_EPS {
                continue;
            }
        }
        polyline.add_vertex(PlineVertex::new(x, y, 0.0));
    }

    if polyline.vertex_count() < 2 {
        return Err(DeoverlapError::DegenerateGeometry);
    }

    let options = PlineOffsetOptions {
        handle_self_intersects: true,
        ..Default::default()
    };
    let pieces = polyline.parallel_offset_opt(distance * PLANAR_SCALE, &options);
    if pieces.is_empty() {
        return Err(DeoverlapError::OffsetFailure(
            "offset produced no polyline".to_string(),
        ));
    }
    if pieces.len() > 1 {
        debug!("parallel offset split into {} pieces", pieces.len());
    }

    let mut coords = Vec::new();
    for piece in &pieces {
        let flattened = piece.arcs_to_approx_lines(ARC_ERROR_DISTANCE).ok_or_else(|| {
            DeoverlapError::OffsetFailure("arc flattening failed".to_string())
        })?;
        coords.extend(flattened.iter_vertexes().map(|v| Coord {
            x: v.x / PLANAR_SCALE + origin.x,
            y: v.y / PLANAR_SCALE + origin.y,
        }));
    }

    if coords.len() < 2 {
        return Err(DeoverlapError::OffsetFailure(format!(
            "offset produced {} vertex",
            coords.len()
        )));
    }

    Ok(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_straight_line_left_and_right() {
        let line = LineString::from(vec![(10.0, 50.0), (10.001, 50.0), (10.002, 50.0)]);

        let left = offset_line_string(&line, 0.00002).unwrap();
        assert!(left.0.iter().all(|c| approx_eq(c.y, 50.00002, 1e-9)));

        let right = offset_line_string(&line, -0.00002).unwrap();
        assert!(right.0.iter().all(|c| approx_eq(c.y, 49.99998, 1e-9)));

        let first = left.0.first().unwrap();
        let last = left.0.last().unwrap();
        assert!(approx_eq(first.x, 10.0, 1e-9));
        assert!(approx_eq(last.x, 10.002, 1e-9));
    }

    #[test]
    fn test_corner_keeps_distance() {
        // East then north, offset to the outside (right) of the turn
        let line = LineString::from(vec![(0.0, 0.0), (0.001, 0.0), (0.001, 0.001)]);
        let d = 0.0001;
        let offset = offset_line_string(&line, -d).unwrap();
        assert!(offset.0.len() >= 4); // round join adds vertices
        let corner = Coord { x: 0.001, y: 0.0 };
        for c in offset.0.iter() {
            let to_corner = (c.x - corner.x).hypot(c.y - corner.y);
            // Nothing comes closer to the source line than the offset distance
            assert!(to_corner >= d * 0.999);
        }
    }

    #[test]
    fn test_duplicate_vertices_merged() {
        let line = LineString::from(vec![(0.0, 0.0), (0.0, 0.0), (0.001, 0.0), (0.001, 0.0)]);
        let offset = offset_line_string(&line, 0.00001).unwrap();
        assert_eq!(offset.0.len(), 2);
    }

    #[test]
    fn test_degenerate_line() {
        let line = LineString::from(vec![(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]);
        assert_eq!(
            offset_line_string(&line, 0.00001),
            Err(DeoverlapError::DegenerateGeometry)
        );
        let empty = LineString::<f64>::new(vec![]);
        assert_eq!(
            offset_line_string(&empty, 0.00001),
            Err(DeoverlapError::DegenerateGeometry)
        );
    }
}
