//! # Run Segmentation
//!
//! Offsets whole stretches of repeated road instead of individual points.
//!
//! ## Algorithm
//! 1. Count the total occurrences of every directed edge in the trace
//! 2. Scan left to right for maximal runs of consecutive edges that each
//!    occur more than once somewhere in the trace
//! 3. Give each run a lane: the k-th appearance of the exact same run content
//!    (same sequence of position keys) is offset by `offset_step * k`, using a
//!    true parallel curve so that turns keep a constant distance
//! 4. Stitch: copy non-run points through, replace each run by its offset
//!    curve, and drop points that would exactly repeat the previous one
//!
//! A run whose offset fails (degenerate or empty result) is emitted with its
//! original coordinates.

use geo::{Coord, LineString};
use log::{debug, warn};

use crate::error::{ensure_len, Result};
use crate::keys::{edge_totals, EdgeKey, PositionKey, VisitCounter};
use crate::parallel_offset::offset_line_string;
use crate::{OffsetConfig, Position};

/// A maximal stretch of repeated edges, as inclusive point indices.
///
/// Every edge `start -> start + 1`, ..., `end - 1 -> end` occurs more than once
/// in the trace. `end > start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub end: usize,
}

impl Run {
    /// Number of points in the run.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Runs always hold at least one edge.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Indices of the run's outgoing edges (edge `i` joins points `i` and `i + 1`).
    pub fn edge_range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// The run's positions.
    pub fn slice<'a>(&self, points: &'a [Position]) -> &'a [Position] {
        &points[self.start..=self.end]
    }
}

/// Find the maximal runs of repeated edges, ordered by start index.
///
/// Runs never overlap: the edge that ends one run is, by construction, not
/// repeated.
///
/// ```
/// use trace_deoverlap::{Position, Run, detect_runs};
///
/// // A, B, C, B, C, D
/// let trace: Vec<Position> = [0.0, 1.0, 2.0, 1.0, 2.0, 3.0]
///     .iter()
///     .map(|&x| Position::new(x, 0.0))
///     .collect();
/// let runs = detect_runs(&trace);
/// assert_eq!(runs, vec![Run { start: 1, end: 2 }, Run { start: 3, end: 4 }]);
/// ```
pub fn detect_runs(points: &[Position]) -> Vec<Run> {
    let totals = edge_totals(points);
    let repeated = |i: usize| {
        totals
            .get(&EdgeKey::of(&points[i], &points[i + 1]))
            .is_some_and(|&count| count > 1)
    };

    let edge_count = points.len().saturating_sub(1);
    let mut runs = Vec::new();
    let mut i = 0;
    while i < edge_count {
        if !repeated(i) {
            i += 1;
            continue;
        }
        let start = i;
        while i < edge_count && repeated(i) {
            i += 1;
        }
        runs.push(Run { start, end: i });
    }
    runs
}

/// Offset each run of repeated edges as a parallel curve and stitch the
/// result back into a single line.
///
/// Requires at least two points. The output length varies: joins add
/// vertices, and points that would exactly repeat the previously emitted point
/// outside a run are dropped.
pub fn run_segment_offset(points: &[Position], config: &OffsetConfig) -> Result<Vec<Position>> {
    ensure_len(points, 2)?;

    let runs = detect_runs(points);
    debug!("run segmentation: {} runs over {} points", runs.len(), points.len());

    let mut appearances: VisitCounter<Vec<PositionKey>> = VisitCounter::new();
    let mut result: Vec<Position> = Vec::with_capacity(points.len());
    let mut next_run = runs.iter().peekable();
    let mut i = 0;

    while i < points.len() {
        match next_run.next_if(|run| run.start == i) {
            Some(run) => {
                let content = run.slice(points);
                let lane = appearances.visit(content.iter().map(PositionKey::of).collect());
                let curve = offset_run(content, config.offset_step * lane as f64);

                let mut curve = curve.into_iter();
                if let Some(first) = curve.next() {
                    push_unless_repeat(&mut result, first);
                }
                result.extend(curve);
                i = run.end + 1;
            }
            None => {
                push_unless_repeat(&mut result, points[i].clone());
                i += 1;
            }
        }
    }

    Ok(result)
}

/// Parallel curve of `content` at `distance`, or `content` itself on failure.
fn offset_run(content: &[Position], distance: f64) -> Vec<Position> {
    let line: LineString = content
        .iter()
        .map(|p| Coord { x: p.longitude, y: p.latitude })
        .collect();

    match offset_line_string(&line, distance) {
        Ok(offset) => offset
            .0
            .iter()
            .enumerate()
            .map(|(j, c)| content[j.min(content.len() - 1)].moved_to(c.x, c.y))
            .collect(),
        Err(err) => {
            warn!(
                "run of {} points kept unmodified: {}",
                content.len(),
                err
            );
            content.to_vec()
        }
    }
}

fn push_unless_repeat(result: &mut Vec<Position>, position: Position) {
    let repeat = result
        .last()
        .is_some_and(|last| PositionKey::of(last) == PositionKey::of(&position));
    if !repeat {
        result.push(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(coords: &[(f64, f64)]) -> Vec<Position> {
        coords.iter().map(|&(lon, lat)| Position::new(lon, lat)).collect()
    }

    fn distance_to_segment(p: &Position, a: (f64, f64), b: (f64, f64)) -> f64 {
        let (abx, aby) = (b.0 - a.0, b.1 - a.1);
        let t = (((p.longitude - a.0) * abx + (p.latitude - a.1) * aby) / (abx * abx + aby * aby))
            .clamp(0.0, 1.0);
        (p.longitude - (a.0 + t * abx)).hypot(p.latitude - (a.1 + t * aby))
    }

    /// Three laps of a square block, then leave eastward.
    fn laps() -> Vec<Position> {
        let lap = [(0.0, 0.0), (0.001, 0.0), (0.001, 0.001), (0.0, 0.001)];
        let mut coords = Vec::new();
        for _ in 0..3 {
            coords.extend(lap);
        }
        coords.push((0.0, 0.0));
        coords.push((-0.001, 0.0));
        trace(&coords)
    }

    #[test]
    fn test_detect_runs_spec_example() {
        let points = trace(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let runs = detect_runs(&points);
        assert_eq!(runs, vec![Run { start: 1, end: 2 }, Run { start: 3, end: 4 }]);
        // A->B (edge 0) and C->D (edge 4) are outside every run
        for run in &runs {
            assert!(!run.edge_range().contains(&0));
            assert!(!run.edge_range().contains(&4));
        }
    }

    #[test]
    fn test_detect_runs_none() {
        let points = trace(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert!(detect_runs(&points).is_empty());
        assert!(detect_runs(&[]).is_empty());
        assert!(detect_runs(&points[..1]).is_empty());
    }

    #[test]
    fn test_detect_runs_laps() {
        let points = laps();
        let runs = detect_runs(&points);
        // Every lap edge repeats, the closing edge repeats, the exit does not
        assert_eq!(runs, vec![Run { start: 0, end: 12 }]);
        assert_eq!(runs[0].len(), 13);
    }

    #[test]
    fn test_runs_are_ordered_and_disjoint() {
        let points = trace(&[
            (0.0, 0.0), (1.0, 0.0), (0.0, 0.0), (1.0, 0.0), (5.0, 5.0),
            (6.0, 5.0), (7.0, 5.0), (6.0, 5.0), (7.0, 5.0), (9.0, 9.0),
        ]);
        let runs = detect_runs(&points);
        assert!(runs.len() >= 2);
        for w in runs.windows(2) {
            assert!(w[0].end < w[1].start);
        }
        for run in &runs {
            assert!(run.end > run.start);
        }
    }

    #[test]
    fn test_too_short_rejected() {
        assert!(run_segment_offset(&trace(&[(0.0, 0.0)]), &OffsetConfig::default()).is_err());
    }

    #[test]
    fn test_no_runs_passes_through() {
        let points = trace(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        let out = run_segment_offset(&points, &OffsetConfig::default()).unwrap();
        assert_eq!(out, points);
    }

    #[test]
    fn test_consecutive_duplicates_dropped_outside_runs() {
        let points = trace(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let out = run_segment_offset(&points, &OffsetConfig::default()).unwrap();
        assert_eq!(out, trace(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]));
    }

    #[test]
    fn test_repeated_runs_get_escalating_lanes() {
        // A, B, C, B, C, D with B->C offset twice
        let points = trace(&[
            (0.0, 0.0), (0.001, 0.0), (0.002, 0.0), (0.001, 0.0), (0.002, 0.0), (0.003, 0.0),
        ]);
        let step = 0.00001;
        let out = run_segment_offset(&points, &OffsetConfig { offset_step: step }).unwrap();

        assert_eq!(out.first(), Some(&points[0]));
        assert_eq!(out.last(), Some(&points[5]));

        // Interior points all come from the two eastward B->C passes
        let interior = &out[1..out.len() - 1];
        assert_eq!(interior.len(), 4);
        assert!((interior[0].latitude - step).abs() < 1e-9);
        assert!((interior[1].latitude - step).abs() < 1e-9);
        assert!((interior[2].latitude - 2.0 * step).abs() < 1e-9);
        assert!((interior[3].latitude - 2.0 * step).abs() < 1e-9);
    }

    #[test]
    fn test_laps_offset_stays_finite() {
        let points = laps();
        let out = run_segment_offset(&points, &OffsetConfig::default()).unwrap();
        assert!(out.len() >= 2);
        assert!(out.iter().all(|p| p.is_finite()));
        assert_eq!(out.last(), Some(&points[points.len() - 1]));
    }

    #[test]
    fn test_separate_passes_offset_as_parallel_curves() {
        // East, north, east along an L-shaped street, detour via X, then the
        // same street again and off to Y
        let street = [(0.0, 0.0), (0.001, 0.0), (0.001, 0.001), (0.002, 0.001)];
        let x = (0.004, 0.004);
        let y = (0.005, -0.002);
        let mut coords = street.to_vec();
        coords.push(x);
        coords.extend(street);
        coords.push(y);
        let points = trace(&coords);
        assert_eq!(detect_runs(&points), vec![Run { start: 0, end: 3 }, Run { start: 5, end: 8 }]);

        let step = 0.00001;
        let out = run_segment_offset(&points, &OffsetConfig { offset_step: step }).unwrap();
        let x_at = out.iter().position(|p| *p == points[4]).unwrap();
        assert_eq!(out.last(), Some(&points[9]));

        let nearest = |p: &Position| {
            street
                .windows(2)
                .map(|s| distance_to_segment(p, s[0], s[1]))
                .fold(f64::INFINITY, f64::min)
        };
        let first_pass = &out[..x_at];
        let second_pass = &out[x_at + 1..out.len() - 1];
        assert!(first_pass.len() >= 4);
        assert!(second_pass.len() >= 4);
        for p in first_pass {
            assert!((nearest(p) - step).abs() < 1e-8, "{:?}", p);
        }
        for p in second_pass {
            assert!((nearest(p) - 2.0 * step).abs() < 1e-8, "{:?}", p);
        }
    }

    #[test]
    fn test_extra_dimensions_inherited_by_index() {
        let points: Vec<Position> = [0.0, 0.001, 0.0, 0.001]
            .iter()
            .enumerate()
            .map(|(i, &x)| Position::new(x, 0.0).with_extra(vec![i as f64]))
            .collect();
        let out = run_segment_offset(&points, &OffsetConfig::default()).unwrap();
        assert!(out.iter().all(|p| p.extra.len() == 1));
        assert_eq!(out[0].extra, vec![0.0]);
    }

    #[test]
    fn test_identical_points_fall_back_unmodified() {
        let points = trace(&[(3.0, 3.0); 5]);
        let out = run_segment_offset(&points, &OffsetConfig::default()).unwrap();
        assert_eq!(out, points);
        assert!(out.iter().all(|p| p.is_finite()));
    }
}
