//! Side-by-side comparison of every strategy.
//!
//! [`compare_strategies`] feeds the same untouched trace to each strategy and
//! labels every resulting line with a name and stroke color, ready for a
//! GeoJSON writer. Output order is fixed: the original trace first, then the
//! strategies in [`Strategy::ALL`] order. With the `parallel` feature the
//! strategies run concurrently but the order is unchanged.

use std::fmt;

use log::{debug, info};

use crate::error::{ensure_len, DeoverlapError, Result};
use crate::geo_utils::polyline_length;
use crate::{
    averaged_pair_offset, force_directed_separation, pair_offset, run_segment_offset,
    single_point_offset, DeoverlapConfig, Position,
};

/// Stroke color of an output line, as a `#RRGGBB` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Stroke(pub String);

impl Stroke {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One labeled line of a comparison. Owns its coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputLine {
    /// Human-readable name of what produced the line
    pub label: String,
    pub stroke: Stroke,
    pub coordinates: Vec<Position>,
}

impl OutputLine {
    pub fn new(strategy: Strategy, coordinates: Vec<Position>) -> Self {
        Self {
            label: strategy.label().to_string(),
            stroke: strategy.stroke(),
            coordinates,
        }
    }

    /// Great-circle length of the line in meters.
    pub fn length_meters(&self) -> f64 {
        polyline_length(&self.coordinates)
    }
}

/// The input trace and the five de-overlap strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// The trace as given
    Original,
    SinglePoint,
    Pair,
    AveragedPair,
    RunSegmentation,
    ForceDirected,
}

impl Strategy {
    /// The de-overlap strategies, in output order.
    pub const ALL: [Strategy; 5] = [
        Strategy::SinglePoint,
        Strategy::Pair,
        Strategy::AveragedPair,
        Strategy::RunSegmentation,
        Strategy::ForceDirected,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Original => "Original trace",
            Strategy::SinglePoint => "Single point offset",
            Strategy::Pair => "Pair offset",
            Strategy::AveragedPair => "Averaged pair offset",
            Strategy::RunSegmentation => "Run segmentation offset",
            Strategy::ForceDirected => "Force-directed separation",
        }
    }

    pub fn stroke(&self) -> Stroke {
        let color = match self {
            Strategy::Original => "#888888",
            Strategy::SinglePoint => "#00FF00",
            Strategy::Pair => "#FF0000",
            Strategy::AveragedPair => "#0000FF",
            Strategy::RunSegmentation => "#FF00FF",
            Strategy::ForceDirected => "#FFA500",
        };
        Stroke(color.to_string())
    }

    /// Run this strategy alone and label its output.
    ///
    /// Every strategy yields one line except [`Strategy::Pair`], which yields
    /// one two-point line per edge.
    pub fn apply(&self, points: &[Position], config: &DeoverlapConfig) -> Result<Vec<OutputLine>> {
        let lines = match self {
            Strategy::Original => {
                ensure_len(points, 1)?;
                vec![points.to_vec()]
            }
            Strategy::SinglePoint => vec![single_point_offset(points, &config.offset)?],
            Strategy::Pair => pair_offset(points, &config.offset)?
                .into_iter()
                .map(Vec::from)
                .collect(),
            Strategy::AveragedPair => vec![averaged_pair_offset(points, &config.offset)?],
            Strategy::RunSegmentation => vec![run_segment_offset(points, &config.offset)?],
            Strategy::ForceDirected => vec![force_directed_separation(points, &config.force)?],
        };
        debug!("{}: {} line(s)", self.label(), lines.len());
        Ok(lines
            .into_iter()
            .map(|coordinates| OutputLine::new(*self, coordinates))
            .collect())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Run every strategy over the same trace and collect the labeled lines.
///
/// The trace must hold at least two finite positions.
///
/// # Example
/// ```
/// use trace_deoverlap::{Position, DeoverlapConfig, Strategy, compare_strategies};
///
/// let trace = vec![
///     Position::new(0.0, 0.0),
///     Position::new(0.001, 0.0),
///     Position::new(0.0, 0.0),
/// ];
/// let lines = compare_strategies(&trace, &DeoverlapConfig::default()).unwrap();
///
/// // original + single point + 2 pair segments + averaged + runs + force
/// assert_eq!(lines.len(), 7);
/// assert_eq!(lines[0].label, Strategy::Original.label());
/// ```
pub fn compare_strategies(points: &[Position], config: &DeoverlapConfig) -> Result<Vec<OutputLine>> {
    ensure_len(points, 2)?;
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(DeoverlapError::NonFinitePosition { index });
    }

    let start = std::time::Instant::now();

    #[cfg(feature = "parallel")]
    let results: Vec<Result<Vec<OutputLine>>> = {
        use rayon::prelude::*;
        Strategy::ALL
            .par_iter()
            .map(|strategy| strategy.apply(points, config))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<Vec<OutputLine>>> = Strategy::ALL
        .iter()
        .map(|strategy| strategy.apply(points, config))
        .collect();

    let mut lines = Strategy::Original.apply(points, config)?;
    for result in results {
        lines.extend(result?);
    }

    info!(
        "compared {} strategies on {} points ({:.0}m) into {} lines in {:?}",
        Strategy::ALL.len(),
        points.len(),
        polyline_length(points),
        lines.len(),
        start.elapsed()
    );

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(coords: &[(f64, f64)]) -> Vec<Position> {
        coords.iter().map(|&(lon, lat)| Position::new(lon, lat)).collect()
    }

    fn sample() -> Vec<Position> {
        trace(&[
            (0.0, 0.0), (0.001, 0.0), (0.002, 0.0), (0.001, 0.0),
            (0.002, 0.0), (0.002, 0.001),
        ])
    }

    #[test]
    fn test_line_count_and_order() {
        let points = sample();
        let lines = compare_strategies(&points, &DeoverlapConfig::default()).unwrap();

        // 1 original + 1 single + 5 pair + 1 averaged + 1 runs + 1 force
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0].label, "Original trace");
        assert_eq!(lines[0].coordinates, points);
        assert_eq!(lines[1].label, "Single point offset");
        assert!(lines[2..7].iter().all(|l| l.label == "Pair offset" && l.coordinates.len() == 2));
        assert_eq!(lines[7].label, "Averaged pair offset");
        assert_eq!(lines[8].label, "Run segmentation offset");
        assert_eq!(lines[9].label, "Force-directed separation");
    }

    #[test]
    fn test_strokes_are_distinct() {
        let mut strokes: Vec<Stroke> = Strategy::ALL.iter().map(|s| s.stroke()).collect();
        strokes.push(Strategy::Original.stroke());
        let count = strokes.len();
        strokes.sort_by(|a, b| a.0.cmp(&b.0));
        strokes.dedup();
        assert_eq!(strokes.len(), count);
        assert_eq!(Strategy::SinglePoint.stroke().as_str(), "#00FF00");
        assert_eq!(Strategy::Pair.stroke().to_string(), "#FF0000");
    }

    #[test]
    fn test_strategies_see_original_input() {
        let points = sample();
        let config = DeoverlapConfig::default();
        let lines = compare_strategies(&points, &config).unwrap();

        let single = single_point_offset(&points, &config.offset).unwrap();
        let averaged = averaged_pair_offset(&points, &config.offset).unwrap();
        let runs = run_segment_offset(&points, &config.offset).unwrap();
        let force = force_directed_separation(&points, &config.force).unwrap();
        assert_eq!(lines[1].coordinates, single);
        assert_eq!(lines[7].coordinates, averaged);
        assert_eq!(lines[8].coordinates, runs);
        assert_eq!(lines[9].coordinates, force);
    }

    #[test]
    fn test_rejects_short_trace() {
        let err = compare_strategies(&trace(&[(0.0, 0.0)]), &DeoverlapConfig::default()).unwrap_err();
        assert_eq!(err, DeoverlapError::TooFewPoints { required: 2, actual: 1 });
    }

    #[test]
    fn test_rejects_non_finite() {
        let points = trace(&[(0.0, 0.0), (f64::NAN, 1.0), (2.0, 2.0)]);
        let err = compare_strategies(&points, &DeoverlapConfig::default()).unwrap_err();
        assert_eq!(err, DeoverlapError::NonFinitePosition { index: 1 });
    }

    #[test]
    fn test_apply_single_strategy() {
        let points = sample();
        let lines = Strategy::Pair.apply(&points, &DeoverlapConfig::default()).unwrap();
        assert_eq!(lines.len(), points.len() - 1);
        assert!(lines.iter().all(|l| l.stroke == Strategy::Pair.stroke()));

        let original = Strategy::Original.apply(&points[..1], &DeoverlapConfig::default()).unwrap();
        assert_eq!(original.len(), 1);
    }

    #[test]
    fn test_output_line_length() {
        let line = OutputLine::new(Strategy::Original, sample());
        let length = line.length_meters();
        // 0.005 degrees of travel near the equator
        assert!(length > 500.0 && length < 600.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Strategy::ForceDirected.to_string(), "Force-directed separation");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_output_line_serializes() {
        let line = OutputLine::new(Strategy::SinglePoint, trace(&[(1.0, 2.0)]));
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["label"], "Single point offset");
        assert_eq!(json["stroke"], "#00FF00");
        assert_eq!(json["coordinates"][0][1], 2.0);
    }
}
