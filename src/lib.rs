//! # Trace De-overlap
//!
//! Turns a "spaghetti" GPS trace, one that loops through the same street
//! segment again and again, into polylines where each repeated traversal is
//! pushed sideways so the passes can be told apart on a map.
//!
//! This library provides five independent strategies operating on the same
//! input trace:
//! - **Single point** ([`single_point_offset`]) - shift each point along its
//!   left normal, scaled by how often the point has been visited so far
//! - **Pair** ([`pair_offset`]) - shift each edge independently, one
//!   two-point line per edge
//! - **Averaged pair** ([`averaged_pair_offset`]) - edge offsets reconciled
//!   into one continuous line
//! - **Run segmentation** ([`run_segment_offset`]) - detect runs of repeated
//!   edges and replace each with a true parallel curve
//! - **Force directed** ([`force_directed_separation`]) - relax overlapping
//!   points apart in a projected plane
//!
//! and an orchestrator ([`compare_strategies`]) that runs them all and labels
//! each result for side-by-side comparison.
//!
//! ## Features
//!
//! - **`parallel`** - Evaluate strategies in parallel with rayon
//! - **`serde`** - Serialize positions, output lines and configs
//!
//! ## Quick Start
//!
//! ```rust
//! use trace_deoverlap::{Position, DeoverlapConfig, compare_strategies};
//!
//! // Out along a street and back the same way
//! let trace = vec![
//!     Position::new(-0.1278, 51.5074),
//!     Position::new(-0.1290, 51.5080),
//!     Position::new(-0.1300, 51.5090),
//!     Position::new(-0.1290, 51.5080),
//!     Position::new(-0.1278, 51.5074),
//! ];
//!
//! let lines = compare_strategies(&trace, &DeoverlapConfig::default()).unwrap();
//! for line in &lines {
//!     println!("{} ({}): {} points", line.label, line.stroke, line.coordinates.len());
//! }
//! ```

use crate::error::DeoverlapError;

pub mod error;
pub use error::Result;

pub mod keys;
pub use keys::{EdgeKey, PositionKey, VisitCounter, count_occurrences};

pub mod geo_utils;

// Per-point and per-edge offsetting
pub mod single_point;
pub use single_point::single_point_offset;

pub mod pair;
pub use pair::{averaged_pair_offset, pair_offset};

// Run detection and parallel curves
pub mod parallel_offset;

pub mod runs;
pub use runs::{Run, detect_runs, run_segment_offset};

// Physics relaxation
pub mod force;
pub use force::{ForceConfig, force_directed_separation};

pub mod compare;
pub use compare::{OutputLine, Strategy, Stroke, compare_strategies};

// ============================================================================
// Core Types
// ============================================================================

/// A trace position in GeoJSON axis order: longitude, latitude, then any
/// extra dimensions (altitude, timestamp...) which strategies carry through
/// untouched.
///
/// # Example
/// ```
/// use trace_deoverlap::Position;
/// let point = Position::new(-0.1278, 51.5074).with_extra(vec![35.0]); // London, 35m
/// assert_eq!(point.to_vec(), vec![-0.1278, 51.5074, 35.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "Vec<f64>", try_from = "Vec<f64>"))]
pub struct Position {
    pub longitude: f64,
    pub latitude: f64,
    /// Dimensions after longitude/latitude, in input order
    pub extra: Vec<f64>,
}

impl Position {
    /// Create a two-dimensional position.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            extra: Vec::new(),
        }
    }

    /// Attach extra dimensions.
    pub fn with_extra(mut self, extra: Vec<f64>) -> Self {
        self.extra = extra;
        self
    }

    /// Build from a `[lon, lat, ...extra]` coordinate array.
    ///
    /// Returns `None` if fewer than two values are given.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [longitude, latitude, extra @ ..] => Some(Self {
                longitude: *longitude,
                latitude: *latitude,
                extra: extra.to_vec(),
            }),
            _ => None,
        }
    }

    /// Flatten back to a `[lon, lat, ...extra]` coordinate array.
    pub fn to_vec(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(2 + self.extra.len());
        values.push(self.longitude);
        values.push(self.latitude);
        values.extend_from_slice(&self.extra);
        values
    }

    /// Same extra dimensions, new longitude/latitude.
    pub fn moved_to(&self, longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            extra: self.extra.clone(),
        }
    }

    /// Check that longitude and latitude are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}

impl From<Position> for Vec<f64> {
    fn from(position: Position) -> Self {
        position.to_vec()
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = DeoverlapError;

    fn try_from(values: Vec<f64>) -> std::result::Result<Self, Self::Error> {
        Position::from_slice(&values).ok_or(DeoverlapError::MissingDimensions {
            dimensions: values.len(),
        })
    }
}

/// An ordered sequence of positions.
pub type Trace = Vec<Position>;

/// Configuration shared by the offsetting strategies.
///
/// Every running-count strategy displaces the k-th visit of a point, edge or
/// run by `offset_step * k`, so the first visit is already shifted by one step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetConfig {
    /// Sideways displacement per visit, in degrees.
    /// Default: 0.00001 (~1.1 meters)
    pub offset_step: f64,
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self { offset_step: 0.00001 }
    }
}

/// Configuration for running every strategy at once.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeoverlapConfig {
    /// Used by the single point, pair, averaged pair and run strategies
    pub offset: OffsetConfig,
    /// Used by the force-directed strategy
    pub force: ForceConfig,
}
