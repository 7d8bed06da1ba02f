//! # Geographic Utilities
//!
//! Core geometric helpers shared by the de-overlap strategies.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`left_normal`] | Unit normal to the left of a direction vector |
//! | [`displace`] | Move a position along a normal by a distance |
//! | [`midpoint`] | Arithmetic mean of two positions |
//! | [`haversine_distance`] | Great-circle distance between two positions |
//! | [`polyline_length`] | Total length of a trace in meters |
//! | [`MercatorFit`] | Web Mercator projection fitted into a square canvas |
//!
//! ## Coordinate System
//!
//! Positions are WGS84 longitude/latitude in degrees. The offsetting
//! strategies treat degrees as a local plane: at the displacement scale used
//! (~1e-5 degrees) the distortion is invisible on a map.

use geo::{BoundingRect, Coord, Distance, Haversine, LineString, Point};

use crate::Position;

/// Web Mercator latitude limit; beyond it the projection diverges.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

// =============================================================================
// Offset Geometry
// =============================================================================

/// Unit normal pointing to the left of the direction `(dx, dy)`.
///
/// Returns `None` for a zero-length (or non-finite) direction, which callers
/// treat as degenerate geometry and leave the input untouched.
///
/// ```rust
/// use trace_deoverlap::geo_utils::left_normal;
///
/// assert_eq!(left_normal(1.0, 0.0), Some((0.0, 1.0)));
/// assert_eq!(left_normal(0.0, 0.0), None);
/// ```
#[inline]
pub fn left_normal(dx: f64, dy: f64) -> Option<(f64, f64)> {
    let length = dx.hypot(dy);
    if length == 0.0 || !length.is_finite() {
        return None;
    }
    Some((-dy / length, dx / length))
}

/// Move `position` by `distance` along `normal`, keeping its extra dimensions.
#[inline]
pub fn displace(position: &Position, normal: (f64, f64), distance: f64) -> Position {
    position.moved_to(
        position.longitude + normal.0 * distance,
        position.latitude + normal.1 * distance,
    )
}

/// Arithmetic mean of two positions' longitude and latitude.
///
/// Extra dimensions are taken from `a`.
#[inline]
pub fn midpoint(a: &Position, b: &Position) -> Position {
    a.moved_to(
        (a.longitude + b.longitude) / 2.0,
        (a.latitude + b.latitude) / 2.0,
    )
}

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two positions in meters.
///
/// # Example
///
/// ```rust
/// use trace_deoverlap::{Position, geo_utils};
///
/// let london = Position::new(-0.1278, 51.5074);
/// let paris = Position::new(2.3522, 48.8566);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &Position, p2: &Position) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Total length of a trace in meters. Empty or single-point traces return 0.0.
pub fn polyline_length(points: &[Position]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Planar Projection
// =============================================================================

/// Web Mercator projection scaled and centred so that the projected bounds of
/// a trace fit a `size` x `size` canvas (y grows downward, screen style).
///
/// Mercator is conformal, so local angles and relative distances survive the
/// trip into the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorFit {
    scale: f64,
    center: Coord,
    half_size: f64,
}

impl MercatorFit {
    /// Fit the projection to `points`.
    ///
    /// Returns `None` for an empty trace, non-finite input, a latitude past
    /// the Mercator limit (about ±85.05°, where the projection cannot be
    /// inverted faithfully), or when every point projects to the same place
    /// (nothing to scale).
    pub fn fit(points: &[Position], size: f64) -> Option<Self> {
        if points.iter().any(|p| p.latitude.abs() > MAX_MERCATOR_LAT) {
            return None;
        }
        let projected: LineString = points.iter().map(raw_mercator).collect();
        let rect = projected.bounding_rect()?;
        let extent = rect.width().max(rect.height());
        if extent <= 0.0 || !extent.is_finite() || size <= 0.0 {
            return None;
        }
        Some(Self {
            scale: size / extent,
            center: rect.center(),
            half_size: size / 2.0,
        })
    }

    /// Longitude/latitude to canvas coordinates.
    pub fn project(&self, position: &Position) -> Coord {
        let raw = raw_mercator(position);
        Coord {
            x: (raw.x - self.center.x) * self.scale + self.half_size,
            y: (self.center.y - raw.y) * self.scale + self.half_size,
        }
    }

    /// Canvas coordinates back to `(longitude, latitude)` in degrees.
    pub fn invert(&self, planar: Coord) -> (f64, f64) {
        let x = (planar.x - self.half_size) / self.scale + self.center.x;
        let y = self.center.y - (planar.y - self.half_size) / self.scale;
        let latitude = (2.0 * y.exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
        (x.to_degrees(), latitude)
    }
}

/// Unit-sphere Web Mercator in radians.
fn raw_mercator(position: &Position) -> Coord {
    let lat = position
        .latitude
        .clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
        .to_radians();
    Coord {
        x: position.longitude.to_radians(),
        y: (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
