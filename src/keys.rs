//! # Position Keying & Repeat Counting
//!
//! Fixed-precision identities for points and directed edges, and the two
//! counting views every strategy builds on:
//!
//! - [`VisitCounter`] - running count, incremented at each traversal step.
//!   Drives the per-step offset magnitude.
//! - [`count_occurrences`] - final totals over the whole sequence. Drives run
//!   detection.
//!
//! The two are deliberately separate structures: a strategy that needs both
//! builds both, and never reads a running count as a total.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::Position;

/// Decimal places kept when keying a coordinate.
pub const KEY_PRECISION: usize = 6;

/// `10^KEY_PRECISION`
const KEY_SCALE: f64 = 1_000_000.0;

/// Identity of a position: longitude and latitude rounded to 6 decimals.
///
/// Extra dimensions (altitude, time...) never take part in identity.
///
/// ```
/// use trace_deoverlap::{Position, keys::PositionKey};
///
/// let a = Position::new(2.3522001, 48.8566001).with_extra(vec![35.0]);
/// let b = Position::new(2.3522004, 48.8566004);
/// assert_eq!(PositionKey::of(&a), PositionKey::of(&b));
/// assert_eq!(PositionKey::of(&a).to_string(), "2.352200:48.856600");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey {
    lon_e6: i64,
    lat_e6: i64,
}

impl PositionKey {
    /// Key a position.
    #[inline]
    pub fn of(position: &Position) -> Self {
        Self {
            lon_e6: quantize(position.longitude),
            lat_e6: quantize(position.latitude),
        }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.*}:{:.*}",
            KEY_PRECISION,
            self.lon_e6 as f64 / KEY_SCALE,
            KEY_PRECISION,
            self.lat_e6 as f64 / KEY_SCALE
        )
    }
}

/// Identity of a directed edge between two consecutive positions.
///
/// `A -> B` and `B -> A` are different edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub from: PositionKey,
    pub to: PositionKey,
}

impl EdgeKey {
    /// Key the directed edge `a -> b`.
    #[inline]
    pub fn of(a: &Position, b: &Position) -> Self {
        Self {
            from: PositionKey::of(a),
            to: PositionKey::of(b),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

// Values past i64 range saturate; NaN maps to 0. Both keep keying total.
#[inline]
fn quantize(value: f64) -> i64 {
    (value * KEY_SCALE).round() as i64
}

/// Running visit counter.
///
/// A key absent from the counter has count 0; each [`visit`](Self::visit)
/// increments and returns the new count, so the first visit returns 1.
#[derive(Debug, Clone)]
pub struct VisitCounter<K> {
    counts: HashMap<K, u32>,
}

impl<K: Eq + Hash> VisitCounter<K> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    /// Record one more visit of `key` and return the count as of this step.
    pub fn visit(&mut self, key: K) -> u32 {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    /// Current count without visiting.
    pub fn count(&self, key: &K) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys seen so far.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }
}

impl<K: Eq + Hash> Default for VisitCounter<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Final occurrence totals of `key_fn(item)` over `items`, in one linear pass.
///
/// ```
/// use trace_deoverlap::keys::count_occurrences;
///
/// let totals = count_occurrences(["a", "b", "a"], |s| *s);
/// assert_eq!(totals["a"], 2);
/// assert_eq!(totals["b"], 1);
/// ```
pub fn count_occurrences<T, K, I, F>(items: I, mut key_fn: F) -> HashMap<K, u32>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut totals = HashMap::new();
    for item in items {
        *totals.entry(key_fn(&item)).or_insert(0) += 1;
    }
    totals
}

/// Total occurrence count of every directed edge of `points`.
pub fn edge_totals(points: &[Position]) -> HashMap<EdgeKey, u32> {
    count_occurrences(points.windows(2), |w| EdgeKey::of(&w[0], &w[1]))
}
