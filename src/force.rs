//! # Force-Directed Separation
//!
//! Pushes overlapping points of a trace apart with a small physics
//! relaxation, instead of offsetting along normals.
//!
//! ## Algorithm
//! 1. Project the trace with Web Mercator, fitted to a square canvas so that
//!    `separation_radius` is measured in canvas pixels whatever the trace size
//! 2. One node per point, starting at its projected position plus a tiny
//!    seeded jitter; the un-jittered position is kept as the node's anchor
//! 3. One link per consecutive pair of points (no links between repeats)
//! 4. For a fixed number of ticks, accumulate velocities from
//!    - links: springs pulling each pair back to its original planar length
//!    - collisions: nodes closer than `separation_radius` are pushed apart
//!    - anchors: independent x and y pulls toward the anchor
//!
//!    then damp velocities and move the nodes
//! 5. Invert the projection, in original point order
//!
//! The force model and cooling schedule follow the classic velocity-Verlet
//! layout used by d3-force: `alpha` cools geometrically from 1 to
//! `ALPHA_MIN` over the configured iterations and scales the link and anchor
//! forces, while collisions act at full strength every tick.
//!
//! The relaxation is approximate; residual overlap is possible. With the same
//! seed and configuration the output is identical between runs.

use geo::Coord;
use log::debug;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::error::{ensure_len, Result};
use crate::geo_utils::MercatorFit;
use crate::Position;

/// Alpha reached after the configured number of iterations.
const ALPHA_MIN: f64 = 0.001;

/// Magnitude of the random nudge applied to exactly coincident nodes.
const JIGGLE: f64 = 1e-6;

/// Configuration for the force-directed strategy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForceConfig {
    /// Number of simulation ticks.
    /// Default: 300
    pub iterations: u32,
    /// Minimum distance between any two nodes, in canvas pixels.
    /// Default: 15.0
    pub separation_radius: f64,
    /// Side of the square canvas the trace is fitted into, in pixels.
    /// Default: 1000.0
    pub canvas_size: f64,
    /// Strength of the x and y anchor forces. Higher keeps the shape, lower
    /// declutters more.
    /// Default: 0.1
    pub anchor_strength: f64,
    /// Strength of the collision force (1.0 resolves an overlap in one tick).
    /// Default: 1.0
    pub collision_strength: f64,
    /// Fraction of velocity lost each tick.
    /// Default: 0.4
    pub velocity_decay: f64,
    /// Width of the uniform jitter added to initial positions, in pixels.
    /// Default: 0.001
    pub jitter: f64,
    /// Seed for the jitter source.
    /// Default: 42
    pub seed: u64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            separation_radius: 15.0,
            canvas_size: 1000.0,
            anchor_strength: 0.1,
            collision_strength: 1.0,
            velocity_decay: 0.4,
            jitter: 0.001,
            seed: 42,
        }
    }
}

/// Separate overlapping points by force-directed relaxation.
///
/// Output has the same length and order as the input; extra dimensions are
/// carried over by index. A trace whose points all coincide, or that reaches
/// past the Web Mercator latitude limit, is returned unchanged. Requires at
/// least two points.
///
/// # Example
/// ```
/// use trace_deoverlap::{Position, ForceConfig, force_directed_separation};
///
/// let trace = vec![
///     Position::new(0.0, 0.0),
///     Position::new(0.001, 0.0),
///     Position::new(0.0, 0.0),
/// ];
/// let config = ForceConfig { iterations: 50, ..ForceConfig::default() };
/// let out = force_directed_separation(&trace, &config).unwrap();
/// assert_eq!(out.len(), 3);
/// assert_ne!(out[0], out[2]);
/// ```
pub fn force_directed_separation(points: &[Position], config: &ForceConfig) -> Result<Vec<Position>> {
    ensure_len(points, 2)?;

    let Some(projection) = MercatorFit::fit(points, config.canvas_size) else {
        debug!("force separation: trace has no projectable extent, returned unchanged");
        return Ok(points.to_vec());
    };

    let anchors: Vec<Coord> = points.iter().map(|p| projection.project(p)).collect();
    let relaxed = relax(&anchors, config);

    Ok(points
        .iter()
        .zip(relaxed)
        .map(|(point, planar)| {
            let (longitude, latitude) = projection.invert(planar);
            point.moved_to(longitude, latitude)
        })
        .collect())
}

/// Run the simulation on planar anchors and return the relaxed positions.
pub(crate) fn relax(anchors: &[Coord], config: &ForceConfig) -> Vec<Coord> {
    let mut simulation = Simulation::new(anchors, config);
    for _ in 0..config.iterations {
        simulation.tick();
    }
    debug!(
        "force separation: {} nodes, {} links, {} ticks, final alpha {:.4}",
        simulation.nodes.len(),
        simulation.links.len(),
        config.iterations,
        simulation.alpha
    );
    simulation
        .nodes
        .iter()
        .map(|n| Coord { x: n.x, y: n.y })
        .collect()
}

// =============================================================================
// Simulation State
// =============================================================================

#[derive(Debug, Clone)]
struct Node {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    anchor: Coord,
}

#[derive(Debug, Clone)]
struct Link {
    source: usize,
    target: usize,
    /// Rest length: planar distance between the anchors
    distance: f64,
    strength: f64,
    /// Share of the correction applied to the target
    bias: f64,
}

struct Simulation<'a> {
    nodes: Vec<Node>,
    links: Vec<Link>,
    alpha: f64,
    alpha_decay: f64,
    rng: JitterRng,
    config: &'a ForceConfig,
}

impl<'a> Simulation<'a> {
    fn new(anchors: &[Coord], config: &'a ForceConfig) -> Self {
        let mut rng = JitterRng::new(config.seed);

        let nodes: Vec<Node> = anchors
            .iter()
            .map(|&anchor| Node {
                x: anchor.x + (rng.next_f64() - 0.5) * config.jitter,
                y: anchor.y + (rng.next_f64() - 0.5) * config.jitter,
                vx: 0.0,
                vy: 0.0,
                anchor,
            })
            .collect();

        // Degree of each node in the chain: 1 at the ends, 2 inside
        let degree = |i: usize| if i == 0 || i + 1 == anchors.len() { 1.0 } else { 2.0 };

        let links: Vec<Link> = (0..anchors.len().saturating_sub(1))
            .map(|i| {
                let (source, target) = (i, i + 1);
                let (ds, dt) = (degree(source), degree(target));
                let a = anchors[source];
                let b = anchors[target];
                Link {
                    source,
                    target,
                    distance: (b.x - a.x).hypot(b.y - a.y),
                    strength: 1.0 / f64::min(ds, dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect();

        let alpha_decay = if config.iterations == 0 {
            0.0
        } else {
            1.0 - ALPHA_MIN.powf(1.0 / config.iterations as f64)
        };

        Self {
            nodes,
            links,
            alpha: 1.0,
            alpha_decay,
            rng,
            config,
        }
    }

    fn tick(&mut self) {
        self.alpha -= self.alpha * self.alpha_decay;

        self.apply_links();
        self.apply_collisions();
        self.apply_anchors();

        let retain = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            node.vx *= retain;
            node.vy *= retain;
            node.x += node.vx;
            node.y += node.vy;
        }
    }

    /// Springs between consecutive nodes, evaluated at predicted positions.
    fn apply_links(&mut self) {
        for k in 0..self.links.len() {
            let link = &self.links[k];
            let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);

            let mut x = t.x + t.vx - s.x - s.vx;
            let mut y = t.y + t.vy - s.y - s.vy;
            if x == 0.0 {
                x = self.rng.jiggle();
            }
            if y == 0.0 {
                y = self.rng.jiggle();
            }

            let length = x.hypot(y);
            let l = (length - link.distance) / length * self.alpha * link.strength;
            x *= l;
            y *= l;

            let (source, target, bias) = (link.source, link.target, link.bias);
            self.nodes[target].vx -= x * bias;
            self.nodes[target].vy -= y * bias;
            self.nodes[source].vx += x * (1.0 - bias);
            self.nodes[source].vy += y * (1.0 - bias);
        }
    }

    /// Push apart every pair of nodes closer than the separation radius.
    fn apply_collisions(&mut self) {
        let min_distance = self.config.separation_radius;
        if min_distance <= 0.0 || self.config.collision_strength == 0.0 {
            return;
        }
        let min_distance_2 = min_distance * min_distance;

        let predicted: Vec<GeomWithData<[f64; 2], usize>> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| GeomWithData::new([n.x + n.vx, n.y + n.vy], i))
            .collect();
        let tree = RTree::bulk_load(predicted.clone());

        for item in &predicted {
            let i = item.data;
            let [xi, yi] = *item.geom();

            for neighbor in tree.locate_within_distance([xi, yi], min_distance_2) {
                let j = neighbor.data;
                if j <= i {
                    continue;
                }
                let [xj, yj] = *neighbor.geom();

                let mut x = xi - xj;
                let mut y = yi - yj;
                let mut l = x * x + y * y;
                if l >= min_distance_2 {
                    continue;
                }
                if x == 0.0 {
                    x = self.rng.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.rng.jiggle();
                    l += y * y;
                }

                let l = l.sqrt();
                let push = (min_distance - l) / l * self.config.collision_strength;
                // Equal radii: each node takes half the correction
                let (dx, dy) = (x * push * 0.5, y * push * 0.5);
                self.nodes[i].vx += dx;
                self.nodes[i].vy += dy;
                self.nodes[j].vx -= dx;
                self.nodes[j].vy -= dy;
            }
        }
    }

    /// Independent x and y pulls back toward each node's anchor.
    fn apply_anchors(&mut self) {
        let k = self.config.anchor_strength * self.alpha;
        for node in &mut self.nodes {
            node.vx += (node.anchor.x - node.x) * k;
            node.vy += (node.anchor.y - node.y) * k;
        }
    }
}

/// Seeded xorshift64* source for jitter.
struct JitterRng {
    state: u64,
}

impl JitterRng {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0xA5A5_A5A5_5A5A_5A5A } else { seed };
        Self { state: seed }
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Tiny non-zero-on-average nudge for coincident coordinates.
    fn jiggle(&mut self) -> f64 {
        let value = (self.next_f64() - 0.5) * JIGGLE;
        if value == 0.0 {
            JIGGLE / 2.0
        } else {
            value
        }
    }
}
