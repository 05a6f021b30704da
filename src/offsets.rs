//! Per-end rod trims that keep neighbouring joint sleeves apart.

use std::collections::btree_map;
use std::collections::BTreeMap;

use nalgebra::Vector3;
use tracing::debug;

use crate::config::GeneratorParams;
use crate::graph::{DirectedEdge, Structure};

/// Trim distance for every rod end, keyed by the edge seen from the trimmed
/// vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Offsets {
    /// Trim per directed edge.
    values: BTreeMap<DirectedEdge, f64>,
}

impl Offsets {
    /// Trim applied at `from` to the rod heading towards `to`.
    #[must_use]
    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        self.values.get(&DirectedEdge::new(from, to)).copied()
    }

    /// Trim for a directed edge, or zero when none was computed.
    #[must_use]
    pub fn at(&self, edge: DirectedEdge) -> f64 {
        self.values.get(&edge).copied().unwrap_or(0.0)
    }

    /// Number of rod ends with a trim.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no trims were computed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over trims in directed-edge order.
    pub fn iter(&self) -> btree_map::Iter<'_, DirectedEdge, f64> {
        self.values.iter()
    }

    /// Raise the trim for `edge` to at least `value`.
    fn raise(&mut self, edge: DirectedEdge, value: f64) {
        self.values
            .entry(edge)
            .and_modify(|current| *current = current.max(value))
            .or_insert(value);
    }
}

impl<'a> IntoIterator for &'a Offsets {
    type Item = (&'a DirectedEdge, &'a f64);
    type IntoIter = btree_map::Iter<'a, DirectedEdge, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Distance from a shared vertex at which the sleeves of two rods leaving it
/// along `first` and `second` stop overlapping.
///
/// The angle is handled through its cosine and the magnitude of the cross
/// product so that nearly parallel and nearly opposite rods stay accurate.
///
/// # Examples
/// ```
/// use nalgebra::Vector3;
/// use rodsteward::{pair_offset, GeneratorParams};
///
/// let params = GeneratorParams::default();
/// let offset = pair_offset(&Vector3::x(), &Vector3::y(), &params);
/// assert!((offset - params.outer_radius()).abs() < 1e-12);
/// ```
#[must_use]
pub fn pair_offset(first: &Vector3<f64>, second: &Vector3<f64>, params: &GeneratorParams) -> f64 {
    let floor = params.joint_thickness + params.tolerance;
    let inner = params.inner_radius();
    let outer = params.outer_radius();

    let magnitudes = first.norm() * second.norm();
    let dot = first.dot(second);
    let cos = dot / magnitudes;
    let sin = (first.norm_squared() * second.norm_squared() - dot * dot).sqrt() / magnitudes;

    if !sin.is_finite() || sin == 0.0 {
        floor
    } else if cos <= 0.0 {
        floor.max(outer * sin)
    } else {
        let reach =
            (outer * outer + inner * inner + 2.0 * outer * inner * cos - inner * inner * sin * sin)
                .sqrt()
                / sin;
        floor.max(reach)
    }
}

/// Compute the trim for both ends of every edge.
///
/// A vertex with a single rod gets a stub trim of half the radius. Otherwise
/// each rod end receives the largest [`pair_offset`] over all pairs of rods
/// meeting at that vertex. Isolated vertices contribute nothing.
///
/// # Examples
/// ```
/// use rodsteward::{compute_offsets, point, GeneratorParams, Structure};
///
/// let structure = Structure::from_parts(
///     [point(0.0, 0.0, 0.0), point(100.0, 0.0, 0.0)],
///     [(0, 1)],
/// )
/// .expect("valid graph");
/// let params = GeneratorParams::default();
/// let offsets = compute_offsets(&structure, &params);
/// assert_eq!(offsets.get(0, 1), Some(params.radius / 2.0));
/// assert_eq!(offsets.get(1, 0), Some(params.radius / 2.0));
/// ```
#[must_use]
pub fn compute_offsets(structure: &Structure, params: &GeneratorParams) -> Offsets {
    let mut offsets = Offsets::default();
    for vertex in 0..structure.vertex_count() {
        let neighbors = structure.neighbors(vertex);
        if let [only] = neighbors[..] {
            offsets.raise(DirectedEdge::new(vertex, only), params.radius / 2.0);
            continue;
        }
        for (index, &first) in neighbors.iter().enumerate() {
            let first_direction = structure.direction(DirectedEdge::new(vertex, first));
            for &second in &neighbors[index + 1..] {
                let second_direction = structure.direction(DirectedEdge::new(vertex, second));
                let offset = pair_offset(&first_direction, &second_direction, params);
                offsets.raise(DirectedEdge::new(vertex, first), offset);
                offsets.raise(DirectedEdge::new(vertex, second), offset);
            }
        }
    }
    debug!(count = offsets.len(), "computed rod offsets");
    offsets
}
