//! Build order and cut list for assembling a generated structure.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::GraphError;
use crate::generator::Generation;
use crate::graph::{EdgeKey, Structure};

/// One physical part of the structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Part {
    /// Printed joint at a vertex.
    Joint(usize),
    /// Cut rod on an edge.
    Rod(EdgeKey),
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Joint(vertex) => write!(f, "joint {vertex}"),
            Part::Rod(edge) => write!(f, "rod {edge}"),
        }
    }
}

/// Breadth-first build order starting from the joint at `start`.
///
/// Each joint is followed by its untraversed rods in edge order, each rod by
/// the joint at its far end when that joint is new. Only the first `count`
/// parts are returned; parts unreachable from `start` never appear.
///
/// # Errors
///
/// Returns [`GraphError::VertexOutOfRange`] when `start` does not exist.
///
/// # Examples
/// ```
/// use rodsteward::{assembly_sequence, point, EdgeKey, Part, Structure};
///
/// let structure = Structure::from_parts(
///     [point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(2.0, 0.0, 0.0)],
///     [(0, 1), (1, 2)],
/// )
/// .expect("valid graph");
/// let order = assembly_sequence(&structure, 1, 3).expect("vertex exists");
/// assert_eq!(
///     order,
///     vec![Part::Joint(1), Part::Rod(EdgeKey::new(0, 1)), Part::Joint(0)]
/// );
/// ```
pub fn assembly_sequence(
    structure: &Structure,
    start: usize,
    count: usize,
) -> Result<Vec<Part>, GraphError> {
    if start >= structure.vertex_count() {
        return Err(GraphError::VertexOutOfRange {
            vertex: start,
            count: structure.vertex_count(),
        });
    }

    let mut parts = Vec::with_capacity(count.min(structure.vertex_count() + structure.edge_count()));
    let mut joints = BTreeSet::from([start]);
    let mut rods = BTreeSet::new();
    let mut queue = VecDeque::from([start]);
    parts.push(Part::Joint(start));

    while let Some(vertex) = queue.pop_front() {
        if parts.len() >= count {
            break;
        }
        for edge in structure.incident_edges(vertex) {
            if !rods.insert(edge) {
                continue;
            }
            parts.push(Part::Rod(edge));
            let Some(next) = edge.other(vertex) else {
                continue;
            };
            if joints.insert(next) {
                parts.push(Part::Joint(next));
                queue.push_back(next);
            }
        }
    }

    parts.truncate(count);
    Ok(parts)
}

/// Trimmed length of every generated rod, ordered by edge.
///
/// Edges whose rod was skipped during generation are absent.
#[must_use]
pub fn cut_list(generation: &Generation) -> Vec<(EdgeKey, f64)> {
    generation
        .rods
        .iter()
        .map(|(edge, rod)| (*edge, rod.length()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorParams;
    use crate::generator::generate;
    use crate::geometry::point;

    fn square_with_tail() -> Structure {
        Structure::from_parts(
            [
                point(0.0, 0.0, 0.0),
                point(100.0, 0.0, 0.0),
                point(100.0, 100.0, 0.0),
                point(0.0, 100.0, 0.0),
                point(0.0, 100.0, 100.0),
                point(500.0, 500.0, 500.0),
            ],
            [(0, 1), (1, 2), (2, 3), (3, 0), (3, 4)],
        )
        .expect("valid graph")
    }

    #[test]
    fn breadth_first_order_visits_every_part_once() {
        let order = assembly_sequence(&square_with_tail(), 0, usize::MAX).expect("vertex exists");
        assert_eq!(
            order,
            vec![
                Part::Joint(0),
                Part::Rod(EdgeKey::new(0, 1)),
                Part::Joint(1),
                Part::Rod(EdgeKey::new(0, 3)),
                Part::Joint(3),
                Part::Rod(EdgeKey::new(1, 2)),
                Part::Joint(2),
                Part::Rod(EdgeKey::new(2, 3)),
                Part::Rod(EdgeKey::new(3, 4)),
                Part::Joint(4),
            ]
        );
    }

    #[test]
    fn sequence_is_truncated_to_count() {
        let structure = square_with_tail();
        assert!(assembly_sequence(&structure, 2, 0)
            .expect("vertex exists")
            .is_empty());
        let order = assembly_sequence(&structure, 2, 4).expect("vertex exists");
        assert_eq!(order.len(), 4);
        assert_eq!(order.last(), Some(&Part::Rod(EdgeKey::new(2, 3))));
    }

    #[test]
    fn isolated_start_yields_only_its_joint() {
        let order = assembly_sequence(&square_with_tail(), 5, 10).expect("vertex exists");
        assert_eq!(order, vec![Part::Joint(5)]);
    }

    #[test]
    fn unknown_start_is_rejected() {
        assert_eq!(
            assembly_sequence(&square_with_tail(), 6, 1),
            Err(GraphError::VertexOutOfRange { vertex: 6, count: 6 })
        );
    }

    #[test]
    fn cut_list_matches_trimmed_rods() {
        let params = GeneratorParams::default();
        let generation = generate(&square_with_tail(), &params).expect("valid params");
        let cuts = cut_list(&generation);
        assert_eq!(cuts.len(), 5);
        assert_eq!(cuts[0].0, EdgeKey::new(0, 1));
        let edge = EdgeKey::new(0, 1);
        let trim = generation.offsets.at(edge.forward()) + generation.offsets.at(edge.backward());
        assert!((cuts[0].1 - (100.0 - trim)).abs() < 1e-9);
        assert_eq!(Part::Rod(cuts[0].0).to_string(), "rod (0, 1)");
    }
}
