//! Rod graph: vertex positions and the straight edges connecting them.

use std::fmt;

use nalgebra::{Point3, Vector3};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::GraphError;
use crate::geometry::Point;

/// Undirected edge between two vertices, stored lower index first.
///
/// # Examples
/// ```
/// use rodsteward::EdgeKey;
///
/// assert_eq!(EdgeKey::new(4, 1), EdgeKey::new(1, 4));
/// assert_eq!(EdgeKey::new(4, 1).a, 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    /// Lower vertex index.
    pub a: usize,
    /// Higher vertex index.
    pub b: usize,
}

impl EdgeKey {
    /// Canonicalise an unordered vertex pair.
    #[must_use]
    pub const fn new(u: usize, v: usize) -> Self {
        if u <= v {
            Self { a: u, b: v }
        } else {
            Self { a: v, b: u }
        }
    }

    /// Whether `vertex` is one of the two ends.
    #[must_use]
    pub const fn contains(self, vertex: usize) -> bool {
        self.a == vertex || self.b == vertex
    }

    /// The end opposite `vertex`, if `vertex` belongs to this edge.
    #[must_use]
    pub const fn other(self, vertex: usize) -> Option<usize> {
        if vertex == self.a {
            Some(self.b)
        } else if vertex == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    /// Direction from the lower to the higher vertex.
    #[must_use]
    pub const fn forward(self) -> DirectedEdge {
        DirectedEdge::new(self.a, self.b)
    }

    /// Direction from the higher to the lower vertex.
    #[must_use]
    pub const fn backward(self) -> DirectedEdge {
        DirectedEdge::new(self.b, self.a)
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

/// Edge seen from one of its ends; trims are keyed this way because each end
/// of a rod is trimmed independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DirectedEdge {
    /// Vertex the edge is seen from.
    pub from: usize,
    /// Vertex at the far end.
    pub to: usize,
}

impl DirectedEdge {
    /// Create a directed edge.
    #[must_use]
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// The same edge seen from the other end.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(self.to, self.from)
    }

    /// The undirected edge this direction belongs to.
    #[must_use]
    pub const fn key(self) -> EdgeKey {
        EdgeKey::new(self.from, self.to)
    }
}

/// Vertices and edges of a rod structure.
///
/// Vertices are identified by insertion order and never removed, so indices
/// stay valid for the lifetime of the structure. Duplicate edges are dropped
/// when added.
#[derive(Clone, Debug, Default)]
pub struct Structure {
    /// Underlying graph storage for vertices and edges.
    graph: UnGraph<Point, EdgeKey>,
}

impl Structure {
    /// Create an empty structure.
    ///
    /// # Examples
    /// ```
    /// use rodsteward::Structure;
    ///
    /// let structure = Structure::new();
    /// assert_eq!(structure.vertex_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
        }
    }

    /// Build a structure from a vertex list and vertex-index pairs.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when an edge refers to a missing vertex or
    /// connects a vertex to itself.
    ///
    /// # Examples
    /// ```
    /// use rodsteward::{point, Structure};
    ///
    /// let structure = Structure::from_parts(
    ///     [point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(0.0, 1.0, 0.0)],
    ///     [(0, 1), (1, 2), (2, 1)],
    /// )
    /// .expect("valid graph");
    /// assert_eq!(structure.edge_count(), 2);
    /// ```
    pub fn from_parts<V, E>(vertices: V, edges: E) -> Result<Self, GraphError>
    where
        V: IntoIterator<Item = Point>,
        E: IntoIterator<Item = (usize, usize)>,
    {
        let mut structure = Self::new();
        for position in vertices {
            structure.add_vertex(position);
        }
        for (u, v) in edges {
            structure.add_edge(u, v)?;
        }
        Ok(structure)
    }

    /// Return the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Add a vertex and return its index.
    pub fn add_vertex(&mut self, position: Point) -> usize {
        self.graph.add_node(position).index()
    }

    /// Connect two vertices.
    ///
    /// Adding an edge that already exists returns the existing key.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexOutOfRange`] for unknown vertices and
    /// [`GraphError::SelfLoop`] when `u == v`.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<EdgeKey, GraphError> {
        let count = self.vertex_count();
        for vertex in [u, v] {
            if vertex >= count {
                return Err(GraphError::VertexOutOfRange { vertex, count });
            }
        }
        if u == v {
            return Err(GraphError::SelfLoop(u));
        }
        let key = EdgeKey::new(u, v);
        if self
            .graph
            .find_edge(NodeIndex::new(key.a), NodeIndex::new(key.b))
            .is_some()
        {
            debug!(edge = %key, "ignoring duplicate edge");
        } else {
            self.graph
                .add_edge(NodeIndex::new(key.a), NodeIndex::new(key.b), key);
        }
        Ok(key)
    }

    /// Position of a vertex, if it exists.
    #[must_use]
    pub fn vertex(&self, vertex: usize) -> Option<Point> {
        self.graph.node_weight(NodeIndex::new(vertex)).copied()
    }

    /// Iterate over vertex positions in index order.
    pub fn vertices(&self) -> impl Iterator<Item = Point> + '_ {
        self.graph.node_weights().copied()
    }

    /// Iterate over edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.graph.edge_weights().copied()
    }

    /// Position in insertion order of an edge, if it exists.
    #[must_use]
    pub fn edge_index(&self, key: EdgeKey) -> Option<usize> {
        if key.b >= self.vertex_count() {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(key.a), NodeIndex::new(key.b))
            .map(|edge| edge.index())
    }

    /// Edges touching `vertex`, in insertion order.
    #[must_use]
    pub fn incident_edges(&self, vertex: usize) -> Vec<EdgeKey> {
        if vertex >= self.vertex_count() {
            return Vec::new();
        }
        let mut incident: Vec<_> = self
            .graph
            .edges(NodeIndex::new(vertex))
            .map(|edge| (edge.id().index(), *edge.weight()))
            .collect();
        incident.sort_unstable_by_key(|(index, _)| *index);
        incident.into_iter().map(|(_, key)| key).collect()
    }

    /// Vertices adjacent to `vertex`, in edge insertion order.
    #[must_use]
    pub fn neighbors(&self, vertex: usize) -> Vec<usize> {
        self.incident_edges(vertex)
            .into_iter()
            .filter_map(|key| key.other(vertex))
            .collect()
    }

    /// Number of edges touching `vertex`.
    #[must_use]
    pub fn degree(&self, vertex: usize) -> usize {
        if vertex >= self.vertex_count() {
            return 0;
        }
        self.graph.edges(NodeIndex::new(vertex)).count()
    }

    /// Algebraic position of a vertex known to exist.
    pub(crate) fn position(&self, vertex: usize) -> Point3<f64> {
        self.graph[NodeIndex::new(vertex)].to_point3()
    }

    /// Vector from the start to the end of a directed edge.
    pub(crate) fn direction(&self, edge: DirectedEdge) -> Vector3<f64> {
        self.position(edge.to) - self.position(edge.from)
    }

    /// Length of an edge whose vertices exist.
    pub(crate) fn edge_length(&self, key: EdgeKey) -> f64 {
        self.direction(key.forward()).norm()
    }
}

impl PartialEq for Structure {
    fn eq(&self, other: &Self) -> bool {
        self.vertices().eq(other.vertices()) && self.edges().eq(other.edges())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point;

    fn triangle() -> Structure {
        Structure::from_parts(
            [
                point(0.0, 0.0, 0.0),
                point(1.0, 0.0, 0.0),
                point(0.0, 1.0, 0.0),
            ],
            [(0, 1), (1, 2), (0, 2)],
        )
        .expect("valid triangle")
    }

    #[test]
    fn edges_are_canonical_and_deduplicated() {
        let mut structure = triangle();
        let key = structure.add_edge(2, 1).expect("existing edge accepted");
        assert_eq!(key, EdgeKey::new(1, 2));
        assert_eq!(structure.edge_count(), 3);
        assert_eq!(
            structure.edges().collect::<Vec<_>>(),
            vec![EdgeKey::new(0, 1), EdgeKey::new(1, 2), EdgeKey::new(0, 2)]
        );
    }

    #[test]
    fn invalid_edges_are_rejected() {
        let mut structure = triangle();
        assert_eq!(
            structure.add_edge(0, 3),
            Err(GraphError::VertexOutOfRange { vertex: 3, count: 3 })
        );
        assert_eq!(structure.add_edge(1, 1), Err(GraphError::SelfLoop(1)));
    }

    #[test]
    fn neighbors_follow_insertion_order() {
        let structure = triangle();
        assert_eq!(structure.neighbors(0), vec![1, 2]);
        assert_eq!(structure.neighbors(2), vec![1, 0]);
        assert_eq!(structure.degree(1), 2);
        assert_eq!(structure.degree(9), 0);
        assert!(structure.neighbors(9).is_empty());
    }

    #[test]
    fn edge_index_matches_insertion_order() {
        let structure = triangle();
        assert_eq!(structure.edge_index(EdgeKey::new(2, 0)), Some(2));
        assert_eq!(structure.edge_index(EdgeKey::new(0, 7)), None);
    }

    #[test]
    fn directed_edges_reverse_onto_same_key() {
        let edge = DirectedEdge::new(5, 2);
        assert_eq!(edge.reversed(), DirectedEdge::new(2, 5));
        assert_eq!(edge.key(), EdgeKey::new(2, 5));
        assert_eq!(EdgeKey::new(2, 5).backward(), edge);
        assert_eq!(EdgeKey::new(2, 5).other(5), Some(2));
        assert_eq!(EdgeKey::new(2, 5).other(3), None);
    }

    #[test]
    fn structures_compare_by_content() {
        assert_eq!(triangle(), triangle());
        let mut moved = Structure::new();
        moved.add_vertex(point(0.0, 0.0, 1.0));
        assert_ne!(triangle(), moved);
    }
}
