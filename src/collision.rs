//! Mesh-mesh clash diagnostics between generated rods and joints.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::EdgeKey;
use crate::mesh::{Aabb, Mesh};
use crate::rods::Rod;

/// Relative size below which a segment is treated as parallel to a triangle.
const PARALLEL_EPSILON: f64 = 1.0e-12;

/// Rods and joints whose surfaces cross another part.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClashSet {
    /// Clashing rods.
    pub rods: BTreeSet<EdgeKey>,
    /// Clashing joints, by vertex.
    pub joints: BTreeSet<usize>,
}

impl ClashSet {
    /// Whether nothing clashes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rods.is_empty() && self.joints.is_empty()
    }
}

/// Piece taking part in a clash test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Piece {
    /// Rod on an edge.
    Rod(EdgeKey),
    /// Joint at a vertex.
    Joint(usize),
}

impl Piece {
    /// Whether two parts meet at a vertex by construction.
    fn touches(self, other: Self) -> bool {
        match (self, other) {
            (Self::Rod(edge), Self::Joint(vertex)) | (Self::Joint(vertex), Self::Rod(edge)) => {
                edge.contains(vertex)
            }
            _ => false,
        }
    }
}

/// Flag every rod and joint whose mesh crosses another part's mesh.
///
/// Rods are not tested against the joints at their own ends, since they are
/// seated in them by construction. Pairs whose members are both flagged
/// already are skipped.
#[must_use]
pub fn detect_clashes(rods: &BTreeMap<EdgeKey, Rod>, joints: &BTreeMap<usize, Mesh>) -> ClashSet {
    let pieces: Vec<(Piece, &Mesh)> = rods
        .iter()
        .map(|(edge, rod)| (Piece::Rod(*edge), &rod.mesh))
        .chain(joints.iter().map(|(vertex, mesh)| (Piece::Joint(*vertex), mesh)))
        .collect();

    let mut flagged: BTreeSet<Piece> = BTreeSet::new();
    let mut tested = 0_usize;
    for (index, &(first, first_mesh)) in pieces.iter().enumerate() {
        for &(second, second_mesh) in &pieces[index + 1..] {
            if first.touches(second) || (flagged.contains(&first) && flagged.contains(&second)) {
                continue;
            }
            tested += 1;
            if meshes_intersect(first_mesh, second_mesh) {
                flagged.insert(first);
                flagged.insert(second);
            }
        }
    }
    debug!(pairs = tested, clashes = flagged.len(), "checked clashes");

    let mut clashes = ClashSet::default();
    for piece in flagged {
        match piece {
            Piece::Rod(edge) => {
                clashes.rods.insert(edge);
            }
            Piece::Joint(vertex) => {
                clashes.joints.insert(vertex);
            }
        }
    }
    clashes
}

/// Whether any triangle of `first` crosses any triangle of `second`.
///
/// Only crossing surfaces count; a mesh buried entirely inside the other or
/// faces touching in a shared plane are not reported.
///
/// # Examples
/// ```
/// use nalgebra::Point3;
/// use rodsteward::{meshes_intersect, rod_mesh, Segment};
///
/// let along_x = Segment::new(Point3::new(-5.0, 0.0, 0.0), Point3::new(5.0, 0.0, 0.0));
/// let along_y = Segment::new(Point3::new(0.0, -5.0, 0.0), Point3::new(0.0, 5.0, 0.0));
/// let first = rod_mesh(&along_x, 1.0, 6).expect("valid rod");
/// let second = rod_mesh(&along_y, 1.0, 6).expect("valid rod");
/// assert!(meshes_intersect(&first, &second));
/// ```
#[must_use]
pub fn meshes_intersect(first: &Mesh, second: &Mesh) -> bool {
    let (Some(first_bounds), Some(second_bounds)) = (first.bounds(), second.bounds()) else {
        return false;
    };
    if !first_bounds.intersects(&second_bounds, 0.0) {
        return false;
    }

    let candidates: Vec<([Point3<f64>; 3], Aabb)> = (0..second.face_count())
        .map(|face| {
            let triangle = second.triangle(face);
            (triangle, triangle_bounds(&triangle))
        })
        .filter(|(_, bounds)| bounds.intersects(&first_bounds, 0.0))
        .collect();

    (0..first.face_count()).any(|face| {
        let triangle = first.triangle(face);
        let bounds = triangle_bounds(&triangle);
        bounds.intersects(&second_bounds, 0.0)
            && candidates.iter().any(|(other, other_bounds)| {
                bounds.intersects(other_bounds, 0.0) && triangles_intersect(&triangle, other)
            })
    })
}

/// Bounding box of a single triangle.
fn triangle_bounds(triangle: &[Point3<f64>; 3]) -> Aabb {
    let [a, b, c] = triangle;
    Aabb {
        min: a.inf(b).inf(c),
        max: a.sup(b).sup(c),
    }
}

/// Whether two triangles cross, tested as each edge against the other face.
fn triangles_intersect(first: &[Point3<f64>; 3], second: &[Point3<f64>; 3]) -> bool {
    let crosses = |edges: &[Point3<f64>; 3], face: &[Point3<f64>; 3]| {
        (0..3).any(|i| segment_crosses_triangle(&edges[i], &edges[(i + 1) % 3], face))
    };
    crosses(first, second) || crosses(second, first)
}

/// Möller-Trumbore test of the closed segment `start`–`end` against a
/// triangle.
fn segment_crosses_triangle(
    start: &Point3<f64>,
    end: &Point3<f64>,
    triangle: &[Point3<f64>; 3],
) -> bool {
    let direction = end - start;
    let edge1 = triangle[1] - triangle[0];
    let edge2 = triangle[2] - triangle[0];
    let h = direction.cross(&edge2);
    let det = edge1.dot(&h);
    let scale = direction.norm() * edge1.norm() * edge2.norm();
    if det.abs() <= PARALLEL_EPSILON * scale {
        return false;
    }

    let inverse = 1.0 / det;
    let s = start - triangle[0];
    let u = inverse * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let q = s.cross(&edge1);
    let v = inverse * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }
    let t = inverse * edge2.dot(&q);
    (0.0..=1.0).contains(&t)
}
