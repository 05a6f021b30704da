//! Incremental 3D convex hull over a point cloud.
//!
//! Points are centred and scaled to a fixed working extent before any
//! orientation test, so the same tolerances apply whether the input spans
//! millimetres or kilometres. The returned mesh references the caller's
//! original coordinates, not the scaled copies.

use std::collections::{HashMap, HashSet};

use nalgebra::{Point3, Vector3};
use thiserror::Error;

use crate::mesh::{Aabb, Mesh};

/// Half-extent the input is scaled to before hulling.
const WORKING_EXTENT: f64 = 1000.0;

/// Distance below which a point counts as lying on a plane or line, in
/// working units.
const PLANE_EPSILON: f64 = 1.0e-7;

/// Error returned when a point cloud does not enclose a volume.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HullError {
    /// Returned when fewer than four points are supplied.
    #[error("a hull needs at least 4 points (received {0})")]
    TooFewPoints(usize),
    /// Returned when every point is at the same position.
    #[error("all points coincide")]
    Coincident,
    /// Returned when every point lies on one line.
    #[error("all points are collinear")]
    Collinear,
    /// Returned when every point lies in one plane.
    #[error("all points are coplanar")]
    Coplanar,
}

/// Hull face in working coordinates.
#[derive(Clone, Copy, Debug)]
struct Face {
    /// Corner indices, counter-clockwise seen from outside.
    corners: [usize; 3],
    /// Outward unit normal.
    normal: Vector3<f64>,
    /// Plane offset along `normal`.
    offset: f64,
}

impl Face {
    /// Build a face and its plane from three corner indices.
    fn new(points: &[Point3<f64>], corners: [usize; 3]) -> Self {
        let [a, b, c] = corners.map(|corner| points[corner]);
        let normal = (b - a)
            .cross(&(c - a))
            .try_normalize(f64::MIN_POSITIVE)
            .unwrap_or_else(Vector3::zeros);
        Self {
            corners,
            normal,
            offset: normal.dot(&a.coords),
        }
    }

    /// Signed distance of `point` above the face plane.
    fn distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Directed boundary edges in winding order.
    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.corners;
        [(a, b), (b, c), (c, a)]
    }
}

/// Compute the convex hull of `points` as a closed, outward-wound mesh.
///
/// Only points on the hull appear in the result, in the order they were
/// first used by a face. Points lying within a small tolerance of an
/// existing face are treated as interior.
///
/// # Errors
///
/// Returns [`HullError`] when the points cannot enclose a volume.
///
/// # Examples
/// ```
/// use nalgebra::Point3;
/// use rodsteward::convex_hull;
///
/// let mut points = Vec::new();
/// for corner in 0..8 {
///     let bit = |b: u32| f64::from((corner >> b) & 1);
///     points.push(Point3::new(bit(0), bit(1), bit(2)));
/// }
/// points.push(Point3::new(0.5, 0.5, 0.5));
/// let hull = convex_hull(&points).expect("cube encloses a volume");
/// assert_eq!(hull.vertex_count(), 8);
/// assert_eq!(hull.face_count(), 12);
/// assert!((hull.signed_volume() - 1.0).abs() < 1e-9);
/// ```
pub fn convex_hull(points: &[Point3<f64>]) -> Result<Mesh, HullError> {
    if points.len() < 4 {
        return Err(HullError::TooFewPoints(points.len()));
    }
    let working = normalise(points).ok_or(HullError::Coincident)?;
    let seed = initial_simplex(&working)?;

    let [p0, p1, p2, p3] = seed;
    let mut faces = vec![
        Face::new(&working, [p0, p2, p1]),
        Face::new(&working, [p0, p1, p3]),
        Face::new(&working, [p1, p2, p3]),
        Face::new(&working, [p0, p3, p2]),
    ];

    for (index, point) in working.iter().enumerate() {
        if seed.contains(&index) {
            continue;
        }
        let visible: Vec<bool> = faces
            .iter()
            .map(|face| face.distance(point) > PLANE_EPSILON)
            .collect();
        if !visible.contains(&true) {
            continue;
        }

        let visible_edges: HashSet<(usize, usize)> = faces
            .iter()
            .zip(&visible)
            .filter(|&(_, &seen)| seen)
            .flat_map(|(face, _)| face.edges())
            .collect();
        let horizon: Vec<(usize, usize)> = faces
            .iter()
            .zip(&visible)
            .filter(|&(_, &seen)| seen)
            .flat_map(|(face, _)| face.edges())
            .filter(|&(a, b)| !visible_edges.contains(&(b, a)))
            .collect();

        let mut kept: Vec<Face> = faces
            .iter()
            .zip(&visible)
            .filter(|&(_, &seen)| !seen)
            .map(|(face, _)| *face)
            .collect();
        kept.extend(
            horizon
                .into_iter()
                .map(|(a, b)| Face::new(&working, [a, b, index])),
        );
        faces = kept;
    }

    Ok(to_mesh(points, &faces))
}

/// Centre the points on their bounding box and scale them to the working
/// extent. Returns `None` when the points have no extent.
fn normalise(points: &[Point3<f64>]) -> Option<Vec<Point3<f64>>> {
    let bounds = Aabb::from_points(points)?;
    let centre = nalgebra::center(&bounds.min, &bounds.max);
    let half_extent = (bounds.max - bounds.min).amax() / 2.0;
    if !(half_extent > 0.0 && half_extent.is_finite()) {
        return None;
    }
    let scale = WORKING_EXTENT / half_extent;
    Some(
        points
            .iter()
            .map(|point| Point3::from((point - centre) * scale))
            .collect(),
    )
}

/// Pick four points spanning a volume, ordered so that the fourth lies on the
/// positive side of the first three.
fn initial_simplex(points: &[Point3<f64>]) -> Result<[usize; 4], HullError> {
    let farthest = |score: &dyn Fn(&Point3<f64>) -> f64| {
        points
            .iter()
            .enumerate()
            .map(|(index, point)| (index, score(point)))
            .fold((0, f64::NEG_INFINITY), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    };

    let (p0, _) = farthest(&|point| -point.x);
    let (p1, spread) = farthest(&|point| (point - points[p0]).norm());
    if spread <= PLANE_EPSILON {
        return Err(HullError::Coincident);
    }

    let axis = (points[p1] - points[p0]).normalize();
    let (p2, offset) = farthest(&|point| (point - points[p0]).cross(&axis).norm());
    if offset <= PLANE_EPSILON {
        return Err(HullError::Collinear);
    }

    let normal = (points[p1] - points[p0])
        .cross(&(points[p2] - points[p0]))
        .normalize();
    let (p3, height) = farthest(&|point| normal.dot(&(point - points[p0])).abs());
    if height <= PLANE_EPSILON {
        return Err(HullError::Coplanar);
    }

    if normal.dot(&(points[p3] - points[p0])) > 0.0 {
        Ok([p0, p1, p2, p3])
    } else {
        Ok([p0, p2, p1, p3])
    }
}

/// Convert working faces into a mesh over the original coordinates.
fn to_mesh(points: &[Point3<f64>], faces: &[Face]) -> Mesh {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    let mut mesh = Mesh::with_capacity(faces.len() / 2 + 2, faces.len());
    for face in faces {
        let corners = face.corners.map(|corner| {
            *remap
                .entry(corner)
                .or_insert_with(|| mesh.add_vertex(points[corner]))
        });
        mesh.faces.push(corners);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn cube(size: f64) -> Vec<Point3<f64>> {
        (0..8)
            .map(|corner: u32| {
                let bit = |b: u32| f64::from((corner >> b) & 1) * size;
                Point3::new(bit(0), bit(1), bit(2))
            })
            .collect()
    }

    #[test]
    fn tiny_and_huge_cubes_hull_alike() {
        for size in [1.0e-3, 1.0, 1.0e4] {
            let hull = convex_hull(&cube(size)).expect("cube");
            assert_eq!(hull.face_count(), 12);
            assert!(hull.is_closed());
            assert_relative_eq!(hull.signed_volume(), size.powi(3), max_relative = 1e-9);
        }
    }

    #[test]
    fn interior_points_are_dropped() {
        let mut points = cube(2.0);
        points.insert(3, Point3::new(1.0, 1.0, 1.0));
        points.push(Point3::new(0.5, 1.5, 1.0));
        let hull = convex_hull(&points).expect("cube");
        assert_eq!(hull.vertex_count(), 8);
        assert!(!hull.vertices.contains(&Point3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn hull_keeps_original_coordinates() {
        let points = cube(0.1);
        let hull = convex_hull(&points).expect("cube");
        for vertex in &hull.vertices {
            assert!(points.contains(vertex));
        }
    }

    #[test]
    fn hull_is_deterministic() {
        let points: Vec<_> = (0..40)
            .map(|i| {
                let t = f64::from(i);
                Point3::new((t * 1.3).sin() * 5.0, (t * 0.7).cos() * 4.0, (t * 2.1).sin() * 3.0)
            })
            .collect();
        let first = convex_hull(&points).expect("scattered points");
        let second = convex_hull(&points).expect("scattered points");
        assert_eq!(first, second);
        assert!(first.is_closed());
        assert!(first.signed_volume() > 0.0);
    }

    #[test]
    fn degenerate_clouds_are_rejected() {
        let origin = Point3::origin();
        assert_eq!(
            convex_hull(&[origin, origin, origin]),
            Err(HullError::TooFewPoints(3))
        );
        assert_eq!(convex_hull(&[origin; 5]), Err(HullError::Coincident));

        let line: Vec<_> = (0..5).map(|i| Point3::new(f64::from(i), 0.0, 0.0)).collect();
        assert_eq!(convex_hull(&line), Err(HullError::Collinear));

        let square: Vec<_> = cube(1.0).into_iter().filter(|p| p.z == 0.0).collect();
        assert_eq!(convex_hull(&square), Err(HullError::Coplanar));
    }
}
