//! Trimmed rod centrelines and their tubular meshes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GeneratorParams;
use crate::errors::Issue;
use crate::geometry::{Basis, Segment};
use crate::graph::{EdgeKey, Structure};
use crate::mesh::Mesh;
use crate::offsets::Offsets;

/// Rod cut for one edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rod {
    /// Edge centreline with both end trims removed.
    pub centreline: Segment,
    /// Closed prism swept along the centreline.
    pub mesh: Mesh,
}

impl Rod {
    /// Length of stock needed for this rod.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.centreline.length()
    }
}

/// Sweep a regular polygon inscribed in `radius` along `segment` and cap both
/// ends flat.
///
/// Returns `None` for a segment of zero length or fewer than three sides.
///
/// # Examples
/// ```
/// use nalgebra::Point3;
/// use rodsteward::{rod_mesh, Segment};
///
/// let segment = Segment::new(Point3::origin(), Point3::new(0.0, 0.0, 10.0));
/// let mesh = rod_mesh(&segment, 1.0, 6).expect("non-degenerate segment");
/// assert_eq!(mesh.vertex_count(), 12);
/// assert!(mesh.is_closed());
/// ```
#[must_use]
pub fn rod_mesh(segment: &Segment, radius: f64, sides: usize) -> Option<Mesh> {
    if sides < 3 {
        return None;
    }
    let basis = Basis::from_tangent(&(segment.end - segment.start))?;
    let ring = basis.ring(radius, sides);

    let mut mesh = Mesh::with_capacity(2 * sides, 4 * sides - 4);
    for corner in &ring {
        mesh.add_vertex(segment.start + corner);
    }
    for corner in &ring {
        mesh.add_vertex(segment.end + corner);
    }

    for corner in 1..sides - 1 {
        mesh.add_triangle(0, corner + 1, corner);
        mesh.add_triangle(sides, sides + corner, sides + corner + 1);
    }
    for corner in 0..sides {
        let next = (corner + 1) % sides;
        mesh.add_triangle(corner, next, sides + next);
        mesh.add_triangle(corner, sides + next, sides + corner);
    }
    Some(mesh)
}

/// Build the rod for every edge whose trims leave some material.
///
/// Edges consumed by their trims are skipped and reported as
/// [`Issue::RodDegenerate`].
pub(crate) fn build_rods(
    structure: &Structure,
    offsets: &Offsets,
    params: &GeneratorParams,
) -> (BTreeMap<EdgeKey, Rod>, Vec<Issue>) {
    let mut rods = BTreeMap::new();
    let mut issues = Vec::new();
    for edge in structure.edges() {
        let start = structure.position(edge.a);
        let end = structure.position(edge.b);
        let length = (end - start).norm();
        let start_trim = offsets.at(edge.forward());
        let end_trim = offsets.at(edge.backward());
        let trim = start_trim + end_trim;

        if length - trim <= 0.0 {
            let issue = Issue::RodDegenerate { edge, length, trim };
            warn!("{issue}");
            issues.push(issue);
            continue;
        }

        let direction = (end - start) / length;
        let centreline = Segment::new(start + direction * start_trim, end - direction * end_trim);
        if let Some(mesh) = rod_mesh(&centreline, params.radius, params.sides) {
            rods.insert(edge, Rod { centreline, mesh });
        }
    }
    debug!(rods = rods.len(), skipped = issues.len(), "built rod meshes");
    (rods, issues)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    use super::*;
    use crate::geometry::point;
    use crate::offsets::compute_offsets;

    #[test]
    fn prism_is_closed_with_polygon_volume() {
        let segment = Segment::new(Point3::new(1.0, 2.0, 3.0), Point3::new(5.0, -1.0, 3.0));
        let sides = 8;
        let mesh = rod_mesh(&segment, 2.0, sides).expect("valid segment");
        assert!(mesh.is_closed());
        assert_eq!(mesh.face_count(), 4 * sides - 4);
        let area = 0.5 * sides as f64 * 4.0 * (std::f64::consts::TAU / sides as f64).sin();
        assert_relative_eq!(mesh.signed_volume(), area * 5.0, epsilon = 1e-9);
    }

    #[test]
    fn prism_corners_sit_on_the_radius() {
        let segment = Segment::new(Point3::origin(), Point3::new(0.0, 3.0, 0.0));
        let mesh = rod_mesh(&segment, 1.5, 5).expect("valid segment");
        for vertex in &mesh.vertices {
            let radial = Vector3::new(vertex.x, 0.0, vertex.z);
            assert_relative_eq!(radial.norm(), 1.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_length_segment_has_no_mesh() {
        let segment = Segment::new(Point3::origin(), Point3::origin());
        assert!(rod_mesh(&segment, 1.0, 4).is_none());
    }

    #[test]
    fn rods_are_trimmed_at_both_ends() {
        let structure = Structure::from_parts(
            [point(0.0, 0.0, 0.0), point(40.0, 0.0, 0.0)],
            [(0, 1)],
        )
        .expect("valid graph");
        let params = GeneratorParams::default();
        let offsets = compute_offsets(&structure, &params);
        let (rods, issues) = build_rods(&structure, &offsets, &params);
        assert!(issues.is_empty());
        let rod = &rods[&EdgeKey::new(0, 1)];
        assert_relative_eq!(rod.centreline.start.x, 1.5, epsilon = 1e-12);
        assert_relative_eq!(rod.centreline.end.x, 38.5, epsilon = 1e-12);
        assert_relative_eq!(rod.length(), 37.0, epsilon = 1e-12);
    }

    #[test]
    fn short_edges_are_reported_and_skipped() {
        let structure = Structure::from_parts(
            [
                point(0.0, 0.0, 0.0),
                point(2.0, 0.0, 0.0),
                point(2.0, 50.0, 0.0),
            ],
            [(0, 1), (1, 2)],
        )
        .expect("valid graph");
        let params = GeneratorParams::default();
        let offsets = compute_offsets(&structure, &params);
        let (rods, issues) = build_rods(&structure, &offsets, &params);
        assert_eq!(rods.len(), 1);
        assert!(rods.contains_key(&EdgeKey::new(1, 2)));
        assert!(matches!(
            issues.as_slice(),
            [Issue::RodDegenerate { edge, .. }] if *edge == EdgeKey::new(0, 1)
        ));
    }
}
