//! Printable joints: one hollow arm per rod end plus a core bridging them.
//!
//! Joint pieces are never unioned as solids. Each arm and the core are built
//! so that their shared corners coincide exactly, then appended and welded.

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::config::{GeneratorParams, JointCoreKind};
use crate::errors::{EdgeEnd, Issue};
use crate::geometry::Basis;
use crate::graph::{EdgeKey, Structure};
use crate::hull::{convex_hull, HullError};
use crate::mesh::Mesh;
use crate::offsets::Offsets;
use crate::rods::Rod;

/// Strategy that builds the solid joining all arms of a joint.
pub trait JointCore {
    /// Build a core from the outer corners of every arm at the vertex.
    ///
    /// # Errors
    ///
    /// Returns [`HullError`] when the corners do not describe a solid.
    fn build(&self, points: &[Point3<f64>]) -> Result<Mesh, HullError>;
}

/// Core formed by the convex hull of the arm corners.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConvexHullCore;

impl JointCore for ConvexHullCore {
    fn build(&self, points: &[Point3<f64>]) -> Result<Mesh, HullError> {
        convex_hull(points)
    }
}

/// Leaves joints as bare arms.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCore;

impl JointCore for NoCore {
    fn build(&self, _points: &[Point3<f64>]) -> Result<Mesh, HullError> {
        Ok(Mesh::new())
    }
}

impl JointCoreKind {
    /// Core builder selected by this kind.
    #[must_use]
    pub fn strategy(self) -> &'static dyn JointCore {
        match self {
            Self::ConvexHull => &ConvexHullCore,
            Self::None => &NoCore,
        }
    }
}

/// Hollow sleeve that receives one rod end.
#[derive(Clone, Debug, PartialEq)]
pub struct JointArm {
    /// Closed arm shell.
    pub mesh: Mesh,
    /// Outer profile corners in the plane through the vertex.
    pub footprint: Vec<Point3<f64>>,
}

/// Build the arm leaving `origin` along `direction`.
///
/// The arm is solid from the vertex up to `offset`, where the rod end sits,
/// and hollow from there to `offset + joint_length`. Returns `None` for a
/// zero direction.
///
/// # Examples
/// ```
/// use nalgebra::{Point3, Vector3};
/// use rodsteward::{joint_arm, GeneratorParams};
///
/// let params = GeneratorParams::default();
/// let arm = joint_arm(Point3::origin(), &Vector3::x(), 5.0, &params).expect("valid direction");
/// assert!(arm.mesh.is_closed());
/// assert_eq!(arm.footprint.len(), params.sides);
/// ```
#[must_use]
pub fn joint_arm(
    origin: Point3<f64>,
    direction: &Vector3<f64>,
    offset: f64,
    params: &GeneratorParams,
) -> Option<JointArm> {
    let sides = params.sides;
    if sides < 3 {
        return None;
    }
    let basis = Basis::from_tangent(direction)?;
    let outer = basis.ring(params.outer_radius(), sides);
    let inner = basis.ring(params.inner_radius(), sides);
    let seat = origin + basis.x * offset;
    let mouth = origin + basis.x * (offset + params.joint_length);

    let mut mesh = Mesh::with_capacity(4 * sides + 2, 8 * sides);
    mesh.add_vertex(origin);
    mesh.add_vertex(seat);
    let footprint: Vec<_> = outer.iter().map(|corner| origin + corner).collect();
    mesh.vertices.extend_from_slice(&footprint);
    mesh.vertices.extend(outer.iter().map(|corner| mouth + corner));
    mesh.vertices.extend(inner.iter().map(|corner| seat + corner));
    mesh.vertices.extend(inner.iter().map(|corner| mouth + corner));

    let outer_base = 2;
    let outer_mouth = 2 + sides;
    let inner_seat = 2 + 2 * sides;
    let inner_mouth = 2 + 3 * sides;
    for i in 0..sides {
        let j = (i + 1) % sides;
        // base disk at the vertex
        mesh.add_triangle(0, outer_base + j, outer_base + i);
        // floor of the bore
        mesh.add_triangle(1, inner_seat + i, inner_seat + j);
        // rim
        mesh.add_triangle(outer_mouth + i, outer_mouth + j, inner_mouth + j);
        mesh.add_triangle(outer_mouth + i, inner_mouth + j, inner_mouth + i);
        // outer wall
        mesh.add_triangle(outer_base + i, outer_base + j, outer_mouth + j);
        mesh.add_triangle(outer_base + i, outer_mouth + j, outer_mouth + i);
        // bore wall
        mesh.add_triangle(inner_seat + i, inner_mouth + j, inner_seat + j);
        mesh.add_triangle(inner_seat + i, inner_mouth + i, inner_mouth + j);
    }

    Some(JointArm { mesh, footprint })
}

/// Pieces collected for one joint before they are merged.
#[derive(Default)]
struct JointParts {
    /// Arm shells in edge order.
    arms: Vec<Mesh>,
    /// Footprint corners of every arm.
    corners: Vec<Point3<f64>>,
}

/// Build the merged joint mesh for every vertex that received an arm.
///
/// Only edges with a rod get arms. An arm that would reach past the far end
/// of its edge is skipped with [`Issue::JointOverlap`]. Vertices with two or
/// more arms get a core from the configured [`JointCore`]; a failing core is
/// reported as [`Issue::HullDegenerate`] and the arms are kept on their own.
pub(crate) fn build_joints(
    structure: &Structure,
    rods: &BTreeMap<EdgeKey, Rod>,
    offsets: &Offsets,
    params: &GeneratorParams,
) -> (BTreeMap<usize, Mesh>, Vec<Issue>) {
    let mut parts: BTreeMap<usize, JointParts> = BTreeMap::new();
    let mut issues = Vec::new();

    for edge in structure.edges().filter(|edge| rods.contains_key(edge)) {
        let length = structure.edge_length(edge);
        let ends = [
            (EdgeEnd::Start, edge.forward()),
            (EdgeEnd::End, edge.backward()),
        ];
        for (end, directed) in ends {
            let offset = offsets.at(directed);
            let reach = offset + params.joint_length;
            if reach >= length {
                let issue = Issue::JointOverlap {
                    edge,
                    end,
                    reach,
                    length,
                };
                warn!("{issue}");
                issues.push(issue);
                continue;
            }
            let origin = structure.position(directed.from);
            let Some(arm) = joint_arm(origin, &structure.direction(directed), offset, params)
            else {
                continue;
            };
            let joint = parts.entry(directed.from).or_default();
            joint.arms.push(arm.mesh);
            joint.corners.extend(arm.footprint);
        }
    }

    let core = params.core.strategy();
    let arm_count: usize = parts.values().map(|joint| joint.arms.len()).sum();
    let mut cores = 0;
    let mut joints = BTreeMap::new();
    for (vertex, joint) in parts {
        let mut mesh = Mesh::new();
        if joint.arms.len() >= 2 {
            match core.build(&joint.corners) {
                Ok(piece) => {
                    if !piece.is_empty() {
                        cores += 1;
                    }
                    mesh.append(&piece);
                }
                Err(error) => {
                    let issue = Issue::HullDegenerate {
                        vertex,
                        points: joint.corners.len(),
                    };
                    warn!(%error, "{issue}");
                    issues.push(issue);
                }
            }
        }
        for arm in &joint.arms {
            mesh.append(arm);
        }
        mesh.weld(params.tolerance);
        joints.insert(vertex, mesh);
    }
    debug!(
        joints = joints.len(),
        arms = arm_count,
        cores,
        "built joint meshes"
    );
    (joints, issues)
}
