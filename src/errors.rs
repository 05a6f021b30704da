//! Error types produced while building structures, generating geometry or
//! analysing frames.
//!
//! Fatal problems are reported through the `Error` enums in this module and
//! stop the operation that raised them. Geometry generation also produces
//! recoverable [`Issue`]s which are collected next to the partial output
//! instead of aborting the pass.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::EdgeKey;
use crate::stiffness::DOFS_PER_VERTEX;

/// Error returned when a [`Structure`](crate::Structure) is edited with invalid indices.
///
/// # Examples
///
/// ```
/// use rodsteward::{point, GraphError, Structure};
///
/// let mut structure = Structure::new();
/// structure.add_vertex(point(0.0, 0.0, 0.0));
/// let error = structure.add_edge(0, 7).expect_err("unknown vertex is rejected");
/// assert_eq!(error, GraphError::VertexOutOfRange { vertex: 7, count: 1 });
/// ```
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Returned when an edge refers to a vertex that does not exist.
    #[error("vertex {vertex} does not exist (structure has {count} vertices)")]
    VertexOutOfRange {
        /// Rejected vertex index.
        vertex: usize,
        /// Number of vertices currently in the structure.
        count: usize,
    },
    /// Returned when both ends of an edge are the same vertex.
    #[error("edge would connect vertex {0} to itself")]
    SelfLoop(usize),
}

/// Error returned when generator parameters are not physically meaningful.
///
/// Validation happens before any geometry is produced, so receiving this error
/// means nothing was generated.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum InputError {
    /// Returned when the rod radius is zero or negative.
    #[error("radius must be positive (received {0})")]
    NonPositiveRadius(f64),
    /// Returned when the rod cross-section has fewer than three sides.
    #[error("rods need at least 3 sides (received {0})")]
    TooFewSides(usize),
    /// Returned when the joint wall thickness is negative.
    #[error("joint thickness must not be negative (received {0})")]
    NegativeJointThickness(f64),
    /// Returned when the joint arm length is negative.
    #[error("joint length must not be negative (received {0})")]
    NegativeJointLength(f64),
    /// Returned when the fit tolerance is negative.
    #[error("tolerance must not be negative (received {0})")]
    NegativeTolerance(f64),
    /// Returned when a parameter is NaN or infinite.
    #[error("parameter `{0}` must be finite")]
    NonFinite(&'static str),
}

/// Error returned when a frame analysis cannot produce a meaningful result.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Returned when a section or material constant is not strictly positive.
    #[error("section property `{name}` must be positive and finite (received {value})")]
    InvalidSection {
        /// Name of the rejected property.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Returned when a member spans zero distance.
    #[error("member {0} has zero length")]
    ZeroLengthMember(EdgeKey),
    /// Returned when a restraint or load refers to a vertex that does not exist.
    #[error("vertex {vertex} does not exist (structure has {count} vertices)")]
    UnknownVertex {
        /// Rejected vertex index.
        vertex: usize,
        /// Number of vertices in the analysed structure.
        count: usize,
    },
    /// Returned when the load case was sized for a different structure.
    #[error("load case covers {loads} vertices but the structure has {vertices}")]
    LoadCountMismatch {
        /// Number of load entries supplied.
        loads: usize,
        /// Number of vertices in the structure.
        vertices: usize,
    },
    /// Returned when the stiffness matrix cannot be factorised.
    #[error("stiffness matrix is singular{}; check restraints and connectivity", dof_suffix(.dof))]
    Singular {
        /// Global degree of freedom where the factorisation broke down, if known.
        dof: Option<usize>,
    },
}

/// Format the optional degree of freedom attached to [`AnalysisError::Singular`].
fn dof_suffix(dof: &Option<usize>) -> String {
    match dof {
        Some(dof) => format!(
            " at degree of freedom {dof} (vertex {})",
            dof / DOFS_PER_VERTEX
        ),
        None => String::new(),
    }
}

/// End of an edge, used to report per-arm problems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeEnd {
    /// The lower-indexed vertex of the edge.
    Start,
    /// The higher-indexed vertex of the edge.
    End,
}

/// Recoverable problem encountered while generating geometry.
///
/// Issues never abort a generation pass; the affected piece is skipped and the
/// remaining geometry is still produced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    /// The trims at both ends consume the whole edge, so no rod was made.
    RodDegenerate {
        /// Edge whose rod was skipped.
        edge: EdgeKey,
        /// Edge length before trimming.
        length: f64,
        /// Sum of both end offsets.
        trim: f64,
    },
    /// A joint arm would reach past the end of its edge, so it was skipped.
    JointOverlap {
        /// Edge carrying the arm.
        edge: EdgeKey,
        /// End of the edge the arm belongs to.
        end: EdgeEnd,
        /// Distance from the vertex to the open end of the arm.
        reach: f64,
        /// Edge length the arm had to fit within.
        length: f64,
    },
    /// The joint core could not be built; the joint keeps its welded arms only
    /// and may not be manifold.
    HullDegenerate {
        /// Vertex whose core was skipped.
        vertex: usize,
        /// Number of hull input points that were collected.
        points: usize,
    },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::RodDegenerate { edge, length, trim } => write!(
                f,
                "rod {edge} skipped: trims of {trim:.3} consume the edge length {length:.3}"
            ),
            Issue::JointOverlap {
                edge,
                end,
                reach,
                length,
            } => write!(
                f,
                "joint arm at the {end:?} of {edge} skipped: reach {reach:.3} exceeds edge length {length:.3}"
            ),
            Issue::HullDegenerate { vertex, points } => write!(
                f,
                "joint {vertex} has no core ({points} points do not span a volume); joint may not be manifold"
            ),
        }
    }
}
