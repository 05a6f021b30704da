#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

mod analysis;
mod collision;
mod config;
mod errors;
mod generator;
mod geometry;
mod graph;
mod hull;
mod joints;
mod mesh;
mod offsets;
mod rods;
mod sequence;
mod stiffness;

pub use analysis::{analyze, AnalysisResult, LoadCase, MemberResult};
pub use collision::{detect_clashes, meshes_intersect, ClashSet};
pub use config::{GeneratorParams, JointCoreKind, SectionProperties};
pub use errors::{AnalysisError, EdgeEnd, GraphError, InputError, Issue};
pub use generator::{generate, generate_geometry, Generation, GenerationCache};
pub use geometry::{load, point, Basis, Displacement, Load, Point, Segment};
pub use graph::{DirectedEdge, EdgeKey, Structure};
pub use hull::{convex_hull, HullError};
pub use joints::{joint_arm, ConvexHullCore, JointArm, JointCore, NoCore};
pub use mesh::{Aabb, Mesh};
pub use offsets::{compute_offsets, pair_offset, Offsets};
pub use rods::{rod_mesh, Rod};
pub use sequence::{assembly_sequence, cut_list, Part};
pub use stiffness::{
    global_stiffness, local_stiffness, member_rotation, MemberMatrix, MemberVector,
    DOFS_PER_VERTEX,
};
