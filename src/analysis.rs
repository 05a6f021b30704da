//! Linear frame analysis of a rod structure under nodal loads.
//!
//! The structure is solved with the direct stiffness method
//! (<https://en.wikipedia.org/wiki/Direct_stiffness_method>) using the
//! five-DOF beam members from [`crate::stiffness`]. Restrained vertices are
//! pinned with a penalty on their translational stiffness.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use nalgebra::{Cholesky, DMatrix, DVector};
use tracing::{debug, info, warn};

use crate::config::SectionProperties;
use crate::errors::AnalysisError;
use crate::geometry::{Basis, Displacement, Load};
use crate::graph::{EdgeKey, Structure};
use crate::stiffness::{
    global_stiffness, local_stiffness, member_rotation, MemberMatrix, MemberVector,
    DOFS_PER_VERTEX,
};

/// Factor applied to the diagonal stiffness of restrained translations.
const PENALTY: f64 = 1.0e10;

/// Smallest acceptable pivot of the equilibrated stiffness matrix.
const PIVOT_THRESHOLD: f64 = 1.0e-10;

/// Diagonal stiffness, relative to the largest one, below which a DOF is
/// treated as untouched by every member.
const INERT_THRESHOLD: f64 = 1.0e-12;

/// Determinant of the bending-rotation block below which a member cannot
/// rotate freely in one of its bending planes.
const CLAMPED_THRESHOLD: f64 = 1.0e-6;

/// Restraints and loads applied to the vertices of a structure.
///
/// # Examples
/// ```
/// use rodsteward::{load, AnalysisError, LoadCase};
///
/// let mut case = LoadCase::new(3);
/// case.restrain(0).expect("vertex exists");
/// case.set_load(1, load(0.0, 0.0, -10.0)).expect("vertex exists");
/// assert!(case.is_restrained(0));
/// assert_eq!(
///     case.restrain(5),
///     Err(AnalysisError::UnknownVertex { vertex: 5, count: 3 })
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadCase {
    /// Pinned vertices.
    restraints: BTreeSet<usize>,
    /// Applied force per vertex.
    loads: Vec<Load>,
}

impl LoadCase {
    /// Create an unloaded, unrestrained case for `vertex_count` vertices.
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        Self {
            restraints: BTreeSet::new(),
            loads: vec![Load::default(); vertex_count],
        }
    }

    /// Build a case from restrained vertices and one load per vertex.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::LoadCountMismatch`] when `loads` does not hold
    /// one entry per vertex and [`AnalysisError::UnknownVertex`] when a
    /// restraint is out of range.
    pub fn from_parts<R>(
        vertex_count: usize,
        restraints: R,
        loads: Vec<Load>,
    ) -> Result<Self, AnalysisError>
    where
        R: IntoIterator<Item = usize>,
    {
        if loads.len() != vertex_count {
            return Err(AnalysisError::LoadCountMismatch {
                loads: loads.len(),
                vertices: vertex_count,
            });
        }
        let mut case = Self {
            restraints: BTreeSet::new(),
            loads,
        };
        for vertex in restraints {
            case.restrain(vertex)?;
        }
        Ok(case)
    }

    /// Number of vertices the case was sized for.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.loads.len()
    }

    /// Pin the translations of `vertex`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownVertex`] when `vertex` is out of range.
    pub fn restrain(&mut self, vertex: usize) -> Result<(), AnalysisError> {
        self.check_vertex(vertex)?;
        self.restraints.insert(vertex);
        Ok(())
    }

    /// Replace the force applied at `vertex`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownVertex`] when `vertex` is out of range.
    pub fn set_load(&mut self, vertex: usize, load: Load) -> Result<(), AnalysisError> {
        self.check_vertex(vertex)?;
        self.loads[vertex] = load;
        Ok(())
    }

    /// Whether `vertex` is pinned.
    #[must_use]
    pub fn is_restrained(&self, vertex: usize) -> bool {
        self.restraints.contains(&vertex)
    }

    /// Pinned vertices in ascending order.
    pub fn restraints(&self) -> impl Iterator<Item = usize> + '_ {
        self.restraints.iter().copied()
    }

    /// Force applied at `vertex`, if it exists.
    #[must_use]
    pub fn load(&self, vertex: usize) -> Option<Load> {
        self.loads.get(vertex).copied()
    }

    /// Reject vertex indices outside the case.
    fn check_vertex(&self, vertex: usize) -> Result<(), AnalysisError> {
        if vertex < self.loads.len() {
            Ok(())
        } else {
            Err(AnalysisError::UnknownVertex {
                vertex,
                count: self.loads.len(),
            })
        }
    }
}

/// Stresses and utilization of one member.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemberResult {
    /// Analysed edge.
    pub edge: EdgeKey,
    /// Undeformed member length.
    pub length: f64,
    /// Most compressive extreme-fibre stress.
    pub stress_min: f64,
    /// Most tensile extreme-fibre stress.
    pub stress_max: f64,
    /// Euler critical stress of the member as a pinned column.
    pub buckling_stress: f64,
    /// Peak stress magnitude over its allowable; above one fails.
    ///
    /// The allowable is the lesser of the ultimate and buckling stress when
    /// any fibre is in compression, and the ultimate stress otherwise.
    pub utilization: f64,
}

/// Solved displacements and member results of one analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisResult {
    /// Global displacement vector, five DOFs per vertex.
    pub displacements: DVector<f64>,
    /// One entry per edge, in structure edge order.
    pub members: Vec<MemberResult>,
    /// Members with no component along world X.
    ///
    /// The two vertex rotations cannot reach one of their bending planes, so
    /// they behave as clamped at both ends in that plane.
    pub clamped_members: Vec<EdgeKey>,
}

impl AnalysisResult {
    /// Motion of `vertex`, if it exists.
    #[must_use]
    pub fn displacement(&self, vertex: usize) -> Option<Displacement> {
        let base = vertex.checked_mul(DOFS_PER_VERTEX)?;
        if base + DOFS_PER_VERTEX > self.displacements.len() {
            return None;
        }
        let mut dofs = [0.0; DOFS_PER_VERTEX];
        for (offset, dof) in dofs.iter_mut().enumerate() {
            *dof = self.displacements[base + offset];
        }
        Some(Displacement::from_dofs(dofs))
    }

    /// Result for `edge`, if it was analysed.
    #[must_use]
    pub fn member(&self, edge: EdgeKey) -> Option<&MemberResult> {
        self.members.iter().find(|member| member.edge == edge)
    }

    /// Member with the highest utilization.
    #[must_use]
    pub fn critical_member(&self) -> Option<&MemberResult> {
        self.members
            .iter()
            .max_by(|a, b| a.utilization.total_cmp(&b.utilization))
    }

    /// Highest utilization over all members, or zero without members.
    #[must_use]
    pub fn max_utilization(&self) -> f64 {
        self.critical_member()
            .map_or(0.0, |member| member.utilization)
    }
}

/// Geometry and matrices of one member, shared by assembly and recovery.
struct Member {
    /// Edge the member spans.
    edge: EdgeKey,
    /// Member length.
    length: f64,
    /// Stiffness in local axes.
    local: MemberMatrix,
    /// Global to local transformation.
    rotation: MemberMatrix,
}

impl Member {
    /// Global DOF indices of both ends, start vertex first.
    fn dofs(&self) -> [usize; 2 * DOFS_PER_VERTEX] {
        let mut dofs = [0; 2 * DOFS_PER_VERTEX];
        for (slot, dof) in dofs.iter_mut().enumerate() {
            let vertex = if slot < DOFS_PER_VERTEX {
                self.edge.a
            } else {
                self.edge.b
            };
            *dof = vertex * DOFS_PER_VERTEX + slot % DOFS_PER_VERTEX;
        }
        dofs
    }

    /// Whether the vertex rotations fail to span both local bending rotations.
    fn is_clamped(&self) -> bool {
        self.rotation
            .fixed_view::<2, 2>(3, 3)
            .clone_owned()
            .determinant()
            .abs()
            < CLAMPED_THRESHOLD
    }
}

/// Solve the structure under a load case.
///
/// # Errors
///
/// Returns [`AnalysisError`] when the section is invalid, the load case does
/// not match the structure, a member has zero length, or the structure is
/// not restrained well enough to carry the loads.
///
/// # Examples
/// ```
/// use rodsteward::{analyze, load, point, LoadCase, SectionProperties, Structure};
///
/// let structure = Structure::from_parts(
///     [point(0.0, 0.0, 0.0), point(50.0, 0.0, 0.0), point(100.0, 0.0, 0.0)],
///     [(0, 1), (1, 2)],
/// )
/// .expect("valid graph");
/// let mut case = LoadCase::new(3);
/// case.restrain(0).expect("vertex exists");
/// case.restrain(2).expect("vertex exists");
/// case.set_load(1, load(0.0, 0.0, -100.0)).expect("vertex exists");
///
/// let section = SectionProperties::solid_rod(3.0, 3_500.0, 40.0);
/// let result = analyze(&structure, &section, &case).expect("supported beam");
/// assert!(result.displacement(1).expect("vertex exists").z < 0.0);
/// assert_eq!(result.displacement(0).expect("vertex exists").z, 0.0);
/// ```
pub fn analyze(
    structure: &Structure,
    section: &SectionProperties,
    case: &LoadCase,
) -> Result<AnalysisResult, AnalysisError> {
    section.validate()?;
    if case.vertex_count() != structure.vertex_count() {
        return Err(AnalysisError::LoadCountMismatch {
            loads: case.vertex_count(),
            vertices: structure.vertex_count(),
        });
    }

    let members = build_members(structure, section)?;
    let clamped_members: Vec<EdgeKey> = members
        .iter()
        .filter(|member| member.is_clamped())
        .map(|member| member.edge)
        .collect();
    for edge in &clamped_members {
        warn!(%edge, "member is clamped in one bending plane");
    }
    let stiffness = build_stiffness_matrix(structure.vertex_count(), &members);
    let load = build_load_vector(case);
    let restrained = restrained_dofs(case);
    let displacements = solve_displacements(stiffness, load, &restrained)?;
    let results: Vec<MemberResult> = members
        .iter()
        .map(|member| member_result(member, section, &displacements))
        .collect();

    let result = AnalysisResult {
        displacements,
        members: results,
        clamped_members,
    };
    info!(
        dofs = result.displacements.len(),
        members = result.members.len(),
        max_utilization = result.max_utilization(),
        "analysis finished"
    );
    Ok(result)
}

/// Member matrices for every edge, in edge order.
fn build_members(
    structure: &Structure,
    section: &SectionProperties,
) -> Result<Vec<Member>, AnalysisError> {
    structure
        .edges()
        .map(|edge| {
            let delta = structure.direction(edge.forward());
            let length = delta.norm();
            let basis = Basis::from_tangent(&delta).ok_or(AnalysisError::ZeroLengthMember(edge))?;
            Ok(Member {
                edge,
                length,
                local: local_stiffness(section, length),
                rotation: member_rotation(&basis),
            })
        })
        .collect()
}

/// Assemble the global stiffness matrix.
fn build_stiffness_matrix(vertex_count: usize, members: &[Member]) -> DMatrix<f64> {
    let dof = vertex_count * DOFS_PER_VERTEX;
    let mut matrix = DMatrix::zeros(dof, dof);
    for member in members {
        let global = global_stiffness(&member.local, &member.rotation);
        let dofs = member.dofs();
        for (row_local, &global_row) in dofs.iter().enumerate() {
            for (col_local, &global_col) in dofs.iter().enumerate() {
                matrix[(global_row, global_col)] += global[(row_local, col_local)];
            }
        }
    }
    matrix
}

/// Assemble the global load vector; rotational DOFs carry no load.
fn build_load_vector(case: &LoadCase) -> DVector<f64> {
    let mut load = DVector::zeros(case.vertex_count() * DOFS_PER_VERTEX);
    for vertex in 0..case.vertex_count() {
        let force = case.load(vertex).unwrap_or_default();
        load.fixed_rows_mut::<3>(vertex * DOFS_PER_VERTEX)
            .copy_from(&force.to_vector());
    }
    load
}

/// Translational DOFs of every pinned vertex.
fn restrained_dofs(case: &LoadCase) -> Vec<usize> {
    case.restraints()
        .flat_map(|vertex| (0..3).map(move |axis| vertex * DOFS_PER_VERTEX + axis))
        .collect()
}

/// Solve `K u = f` with penalty restraints.
///
/// DOFs no member stiffens are pinned when unloaded. The penalised matrix is
/// equilibrated to a unit diagonal before the Cholesky factorisation so the
/// pivot check does not depend on the units of the model.
fn solve_displacements(
    mut stiffness: DMatrix<f64>,
    mut load: DVector<f64>,
    restrained: &[usize],
) -> Result<DVector<f64>, AnalysisError> {
    let dof = load.len();
    if dof == 0 {
        return Ok(load);
    }

    let largest = stiffness.diagonal().amax();
    let inert: Vec<usize> = (0..dof)
        .filter(|&i| stiffness[(i, i)] <= INERT_THRESHOLD * largest)
        .collect();
    for &i in &inert {
        if load[i] != 0.0 && !restrained.contains(&i) {
            return Err(AnalysisError::Singular { dof: Some(i) });
        }
        stiffness.row_mut(i).fill(0.0);
        stiffness.column_mut(i).fill(0.0);
        stiffness[(i, i)] = 1.0;
        load[i] = 0.0;
    }
    if !inert.is_empty() {
        debug!(count = inert.len(), "pinned inert degrees of freedom");
    }

    for &i in restrained {
        stiffness[(i, i)] *= PENALTY;
        load[i] = 0.0;
    }

    let scale = stiffness.diagonal().map(|d| 1.0 / d.sqrt());
    let equilibrated = stiffness.component_mul(&(&scale * scale.transpose()));
    let cholesky = Cholesky::new(equilibrated).ok_or(AnalysisError::Singular { dof: None })?;

    let pivots = cholesky.l_dirty().diagonal().map(|l| l * l);
    if let Some(dof) = pivots
        .iter()
        .position(|&pivot| pivot.is_nan() || pivot < PIVOT_THRESHOLD)
    {
        return Err(AnalysisError::Singular { dof: Some(dof) });
    }
    debug!(smallest_pivot = pivots.min(), "factorised stiffness matrix");

    let mut displacements = cholesky
        .solve(&load.component_mul(&scale))
        .component_mul(&scale);
    for &i in restrained.iter().chain(&inert) {
        displacements[i] = 0.0;
    }
    Ok(displacements)
}

/// Recover end forces and extreme-fibre stresses of one member.
fn member_result(
    member: &Member,
    section: &SectionProperties,
    displacements: &DVector<f64>,
) -> MemberResult {
    let global = MemberVector::from_iterator(member.dofs().iter().map(|&dof| displacements[dof]));
    let forces = member.local * (member.rotation * global);

    let axial = forces[5] / section.area;
    let bending = [
        forces[3].abs() / section.sy + forces[4].abs() / section.sz,
        forces[8].abs() / section.sy + forces[9].abs() / section.sz,
    ];
    let (stress_min, stress_max) = bending
        .iter()
        .flat_map(|&b| [axial + b, axial - b])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), stress| {
            (lo.min(stress), hi.max(stress))
        });

    let buckling_stress = PI * PI * section.elastic_modulus * section.min_second_moment()
        / (member.length * member.length * section.area);
    let peak = stress_min.abs().max(stress_max.abs());
    let allowable = if stress_min < 0.0 {
        section.allowable_stress.min(buckling_stress)
    } else {
        section.allowable_stress
    };

    MemberResult {
        edge: member.edge,
        length: member.length,
        stress_min,
        stress_max,
        buckling_stress,
        utilization: peak / allowable,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::{load, point};

    fn section() -> SectionProperties {
        SectionProperties::solid_rod(1.0, 1_000.0, 50.0)
    }

    fn bar(length: f64) -> Structure {
        Structure::from_parts([point(0.0, 0.0, 0.0), point(length, 0.0, 0.0)], [(0, 1)])
            .expect("valid bar")
    }

    #[test]
    fn load_case_checks_sizes() {
        assert_eq!(
            LoadCase::from_parts(2, [0], vec![Load::default()]),
            Err(AnalysisError::LoadCountMismatch {
                loads: 1,
                vertices: 2
            })
        );
        assert_eq!(
            LoadCase::from_parts(1, [3], vec![Load::default()]),
            Err(AnalysisError::UnknownVertex { vertex: 3, count: 1 })
        );
        let case = LoadCase::from_parts(2, [1, 1], vec![Load::default(); 2]).expect("valid case");
        assert_eq!(case.restraints().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn mismatched_case_is_rejected() {
        let result = analyze(&bar(10.0), &section(), &LoadCase::new(3));
        assert_eq!(
            result,
            Err(AnalysisError::LoadCountMismatch {
                loads: 3,
                vertices: 2
            })
        );
    }

    #[test]
    fn zero_length_member_is_rejected() {
        let structure =
            Structure::from_parts([point(1.0, 1.0, 1.0), point(1.0, 1.0, 1.0)], [(0, 1)])
                .expect("valid graph");
        assert_eq!(
            analyze(&structure, &section(), &LoadCase::new(2)),
            Err(AnalysisError::ZeroLengthMember(EdgeKey::new(0, 1)))
        );
    }

    #[test]
    fn axial_load_splits_between_collinear_members() {
        let length = 20.0;
        let structure = Structure::from_parts(
            [
                point(0.0, 0.0, 0.0),
                point(length, 0.0, 0.0),
                point(2.0 * length, 0.0, 0.0),
            ],
            [(0, 1), (1, 2)],
        )
        .expect("valid graph");
        let mut case = LoadCase::new(3);
        case.restrain(0).expect("vertex exists");
        case.restrain(2).expect("vertex exists");
        case.set_load(1, load(5.0, 0.0, 0.0)).expect("vertex exists");

        let props = section();
        let result = analyze(&structure, &props, &case).expect("stable structure");
        let middle = result.displacement(1).expect("vertex exists");
        let expected = 5.0 * length / (2.0 * props.area * props.elastic_modulus);
        assert_relative_eq!(middle.x, expected, max_relative = 1e-6);
        assert!(middle.y.abs() < 1e-12);

        let stretched = result.member(EdgeKey::new(0, 1)).expect("analysed member");
        let stress = 2.5 / props.area;
        assert_relative_eq!(stretched.stress_max, stress, max_relative = 1e-6);
        assert_relative_eq!(stretched.stress_min, stress, max_relative = 1e-6);
        assert_relative_eq!(
            stretched.utilization,
            stress / props.allowable_stress,
            max_relative = 1e-6
        );

        let squashed = result.member(EdgeKey::new(1, 2)).expect("analysed member");
        assert_relative_eq!(squashed.stress_min, -stress, max_relative = 1e-6);
        assert_relative_eq!(
            squashed.utilization,
            stress / squashed.buckling_stress,
            max_relative = 1e-6
        );
        assert_eq!(result.critical_member().map(|m| m.edge), Some(EdgeKey::new(1, 2)));
    }

    #[test]
    fn compression_is_governed_by_buckling() {
        let props = section();
        let member = Member {
            edge: EdgeKey::new(0, 1),
            length: 100.0,
            local: local_stiffness(&props, 100.0),
            rotation: MemberMatrix::identity(),
        };
        let mut displacements = DVector::zeros(10);
        displacements[5] = -0.01;
        let result = member_result(&member, &props, &displacements);

        let stress = -props.elastic_modulus * 0.01 / 100.0;
        assert_relative_eq!(result.stress_min, stress, max_relative = 1e-12);
        assert!(result.buckling_stress < props.allowable_stress);
        assert_relative_eq!(
            result.utilization,
            -stress / result.buckling_stress,
            max_relative = 1e-12
        );
    }

    #[test]
    fn mixed_sign_stress_uses_the_peak_magnitude() {
        let props = section();
        let member = Member {
            edge: EdgeKey::new(0, 1),
            length: 100.0,
            local: local_stiffness(&props, 100.0),
            rotation: MemberMatrix::identity(),
        };
        let mut displacements = DVector::zeros(10);
        displacements[4] = 0.01;
        displacements[5] = 0.01;
        let result = member_result(&member, &props, &displacements);

        assert_relative_eq!(result.stress_min, -0.3, max_relative = 1e-9);
        assert_relative_eq!(result.stress_max, 0.5, max_relative = 1e-9);
        assert!(result.buckling_stress < props.allowable_stress);
        assert_relative_eq!(
            result.utilization,
            0.5 / result.buckling_stress,
            max_relative = 1e-12
        );
    }

    #[test]
    fn members_without_an_x_component_are_clamped() {
        let structure = Structure::from_parts(
            [
                point(0.0, 0.0, 0.0),
                point(10.0, 0.0, 0.0),
                point(10.0, 10.0, 0.0),
                point(10.0, 10.0, 10.0),
                point(20.0, 20.0, 10.0),
            ],
            [(0, 1), (1, 2), (2, 3), (3, 4)],
        )
        .expect("valid graph");
        let mut case = LoadCase::new(5);
        for vertex in 0..5 {
            case.restrain(vertex).expect("vertex exists");
        }
        let result = analyze(&structure, &section(), &case).expect("fully pinned");
        assert_eq!(
            result.clamped_members,
            vec![EdgeKey::new(1, 2), EdgeKey::new(2, 3)]
        );
    }

    #[test]
    fn free_floating_structure_is_singular() {
        let mut case = LoadCase::new(2);
        case.set_load(1, load(1.0, 0.0, 0.0)).expect("vertex exists");
        assert!(matches!(
            analyze(&bar(10.0), &section(), &case),
            Err(AnalysisError::Singular { .. })
        ));
    }

    #[test]
    fn loaded_isolated_vertex_names_its_dof() {
        let structure = Structure::from_parts(
            [point(0.0, 0.0, 0.0), point(10.0, 0.0, 0.0), point(5.0, 5.0, 5.0)],
            [(0, 1)],
        )
        .expect("valid graph");
        let mut case = LoadCase::new(3);
        case.set_load(2, load(0.0, 2.0, 0.0)).expect("vertex exists");
        assert_eq!(
            analyze(&structure, &section(), &case),
            Err(AnalysisError::Singular { dof: Some(11) })
        );
    }

    #[test]
    fn empty_structure_solves_trivially() {
        let result = analyze(&Structure::new(), &section(), &LoadCase::new(0))
            .expect("nothing to solve");
        assert!(result.members.is_empty());
        assert!(result.clamped_members.is_empty());
        assert_eq!(result.max_utilization(), 0.0);
        assert!(result.displacement(0).is_none());
    }
}
