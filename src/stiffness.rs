//! Member matrices for the five-DOF frame model.
//!
//! Each vertex carries three translations and the rotations about the global
//! Y and Z axes, in that order. Member-local DOFs follow the same pattern:
//! axial translation, the two transverse translations, and rotations about
//! the local y and z axes. Torsion and shear deformation are not modelled.

use nalgebra::{Matrix2, Matrix3, SMatrix, SVector};

use crate::config::SectionProperties;
use crate::geometry::Basis;

/// Degrees of freedom carried by every vertex.
pub const DOFS_PER_VERTEX: usize = 5;

/// Matrix over the DOFs of both ends of a member.
pub type MemberMatrix = SMatrix<f64, 10, 10>;

/// Vector over the DOFs of both ends of a member.
pub type MemberVector = SVector<f64, 10>;

/// Euler-Bernoulli stiffness of a member in its local axes.
///
/// # Examples
/// ```
/// use rodsteward::{local_stiffness, SectionProperties};
///
/// let section = SectionProperties::solid_rod(1.0, 200.0, 1.0);
/// let k = local_stiffness(&section, 10.0);
/// assert!((k[(0, 0)] - 200.0 * section.area / 10.0).abs() < 1e-12);
/// assert_eq!(k, k.transpose());
/// ```
#[must_use]
pub fn local_stiffness(section: &SectionProperties, length: f64) -> MemberMatrix {
    let e = section.elastic_modulus;
    let axial = e * section.area / length;
    let [z12, z6, z4, z2] = bending_terms(e * section.iz, length);
    let [y12, y6, y4, y2] = bending_terms(e * section.iy, length);

    let mut k = MemberMatrix::zeros();
    k[(0, 0)] = axial;
    k[(0, 5)] = -axial;
    k[(5, 5)] = axial;

    // bending in the local x-y plane: v and rotation about z
    k[(1, 1)] = z12;
    k[(1, 4)] = z6;
    k[(1, 6)] = -z12;
    k[(1, 9)] = z6;
    k[(4, 4)] = z4;
    k[(4, 6)] = -z6;
    k[(4, 9)] = z2;
    k[(6, 6)] = z12;
    k[(6, 9)] = -z6;
    k[(9, 9)] = z4;

    // bending in the local x-z plane: w and rotation about y
    k[(2, 2)] = y12;
    k[(2, 3)] = -y6;
    k[(2, 7)] = -y12;
    k[(2, 8)] = -y6;
    k[(3, 3)] = y4;
    k[(3, 7)] = y6;
    k[(3, 8)] = y2;
    k[(7, 7)] = y12;
    k[(7, 8)] = y6;
    k[(8, 8)] = y4;

    k.fill_lower_triangle_with_upper_triangle();
    k
}

/// `12EI/L³`, `6EI/L²`, `4EI/L` and `2EI/L` for one bending plane.
fn bending_terms(flexural_rigidity: f64, length: f64) -> [f64; 4] {
    [
        12.0 * flexural_rigidity / length.powi(3),
        6.0 * flexural_rigidity / length.powi(2),
        4.0 * flexural_rigidity / length,
        2.0 * flexural_rigidity / length,
    ]
}

/// Transformation from global to member-local DOFs.
///
/// Translations rotate with the direction cosines of the local axes. The two
/// global rotations map onto the local bending rotations through the Y and Z
/// components of the local y and z axes.
///
/// # Examples
/// ```
/// use nalgebra::Vector3;
/// use rodsteward::{member_rotation, Basis, MemberMatrix};
///
/// let basis = Basis::from_tangent(&Vector3::x()).expect("non-zero tangent");
/// assert_eq!(member_rotation(&basis), MemberMatrix::identity());
/// ```
#[must_use]
pub fn member_rotation(basis: &Basis) -> MemberMatrix {
    let cosines = Matrix3::from_rows(&[
        basis.x.transpose(),
        basis.y.transpose(),
        basis.z.transpose(),
    ]);
    let bending = Matrix2::new(basis.y.y, basis.y.z, basis.z.y, basis.z.z);

    let mut r = MemberMatrix::zeros();
    for end in 0..2 {
        let base = end * DOFS_PER_VERTEX;
        r.fixed_view_mut::<3, 3>(base, base).copy_from(&cosines);
        r.fixed_view_mut::<2, 2>(base + 3, base + 3).copy_from(&bending);
    }
    r
}

/// Member stiffness in global DOFs, `Rᵀ · k · R`.
#[must_use]
pub fn global_stiffness(local: &MemberMatrix, rotation: &MemberMatrix) -> MemberMatrix {
    rotation.transpose() * local * rotation
}
