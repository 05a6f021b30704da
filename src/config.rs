//! Parameters controlling geometry generation and frame analysis.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, InputError};

/// How the core bridging the arms of a joint is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointCoreKind {
    /// Convex hull of the outer profile corners of every arm.
    #[default]
    ConvexHull,
    /// Arms only; joints are left without a core.
    None,
}

/// Dimensions of rods and printed joints.
///
/// All lengths share the unit of the vertex coordinates.
///
/// # Examples
/// ```
/// use rodsteward::GeneratorParams;
///
/// let params: GeneratorParams =
///     serde_json::from_str(r#"{ "radius": 4.0, "sides": 6 }"#).expect("valid json");
/// assert_eq!(params.sides, 6);
/// assert_eq!(params.tolerance, GeneratorParams::default().tolerance);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorParams {
    /// Number of sides of the rod cross-section polygon.
    pub sides: usize,
    /// Rod radius.
    pub radius: f64,
    /// Wall thickness of the joint sleeves.
    pub joint_thickness: f64,
    /// Length of each sleeve beyond the rod end.
    pub joint_length: f64,
    /// Clearance between rod and sleeve bore; also the weld distance.
    pub tolerance: f64,
    /// Strategy used for joint cores.
    pub core: JointCoreKind,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            sides: 8,
            radius: 3.0,
            joint_thickness: 2.0,
            joint_length: 20.0,
            tolerance: 0.1,
            core: JointCoreKind::ConvexHull,
        }
    }
}

impl GeneratorParams {
    /// Radius of the sleeve bore.
    #[must_use]
    pub fn inner_radius(&self) -> f64 {
        self.radius + self.tolerance
    }

    /// Radius of the sleeve outer wall.
    #[must_use]
    pub fn outer_radius(&self) -> f64 {
        self.radius + self.joint_thickness + self.tolerance
    }

    /// Check that the parameters describe buildable geometry.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError`] found.
    pub fn validate(&self) -> Result<(), InputError> {
        let scalars = [
            ("radius", self.radius),
            ("joint_thickness", self.joint_thickness),
            ("joint_length", self.joint_length),
            ("tolerance", self.tolerance),
        ];
        if let Some(&(name, _)) = scalars.iter().find(|(_, value)| !value.is_finite()) {
            return Err(InputError::NonFinite(name));
        }
        if self.radius <= 0.0 {
            return Err(InputError::NonPositiveRadius(self.radius));
        }
        if self.sides < 3 {
            return Err(InputError::TooFewSides(self.sides));
        }
        if self.joint_thickness < 0.0 {
            return Err(InputError::NegativeJointThickness(self.joint_thickness));
        }
        if self.joint_length < 0.0 {
            return Err(InputError::NegativeJointLength(self.joint_length));
        }
        if self.tolerance < 0.0 {
            return Err(InputError::NegativeTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Material and cross-section constants shared by every member.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionProperties {
    /// Young's modulus.
    pub elastic_modulus: f64,
    /// Cross-sectional area.
    pub area: f64,
    /// Second moment of area for bending in the local x-z plane.
    pub iy: f64,
    /// Second moment of area for bending in the local x-y plane.
    pub iz: f64,
    /// Section modulus paired with `iy`.
    pub sy: f64,
    /// Section modulus paired with `iz`.
    pub sz: f64,
    /// Allowable stress before yield.
    pub allowable_stress: f64,
}

impl SectionProperties {
    /// Constants for a solid circular rod.
    ///
    /// # Examples
    /// ```
    /// use rodsteward::SectionProperties;
    ///
    /// let section = SectionProperties::solid_rod(2.0, 3_500.0, 40.0);
    /// assert!((section.area - 4.0 * std::f64::consts::PI).abs() < 1e-12);
    /// assert_eq!(section.iy, section.iz);
    /// ```
    #[must_use]
    pub fn solid_rod(radius: f64, elastic_modulus: f64, allowable_stress: f64) -> Self {
        let second_moment = PI * radius.powi(4) / 4.0;
        let section_modulus = PI * radius.powi(3) / 4.0;
        Self {
            elastic_modulus,
            area: PI * radius * radius,
            iy: second_moment,
            iz: second_moment,
            sy: section_modulus,
            sz: section_modulus,
            allowable_stress,
        }
    }

    /// Smaller of the two second moments, which governs buckling.
    #[must_use]
    pub fn min_second_moment(&self) -> f64 {
        self.iy.min(self.iz)
    }

    /// Check that every constant is strictly positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidSection`] naming the first bad value.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let values = [
            ("elastic_modulus", self.elastic_modulus),
            ("area", self.area),
            ("iy", self.iy),
            ("iz", self.iz),
            ("sy", self.sy),
            ("sz", self.sz),
            ("allowable_stress", self.allowable_stress),
        ];
        match values
            .into_iter()
            .find(|(_, value)| !(value.is_finite() && *value > 0.0))
        {
            Some((name, value)) => Err(AnalysisError::InvalidSection { name, value }),
            None => Ok(()),
        }
    }
}
