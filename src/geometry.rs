//! Fundamental geometric types shared by the mesh generators and the frame
//! analysis.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Cosine above which a tangent is treated as parallel to world Z when
/// choosing the reference up axis of a [`Basis`].
const VERTICAL_COSINE: f64 = 1.0 - 1.0e-9;

/// Position in three dimensional space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Distance along the global X axis.
    pub x: f64,
    /// Distance along the global Y axis.
    pub y: f64,
    /// Distance along the global Z axis.
    pub z: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the point into an algebraic point.
    #[must_use]
    pub fn to_point3(self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    /// Whether every coordinate is finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Point3<f64>> for Point {
    fn from(value: Point3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<Point> for Point3<f64> {
    fn from(value: Point) -> Self {
        value.to_point3()
    }
}

/// Force applied to a vertex, in the global axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Load {
    /// Force component acting along the global X axis.
    pub x: f64,
    /// Force component acting along the global Y axis.
    pub y: f64,
    /// Force component acting along the global Z axis.
    pub z: f64,
}

impl Load {
    /// Create a [`Load`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the load into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<Vector3<f64>> for Load {
    fn from(value: Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

/// Solved motion of a vertex: three translations and the two bending
/// rotations carried by the frame model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    /// Translation along the global X axis.
    pub x: f64,
    /// Translation along the global Y axis.
    pub y: f64,
    /// Translation along the global Z axis.
    pub z: f64,
    /// Rotation about the global Y axis.
    pub ry: f64,
    /// Rotation about the global Z axis.
    pub rz: f64,
}

impl Displacement {
    /// Build a displacement from the five degrees of freedom of one vertex.
    #[must_use]
    pub const fn from_dofs(dofs: [f64; 5]) -> Self {
        Self {
            x: dofs[0],
            y: dofs[1],
            z: dofs[2],
            ry: dofs[3],
            rz: dofs[4],
        }
    }

    /// The translational part as an algebraic vector.
    #[must_use]
    pub fn translation(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use rodsteward::point;
///
/// let origin = point(0.0, 0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64, z: f64) -> Point {
    Point::new(x, y, z)
}

/// Convenience helper for creating [`Load`] instances.
///
/// # Examples
/// ```
/// use rodsteward::load;
///
/// let weight = load(0.0, 0.0, -9.81);
/// assert_eq!(weight.z, -9.81);
/// ```
#[must_use]
pub const fn load(x: f64, y: f64, z: f64) -> Load {
    Load::new(x, y, z)
}

/// Straight segment between two points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First end point.
    pub start: Point3<f64>,
    /// Second end point.
    pub end: Point3<f64>,
}

impl Segment {
    /// Create a segment between two points.
    #[must_use]
    pub const fn new(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self { start, end }
    }

    /// Euclidean length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Point halfway between both ends.
    #[must_use]
    pub fn midpoint(&self) -> Point3<f64> {
        nalgebra::center(&self.start, &self.end)
    }
}

/// Right-handed orthonormal frame whose `x` axis follows a rod.
///
/// The `y` axis is built from a reference up direction (world Z, or world X
/// for vertical tangents) so that the same tangent always yields the same
/// frame. Profile polygons and member rotations are both derived from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Basis {
    /// Unit tangent.
    pub x: Vector3<f64>,
    /// First unit normal, perpendicular to the up axis.
    pub y: Vector3<f64>,
    /// Second unit normal, `x × y`.
    pub z: Vector3<f64>,
}

impl Basis {
    /// Build the frame for a tangent direction.
    ///
    /// Returns `None` when the tangent has no usable length.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::Vector3;
    /// use rodsteward::Basis;
    ///
    /// let basis = Basis::from_tangent(&Vector3::new(2.0, 0.0, 0.0)).expect("non-zero tangent");
    /// assert_eq!(basis.y, Vector3::y());
    /// assert_eq!(basis.z, Vector3::z());
    /// ```
    #[must_use]
    pub fn from_tangent(tangent: &Vector3<f64>) -> Option<Self> {
        let x = tangent.try_normalize(f64::MIN_POSITIVE)?;
        let up = if x.z.abs() > VERTICAL_COSINE {
            Vector3::x()
        } else {
            Vector3::z()
        };
        let y = up.cross(&x).try_normalize(f64::MIN_POSITIVE)?;
        let z = x.cross(&y);
        Some(Self { x, y, z })
    }

    /// Corners of a regular polygon inscribed in a circle of `radius` in the
    /// plane normal to `x`, as offsets from the centre.
    ///
    /// Corners run counter-clockwise when viewed from the tip of `x`; the
    /// first corner lies on `y`.
    #[must_use]
    pub fn ring(&self, radius: f64, sides: usize) -> Vec<Vector3<f64>> {
        (0..sides)
            .map(|corner| {
                let angle = std::f64::consts::TAU * corner as f64 / sides as f64;
                (self.y * angle.cos() + self.z * angle.sin()) * radius
            })
            .collect()
    }
}
