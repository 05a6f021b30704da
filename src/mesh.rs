//! Indexed triangle meshes used for rods, joint arms and joint cores.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Smallest box containing every point, or `None` for no points.
    #[must_use]
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            min: *first,
            max: *first,
        };
        for point in points {
            bounds.min = bounds.min.inf(point);
            bounds.max = bounds.max.sup(point);
        }
        Some(bounds)
    }

    /// Whether the boxes overlap once each is grown by `padding`.
    #[must_use]
    pub fn intersects(&self, other: &Self, padding: f64) -> bool {
        (0..3).all(|axis| {
            self.min[axis] - padding <= other.max[axis]
                && other.min[axis] - padding <= self.max[axis]
        })
    }
}

/// Triangle mesh with shared vertices.
///
/// Faces are wound counter-clockwise when seen from outside, so face normals
/// from [`Mesh::face_normals`] point outward for closed solids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Triangles as indices into `vertices`.
    pub faces: Vec<[usize; 3]>,
}

impl Mesh {
    /// Create an empty mesh.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create an empty mesh with room for the given element counts.
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        self.vertices.push(position);
        self.vertices.len() - 1
    }

    /// Append a triangle.
    pub fn add_triangle(&mut self, a: usize, b: usize, c: usize) {
        self.faces.push([a, b, c]);
    }

    /// Corner positions of a face.
    #[must_use]
    pub fn triangle(&self, face: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.faces[face];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Unit normal of every face; degenerate faces get a zero vector.
    #[must_use]
    pub fn face_normals(&self) -> Vec<Vector3<f64>> {
        (0..self.faces.len())
            .map(|face| {
                let [a, b, c] = self.triangle(face);
                (b - a)
                    .cross(&(c - a))
                    .try_normalize(f64::MIN_POSITIVE)
                    .unwrap_or_else(Vector3::zeros)
            })
            .collect()
    }

    /// Bounding box of the vertices.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Enclosed volume; positive when faces are wound outward.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        (0..self.faces.len())
            .map(|face| {
                let [a, b, c] = self.triangle(face);
                a.coords.dot(&b.coords.cross(&c.coords))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Whether every edge is shared by exactly two faces.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        if self.faces.is_empty() {
            return false;
        }
        let mut edge_uses: HashMap<(usize, usize), usize> = HashMap::new();
        for &[a, b, c] in &self.faces {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edge_uses.entry((u.min(v), u.max(v))).or_default() += 1;
            }
        }
        edge_uses.values().all(|&uses| uses == 2)
    }

    /// Copy another mesh's vertices and faces onto the end of this one.
    pub fn append(&mut self, other: &Self) {
        let base = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|&[a, b, c]| [a + base, b + base, c + base]),
        );
    }

    /// Merge vertices closer than `tolerance` and drop faces that collapse.
    ///
    /// Each vertex is replaced by the earliest vertex within `tolerance` of it,
    /// so the result depends only on vertex order. A zero tolerance merges
    /// exact duplicates only. Returns the number of vertices removed.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::Point3;
    /// use rodsteward::Mesh;
    ///
    /// let mut mesh = Mesh::new();
    /// mesh.vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    ///     Point3::new(1.0001, 0.0, 0.0),
    /// ];
    /// mesh.faces = vec![[0, 1, 2], [0, 3, 2]];
    /// assert_eq!(mesh.weld(0.001), 1);
    /// assert_eq!(mesh.vertex_count(), 3);
    /// assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 1, 2]]);
    /// ```
    pub fn weld(&mut self, tolerance: f64) -> usize {
        let original_count = self.vertices.len();
        if original_count == 0 {
            return 0;
        }
        let representative = if tolerance > 0.0 {
            self.near_representatives(tolerance)
        } else {
            self.exact_representatives()
        };

        let mut remap = vec![usize::MAX; original_count];
        let mut vertices = Vec::with_capacity(original_count);
        for (index, &target) in representative.iter().enumerate() {
            if target == index {
                remap[index] = vertices.len();
                vertices.push(self.vertices[index]);
            }
        }
        for index in 0..original_count {
            remap[index] = remap[representative[index]];
        }

        self.vertices = vertices;
        for face in &mut self.faces {
            for corner in face.iter_mut() {
                *corner = remap[*corner];
            }
        }
        self.faces
            .retain(|&[a, b, c]| a != b && b != c && a != c);
        original_count - self.vertices.len()
    }

    /// For each vertex, the earliest vertex within `tolerance` of it.
    fn near_representatives(&self, tolerance: f64) -> Vec<usize> {
        let cell_size = tolerance * 2.0;
        let cell_of = |point: &Point3<f64>| {
            (
                (point.x / cell_size).floor() as i64,
                (point.y / cell_size).floor() as i64,
                (point.z / cell_size).floor() as i64,
            )
        };

        let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
        for (index, vertex) in self.vertices.iter().enumerate() {
            grid.entry(cell_of(vertex)).or_default().push(index);
        }

        let mut representative: Vec<usize> = (0..self.vertices.len()).collect();
        for (index, vertex) in self.vertices.iter().enumerate() {
            if representative[index] != index {
                continue;
            }
            let (cx, cy, cz) = cell_of(vertex);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let Some(candidates) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                            continue;
                        };
                        for &other in candidates {
                            if other > index
                                && representative[other] == other
                                && (self.vertices[other] - vertex).norm() <= tolerance
                            {
                                representative[other] = index;
                            }
                        }
                    }
                }
            }
        }
        representative
    }

    /// For each vertex, the earliest vertex at exactly the same position.
    fn exact_representatives(&self) -> Vec<usize> {
        // -0.0 and 0.0 compare equal, so normalise the sign before hashing bits.
        let bits = |value: f64| (value + 0.0).to_bits();
        let mut first_seen: HashMap<[u64; 3], usize> = HashMap::new();
        self.vertices
            .iter()
            .enumerate()
            .map(|(index, vertex)| {
                *first_seen
                    .entry([bits(vertex.x), bits(vertex.y), bits(vertex.z)])
                    .or_insert(index)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn unit_tetrahedron() -> Mesh {
        Mesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            faces: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        }
    }

    #[test]
    fn tetrahedron_is_closed_with_positive_volume() {
        let mesh = unit_tetrahedron();
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn normals_point_outward() {
        let mesh = unit_tetrahedron();
        let normals = mesh.face_normals();
        assert_relative_eq!(normals[0], -Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(normals[1], -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn append_offsets_face_indices() {
        let mut mesh = unit_tetrahedron();
        mesh.append(&unit_tetrahedron());
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 8);
        assert_eq!(mesh.faces[4], [4, 6, 5]);
    }

    #[test]
    fn weld_merges_appended_copies() {
        let mut mesh = unit_tetrahedron();
        mesh.append(&unit_tetrahedron());
        assert_eq!(mesh.weld(0.0), 4);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 8);
        assert!(mesh.faces.iter().flatten().all(|&index| index < 4));
    }

    #[test]
    fn weld_drops_collapsed_faces() {
        let mut mesh = Mesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.05),
            ],
            faces: vec![[0, 1, 2]],
        };
        assert_eq!(mesh.weld(0.1), 1);
        assert!(mesh.is_empty());
    }

    #[test]
    fn weld_keeps_distinct_vertices() {
        let mut mesh = unit_tetrahedron();
        assert_eq!(mesh.weld(0.5), 0);
        assert_eq!(mesh, unit_tetrahedron());
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let bounds = unit_tetrahedron().bounds().expect("non-empty mesh");
        assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
        assert!(Mesh::new().bounds().is_none());
    }

    #[test]
    fn boxes_respect_padding() {
        let a = Aabb {
            min: Point3::new(0.0, 0.0, 0.0),
            max: Point3::new(1.0, 1.0, 1.0),
        };
        let b = Aabb {
            min: Point3::new(1.5, 0.0, 0.0),
            max: Point3::new(2.0, 1.0, 1.0),
        };
        assert!(!a.intersects(&b, 0.0));
        assert!(a.intersects(&b, 0.6));
    }
}
