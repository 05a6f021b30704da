use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rodsteward::{
    load, point, AnalysisError, GeneratorParams, GraphError, Load, LoadCase, Point,
    SectionProperties, Structure,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised while reading a project file.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Returned when the file cannot be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Returned when the file is not a valid project document.
    #[error("invalid project: {0}")]
    Parse(#[from] serde_json::Error),
    /// Returned when the edges do not form a valid structure.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Structure, generator parameters and optional load case read from JSON.
///
/// ```json
/// {
///   "vertices": [{ "x": 0, "y": 0, "z": 0 }, { "x": 100, "y": 0, "z": 0 }],
///   "edges": [[0, 1]],
///   "params": { "radius": 3.0 },
///   "restraints": [0],
///   "loads": { "1": { "x": 0, "y": 0, "z": -10 } }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    /// Vertex positions.
    pub vertices: Vec<Point>,
    /// Vertex-index pairs joined by rods.
    pub edges: Vec<(usize, usize)>,
    /// Rod and joint dimensions.
    #[serde(default)]
    pub params: GeneratorParams,
    /// Rod section; the frame analysis is skipped without one.
    #[serde(default)]
    pub section: Option<SectionProperties>,
    /// Pinned vertices.
    #[serde(default)]
    pub restraints: Vec<usize>,
    /// Forces keyed by vertex index.
    #[serde(default)]
    pub loads: BTreeMap<usize, Load>,
}

impl Project {
    /// Read a project from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let text = fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// A PLA tetrahedron standing on three pinned feet with a weight on top.
    pub fn demo() -> Self {
        Self {
            vertices: vec![
                point(0.0, 0.0, 0.0),
                point(120.0, 0.0, 0.0),
                point(60.0, 104.0, 0.0),
                point(60.0, 35.0, 98.0),
            ],
            edges: vec![(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)],
            params: GeneratorParams::default(),
            section: Some(SectionProperties::solid_rod(3.0, 3_500.0, 40.0)),
            restraints: vec![0, 1, 2],
            loads: BTreeMap::from([(3, load(0.0, 0.0, -200.0))]),
        }
    }

    /// Build the structure described by the project.
    pub fn structure(&self) -> Result<Structure, ProjectError> {
        Ok(Structure::from_parts(
            self.vertices.iter().copied(),
            self.edges.iter().copied(),
        )?)
    }

    /// Restraints and loads sized for the project's vertices.
    pub fn load_case(&self) -> Result<LoadCase, AnalysisError> {
        let mut case = LoadCase::new(self.vertices.len());
        for &vertex in &self.restraints {
            case.restrain(vertex)?;
        }
        for (&vertex, &force) in &self.loads {
            case.set_load(vertex, force)?;
        }
        Ok(case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_project_uses_defaults() {
        let project: Project = serde_json::from_str(
            r#"{
                "vertices": [{ "x": 0, "y": 0, "z": 0 }, { "x": 100, "y": 0, "z": 0 }],
                "edges": [[0, 1]]
            }"#,
        )
        .expect("valid project");
        assert_eq!(project.params, GeneratorParams::default());
        assert!(project.section.is_none());
        assert_eq!(project.structure().expect("valid graph").edge_count(), 1);
    }

    #[test]
    fn loads_are_keyed_by_vertex() {
        let project: Project = serde_json::from_str(
            r#"{
                "vertices": [{ "x": 0, "y": 0, "z": 0 }, { "x": 100, "y": 0, "z": 0 }],
                "edges": [[0, 1]],
                "restraints": [0],
                "loads": { "1": { "x": 1, "y": 2, "z": 3 } }
            }"#,
        )
        .expect("valid project");
        let case = project.load_case().expect("valid case");
        assert!(case.is_restrained(0));
        assert_eq!(case.load(1), Some(load(1.0, 2.0, 3.0)));
    }

    #[test]
    fn bad_edges_are_reported() {
        let project = Project {
            edges: vec![(0, 9)],
            ..Project::demo()
        };
        assert!(matches!(
            project.structure(),
            Err(ProjectError::Graph(GraphError::VertexOutOfRange { vertex: 9, .. }))
        ));
    }

    #[test]
    fn demo_project_is_consistent() {
        let project = Project::demo();
        assert_eq!(project.structure().expect("valid graph").vertex_count(), 4);
        assert!(project.load_case().is_ok());
    }
}
