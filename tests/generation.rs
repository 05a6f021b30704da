#![warn(clippy::pedantic)]

use std::collections::{BTreeMap, BTreeSet};

use approx::assert_relative_eq;
use rodsteward::{
    compute_offsets, detect_clashes, generate, generate_geometry, point, EdgeEnd, EdgeKey,
    GeneratorParams, Issue, JointCoreKind, Structure,
};

fn tetrahedron() -> Structure {
    Structure::from_parts(
        [
            point(0.0, 0.0, 0.0),
            point(120.0, 0.0, 0.0),
            point(60.0, 104.0, 0.0),
            point(60.0, 35.0, 98.0),
        ],
        [(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)],
    )
    .expect("tetrahedron topology is valid")
}

/// Two vertical rods `spacing` apart along X.
fn parallel_rods(spacing: f64) -> Structure {
    Structure::from_parts(
        [
            point(0.0, 0.0, 0.0),
            point(0.0, 0.0, 80.0),
            point(spacing, 0.0, 0.0),
            point(spacing, 0.0, 80.0),
        ],
        [(0, 1), (2, 3)],
    )
    .expect("parallel rods are valid")
}

#[test]
fn identical_inputs_generate_identical_geometry() {
    let params = GeneratorParams::default();
    let first = generate(&tetrahedron(), &params).expect("valid parameters");
    let second = generate(&tetrahedron(), &params).expect("valid parameters");
    assert_eq!(first, second);

    for (vertex, joint) in &first.joints {
        let again = second.joint(*vertex).expect("same joints");
        assert_eq!(joint.vertex_count(), again.vertex_count());
        assert_eq!(joint.face_count(), again.face_count());
        for (a, b) in joint.vertices.iter().zip(&again.vertices) {
            assert!((a - b).norm() < 1e-9);
        }
    }
}

#[test]
fn tetrahedron_generates_every_part() {
    let generation = generate(&tetrahedron(), &GeneratorParams::default()).expect("valid parameters");
    assert_eq!(generation.rods.len(), 6);
    assert_eq!(generation.joints.len(), 4);
    assert!(generation.issues.is_empty());
    assert!(generation.clashes.is_empty());
    for rod in generation.rods.values() {
        assert!(rod.mesh.is_closed());
        assert!(rod.mesh.signed_volume() > 0.0);
    }
}

#[test]
fn close_parallel_rods_are_flagged_and_separated_rods_are_not() {
    let params = GeneratorParams::default();

    let close = generate_geometry(&parallel_rods(1.5 * params.radius), &params)
        .expect("valid parameters");
    let clashes = detect_clashes(&close.rods, &BTreeMap::new());
    assert_eq!(
        clashes.rods,
        BTreeSet::from([EdgeKey::new(0, 1), EdgeKey::new(2, 3)])
    );

    let apart = generate_geometry(&parallel_rods(2.5 * params.radius), &params)
        .expect("valid parameters");
    assert!(detect_clashes(&apart.rods, &BTreeMap::new()).is_empty());
}

#[test]
fn offsets_follow_the_vertex_geometry() {
    let params = GeneratorParams {
        radius: 2.0,
        joint_thickness: 1.5,
        tolerance: 0.25,
        ..GeneratorParams::default()
    };
    let structure = Structure::from_parts(
        [
            point(0.0, 0.0, 0.0),
            point(100.0, 0.0, 0.0),
            point(200.0, 0.0, 0.0),
            point(200.0, 100.0, 0.0),
        ],
        [(0, 1), (1, 2), (2, 3)],
    )
    .expect("valid chain");
    let offsets = compute_offsets(&structure, &params);

    // leaf
    assert_eq!(offsets.get(0, 1), Some(1.0));
    assert_eq!(offsets.get(3, 2), Some(1.0));
    // straight through
    assert_eq!(offsets.get(1, 0), Some(1.75));
    assert_eq!(offsets.get(1, 2), Some(1.75));
    // right angle
    let corner = offsets.get(2, 1).expect("corner offset");
    assert_relative_eq!(corner, params.outer_radius(), epsilon = 1e-12);
    assert_eq!(offsets.get(2, 3), Some(corner));
}

#[test]
fn short_edges_report_issues_but_keep_the_rest() {
    let structure = Structure::from_parts(
        [
            point(0.0, 0.0, 0.0),
            point(10.0, 0.0, 0.0),
            point(10.0, 10.0, 0.0),
            point(10.0, 10.0, 100.0),
        ],
        [(0, 1), (1, 2), (2, 3)],
    )
    .expect("valid chain");
    let params = GeneratorParams {
        joint_length: 15.0,
        ..GeneratorParams::default()
    };
    let generation = generate(&structure, &params).expect("valid parameters");

    assert!(generation.rod(EdgeKey::new(2, 3)).is_some());
    assert!(generation.rod(EdgeKey::new(1, 2)).is_none());
    assert!(generation.issues.iter().any(|issue| matches!(
        issue,
        Issue::RodDegenerate { edge, .. } if *edge == EdgeKey::new(1, 2)
    )));
    assert!(generation.issues.iter().any(|issue| matches!(
        issue,
        Issue::JointOverlap {
            edge,
            end: EdgeEnd::Start,
            ..
        } if *edge == EdgeKey::new(0, 1)
    )));
    assert_eq!(
        generation.joints.keys().copied().collect::<Vec<_>>(),
        vec![2, 3]
    );
}

#[test]
fn coreless_joints_are_plain_arms() {
    let params = GeneratorParams {
        core: JointCoreKind::None,
        ..GeneratorParams::default()
    };
    let generation = generate(&tetrahedron(), &params).expect("valid parameters");
    assert!(generation.issues.is_empty());
    let hulled = generate(&tetrahedron(), &GeneratorParams::default()).expect("valid parameters");
    for (vertex, joint) in &generation.joints {
        let with_core = hulled.joint(*vertex).expect("same joints");
        assert!(joint.face_count() < with_core.face_count());
    }
}
