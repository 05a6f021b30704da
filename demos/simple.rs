use rodsteward::{cut_list, generate, point, GeneratorParams, Structure};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A square frame with one diagonal brace
    let structure = Structure::from_parts(
        [
            point(0.0, 0.0, 0.0),
            point(150.0, 0.0, 0.0),
            point(150.0, 150.0, 0.0),
            point(0.0, 150.0, 0.0),
        ],
        [(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)],
    )?;

    // Thin rods with short sleeves
    let params = GeneratorParams {
        radius: 2.5,
        joint_length: 15.0,
        ..GeneratorParams::default()
    };
    let generation = generate(&structure, &params)?;

    for (edge, length) in cut_list(&generation) {
        println!("rod {edge}: cut to {length:.1}");
    }
    for (vertex, joint) in &generation.joints {
        println!(
            "joint {vertex}: {} vertices, {} triangles",
            joint.vertex_count(),
            joint.face_count()
        );
    }
    for issue in &generation.issues {
        println!("warning: {issue}");
    }

    Ok(())
}
