use rodsteward::{analyze, load, point, LoadCase, SectionProperties, Structure};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A tetrahedron standing on three pinned feet
    let structure = Structure::from_parts(
        [
            point(0.0, 0.0, 0.0),
            point(120.0, 0.0, 0.0),
            point(60.0, 104.0, 0.0),
            point(60.0, 35.0, 98.0),
        ],
        [(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)],
    )?;

    // 6 mm PLA rods
    let section = SectionProperties::solid_rod(3.0, 3_500.0, 40.0);

    // Increase the weight on the apex until a member fails
    for weight in [50.0, 100.0, 200.0, 400.0, 800.0] {
        let mut case = LoadCase::new(structure.vertex_count());
        for foot in 0..3 {
            case.restrain(foot)?;
        }
        case.set_load(3, load(0.0, 0.0, -weight))?;

        let result = analyze(&structure, &section, &case)?;
        let apex = result.displacement(3).map(|d| d.z).unwrap_or_default();
        match result.critical_member() {
            Some(member) => println!(
                "load {weight:>5.0}: apex moves {apex:+.4}, worst member {} at {:.2}",
                member.edge, member.utilization
            ),
            None => println!("load {weight:>5.0}: no members"),
        }
    }

    Ok(())
}
