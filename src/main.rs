mod project;
mod report;

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use rodsteward::{analyze, assembly_sequence, generate, generate_geometry};

use project::Project;
use report::render_report;

/// Generate printable joints and trimmed rods for a rod structure and check
/// it under load.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Project JSON file; a demo tetrahedron is used when omitted.
    project: Option<PathBuf>,
    /// Skip the mesh clash check.
    #[arg(long)]
    no_clashes: bool,
    /// Print the assembly order starting from this vertex.
    #[arg(long, value_name = "VERTEX")]
    sequence_from: Option<usize>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let project = match &args.project {
        Some(path) => Project::load(path)?,
        None => Project::demo(),
    };
    let structure = project.structure()?;

    let generation = if args.no_clashes {
        generate_geometry(&structure, &project.params)?
    } else {
        generate(&structure, &project.params)?
    };

    let analysis = match &project.section {
        Some(section) => Some(analyze(&structure, section, &project.load_case()?)?),
        None => None,
    };

    let sequence = args
        .sequence_from
        .map(|start| assembly_sequence(&structure, start, usize::MAX))
        .transpose()?;

    let report = render_report(
        &structure,
        &generation,
        analysis.as_ref(),
        sequence.as_deref(),
    )?;
    print!("{report}");

    Ok(())
}
