use std::fmt::{self, Write};

use rodsteward::{cut_list, AnalysisResult, Generation, Part, Structure};

/// Render a text report of a generation pass and, when available, the frame
/// analysis and build order.
pub fn render_report(
    structure: &Structure,
    generation: &Generation,
    analysis: Option<&AnalysisResult>,
    sequence: Option<&[Part]>,
) -> Result<String, fmt::Error> {
    let mut output = String::new();

    writeln!(
        output,
        "Structure: {} vertices, {} edges",
        structure.vertex_count(),
        structure.edge_count()
    )?;
    writeln!(
        output,
        "Generated {} rods ({:.2} total length) and {} joints",
        generation.rods.len(),
        generation.total_rod_length(),
        generation.joints.len()
    )?;

    if !generation.issues.is_empty() {
        writeln!(output, "\nIssues:")?;
        for issue in &generation.issues {
            writeln!(output, "  {issue}")?;
        }
    }

    if generation.clashes.is_empty() {
        writeln!(output, "\nClashes: none")?;
    } else {
        writeln!(output, "\nClashes:")?;
        for edge in &generation.clashes.rods {
            writeln!(output, "  rod {edge}")?;
        }
        for vertex in &generation.clashes.joints {
            writeln!(output, "  joint {vertex}")?;
        }
    }

    writeln!(output, "\nCut list:")?;
    for (edge, length) in cut_list(generation) {
        writeln!(output, "  {edge}: {length:.2}")?;
    }

    if let Some(parts) = sequence {
        writeln!(output, "\nAssembly order:")?;
        for (step, part) in parts.iter().enumerate() {
            writeln!(output, "  {:>3}. {part}", step + 1)?;
        }
    }

    if let Some(result) = analysis {
        render_analysis(&mut output, structure, result)?;
    }

    Ok(output)
}

/// Append displacement extremes and member utilization.
fn render_analysis(
    output: &mut String,
    structure: &Structure,
    result: &AnalysisResult,
) -> fmt::Result {
    writeln!(output, "\nFrame analysis:")?;
    let largest = (0..structure.vertex_count())
        .filter_map(|vertex| Some((vertex, result.displacement(vertex)?.translation().norm())))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((vertex, magnitude)) = largest {
        writeln!(
            output,
            "  largest displacement: {magnitude:.4e} at vertex {vertex}"
        )?;
    }
    for member in &result.members {
        let flag = if member.utilization > 1.0 { "  FAILS" } else { "" };
        writeln!(
            output,
            "  {}: stress [{:+.3}, {:+.3}], utilization {:.3}{flag}",
            member.edge, member.stress_min, member.stress_max, member.utilization
        )?;
    }
    if !result.clamped_members.is_empty() {
        let edges: Vec<String> = result
            .clamped_members
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(
            output,
            "  clamped in one bending plane: {}",
            edges.join(", ")
        )?;
    }
    writeln!(output, "  max utilization: {:.3}", result.max_utilization())
}
