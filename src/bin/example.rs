//! Structural Stager Example - Two-Storey Portal Frame
//!
//! Builds a grid of line elements, converts it to beam-columns, realizes it
//! against a recording session and runs gravity, modal and pushover stages.
//! Set `RUST_LOG=info` (or `debug`) to follow the build.

use anyhow::Context;
use std::collections::BTreeMap;
use structural_stager::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    println!("=== Structural Stager Example: Portal Frame ===\n");

    let session = RecordingSession::new()
        .with_response("eigen", vec![118.4, 1021.7, 2874.2]);
    let mut model = StructuralModel::new("portal", ModelParams::default(), session);

    // Sections
    let props = model.properties_mut();
    let column = ElasticSectionSpec::new(SectionShape::rectangle(0.5, 0.5), 30e9, 12.5e9);
    props.create_elastic_section(1, "C50", StructuralType::Column, &column)?;
    let beam = ElasticSectionSpec::new(SectionShape::rectangle(0.3, 0.6), 30e9, 12.5e9);
    props.create_elastic_section(2, "B30x60", StructuralType::Beam, &beam)?;

    // Geometry: 2 bays x 1 bay x 2 storeys of line elements
    //
    //     o-----o-----o
    //     |     |     |
    //     o-----o-----o
    //     |     |     |
    //     ^     ^     ^
    //
    let summary = model.geometry_mut().create_grid(
        &[0.0, 6.0, 12.0],
        &[0.0, 5.0],
        &[0.0, 3.5, 7.0],
        Some("C50"),
        Some("B30x60"),
    )?;
    println!(
        "Grid: {} nodes, {} line elements",
        summary.nodes_created, summary.elements_created
    );

    // Lines become elastic columns and beams
    let mapping: BTreeMap<StructuralType, String> = [
        (StructuralType::Column, "C50".to_string()),
        (StructuralType::BeamX, "B30x60".to_string()),
        (StructuralType::BeamY, "B30x60".to_string()),
    ]
    .into_iter()
    .collect();
    let converted = model.geometry_mut().convert_line_elements(
        &mapping,
        None,
        Formulation::Elastic,
        None,
    )?;
    println!("Converted {converted} lines to elastic beam-columns");

    // Supports, diaphragms and floor masses
    let geo = model.geometry();
    let base: Vec<u32> = geo
        .nodes()
        .values()
        .filter(|n| n.z().abs() < 1e-9)
        .map(Node::tag)
        .collect();
    let floors: Vec<Vec<u32>> = [3.5, 7.0]
        .iter()
        .map(|z| {
            geo.nodes()
                .values()
                .filter(|n| (n.z() - z).abs() < 1e-9)
                .map(Node::tag)
                .collect()
        })
        .collect();
    for &node in &base {
        model.constraints_mut().create_constraint(node, [true; 6]);
    }
    for floor in &floors {
        let (master, slaves) = floor.split_first().context("empty floor")?;
        model
            .constraints_mut()
            .create_rigid_diaphragm(3, *master, slaves.to_vec())?;
        for &node in floor {
            model
                .geometry_mut()
                .assign_node_mass(node, [12e3, 12e3, 0.0, 0.0, 0.0, 0.0])?;
        }
    }

    // Gravity loads on the beams
    let loading = model.loading_mut();
    loading.create_linear_time_series(1, 1.0)?;
    loading.create_load_pattern(1, Some(TimeSeriesRef::Registered(1)));
    let beams: Vec<u32> = model
        .geometry()
        .elements()
        .values()
        .filter(|e| !matches!(e.structural_type, StructuralType::Column))
        .map(|e| e.tag)
        .collect();
    model
        .loading_mut()
        .create_beam_uniform_load(1, beams, 0.0, -25e3, None)?;

    // Lateral pattern for the pushover
    let roof = floors.last().and_then(|f| f.first()).copied().context("no roof node")?;
    model.loading_mut().create_constant_time_series(2, 1.0)?;
    model
        .loading_mut()
        .create_load_pattern(2, Some(TimeSeriesRef::Registered(2)));
    model
        .loading_mut()
        .create_node_load(2, NodalLoad::force(roof, 1.0, 0.0, 0.0))?;

    println!("\nBuilding model...");
    model.build_model()?;
    println!(
        "Emitted {} engine commands",
        model.session().commands().len()
    );

    // Stages
    let mut stager = model.analysis();
    let gravity = stager.run_gravity_analysis(1, &StaticOptions::gravity())?;
    println!(
        "\nGravity: {}/{} steps",
        gravity.completed_steps, gravity.requested_steps
    );

    let modal = stager.run_modal_analysis(3, None)?;
    println!("\nModal periods:");
    for (i, period) in modal.periods.iter().enumerate() {
        println!("  Mode {}: T = {:.3}s", i + 1, period);
    }

    let pushover = stager.run_pushover_analysis(
        2,
        &PushoverOptions::new(roof, 1, vec![0.05, 0.10, 0.20], 0.01),
    )?;
    println!(
        "\nPushover: {}/{} steps (complete: {})",
        pushover.completed_steps,
        pushover.requested_steps,
        pushover.is_complete()
    );

    println!("\n=== Engine script (first 15 lines) ===\n");
    for line in model.session().script().lines().take(15) {
        println!("  {line}");
    }
    println!("\n=== Staging Complete ===");
    Ok(())
}
