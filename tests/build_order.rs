use std::collections::BTreeMap;
use structural_stager::prelude::*;

/// One entity of every kind, registered deliberately out of build order
fn full_fixture() -> StructuralModel<RecordingSession> {
    let mut model = StructuralModel::new("fixture", ModelParams::default(), RecordingSession::new());

    let loading = model.loading_mut();
    loading.create_linear_time_series(1, 1.0).unwrap();
    loading.create_load_pattern(1, Some(TimeSeriesRef::Registered(1)));
    loading.create_node_load(1, NodalLoad::force(3, 5e3, 0.0, -10e3)).unwrap();
    loading.create_beam_uniform_load(1, vec![2], 0.0, -4e3, None).unwrap();
    loading.create_sp_constraint(1, 1, 3, 0.0).unwrap();

    let geo = model.geometry_mut();
    let n1 = geo.create_node(0.0, 0.0, 0.0);
    let n2 = geo.create_node(0.0, 0.0, 3.0);
    let n3 = geo.add_node(Node::new(3, 4.0, 0.0, 3.0).with_mass([500.0, 500.0, 0.0, 0.0, 0.0, 0.0])).unwrap();
    geo.create_element(None, n1, n2, StructuralType::Column, BeamColumn::elastic("COL"))
        .unwrap();
    geo.create_element(None, n2, n3, StructuralType::Beam, BeamColumn::force_based("BEAM", 1))
        .unwrap();

    model.constraints_mut().create_equal_dof(n2, n3, vec![1]).unwrap();
    model.constraints_mut().create_constraint(n1, [true; 6]);

    let props = model.properties_mut();
    props.add_beam_integration(BeamIntegration::lobatto(1, 2, 5));
    props
        .create_elastic_section(
            1,
            "COL",
            StructuralType::Column,
            &ElasticSectionSpec::new(SectionShape::rectangle(0.4, 0.4), 30e9, 12.5e9),
        )
        .unwrap();
    props
        .create_fiber_section(
            2,
            "BEAM",
            StructuralType::Beam,
            &FiberSectionSpec::new(SectionShape::rectangle(0.3, 0.5), 1)
                .with_cover(0.03, 2)
                .with_shear_modulus(12.5e9),
        )
        .unwrap();
    props
        .create_uniaxial_material(1, "core", "Concrete01", Params::new().with("fpc", -35e6).with("epsc0", -0.002).with("fpcu", -7e6).with("epsU", -0.01))
        .unwrap();
    props
        .create_uniaxial_material(2, "cover", "Concrete01", Params::new().with("fpc", -30e6).with("epsc0", -0.002).with("fpcu", 0.0).with("epsU", -0.006))
        .unwrap();
    model
}

fn category(kind: &str) -> usize {
    match kind {
        "wipe" | "model" => 0,
        "uniaxialMaterial" => 1,
        "section" | "fiber" => 2,
        "beamIntegration" => 3,
        "node" | "mass" => 4,
        "fix" => 5,
        "equalDOF" | "rigidDiaphragm" | "rigidLink" => 6,
        "geomTransf" | "element" => 7,
        "timeSeries" => 8,
        "pattern" | "load" | "eleLoad" | "sp" => 9,
        other => panic!("unexpected command kind {other}"),
    }
}

#[test]
fn test_build_emits_categories_in_dependency_order() {
    let mut model = full_fixture();
    model.build_model().unwrap();

    let ranks: Vec<usize> = model.session().kinds().iter().map(|k| category(k)).collect();
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "out of order: {:?}", model.session().kinds());
    for rank in 0..=9 {
        assert!(ranks.contains(&rank), "category {rank} never emitted");
    }
}

#[test]
fn test_build_emits_expected_entity_lines() {
    let mut model = full_fixture();
    model.build_model().unwrap();
    let script = model.session().script();

    assert!(script.starts_with("wipe\nmodel basic -ndm 3 -ndf 6\n"));
    assert!(script.contains("uniaxialMaterial Concrete01 1 -35000000.0 -0.002 -7000000.0 -0.01"));
    assert!(script.contains("beamIntegration Lobatto 1 2 5"));
    assert!(script.contains("node 3 4.0 0.0 3.0\nmass 3 500.0 500.0 0.0 0.0 0.0 0.0"));
    assert!(script.contains("fix 1 1 1 1 1 1 1"));
    assert!(script.contains("equalDOF 2 3 1"));
    assert!(script.contains("geomTransf PDelta 1 "));
    assert!(script.contains("element elasticBeamColumn 1 1 2 1 1"));
    assert!(script.contains("element forceBeamColumn 2 2 3 2 1"));
    assert!(script.ends_with(
        "timeSeries Linear 1 -factor 1.0\n\
         pattern Plain 1 1\n\
         load 3 5000.0 0.0 -10000.0 0.0 0.0 0.0\n\
         eleLoad -ele 2 -type -beamUniform 0.0 -4000.0\n\
         sp 1 3 0.0"
    ));
}

#[test]
fn test_second_build_and_updates_emit_nothing() {
    let mut model = full_fixture();
    model.build_model().unwrap();
    let emitted = model.session().commands().len();

    model.build_model().unwrap();
    model.user_update_all().unwrap();
    model.user_update_load_pattern(1).unwrap();
    assert_eq!(model.session().commands().len(), emitted);
}

#[test]
fn test_unconverted_lines_block_the_build_before_any_emission() {
    let mut model = full_fixture();
    let geo = model.geometry_mut();
    let a = geo.create_node(10.0, 0.0, 0.0);
    let b = geo.create_node(10.0, 0.0, 3.0);
    geo.create_line_element(None, a, b, Some(StructuralType::Column)).unwrap();

    let err = model.build_model().unwrap_err();
    assert!(matches!(err, BuildError::UnconvertedLineElements(1)));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(model.session().commands().is_empty());
    assert!(!model.is_built());

    let mapping: BTreeMap<StructuralType, String> =
        [(StructuralType::Column, "COL".to_string())].into_iter().collect();
    let converted = model
        .geometry_mut()
        .convert_line_elements(&mapping, None, Formulation::Elastic, None)
        .unwrap();
    assert_eq!(converted, 1);
    model.build_model().unwrap();
    assert_eq!(model.session().commands_of("element").len(), 3);
}

#[test]
fn test_plain_pattern_without_series_aborts_the_build() {
    let mut model = full_fixture();
    model
        .loading_mut()
        .create_node_load(9, NodalLoad::force(2, 1.0, 0.0, 0.0))
        .unwrap();
    let err = model.build_model().unwrap_err();
    assert_eq!(err.to_string(), "No time series defined for load pattern 9");
    assert!(!model.is_built());
}

#[test]
fn test_engine_rejection_propagates() {
    let mut model = StructuralModel::new(
        "rejecting",
        ModelParams::default(),
        RecordingSession::new().reject_kind("element"),
    );
    let geo = model.geometry_mut();
    let a = geo.create_node(0.0, 0.0, 0.0);
    let b = geo.create_node(5.0, 0.0, 0.0);
    geo.create_general_element(
        None,
        a,
        b,
        StructuralType::Truss,
        GeneralElement::new("truss", Params::new().with("A", 0.01).with("matTag", 1)),
    )
    .unwrap();
    let err = model.build_model().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Engine);
}

#[test]
fn test_replacing_a_section_after_build_reemits_it() {
    let mut model = full_fixture();
    model.build_model().unwrap();
    model
        .properties_mut()
        .create_elastic_section(
            1,
            "COL",
            StructuralType::Column,
            &ElasticSectionSpec::new(SectionShape::rectangle(0.5, 0.5), 30e9, 12.5e9),
        )
        .unwrap();
    let before = model.session().commands_of("section").len();
    model.user_update_sections().unwrap();
    assert_eq!(model.session().commands_of("section").len(), before + 1);
}

#[test]
fn test_geometry_is_locked_after_build() {
    let mut model = full_fixture();
    model.build_model().unwrap();
    let err = model.geometry_mut().remove_element(1).unwrap_err();
    assert_eq!(err.to_string(), "Cannot remove elements after the model has been built");
    assert!(model.remove_node(3).is_err());
    assert!(model
        .constraints_mut()
        .update_constraint(1, [None, None, None, Some(false), None, None])
        .is_err());

    // New entities can still be registered and pushed
    let tag = model.geometry_mut().create_node(8.0, 0.0, 0.0);
    model.constraints_mut().create_constraint(tag, [true; 6]);
    model.user_update_nodes().unwrap();
    model.user_update_constraints().unwrap();
    assert!(model.session().script().ends_with("node 4 8.0 0.0 0.0\nfix 4 1 1 1 1 1 1"));
}

#[test]
fn test_reset_allows_a_clean_rebuild() {
    let mut model = full_fixture();
    model.build_model().unwrap();
    model.reset("fresh").unwrap();
    assert!(model.geometry().nodes().is_empty());
    assert!(model.geometry().elements().is_empty());
    assert!(model.properties().sections().is_empty());
    assert!(model.properties().transformations().is_empty());
    assert!(model.constraints().fixities().is_empty());
    assert!(model.loading().time_series().is_empty());
    assert!(!model.is_built());

    model.session_mut().clear();
    model.build_model().unwrap();
    assert_eq!(model.session().kinds(), vec!["wipe", "model"]);
}
