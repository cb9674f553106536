use approx::assert_relative_eq;
use std::f64::consts::PI;
use structural_stager::prelude::*;

/// Fixed-base column with a lumped top mass, a gravity and a lateral pattern
fn column(session: RecordingSession, params: ModelParams) -> StructuralModel<RecordingSession> {
    let mut model = StructuralModel::new("column", params, session);
    model
        .properties_mut()
        .create_elastic_section(
            1,
            "C40",
            StructuralType::Column,
            &ElasticSectionSpec::new(SectionShape::rectangle(0.4, 0.4), 30e9, 12.5e9),
        )
        .unwrap();
    let geo = model.geometry_mut();
    let base = geo.create_node(0.0, 0.0, 0.0);
    let top = geo.create_node(0.0, 0.0, 3.0);
    geo.create_element(None, base, top, StructuralType::Column, BeamColumn::elastic("C40"))
        .unwrap();
    geo.assign_node_mass(top, [2e3, 2e3, 0.0, 0.0, 0.0, 0.0]).unwrap();
    model.constraints_mut().create_constraint(base, [true; 6]);

    let loading = model.loading_mut();
    loading.create_linear_time_series(1, 1.0).unwrap();
    loading.create_load_pattern(1, Some(TimeSeriesRef::Registered(1)));
    loading.create_node_load(1, NodalLoad::force(top, 0.0, 0.0, -20e3)).unwrap();
    loading.create_linear_time_series(2, 1.0).unwrap();
    loading.create_load_pattern(2, Some(TimeSeriesRef::Registered(2)));
    loading.create_node_load(2, NodalLoad::force(top, 1.0, 0.0, 0.0)).unwrap();
    model
}

fn built(session: RecordingSession) -> StructuralModel<RecordingSession> {
    let mut model = column(session, ModelParams::default());
    model.build_model().unwrap();
    model.session_mut().clear();
    model
}

fn record() -> GroundMotionRecord {
    GroundMotionRecord::from_accel(vec![0.0, 0.01, 0.02], vec![0.0, 1.0, 0.0])
}

#[test]
fn test_gravity_stage_completes_and_keeps_loads() {
    let mut model = built(RecordingSession::new());
    let mut stager = model.analysis();
    let results = stager
        .run_gravity_analysis(1, &StaticOptions::gravity())
        .unwrap();
    assert!(stager.gravity_applied());

    assert_eq!(results.kind, StageKind::Gravity);
    assert_eq!(results.tag, 1);
    assert!(results.is_complete());
    assert_eq!(results.snapshots.len(), 10);
    assert_relative_eq!(results.last_snapshot().unwrap().time, 10.0);

    let session = model.session();
    assert_eq!(session.steps().len(), 10);
    assert_eq!(
        session.script(),
        "system BandGeneral\n\
         constraints Transformation\n\
         numberer RCM\n\
         test NormDispIncr 1e-5 25 0\n\
         algorithm Newton\n\
         integrator LoadControl 0.1\n\
         analysis Static\n\
         setTime 0.0\n\
         loadConst -time 0.0\n\
         remove recorders\n\
         wipeAnalysis"
    );
    // One getTime and one nodeDisp per node for every step
    assert_eq!(session.queries().len(), 10 * 3);
    assert_eq!(model.stage_results().len(), 1);
}

#[test]
fn test_failed_step_ends_the_stage_early() {
    let mut model = built(RecordingSession::new().fail_from_step(4));
    let results = model
        .analysis()
        .run_gravity_analysis(1, &StaticOptions::gravity())
        .unwrap();
    assert_eq!(results.completed_steps, 3);
    assert_eq!(results.requested_steps, 10);
    assert!(!results.is_complete());
    assert_eq!(results.snapshots.len(), 3);
    assert_eq!(model.session().steps().len(), 4);
    assert!(model.session().script().ends_with("wipeAnalysis"));
}

#[test]
fn test_static_stage_with_user_overrides() {
    let mut model = built(RecordingSession::new());
    let config = AnalysisConfig::new()
        .set(AnalysisConfig::directive("algorithm", ["KrylovNewton"]))
        .unwrap()
        .set(AnalysisConfig::directive("system", ["ProfileSPD"]))
        .unwrap();
    let options = StaticOptions::standard().with_steps(4).with_config(config);
    let results = model.analysis().run_static_analysis(2, &options).unwrap();
    assert!(results.is_complete());

    let script = model.session().script();
    assert!(script.starts_with("system ProfileSPD\n"));
    assert!(script.contains("algorithm KrylovNewton\n"));
    assert!(!script.contains("algorithm Newton\n"));
    assert!(script.contains("integrator LoadControl 0.25\n"));
    assert!(!script.contains("loadConst"));

    assert!(AnalysisConfig::new().set(Command::new("recorder")).is_err());
    let err = model
        .analysis()
        .run_static_analysis(2, &StaticOptions::standard().with_steps(0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_modal_periods_from_eigenvalues() {
    let session = RecordingSession::new().with_response("eigen", vec![4.0 * PI * PI, 16.0 * PI * PI]);
    let mut model = built(session);
    let modal = model.analysis().run_modal_analysis(2, None).unwrap();
    assert_relative_eq!(modal.periods[0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(modal.periods[1], 0.5, epsilon = 1e-12);
    assert_relative_eq!(modal.fundamental_period().unwrap(), 1.0, epsilon = 1e-12);

    assert_eq!(model.session().queries()[0].to_string(), "eigen -genBandArpack 2");
    let stage = &model.stage_results()[0];
    assert_eq!(stage.kind, StageKind::Modal);
    assert_eq!(stage.modal.as_ref().unwrap().num_modes(), 2);

    model.analysis().run_modal_analysis(1, Some("-fullGenLapack")).unwrap();
    assert_eq!(model.session().queries()[1].to_string(), "eigen -fullGenLapack 1");
}

#[test]
fn test_modal_without_eigenvalues_is_an_engine_error() {
    let mut model = built(RecordingSession::new());
    let err = model.analysis().run_modal_analysis(3, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Engine);
    assert!(model.stage_results().is_empty());
}

#[test]
fn test_pushover_follows_the_protocol() {
    let mut model = built(RecordingSession::new());
    let mut stager = model.analysis();
    stager.run_gravity_analysis(1, &StaticOptions::gravity()).unwrap();
    let options = PushoverOptions::new(2, 1, vec![0.05, -0.05], 0.01);
    let results = stager.run_pushover_analysis(2, &options).unwrap();
    assert_eq!(results.requested_steps, 5 + 10);
    assert!(results.is_complete());
    assert_eq!(results.tag, 2);

    let increments: Vec<f64> = model
        .session()
        .steps()
        .iter()
        .filter_map(|s| match s {
            StepRequest::DisplacementControl { node: 2, dof: 1, increment } => Some(*increment),
            _ => None,
        })
        .collect();
    assert_eq!(increments.len(), 15);
    assert_relative_eq!(increments[0], 0.01, epsilon = 1e-12);
    assert_relative_eq!(increments[5], -0.01, epsilon = 1e-12);
    assert_relative_eq!(increments.iter().sum::<f64>(), -0.05, epsilon = 1e-12);

    let script = model.session().script();
    assert!(script.contains("system UmfPack\n"));
    assert!(script.contains(
        "smartAnalyze Static -testType EnergyIncr -tolTest 1e-8 -testIterTimes 25 \
         -testIterTimesMore 50 100 -tryAlgoSeq 40 10 20 30 50 60 -relaxation 0.5 -minStep 1e-6"
    ));

    let mut stager = model.analysis();
    let bad_dof = PushoverOptions::new(2, 7, vec![0.05], 0.01);
    assert!(stager.run_pushover_analysis(2, &bad_dof).is_err());
    let bad_node = PushoverOptions::new(99, 1, vec![0.05], 0.01);
    assert!(matches!(
        stager.run_pushover_analysis(2, &bad_node),
        Err(BuildError::NodeNotFound(99))
    ));
    let bad_step = PushoverOptions::new(2, 1, vec![0.05], -1.0);
    assert!(stager.run_pushover_analysis(2, &bad_step).is_err());
}

#[test]
fn test_uniform_time_history_cleans_up_after_itself() {
    let mut model = built(RecordingSession::new());
    let options = TimeHistoryOptions::new(
        record(),
        Excitation::Uniform {
            direction: 1,
            scale: 9.81,
        },
        0.01,
        3,
    );
    let results = model.analysis().run_time_history_analysis(&options).unwrap();
    assert!(results.is_complete());
    assert_relative_eq!(results.last_snapshot().unwrap().time, 0.03, epsilon = 1e-12);

    let script = model.session().script();
    assert!(script.starts_with(
        "timeSeries Path 1000 -time 0.0 0.01 0.02 -values 0.0 1.0 0.0 -factor 9.81\n\
         pattern UniformExcitation 1001 1 -accel 1000\n\
         system BandGeneral\n"
    ));
    assert!(script.contains(
        "integrator Newmark 0.5 0.25\nanalysis Transient\n\
         smartAnalyze Transient -testType EnergyIncr -tolTest 1e-8 -testIterTimes 20 \
         -testIterTimesMore 50 -tryAlgoSeq 40 10 20 30 -relaxation 0.5 -minStep 1e-6\n"
    ));
    assert!(script.ends_with(
        "setTime 0.0\n\
         remove recorders\n\
         remove loadPattern 1001\n\
         remove timeSeries 1000\n\
         rayleigh 0.0 0.0 0.0 0.0\n\
         wipeAnalysis"
    ));
    assert!(model.loading().series(1000).is_none());
    assert!(model.loading().pattern(1001).is_none());
    assert!(model.session().steps().iter().all(|s| *s == StepRequest::Transient { dt: 0.01 }));

    // A second record gets fresh tags
    model.session_mut().clear();
    model.analysis().run_time_history_analysis(&options).unwrap();
    assert!(model.session().script().contains("pattern UniformExcitation 1003 1 -accel 1002"));
}

#[test]
fn test_multiple_support_time_history_excites_fixed_supports() {
    let mut model = built(RecordingSession::new());
    let mut motion = record();
    motion.disp = Some(vec![0.0, 1e-4, 2e-4]);
    let damping = RayleighDamping {
        ratio: 0.05,
        eigenvalues: [100.0, 400.0],
    };
    let options = TimeHistoryOptions::new(
        motion,
        Excitation::MultipleSupport {
            direction: 1,
            scale: 1.0,
        },
        0.01,
        2,
    )
    .with_damping(damping);
    model.analysis().run_time_history_analysis(&options).unwrap();

    let script = model.session().script();
    assert!(script.contains("timeSeries Path 1000 -time 0.0 0.01 0.02 -values 0.0 1.0 0.0\n"));
    assert!(script.contains("timeSeries Path 1001 -time 0.0 0.01 0.02 -values 0.0 0.0001 0.0002\n"));
    assert!(script.contains(
        "pattern MultipleSupport 1002\n\
         groundMotion 2002 Plain -disp 1001 -accel 1000 -int Trapezoidal -fact 1.0\n\
         imposedMotion 1 1 2002\n"
    ));
    // ω = 10 and 20: α = 0.05·2·200/30, β = 0.05·2/30
    let rayleigh = model.session().commands_of("rayleigh")[0].numbers();
    assert_relative_eq!(rayleigh[0], 0.05 * 400.0 / 30.0, epsilon = 1e-12);
    assert_relative_eq!(rayleigh[3], 0.1 / 30.0, epsilon = 1e-12);
    assert!(script.contains("system UmfPack\n"));
    assert!(model.loading().pattern(1002).is_none());
    assert!(model.loading().series(1001).is_none());
}

#[test]
fn test_time_history_tags_skip_user_entities() {
    let mut model = column(RecordingSession::new(), ModelParams::default());
    let loading = model.loading_mut();
    loading.create_linear_time_series(1000, 1.0).unwrap();
    loading.create_load_pattern(1001, Some(TimeSeriesRef::Registered(1000)));
    model.build_model().unwrap();
    model.session_mut().clear();

    let options = TimeHistoryOptions::new(
        record(),
        Excitation::Uniform {
            direction: 1,
            scale: 1.0,
        },
        0.01,
        2,
    );
    model.analysis().run_time_history_analysis(&options).unwrap();

    let script = model.session().script();
    assert!(script.starts_with(
        "timeSeries Path 1001 -time 0.0 0.01 0.02 -values 0.0 1.0 0.0
         pattern UniformExcitation 1002 1 -accel 1001
"
    ));
    assert!(script.contains("remove loadPattern 1002
remove timeSeries 1001
"));
    assert!(!script.contains("1000"));
    assert!(model.loading().series(1000).is_some());
    assert!(model.loading().pattern(1001).is_some());
    assert!(model.loading().series(1001).is_none());
    assert!(model.loading().pattern(1002).is_none());
}

#[test]
fn test_failed_time_history_removes_its_series_and_pattern() {
    let mut model = built(RecordingSession::new().reject_kind("system"));
    let options = TimeHistoryOptions::new(
        record(),
        Excitation::Uniform {
            direction: 1,
            scale: 1.0,
        },
        0.01,
        2,
    );
    let err = model.analysis().run_time_history_analysis(&options).unwrap_err();
    assert!(matches!(err, BuildError::Engine { .. }));
    assert!(model.loading().series(1000).is_none());
    assert!(model.loading().pattern(1001).is_none());
    assert!(model.session().steps().is_empty());
    assert!(model
        .session()
        .script()
        .ends_with("remove loadPattern 1001
remove timeSeries 1000"));
    assert!(model.stage_results().is_empty());

    // The stage tags are handed out again once the engine accepts the run
    model.session_mut().accept_kind("system");
    model.session_mut().clear();
    model.analysis().run_time_history_analysis(&options).unwrap();
    assert!(model
        .session()
        .script()
        .contains("pattern UniformExcitation 1001 1 -accel 1000"));
}

#[test]
fn test_multiple_support_time_history_with_explicit_supports() {
    let mut model = built(RecordingSession::new());
    let excitation = Excitation::MultipleSupport {
        direction: 2,
        scale: 1.0,
    };
    let options =
        TimeHistoryOptions::new(record(), excitation, 0.01, 1).with_support_nodes(vec![1, 2]);
    model.analysis().run_time_history_analysis(&options).unwrap();
    assert!(model.session().script().contains(
        "pattern MultipleSupport 1001
         groundMotion 2001 Plain -accel 1000 -int Trapezoidal -fact 1.0
         imposedMotion 1 2 2001
         imposedMotion 2 2 2001
"
    ));

    model.session_mut().clear();
    let unknown =
        TimeHistoryOptions::new(record(), excitation, 0.01, 1).with_support_nodes(vec![1, 99]);
    let err = model.analysis().run_time_history_analysis(&unknown).unwrap_err();
    assert!(matches!(err, BuildError::NodeNotFound(99)));
    assert!(model.loading().series(1002).is_none());
    assert!(model.loading().pattern(1003).is_none());
    // nothing reached the engine, so there is nothing to remove there
    assert!(model.session().commands().is_empty());
}

#[test]
fn test_time_history_rejects_bad_records() {
    let mut model = built(RecordingSession::new());
    let short = GroundMotionRecord::from_accel(vec![0.0, 0.01], vec![0.0]);
    let options = TimeHistoryOptions::new(
        short,
        Excitation::Uniform {
            direction: 1,
            scale: 1.0,
        },
        0.01,
        2,
    );
    let err = model.analysis().run_time_history_analysis(&options).unwrap_err();
    assert!(matches!(err, BuildError::LengthMismatch { .. }));

    let options = TimeHistoryOptions::new(
        record(),
        Excitation::Uniform {
            direction: 1,
            scale: 1.0,
        },
        0.0,
        2,
    );
    assert!(model.analysis().run_time_history_analysis(&options).is_err());
    assert!(model.session().commands().is_empty());
}

#[test]
fn test_stages_build_lazily_and_persist_results() {
    let dir = tempfile::tempdir().unwrap();
    let params = ModelParams::default().with_results_dir(dir.path().join("stages"));
    let mut model = column(RecordingSession::new(), params);
    assert!(!model.is_built());

    let mut stager = model.analysis();
    stager.run_gravity_analysis(1, &StaticOptions::gravity()).unwrap();
    stager
        .run_static_analysis(2, &StaticOptions::standard().with_steps(2))
        .unwrap();
    assert!(model.is_built());
    assert_eq!(model.session().commands_of("element").len(), 1);

    let first = StageResults::load_json(dir.path().join("stages/1.json")).unwrap();
    assert_eq!(&first, &model.stage_results()[0]);
    let second = StageResults::load_json(dir.path().join("stages/2.json")).unwrap();
    assert_eq!(second.kind, StageKind::Static);
    assert_eq!(second.completed_steps, 2);
}
