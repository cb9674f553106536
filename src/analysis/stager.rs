//! Multi-stage analysis driver
//!
//! Every stage follows the same skeleton: make sure the model is built,
//! realize the stage's load pattern, send the numerical method selection,
//! step the engine, snapshot each successful step, record the results and
//! reset transient engine state for the next stage. A failing step ends the
//! stage early without raising; the results report how far it got.

use super::config::{
    AnalysisConfig, Excitation, PushoverOptions, StageReset, StaticOptions, TimeHistoryOptions,
};
use crate::command::Command;
use crate::error::{BuildError, BuildResult};
use crate::loads::{GroundMotion, LoadPattern, PathSeries, TimeSeries, UniformExcitation};
use crate::model::{Loading, StructuralModel};
use crate::results::{ModalResults, StageKind, StageResults, StepSnapshot};
use crate::session::{EngineSession, StepRequest};
use std::collections::BTreeMap;

/// Default eigen solver flag
pub const DEFAULT_EIGEN_SOLVER: &str = "-genBandArpack";

/// Tag offset between a multiple-support pattern and its ground motion
const GROUND_MOTION_OFFSET: u32 = 1000;

/// Upper bound on the increments one pushover protocol may expand to
pub const MAX_PROTOCOL_STEPS: usize = 1_000_000;

/// Split a displacement protocol into increments no larger than `max_step`
///
/// `protocol` lists target displacements visited in order from zero. Each
/// leg is cut into the fewest equal increments whose size stays within
/// `max_step`; legs of zero length are skipped.
pub fn split_protocol(protocol: &[f64], max_step: f64) -> BuildResult<Vec<f64>> {
    if !max_step.is_finite() || max_step <= 0.0 {
        return Err(BuildError::invalid(format!(
            "pushover max step must be positive and finite, got {max_step}"
        )));
    }
    let mut increments = Vec::new();
    let mut current = 0.0;
    for &target in protocol {
        if !target.is_finite() {
            return Err(BuildError::invalid(format!(
                "pushover target displacement must be finite, got {target}"
            )));
        }
        let leg = target - current;
        if leg != 0.0 {
            let steps = (leg.abs() / max_step).ceil().max(1.0);
            if !steps.is_finite() || steps + increments.len() as f64 > MAX_PROTOCOL_STEPS as f64 {
                return Err(BuildError::invalid(format!(
                    "pushover protocol needs more than {MAX_PROTOCOL_STEPS} steps at max step {max_step}"
                )));
            }
            let n = steps as usize;
            increments.extend(std::iter::repeat(leg / n as f64).take(n));
        }
        current = target;
    }
    Ok(increments)
}

/// Tags created by a time-history stage
#[derive(Debug, Default)]
struct StageEntities {
    series: Vec<u32>,
    pattern: Option<u32>,
}

/// Drives analysis stages on a model; obtained from [`StructuralModel::analysis`]
pub struct Stager<'m, S: EngineSession> {
    model: &'m mut StructuralModel<S>,
}

impl<'m, S: EngineSession> Stager<'m, S> {
    pub(crate) fn new(model: &'m mut StructuralModel<S>) -> Self {
        Self { model }
    }

    /// Whether a gravity stage has locked its loads in
    pub fn gravity_applied(&self) -> bool {
        self.model.stages.gravity_applied
    }

    /// Eigenvalue analysis for `num_modes` modes
    pub fn run_modal_analysis(
        &mut self,
        num_modes: usize,
        solver: Option<&str>,
    ) -> BuildResult<ModalResults> {
        self.ensure_built()?;
        if self.model.geometry.nodes_with_mass().is_empty() {
            log::warn!("No node carries mass; modal analysis will likely fail");
        }
        let defaults = AnalysisConfig {
            system: Some(Command::new("system").arg("BandGeneral")),
            constraints: Some(Command::new("constraints").arg("Transformation")),
            numberer: Some(Command::new("numberer").arg("RCM")),
            ..AnalysisConfig::default()
        };
        self.configure(&defaults, &AnalysisConfig::default())?;

        let eigen = Command::new("eigen")
            .arg(solver.unwrap_or(DEFAULT_EIGEN_SOLVER))
            .arg(num_modes);
        let eigenvalues = self.model.session.query(&eigen)?;
        if eigenvalues.is_empty() {
            return Err(BuildError::Engine {
                command: eigen.to_string(),
                message: "no eigenvalues returned".to_string(),
            });
        }
        let modal = ModalResults::from_eigenvalues(eigenvalues);

        let mut results = StageResults::new(self.stage_tag(), StageKind::Modal, num_modes);
        results.completed_steps = modal.num_modes().min(num_modes);
        results.modal = Some(modal.clone());
        self.record(results)?;
        self.prepare_next_analysis_stage(&StageReset::default())?;
        if let Some(period) = modal.fundamental_period() {
            log::info!("Modal analysis: {} modes, T1 = {period:.4} s", modal.num_modes());
        }
        Ok(modal)
    }

    /// Load-controlled gravity stage; loads are kept constant afterwards
    pub fn run_gravity_analysis(
        &mut self,
        pattern: u32,
        options: &StaticOptions,
    ) -> BuildResult<StageResults> {
        let results = self.run_load_controlled(StageKind::Gravity, pattern, options)?;
        self.prepare_next_analysis_stage(&StageReset::keeping_loads())?;
        self.model.stages.gravity_applied = true;
        Ok(results)
    }

    /// Load-controlled static stage; loads are released afterwards
    pub fn run_static_analysis(
        &mut self,
        pattern: u32,
        options: &StaticOptions,
    ) -> BuildResult<StageResults> {
        let results = self.run_load_controlled(StageKind::Static, pattern, options)?;
        self.prepare_next_analysis_stage(&StageReset::default())?;
        Ok(results)
    }

    fn run_load_controlled(
        &mut self,
        kind: StageKind,
        pattern: u32,
        options: &StaticOptions,
    ) -> BuildResult<StageResults> {
        if options.steps == 0 {
            return Err(BuildError::invalid(format!("{kind} analysis needs at least one step")));
        }
        self.ensure_built()?;
        self.model.user_update_load_pattern(pattern)?;
        let defaults = AnalysisConfig {
            system: Some(Command::new("system").arg("BandGeneral")),
            constraints: Some(Command::new("constraints").arg("Transformation")),
            numberer: Some(Command::new("numberer").arg("RCM")),
            test: Some(
                Command::new("test")
                    .arg("NormDispIncr")
                    .arg(options.tolerance)
                    .arg(options.max_iterations)
                    .arg(0),
            ),
            algorithm: Some(Command::new("algorithm").arg("Newton")),
            integrator: Some(
                Command::new("integrator")
                    .arg("LoadControl")
                    .arg(1.0 / options.steps as f64),
            ),
            analysis: Some(Command::new("analysis").arg("Static")),
        };
        self.configure(&defaults, &options.config)?;
        let requests = vec![StepRequest::Static; options.steps];
        self.run_steps(kind, &requests)
    }

    /// Displacement-controlled pushover along a target protocol
    pub fn run_pushover_analysis(
        &mut self,
        pattern: u32,
        options: &PushoverOptions,
    ) -> BuildResult<StageResults> {
        if !(1..=6).contains(&options.dof) {
            return Err(BuildError::invalid(format!(
                "control DOF {} is outside 1..=6",
                options.dof
            )));
        }
        let increments = split_protocol(&options.protocol, options.max_step)?;
        self.ensure_built()?;
        if self.model.geometry.node(options.control_node).is_none() {
            return Err(BuildError::NodeNotFound(options.control_node));
        }
        if !self.model.stages.gravity_applied {
            log::info!("Pushover without a preceding gravity stage");
        }
        self.model.user_update_load_pattern(pattern)?;
        let defaults = AnalysisConfig {
            system: Some(Command::new("system").arg("UmfPack")),
            constraints: Some(Command::new("constraints").arg("Transformation")),
            numberer: Some(Command::new("numberer").arg("RCM")),
            ..AnalysisConfig::default()
        };
        self.configure(&defaults, &options.config)?;
        self.model
            .session
            .execute(&options.smart.command("Static"))?;

        let requests: Vec<StepRequest> = increments
            .into_iter()
            .map(|increment| StepRequest::DisplacementControl {
                node: options.control_node,
                dof: options.dof,
                increment,
            })
            .collect();
        let results = self.run_steps(StageKind::Pushover, &requests)?;
        self.prepare_next_analysis_stage(&StageReset::default())?;
        Ok(results)
    }

    /// Ground-motion time history
    ///
    /// Creates Path series for every component of the record and a pattern
    /// that applies them, runs the transient steps, then removes both again.
    /// Stage tags skip any series or pattern tag already registered. A stage
    /// that errors removes whatever it created.
    pub fn run_time_history_analysis(
        &mut self,
        options: &TimeHistoryOptions,
    ) -> BuildResult<StageResults> {
        let components = options.record.components()?;
        let direction = options.excitation.direction();
        if !(1..=6).contains(&direction) {
            return Err(BuildError::invalid(format!(
                "excitation direction {direction} is outside 1..=6"
            )));
        }
        if options.dt.is_nan() || options.dt <= 0.0 {
            return Err(BuildError::invalid(format!(
                "time step must be positive, got {}",
                options.dt
            )));
        }
        self.ensure_built()?;

        let first_tag = self.model.stages.next_tag;
        let mut created = StageEntities::default();
        let prepared = self
            .setup_time_history(options, &components, &mut created)
            .and_then(|()| {
                created
                    .pattern
                    .ok_or_else(|| BuildError::invalid("time-history stage created no pattern"))
            });
        let pattern = match prepared {
            Ok(pattern) => pattern,
            Err(err) => return Err(self.abort(&created, first_tag, err)),
        };

        let requests = vec![StepRequest::Transient { dt: options.dt }; options.steps];
        let results = match self.run_steps(StageKind::TimeHistory, &requests) {
            Ok(results) => results,
            Err(err) => return Err(self.abort(&created, first_tag, err)),
        };

        let reset = StageReset::default()
            .removing(vec![pattern], created.series.clone())
            .with_damping_reset();
        self.prepare_next_analysis_stage(&reset)?;
        Ok(results)
    }

    /// Series, pattern and method selection of a time-history stage
    fn setup_time_history(
        &mut self,
        options: &TimeHistoryOptions,
        components: &[(&'static str, &[f64])],
        created: &mut StageEntities,
    ) -> BuildResult<()> {
        let mut series = BTreeMap::new();
        for (flag, values) in components {
            let tag = self.next_free_tag(|loading, tag| loading.series(tag).is_some());
            let path = PathSeries::timed(options.record.time.clone(), values.to_vec())
                .with_factor(options.excitation.scale());
            self.model.loading.create_path_time_series(tag, path)?;
            created.series.push(tag);
            series.insert(*flag, tag);
        }
        let pattern = self.next_free_tag(|loading, tag| loading.pattern(tag).is_some());

        let direction = options.excitation.direction();
        let multiple_support = matches!(options.excitation, Excitation::MultipleSupport { .. });
        if multiple_support {
            created.pattern = Some(pattern);
            self.create_multiple_support(
                pattern,
                direction,
                &series,
                options.support_nodes.as_deref(),
            )?;
        } else {
            if options.support_nodes.is_some() {
                log::warn!("Support nodes are ignored for a uniform excitation");
            }
            let mut excitation = UniformExcitation::new(direction)?;
            excitation.accel = series.get("-accel").copied();
            excitation.vel = series.get("-vel").copied();
            excitation.disp = series.get("-disp").copied();
            created.pattern = Some(pattern);
            self.model
                .loading
                .create_uniform_excitation_pattern(pattern, None, excitation);
        }
        self.model.user_update_load_pattern(pattern)?;

        if let Some(damping) = &options.damping {
            self.model.session.execute(&damping.command()?)?;
        }
        let system = if multiple_support { "UmfPack" } else { "BandGeneral" };
        let defaults = AnalysisConfig {
            system: Some(Command::new("system").arg(system)),
            constraints: Some(Command::new("constraints").arg("Transformation")),
            numberer: Some(Command::new("numberer").arg("RCM")),
            integrator: Some(Command::new("integrator").arg("Newmark").args([0.5, 0.25])),
            analysis: Some(Command::new("analysis").arg("Transient")),
            ..AnalysisConfig::default()
        };
        self.configure(&defaults, &options.config)?;
        self.model
            .session
            .execute(&options.smart.command("Transient"))?;
        Ok(())
    }

    /// First stage tag at or after `next_tag` that `taken` does not claim
    fn next_free_tag(&mut self, taken: impl Fn(&Loading, u32) -> bool) -> u32 {
        let mut tag = self.model.stages.next_tag;
        while taken(&self.model.loading, tag) {
            log::debug!("Stage tag {tag} is in use; skipping");
            tag += 1;
        }
        self.model.stages.next_tag = tag + 1;
        tag
    }

    /// Undo a failed time-history stage and hand back its error
    fn abort(&mut self, created: &StageEntities, first_tag: u32, err: BuildError) -> BuildError {
        log::warn!("Time-history stage failed: {err}");
        self.discard(created);
        self.model.stages.next_tag = first_tag;
        err
    }

    /// Drop stage entities from the registry and, once emitted, the engine
    fn discard(&mut self, created: &StageEntities) {
        let mut commands = Vec::new();
        if let Some(tag) = created.pattern {
            if self.model.loading.pattern(tag).is_some_and(LoadPattern::is_realized) {
                commands.push(Command::new("remove").arg("loadPattern").arg(tag));
            }
            self.model.loading.remove_load_pattern(tag);
        }
        for &tag in &created.series {
            if self.model.loading.series(tag).is_some_and(TimeSeries::is_realized) {
                commands.push(Command::new("remove").arg("timeSeries").arg(tag));
            }
            self.model.loading.remove_time_series(tag);
        }
        for command in commands {
            if let Err(err) = self.model.session.execute(&command) {
                log::warn!("Could not clean up after failed stage: {err}");
            }
        }
        log::info!(
            "Discarded time-history pattern {:?} and series {:?}",
            created.pattern,
            created.series
        );
    }

    fn create_multiple_support(
        &mut self,
        pattern: u32,
        direction: u8,
        series: &BTreeMap<&str, u32>,
        support_nodes: Option<&[u32]>,
    ) -> BuildResult<()> {
        let supports: Vec<u32> = match support_nodes {
            Some(nodes) => {
                if let Some(&missing) = nodes
                    .iter()
                    .find(|&&tag| self.model.geometry.node(tag).is_none())
                {
                    return Err(BuildError::NodeNotFound(missing));
                }
                nodes.to_vec()
            }
            None => self
                .model
                .constraints
                .fixities()
                .values()
                .filter(|f| f.dofs[usize::from(direction) - 1])
                .map(|f| f.node)
                .collect(),
        };
        if supports.is_empty() {
            log::warn!("No support node in direction {direction}; nothing to excite");
        }

        let loading = &mut self.model.loading;
        loading.create_multiple_support_pattern(pattern);
        let ground_motion = pattern + GROUND_MOTION_OFFSET;
        loading.add_ground_motion(
            pattern,
            ground_motion,
            GroundMotion::Plain {
                disp: series.get("-disp").copied(),
                vel: series.get("-vel").copied(),
                accel: series.get("-accel").copied(),
                integration: "Trapezoidal".to_string(),
                factor: 1.0,
            },
        )?;
        for node in supports {
            loading.add_imposed_motion(pattern, node, direction, ground_motion)?;
        }
        Ok(())
    }

    /// Reset transient engine state so the next stage starts clean
    ///
    /// Patterns and series listed for removal are dropped from the loading
    /// registry as well as from the engine.
    pub fn prepare_next_analysis_stage(&mut self, reset: &StageReset) -> BuildResult<()> {
        for command in reset.commands() {
            self.model.session.execute(&command)?;
        }
        for tag in &reset.remove_patterns {
            self.model.loading.remove_load_pattern(*tag);
        }
        for tag in &reset.remove_series {
            self.model.loading.remove_time_series(*tag);
        }
        log::debug!("Prepared next analysis stage");
        Ok(())
    }

    fn ensure_built(&mut self) -> BuildResult<()> {
        if !self.model.is_built() {
            self.model.build_model()?;
        }
        Ok(())
    }

    fn configure(&mut self, defaults: &AnalysisConfig, user: &AnalysisConfig) -> BuildResult<()> {
        for command in user.merged_over(defaults).commands() {
            self.model.session.execute(command)?;
        }
        Ok(())
    }

    fn stage_tag(&self) -> u32 {
        self.model.stages.ledger.len() as u32 + 1
    }

    fn run_steps(&mut self, kind: StageKind, requests: &[StepRequest]) -> BuildResult<StageResults> {
        let requested = requests.len();
        let mut results = StageResults::new(self.stage_tag(), kind, requested);
        for (index, request) in requests.iter().enumerate() {
            let step = index + 1;
            let code = self.model.session.analyze(request);
            if code < 0 {
                log::warn!("{kind} stage failed at step {step}/{requested} (code {code})");
                break;
            }
            results.completed_steps = step;
            results.snapshots.push(self.snapshot(step)?);
            log::debug!("{kind} step {step}/{requested} done");
        }
        self.record(results.clone())?;
        log::info!(
            "{kind} stage {}: {}/{} steps completed",
            results.tag,
            results.completed_steps,
            results.requested_steps
        );
        Ok(results)
    }

    fn snapshot(&mut self, step: usize) -> BuildResult<StepSnapshot> {
        let session = &mut self.model.session;
        let time = session
            .query(&Command::new("getTime"))?
            .first()
            .copied()
            .unwrap_or(0.0);
        let mut node_displacements = BTreeMap::new();
        for &tag in self.model.geometry.nodes().keys() {
            let values = session.query(&Command::new("nodeDisp").arg(tag))?;
            node_displacements.insert(tag, values);
        }
        Ok(StepSnapshot {
            step,
            time,
            node_displacements,
        })
    }

    fn record(&mut self, results: StageResults) -> BuildResult<()> {
        if let Some(dir) = &self.model.params.results_dir {
            let path = results.save_json(dir)?;
            log::debug!("Saved stage {} to {}", results.tag, path.display());
        }
        self.model.stages.ledger.push(results);
        Ok(())
    }
}
