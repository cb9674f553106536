//! Structural model root
//!
//! [`StructuralModel`] owns the four registries and the engine session, and
//! is the only place that knows the build order. Entities are registered
//! freely, then [`StructuralModel::build_model`] emits everything once:
//!
//! materials → sections → beam integrations → nodes → single-point
//! constraints → multi-point constraints → elements → time series →
//! load patterns.
//!
//! After a build, geometry and constraint mutation is refused unless the
//! model was force-released. New entities can still be registered and
//! pushed to the engine through the `user_update_*` family, which only emits
//! entities that have not been realized yet. Changing an emitted entity means
//! replacing it (re-adding under the same name or tag), which registers a
//! fresh unrealized entity in the same position.

mod constraints;
mod geometry;
mod loading;
mod properties;

pub use constraints::Constraints;
pub use geometry::{line_section, FloorBucket, Geometry, GridOptions, GridSummary};
pub use loading::Loading;
pub use properties::Properties;

use crate::analysis::Stager;
use crate::command::Command;
use crate::config::ModelParams;
use crate::elements::TransformKind;
use crate::error::{BuildError, BuildResult};
use crate::results::StageResults;
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};

/// Lifecycle flags of a model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildState {
    pub engine_initialized: bool,
    pub built: bool,
    pub force_released: bool,
}

/// Options of [`StructuralModel::execute_command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectCommand {
    /// Initialize the engine first when it is not yet
    pub auto_initialize: bool,
    /// Hand consistency over to the caller: mark the model force-released
    pub update_model_state: bool,
}

impl Default for DirectCommand {
    fn default() -> Self {
        Self {
            auto_initialize: true,
            update_model_state: false,
        }
    }
}

/// Bookkeeping shared by analysis stages
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StageState {
    /// Next tag for series and patterns created by a stage
    pub(crate) next_tag: u32,
    pub(crate) gravity_applied: bool,
    pub(crate) ledger: Vec<StageResults>,
}

impl Default for StageState {
    fn default() -> Self {
        Self {
            next_tag: 1000,
            gravity_applied: false,
            ledger: Vec::new(),
        }
    }
}

/// A structural analysis case and the engine session it is realized against
pub struct StructuralModel<S: EngineSession> {
    name: String,
    pub(crate) params: ModelParams,
    pub(crate) session: S,
    pub(crate) geometry: Geometry,
    pub(crate) properties: Properties,
    pub(crate) constraints: Constraints,
    pub(crate) loading: Loading,
    state: BuildState,
    pub(crate) stages: StageState,
}

impl<S: EngineSession> StructuralModel<S> {
    pub fn new(name: impl Into<String>, params: ModelParams, session: S) -> Self {
        let geometry = Geometry::new(params.node_merge_tolerance, params.floor_height_tolerance);
        Self {
            name: name.into(),
            params,
            session,
            geometry,
            properties: Properties::new(),
            constraints: Constraints::new(),
            loading: Loading::new(),
            state: BuildState::default(),
            stages: StageState::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn is_built(&self) -> bool {
        self.state.built
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut Constraints {
        &mut self.constraints
    }

    pub fn loading(&self) -> &Loading {
        &self.loading
    }

    pub fn loading_mut(&mut self) -> &mut Loading {
        &mut self.loading
    }

    /// Results of every stage run so far
    pub fn stage_results(&self) -> &[StageResults] {
        &self.stages.ledger
    }

    /// Entry point for multi-stage analysis
    pub fn analysis(&mut self) -> Stager<'_, S> {
        Stager::new(self)
    }

    /// Wipe the engine and declare the model dimensions, once per lifetime
    pub fn initialize_engine(&mut self) -> BuildResult<()> {
        if self.state.engine_initialized {
            return Ok(());
        }
        self.session.execute(&Command::new("wipe"))?;
        self.session.execute(
            &Command::new("model")
                .arg("basic")
                .arg("-ndm")
                .arg(self.params.ndm)
                .arg("-ndf")
                .arg(self.params.ndf),
        )?;
        self.state.engine_initialized = true;
        log::debug!(
            "Engine initialized (ndm={}, ndf={})",
            self.params.ndm,
            self.params.ndf
        );
        Ok(())
    }

    /// Realize every registered entity in dependency order
    ///
    /// Fails before emitting anything while line elements remain. Building
    /// an already built model is a no-op.
    pub fn build_model(&mut self) -> BuildResult<()> {
        if self.state.built {
            log::warn!("Model '{}' is already built; nothing to do", self.name);
            return Ok(());
        }
        let lines = self.geometry.line_element_count();
        if lines > 0 {
            return Err(BuildError::UnconvertedLineElements(lines));
        }

        log::info!("Building model '{}'", self.name);
        self.initialize_engine()?;
        self.realize_in_order()?;
        self.state.built = true;
        self.sync_locks();
        log::info!(
            "Built model '{}' with {} nodes and {} elements",
            self.name,
            self.geometry.nodes().len(),
            self.geometry.elements().len()
        );
        Ok(())
    }

    /// Mark the model built without realizing anything
    ///
    /// Skips the line-element check. The caller becomes responsible for the
    /// engine state matching the registries.
    pub fn force_release_model(&mut self) -> BuildResult<()> {
        self.initialize_engine()?;
        self.state.built = true;
        self.state.force_released = true;
        self.sync_locks();
        log::warn!("Model '{}' force-released; consistency is up to the caller", self.name);
        Ok(())
    }

    /// Send a command straight to the engine
    pub fn execute_command(&mut self, command: &Command, options: DirectCommand) -> BuildResult<()> {
        if options.auto_initialize {
            self.initialize_engine()?;
        }
        self.session.execute(command)?;
        if options.update_model_state {
            self.state.built = true;
            self.state.force_released = true;
            self.sync_locks();
        }
        Ok(())
    }

    fn sync_locks(&mut self) {
        let locked = self.state.built && !self.state.force_released;
        self.geometry.locked = locked;
        self.constraints.locked = locked;
    }

    fn realize_in_order(&mut self) -> BuildResult<()> {
        let session: &mut dyn EngineSession = &mut self.session;
        self.properties.realize_materials(session)?;
        self.properties.realize_sections(session)?;
        self.properties.realize_integrations(session)?;
        self.geometry.realize_nodes(session)?;
        self.constraints.realize_fixities(session)?;
        self.constraints.realize_mp(session)?;
        let tolerance = self.params.node_merge_tolerance;
        let (sections, transforms) = self.properties.element_inputs();
        self.geometry
            .realize_elements(session, sections, transforms, tolerance)?;
        self.loading.realize_series(session)?;
        self.loading.realize_patterns(session)
    }

    fn require_built(&self, operation: &'static str) -> BuildResult<()> {
        if !self.state.built {
            return Err(BuildError::EngineNotInitialized { operation });
        }
        Ok(())
    }

    // ---- user updates ----

    pub fn user_update_materials(&mut self) -> BuildResult<()> {
        self.require_built("user_update_materials")?;
        self.properties.realize_materials(&mut self.session)
    }

    pub fn user_update_sections(&mut self) -> BuildResult<()> {
        self.require_built("user_update_sections")?;
        self.properties.realize_sections(&mut self.session)
    }

    pub fn user_update_beam_integrations(&mut self) -> BuildResult<()> {
        self.require_built("user_update_beam_integrations")?;
        self.properties.realize_integrations(&mut self.session)
    }

    pub fn user_update_nodes(&mut self) -> BuildResult<()> {
        self.require_built("user_update_nodes")?;
        self.geometry.realize_nodes(&mut self.session)
    }

    pub fn user_update_constraints(&mut self) -> BuildResult<()> {
        self.require_built("user_update_constraints")?;
        self.constraints.realize_fixities(&mut self.session)
    }

    pub fn user_update_mp_constraints(&mut self) -> BuildResult<()> {
        self.require_built("user_update_mp_constraints")?;
        self.constraints.realize_mp(&mut self.session)
    }

    pub fn user_update_elements(&mut self) -> BuildResult<()> {
        self.require_built("user_update_elements")?;
        let tolerance = self.params.node_merge_tolerance;
        let (sections, transforms) = self.properties.element_inputs();
        self.geometry
            .realize_elements(&mut self.session, sections, transforms, tolerance)
    }

    /// Realize one pattern after the series it reads from
    pub fn user_update_load_pattern(&mut self, tag: u32) -> BuildResult<()> {
        self.require_built("user_update_load_pattern")?;
        self.loading.realize_pattern(tag, &mut self.session)
    }

    /// Every registry update in build order, then pending series and patterns
    pub fn user_update_all(&mut self) -> BuildResult<()> {
        self.require_built("user_update_all")?;
        self.realize_in_order()
    }

    // ---- cross-registry operations ----

    /// Tag of the transformation aligned with the member between two nodes
    ///
    /// The transformation is emitted right away when the engine is
    /// initialized, otherwise when the first element realizes against it.
    pub fn create_transformation(
        &mut self,
        start: u32,
        end: u32,
        kind: TransformKind,
    ) -> BuildResult<u32> {
        let position = |tag: u32| {
            self.geometry
                .node(tag)
                .map(|n| n.position())
                .ok_or(BuildError::NodeNotFound(tag))
        };
        let (a, b) = (position(start)?, position(end)?);
        let tolerance = self.params.node_merge_tolerance;
        let session: Option<&mut dyn EngineSession> = if self.state.engine_initialized {
            Some(&mut self.session)
        } else {
            None
        };
        self.properties
            .transforms_mut()
            .get_or_create(&a, &b, kind, tolerance, session)
    }

    /// Remove an unused node together with its single-point constraint
    pub fn remove_node(&mut self, tag: u32) -> BuildResult<bool> {
        let removed = self.geometry.remove_node(tag)?;
        if removed {
            self.constraints.drop_fixity(tag);
        }
        Ok(removed)
    }

    /// Remove every node no element uses, with their constraints
    pub fn remove_free_nodes(&mut self) -> BuildResult<Vec<u32>> {
        let removed = self.geometry.remove_free_nodes()?;
        for tag in &removed {
            self.constraints.drop_fixity(*tag);
        }
        Ok(removed)
    }

    /// Wipe the engine and return to an empty, unbuilt model
    pub fn reset(&mut self, name: impl Into<String>) -> BuildResult<()> {
        self.session.execute(&Command::new("wipe"))?;
        self.geometry.clear();
        self.properties.clear();
        self.constraints.clear();
        self.loading.clear();
        self.state = BuildState::default();
        self.stages = StageState::default();
        self.name = name.into();
        log::info!("Reset model to '{}'", self.name);
        Ok(())
    }
}

impl<S: EngineSession> std::fmt::Debug for StructuralModel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuralModel")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("nodes", &self.geometry.nodes().len())
            .field("elements", &self.geometry.elements().len())
            .field("properties", &self.properties)
            .field("stages", &self.stages.ledger.len())
            .finish()
    }
}
