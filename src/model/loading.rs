//! Loading registry: time series and load patterns

use crate::error::{BuildError, BuildResult};
use crate::loads::{
    BeamLoad, GroundMotion, Load, LoadPattern, NodalLoad, PathSeries, TimeSeries,
    TimeSeriesRef, UniformExcitation,
};
use crate::registry::Registry;
use crate::session::EngineSession;

/// Owner of the time series and load patterns of a model
#[derive(Debug, Clone, Default)]
pub struct Loading {
    series: Registry<u32, TimeSeries>,
    patterns: Registry<u32, LoadPattern>,
}

impl Loading {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_series(&self) -> &Registry<u32, TimeSeries> {
        &self.series
    }

    pub fn series(&self, tag: u32) -> Option<&TimeSeries> {
        self.series.get(&tag)
    }

    pub fn patterns(&self) -> &Registry<u32, LoadPattern> {
        &self.patterns
    }

    pub fn pattern(&self, tag: u32) -> Option<&LoadPattern> {
        self.patterns.get(&tag)
    }

    /// Reference to a series tag: registered when this registry owns it
    pub fn series_ref(&self, tag: u32) -> TimeSeriesRef {
        if self.series.contains_key(&tag) {
            TimeSeriesRef::Registered(tag)
        } else {
            TimeSeriesRef::Raw(tag)
        }
    }

    // ---- time series ----

    /// Register a series; an existing tag is replaced
    pub fn add_time_series(&mut self, series: TimeSeries) -> &TimeSeries {
        log::info!("Added {} time series {}", series.kind.as_str(), series.tag);
        self.series.upsert(series.tag, series)
    }

    pub fn create_constant_time_series(&mut self, tag: u32, factor: f64) -> BuildResult<&TimeSeries> {
        Ok(self.add_time_series(TimeSeries::constant(tag, factor)?))
    }

    pub fn create_linear_time_series(&mut self, tag: u32, factor: f64) -> BuildResult<&TimeSeries> {
        Ok(self.add_time_series(TimeSeries::linear(tag, factor)?))
    }

    pub fn create_path_time_series(&mut self, tag: u32, path: PathSeries) -> BuildResult<&TimeSeries> {
        Ok(self.add_time_series(TimeSeries::path(tag, path)?))
    }

    pub fn remove_time_series(&mut self, tag: u32) -> bool {
        let dependents: Vec<u32> = self
            .patterns
            .values()
            .filter(|p| p.series_dependencies().contains(&tag))
            .map(|p| p.tag)
            .collect();
        if !dependents.is_empty() {
            log::warn!("Removing time series {tag} still used by patterns {dependents:?}");
        }
        self.series.remove(&tag).is_some()
    }

    // ---- patterns ----

    /// Register a pattern; an existing tag is replaced
    pub fn add_load_pattern(&mut self, pattern: LoadPattern) -> &LoadPattern {
        log::info!("Added {} load pattern {}", pattern.kind.as_str(), pattern.tag);
        self.patterns.upsert(pattern.tag, pattern)
    }

    pub fn create_load_pattern(&mut self, tag: u32, time_series: Option<TimeSeriesRef>) -> &LoadPattern {
        self.add_load_pattern(LoadPattern::plain(tag, time_series))
    }

    pub fn create_uniform_excitation_pattern(
        &mut self,
        tag: u32,
        time_series: Option<TimeSeriesRef>,
        excitation: UniformExcitation,
    ) -> &LoadPattern {
        self.add_load_pattern(LoadPattern::uniform_excitation(tag, time_series, excitation))
    }

    pub fn create_multiple_support_pattern(&mut self, tag: u32) -> &LoadPattern {
        self.add_load_pattern(LoadPattern::multiple_support(tag))
    }

    pub fn remove_load_pattern(&mut self, tag: u32) -> bool {
        let removed = self.patterns.remove(&tag).is_some();
        if removed {
            log::info!("Removed load pattern {tag}");
        }
        removed
    }

    fn pattern_mut(&mut self, tag: u32) -> BuildResult<&mut LoadPattern> {
        self.patterns
            .get_mut(&tag)
            .ok_or(BuildError::PatternNotFound(tag))
    }

    /// Pattern that receives loads, created as a seriesless Plain pattern when absent
    fn load_target(&mut self, tag: u32) -> &mut LoadPattern {
        self.patterns.get_or_insert_with(tag, || {
            log::info!("Auto-created Plain load pattern {tag}");
            LoadPattern::plain(tag, None)
        })
    }

    // ---- ground motions ----

    pub fn add_ground_motion(&mut self, pattern: u32, tag: u32, motion: GroundMotion) -> BuildResult<()> {
        self.pattern_mut(pattern)?.add_ground_motion(tag, motion);
        Ok(())
    }

    /// Plain ground motion driven by an acceleration series
    pub fn add_plain_ground_motion(
        &mut self,
        pattern: u32,
        tag: u32,
        accel: u32,
        factor: f64,
    ) -> BuildResult<()> {
        let motion = GroundMotion::Plain {
            disp: None,
            vel: None,
            accel: Some(accel),
            integration: "Trapezoidal".to_string(),
            factor,
        };
        self.add_ground_motion(pattern, tag, motion)
    }

    pub fn add_interpolated_ground_motion(
        &mut self,
        pattern: u32,
        tag: u32,
        motions: Vec<u32>,
        factors: Option<Vec<f64>>,
    ) -> BuildResult<()> {
        let motion = GroundMotion::interpolated(motions, factors)?;
        self.add_ground_motion(pattern, tag, motion)
    }

    pub fn add_imposed_motion(
        &mut self,
        pattern: u32,
        node: u32,
        dof: u8,
        ground_motion: u32,
    ) -> BuildResult<()> {
        self.pattern_mut(pattern)?
            .add_imposed_motion(node, dof, ground_motion)
    }

    // ---- loads ----

    /// Add a load to a Plain pattern, creating the pattern when absent
    pub fn add_load(&mut self, pattern: u32, load: Load) -> BuildResult<()> {
        self.load_target(pattern).add_load(load)
    }

    pub fn create_node_load(&mut self, pattern: u32, load: NodalLoad) -> BuildResult<()> {
        self.add_load(pattern, load.into())
    }

    pub fn create_element_load(
        &mut self,
        pattern: u32,
        elements: Vec<u32>,
        load: BeamLoad,
    ) -> BuildResult<()> {
        let load = Load::element(elements, load)?;
        self.add_load(pattern, load)
    }

    /// Uniform beam load in local axes; the axial term `wx` is optional
    pub fn create_beam_uniform_load(
        &mut self,
        pattern: u32,
        elements: Vec<u32>,
        wy: f64,
        wz: f64,
        wx: Option<f64>,
    ) -> BuildResult<()> {
        let load = BeamLoad::Uniform {
            wy,
            wz,
            wx: wx.unwrap_or(0.0),
        };
        self.create_element_load(pattern, elements, load)
    }

    /// Point beam load at relative position `x_l` (mid-span when `None`)
    pub fn create_beam_point_load(
        &mut self,
        pattern: u32,
        elements: Vec<u32>,
        py: f64,
        pz: f64,
        x_l: Option<f64>,
        px: Option<f64>,
    ) -> BuildResult<()> {
        let load = BeamLoad::Point {
            py,
            pz,
            x_l: x_l.unwrap_or(0.5),
            px: px.unwrap_or(0.0),
        };
        self.create_element_load(pattern, elements, load)
    }

    pub fn create_sp_constraint(&mut self, pattern: u32, node: u32, dof: u8, value: f64) -> BuildResult<()> {
        let load = Load::single_point(node, dof, value)?;
        self.add_load(pattern, load)
    }

    // ---- realization ----

    pub(crate) fn realize_series(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        for series in self.series.values_mut() {
            series.realize(session)?;
        }
        Ok(())
    }

    pub(crate) fn realize_patterns(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        for pattern in self.patterns.values_mut() {
            pattern.realize(session, &mut self.series)?;
        }
        Ok(())
    }

    /// Realize one pattern after every registered series it reads from
    pub(crate) fn realize_pattern(
        &mut self,
        tag: u32,
        session: &mut dyn EngineSession,
    ) -> BuildResult<()> {
        let pattern = self
            .patterns
            .get_mut(&tag)
            .ok_or(BuildError::PatternNotFound(tag))?;
        for dep in pattern.series_dependencies() {
            if let Some(series) = self.series.get_mut(&dep) {
                series.realize(session)?;
            }
        }
        pattern.realize(session, &mut self.series)
    }

    pub(crate) fn clear(&mut self) {
        self.series.clear();
        self.patterns.clear();
    }
}
