//! Load patterns: plain, uniform excitation and multiple support

use super::load::Load;
use super::time_series::TimeSeries;
use crate::command::Command;
use crate::error::{BuildError, BuildResult};
use crate::registry::Registry;
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};

/// How a pattern refers to its driving time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSeriesRef {
    /// Series owned by the loading registry; realized before the pattern
    Registered(u32),
    /// Bare engine tag, assumed to exist already
    Raw(u32),
}

impl TimeSeriesRef {
    pub fn tag(&self) -> u32 {
        match self {
            Self::Registered(t) | Self::Raw(t) => *t,
        }
    }
}

/// A ground motion of a multiple-support pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GroundMotion {
    Plain {
        disp: Option<u32>,
        vel: Option<u32>,
        accel: Option<u32>,
        integration: String,
        factor: f64,
    },
    /// Weighted combination of other ground motions
    Interpolated {
        motions: Vec<u32>,
        factors: Option<Vec<f64>>,
    },
}

impl GroundMotion {
    /// Plain ground motion from an acceleration record
    pub fn from_accel(accel: u32) -> Self {
        Self::Plain {
            disp: None,
            vel: None,
            accel: Some(accel),
            integration: "Trapezoidal".to_string(),
            factor: 1.0,
        }
    }

    pub fn interpolated(motions: Vec<u32>, factors: Option<Vec<f64>>) -> BuildResult<Self> {
        if let Some(f) = &factors {
            if f.len() != motions.len() {
                return Err(BuildError::length_mismatch(
                    "interpolation factors",
                    motions.len(),
                    f.len(),
                ));
            }
        }
        Ok(Self::Interpolated { motions, factors })
    }

    /// Series tags this motion reads from
    pub fn series(&self) -> Vec<u32> {
        match self {
            Self::Plain {
                disp, vel, accel, ..
            } => [*disp, *vel, *accel].into_iter().flatten().collect(),
            Self::Interpolated { .. } => Vec::new(),
        }
    }

    fn command(&self, tag: u32) -> Command {
        let cmd = Command::new("groundMotion").arg(tag);
        match self {
            Self::Plain {
                disp,
                vel,
                accel,
                integration,
                factor,
            } => cmd
                .arg("Plain")
                .flag_opt("-disp", *disp)
                .flag_opt("-vel", *vel)
                .flag_opt("-accel", *accel)
                .arg("-int")
                .arg(integration.as_str())
                .arg("-fact")
                .arg(*factor),
            Self::Interpolated { motions, factors } => {
                let cmd = cmd.arg("Interpolated").args(motions.iter().copied());
                match factors {
                    Some(f) => cmd.arg("-fact").args(f.iter().copied()),
                    None => cmd,
                }
            }
        }
    }
}

/// Motion imposed on one support DOF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImposedMotion {
    pub node: u32,
    pub dof: u8,
    pub ground_motion: u32,
}

/// Uniform base excitation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformExcitation {
    /// 1..=6
    pub direction: u8,
    pub accel: Option<u32>,
    pub vel: Option<u32>,
    pub disp: Option<u32>,
    pub vel0: Option<f64>,
    pub fact: Option<f64>,
}

impl UniformExcitation {
    pub fn new(direction: u8) -> BuildResult<Self> {
        if !(1..=6).contains(&direction) {
            return Err(BuildError::invalid(format!(
                "excitation direction {direction} is outside 1..=6"
            )));
        }
        Ok(Self {
            direction,
            accel: None,
            vel: None,
            disp: None,
            vel0: None,
            fact: None,
        })
    }

    pub fn with_accel(mut self, series: u32) -> Self {
        self.accel = Some(series);
        self
    }

    pub fn with_factor(mut self, fact: f64) -> Self {
        self.fact = Some(fact);
        self
    }

    /// Series tags this excitation reads from
    pub fn series(&self) -> Vec<u32> {
        [self.accel, self.vel, self.disp].into_iter().flatten().collect()
    }
}

/// Pattern variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternKind {
    Plain,
    UniformExcitation(UniformExcitation),
    MultipleSupport {
        /// Ground motions keyed by tag, in insertion order
        ground_motions: Vec<(u32, GroundMotion)>,
        imposed: Vec<ImposedMotion>,
    },
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "Plain",
            Self::UniformExcitation(_) => "UniformExcitation",
            Self::MultipleSupport { .. } => "MultipleSupport",
        }
    }
}

/// A load pattern and the loads it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadPattern {
    pub tag: u32,
    pub time_series: Option<TimeSeriesRef>,
    pub kind: PatternKind,
    pub loads: Vec<Load>,

    #[serde(skip)]
    pub(crate) realized: bool,
}

impl LoadPattern {
    pub fn plain(tag: u32, time_series: Option<TimeSeriesRef>) -> Self {
        Self {
            tag,
            time_series,
            kind: PatternKind::Plain,
            loads: Vec::new(),
            realized: false,
        }
    }

    pub fn uniform_excitation(
        tag: u32,
        time_series: Option<TimeSeriesRef>,
        mut excitation: UniformExcitation,
    ) -> Self {
        if excitation.accel.is_none() {
            excitation.accel = time_series.map(|ts| ts.tag());
        }
        Self {
            tag,
            time_series,
            kind: PatternKind::UniformExcitation(excitation),
            loads: Vec::new(),
            realized: false,
        }
    }

    pub fn multiple_support(tag: u32) -> Self {
        Self {
            tag,
            time_series: None,
            kind: PatternKind::MultipleSupport {
                ground_motions: Vec::new(),
                imposed: Vec::new(),
            },
            loads: Vec::new(),
            realized: false,
        }
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Append a load; only Plain patterns carry loads
    pub fn add_load(&mut self, load: Load) -> BuildResult<()> {
        if !matches!(self.kind, PatternKind::Plain) {
            return Err(BuildError::invalid(format!(
                "{} pattern {} cannot carry loads",
                self.kind.as_str(),
                self.tag
            )));
        }
        self.loads.push(load);
        Ok(())
    }

    /// Add or replace a ground motion, converting the pattern if needed
    pub fn add_ground_motion(&mut self, tag: u32, motion: GroundMotion) {
        self.ensure_multiple_support();
        if let PatternKind::MultipleSupport { ground_motions, .. } = &mut self.kind {
            match ground_motions.iter_mut().find(|(t, _)| *t == tag) {
                Some(slot) => slot.1 = motion,
                None => ground_motions.push((tag, motion)),
            }
        }
    }

    pub fn add_imposed_motion(&mut self, node: u32, dof: u8, ground_motion: u32) -> BuildResult<()> {
        if !(1..=6).contains(&dof) {
            return Err(BuildError::invalid(format!("DOF {dof} is outside 1..=6")));
        }
        self.ensure_multiple_support();
        if let PatternKind::MultipleSupport { imposed, .. } = &mut self.kind {
            imposed.push(ImposedMotion {
                node,
                dof,
                ground_motion,
            });
        }
        Ok(())
    }

    fn ensure_multiple_support(&mut self) {
        if matches!(self.kind, PatternKind::MultipleSupport { .. }) {
            return;
        }
        log::warn!(
            "Converting {} pattern {} to MultipleSupport",
            self.kind.as_str(),
            self.tag
        );
        if !self.loads.is_empty() {
            log::warn!("Dropping {} loads of pattern {}", self.loads.len(), self.tag);
            self.loads.clear();
        }
        self.kind = PatternKind::MultipleSupport {
            ground_motions: Vec::new(),
            imposed: Vec::new(),
        };
    }

    /// Every series tag this pattern depends on
    pub fn series_dependencies(&self) -> Vec<u32> {
        let mut tags: Vec<u32> = match &self.kind {
            PatternKind::Plain => Vec::new(),
            PatternKind::UniformExcitation(ex) => ex.series(),
            PatternKind::MultipleSupport { ground_motions, .. } => ground_motions
                .iter()
                .flat_map(|(_, gm)| gm.series())
                .collect(),
        };
        if let Some(TimeSeriesRef::Registered(t)) = self.time_series {
            tags.insert(0, t);
        }
        tags.dedup();
        tags
    }

    /// Emit the pattern and everything it owns
    ///
    /// A plain pattern realizes its registered series first; a raw tag is
    /// used as is. Without any series the pattern fails.
    pub fn realize(
        &mut self,
        session: &mut dyn EngineSession,
        series: &mut Registry<u32, TimeSeries>,
    ) -> BuildResult<()> {
        if self.realized {
            return Ok(());
        }
        match &self.kind {
            PatternKind::Plain => {
                let ts = match self.time_series {
                    Some(TimeSeriesRef::Registered(tag)) => {
                        series
                            .get_mut(&tag)
                            .ok_or(BuildError::TimeSeriesNotFound(tag))?
                            .realize(session)?;
                        tag
                    }
                    Some(TimeSeriesRef::Raw(tag)) => tag,
                    None => return Err(BuildError::MissingTimeSeries { pattern: self.tag }),
                };
                session.execute(&Command::new("pattern").arg("Plain").arg(self.tag).arg(ts))?;
                for load in &self.loads {
                    load.realize(session)?;
                }
            }
            PatternKind::UniformExcitation(ex) => {
                let cmd = Command::new("pattern")
                    .arg("UniformExcitation")
                    .arg(self.tag)
                    .arg(ex.direction)
                    .flag_opt("-accel", ex.accel)
                    .flag_opt("-vel", ex.vel)
                    .flag_opt("-disp", ex.disp)
                    .flag_opt("-vel0", ex.vel0)
                    .flag_opt("-fact", ex.fact);
                session.execute(&cmd)?;
            }
            PatternKind::MultipleSupport {
                ground_motions,
                imposed,
            } => {
                session.execute(&Command::new("pattern").arg("MultipleSupport").arg(self.tag))?;
                for (tag, gm) in ground_motions {
                    session.execute(&gm.command(*tag))?;
                }
                for im in imposed {
                    session.execute(
                        &Command::new("imposedMotion")
                            .arg(im.node)
                            .arg(im.dof)
                            .arg(im.ground_motion),
                    )?;
                }
            }
        }
        self.realized = true;
        log::debug!("Realized {} pattern {}", self.kind.as_str(), self.tag);
        Ok(())
    }
}
