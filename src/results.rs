//! Result types for analysis stages

use crate::error::BuildResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of analysis stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Modal,
    Gravity,
    Static,
    Pushover,
    TimeHistory,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modal => "modal",
            Self::Gravity => "gravity",
            Self::Static => "static",
            Self::Pushover => "pushover",
            Self::TimeHistory => "time_history",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State captured after one successful engine step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    /// 1-based step number within the stage
    pub step: usize,
    /// Engine pseudo-time after the step
    pub time: f64,
    /// Displacements per node tag, as returned by the engine
    pub node_displacements: BTreeMap<u32, Vec<f64>>,
}

impl StepSnapshot {
    /// Displacement of one node along a 1-based DOF
    pub fn displacement(&self, node: u32, dof: u8) -> Option<f64> {
        let index = usize::from(dof).checked_sub(1)?;
        self.node_displacements.get(&node)?.get(index).copied()
    }
}

/// Natural vibration properties derived from eigenvalues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalResults {
    pub eigenvalues: Vec<f64>,
    /// Circular frequencies (rad/s)
    pub omegas: Vec<f64>,
    /// Frequencies (Hz)
    pub frequencies: Vec<f64>,
    /// Periods (s)
    pub periods: Vec<f64>,
}

impl ModalResults {
    /// Derive ω = √λ, f = ω/2π and T = 1/f; negative eigenvalues count as zero
    pub fn from_eigenvalues(eigenvalues: Vec<f64>) -> Self {
        let omegas: Vec<f64> = eigenvalues.iter().map(|l| l.max(0.0).sqrt()).collect();
        let frequencies: Vec<f64> = omegas.iter().map(|w| w / (2.0 * PI)).collect();
        let periods = frequencies.iter().map(|f| 1.0 / f).collect();
        Self {
            eigenvalues,
            omegas,
            frequencies,
            periods,
        }
    }

    pub fn num_modes(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Fundamental period
    pub fn fundamental_period(&self) -> Option<f64> {
        self.periods.first().copied()
    }
}

/// Everything one analysis stage produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResults {
    /// Sequence number of the stage within the model
    pub tag: u32,
    pub kind: StageKind,
    pub requested_steps: usize,
    pub completed_steps: usize,
    pub snapshots: Vec<StepSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modal: Option<ModalResults>,
}

impl StageResults {
    pub fn new(tag: u32, kind: StageKind, requested_steps: usize) -> Self {
        Self {
            tag,
            kind,
            requested_steps,
            completed_steps: 0,
            snapshots: Vec::new(),
            modal: None,
        }
    }

    /// True when every requested step succeeded
    pub fn is_complete(&self) -> bool {
        self.completed_steps == self.requested_steps
    }

    pub fn last_snapshot(&self) -> Option<&StepSnapshot> {
        self.snapshots.last()
    }

    /// Write the stage as `<dir>/<tag>.json`, creating `dir` if needed
    pub fn save_json(&self, dir: impl AsRef<Path>) -> BuildResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", self.tag));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn load_json(path: impl AsRef<Path>) -> BuildResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
