//! Pass-through configuration for analysis stages

use crate::command::{Arg, Command};
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};

/// Numerical method selection for one stage
///
/// Every slot holds the complete engine directive (`system`, `constraints`,
/// `numberer`, `test`, `algorithm`, `integrator`, `analysis`). Unset slots
/// take the defaults of the stage being run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub system: Option<Command>,
    pub constraints: Option<Command>,
    pub numberer: Option<Command>,
    pub test: Option<Command>,
    pub algorithm: Option<Command>,
    pub integrator: Option<Command>,
    pub analysis: Option<Command>,
}

/// Directive kinds in emission order
pub const DIRECTIVES: [&str; 7] = [
    "system",
    "constraints",
    "numberer",
    "test",
    "algorithm",
    "integrator",
    "analysis",
];

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directive built from a kind and its arguments
    pub fn directive<T: Into<Arg>>(kind: &str, args: impl IntoIterator<Item = T>) -> Command {
        Command::new(kind).args(args)
    }

    /// Put a directive in the slot named by its kind
    pub fn set(mut self, directive: Command) -> BuildResult<Self> {
        let slot = self.slot_mut(&directive.kind)?;
        *slot = Some(directive);
        Ok(self)
    }

    /// This configuration with unset slots taken from `defaults`
    pub fn merged_over(&self, defaults: &AnalysisConfig) -> AnalysisConfig {
        let pick = |own: &Option<Command>, fallback: &Option<Command>| {
            own.clone().or_else(|| fallback.clone())
        };
        AnalysisConfig {
            system: pick(&self.system, &defaults.system),
            constraints: pick(&self.constraints, &defaults.constraints),
            numberer: pick(&self.numberer, &defaults.numberer),
            test: pick(&self.test, &defaults.test),
            algorithm: pick(&self.algorithm, &defaults.algorithm),
            integrator: pick(&self.integrator, &defaults.integrator),
            analysis: pick(&self.analysis, &defaults.analysis),
        }
    }

    /// Set directives in emission order
    pub fn commands(&self) -> Vec<&Command> {
        [
            &self.system,
            &self.constraints,
            &self.numberer,
            &self.test,
            &self.algorithm,
            &self.integrator,
            &self.analysis,
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn slot_mut(&mut self, kind: &str) -> BuildResult<&mut Option<Command>> {
        Ok(match kind {
            "system" => &mut self.system,
            "constraints" => &mut self.constraints,
            "numberer" => &mut self.numberer,
            "test" => &mut self.test,
            "algorithm" => &mut self.algorithm,
            "integrator" => &mut self.integrator,
            "analysis" => &mut self.analysis,
            other => {
                return Err(BuildError::invalid(format!(
                    "'{other}' is not an analysis directive; expected one of {DIRECTIVES:?}"
                )))
            }
        })
    }
}

/// Settings of the engine's multi-algorithm retry facility
///
/// Static and transient stages start from different defaults; see
/// [`SmartConfig::static_stage`] and [`SmartConfig::transient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartConfig {
    pub test_type: String,
    pub tolerance: f64,
    pub max_iterations: u32,
    /// Retry a failed step with the larger iteration limits below
    pub try_more_iterations: bool,
    pub more_iterations: Vec<u32>,
    /// Retry a failed step with the next algorithm in `try_algorithms`
    pub try_alter_algorithms: bool,
    /// Algorithm codes tried in order
    pub try_algorithms: Vec<u32>,
    /// Step reduction factor applied on failure
    pub relaxation: f64,
    /// Smallest step the engine may subdivide to
    pub min_step: f64,
}

impl Default for SmartConfig {
    fn default() -> Self {
        Self::static_stage()
    }
}

impl SmartConfig {
    /// EnergyIncr 1e-8, 25 iterations (then 50, 100), algorithms 40 10 20 30 50 60
    pub fn static_stage() -> Self {
        Self {
            test_type: "EnergyIncr".to_string(),
            tolerance: 1e-8,
            max_iterations: 25,
            try_more_iterations: true,
            more_iterations: vec![50, 100],
            try_alter_algorithms: true,
            try_algorithms: vec![40, 10, 20, 30, 50, 60],
            relaxation: 0.5,
            min_step: 1e-6,
        }
    }

    /// EnergyIncr 1e-8, 20 iterations (then 50), algorithms 40 10 20 30
    pub fn transient() -> Self {
        Self {
            max_iterations: 20,
            more_iterations: vec![50],
            try_algorithms: vec![40, 10, 20, 30],
            ..Self::static_stage()
        }
    }

    /// `smartAnalyze <mode> -testType .. -tryAlgoSeq ..` configuration line
    pub fn command(&self, mode: &str) -> Command {
        let mut command = Command::new("smartAnalyze")
            .arg(mode)
            .arg("-testType")
            .arg(self.test_type.as_str())
            .arg("-tolTest")
            .arg(self.tolerance)
            .arg("-testIterTimes")
            .arg(self.max_iterations);
        if self.try_more_iterations && !self.more_iterations.is_empty() {
            command = command
                .arg("-testIterTimesMore")
                .args(self.more_iterations.iter().copied());
        }
        if self.try_alter_algorithms && !self.try_algorithms.is_empty() {
            command = command
                .arg("-tryAlgoSeq")
                .args(self.try_algorithms.iter().copied());
        }
        command
            .arg("-relaxation")
            .arg(self.relaxation)
            .arg("-minStep")
            .arg(self.min_step)
    }
}

/// What `prepare_next_analysis_stage` clears
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageReset {
    pub reset_time: bool,
    /// Lock current loads in as constant
    pub keep_loads: bool,
    pub remove_recorders: bool,
    pub remove_patterns: Vec<u32>,
    pub remove_series: Vec<u32>,
    pub reset_damping: bool,
}

impl Default for StageReset {
    fn default() -> Self {
        Self {
            reset_time: true,
            keep_loads: false,
            remove_recorders: true,
            remove_patterns: Vec::new(),
            remove_series: Vec::new(),
            reset_damping: false,
        }
    }
}

impl StageReset {
    /// Reset after a gravity stage: loads stay applied
    pub fn keeping_loads() -> Self {
        Self {
            keep_loads: true,
            ..Self::default()
        }
    }

    pub fn removing(mut self, patterns: Vec<u32>, series: Vec<u32>) -> Self {
        self.remove_patterns = patterns;
        self.remove_series = series;
        self
    }

    pub fn with_damping_reset(mut self) -> Self {
        self.reset_damping = true;
        self
    }

    /// Directives in emission order
    pub fn commands(&self) -> Vec<Command> {
        let mut out = Vec::new();
        if self.reset_time {
            out.push(Command::new("setTime").arg(0.0));
        }
        if self.keep_loads {
            out.push(Command::new("loadConst").arg("-time").arg(0.0));
        }
        if self.remove_recorders {
            out.push(Command::new("remove").arg("recorders"));
        }
        for tag in &self.remove_patterns {
            out.push(Command::new("remove").arg("loadPattern").arg(*tag));
        }
        for tag in &self.remove_series {
            out.push(Command::new("remove").arg("timeSeries").arg(*tag));
        }
        if self.reset_damping {
            out.push(Command::new("rayleigh").args([0.0; 4]));
        }
        out.push(Command::new("wipeAnalysis"));
        out
    }
}

/// Recorded ground motion driving a time-history stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundMotionRecord {
    pub time: Vec<f64>,
    pub accel: Option<Vec<f64>>,
    pub vel: Option<Vec<f64>>,
    pub disp: Option<Vec<f64>>,
}

impl GroundMotionRecord {
    pub fn from_accel(time: Vec<f64>, accel: Vec<f64>) -> Self {
        Self {
            time,
            accel: Some(accel),
            vel: None,
            disp: None,
        }
    }

    /// Present components with their engine flag, each checked against `time`
    pub(crate) fn components(&self) -> BuildResult<Vec<(&'static str, &[f64])>> {
        let mut out = Vec::new();
        for (flag, values) in [("-accel", &self.accel), ("-vel", &self.vel), ("-disp", &self.disp)] {
            if let Some(values) = values {
                if values.len() != self.time.len() {
                    return Err(BuildError::length_mismatch(
                        format!("ground motion {flag} record"),
                        self.time.len(),
                        values.len(),
                    ));
                }
                out.push((flag, values.as_slice()));
            }
        }
        if out.is_empty() {
            return Err(BuildError::invalid(
                "ground motion record needs acceleration, velocity or displacement",
            ));
        }
        Ok(out)
    }
}

/// How a time-history record is applied to the supports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Excitation {
    /// Same motion under every support
    Uniform { direction: u8, scale: f64 },
    /// Imposed motion in `direction` on the stage's support nodes, or on
    /// every support fixed in that direction
    MultipleSupport { direction: u8, scale: f64 },
}

impl Excitation {
    pub fn direction(&self) -> u8 {
        match self {
            Self::Uniform { direction, .. } | Self::MultipleSupport { direction, .. } => *direction,
        }
    }

    pub fn scale(&self) -> f64 {
        match self {
            Self::Uniform { scale, .. } | Self::MultipleSupport { scale, .. } => *scale,
        }
    }
}

/// Rayleigh damping fitted to two modes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayleighDamping {
    pub ratio: f64,
    /// Eigenvalues (ω²) of the two anchor modes
    pub eigenvalues: [f64; 2],
}

impl RayleighDamping {
    /// α = ζ·2ω₁ω₂/(ω₁+ω₂), β = ζ·2/(ω₁+ω₂)
    pub fn coefficients(&self) -> BuildResult<(f64, f64)> {
        let [w1, w2] = self.eigenvalues.map(|l| l.max(0.0).sqrt());
        if w1 + w2 <= 0.0 {
            return Err(BuildError::invalid(
                "Rayleigh damping needs at least one positive eigenvalue",
            ));
        }
        let alpha = self.ratio * 2.0 * w1 * w2 / (w1 + w2);
        let beta = self.ratio * 2.0 / (w1 + w2);
        Ok((alpha, beta))
    }

    /// `rayleigh α 0 0 β`
    pub fn command(&self) -> BuildResult<Command> {
        let (alpha, beta) = self.coefficients()?;
        Ok(Command::new("rayleigh").args([alpha, 0.0, 0.0, beta]))
    }
}

/// Load-controlled static stage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticOptions {
    pub steps: usize,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub config: AnalysisConfig,
}

impl Default for StaticOptions {
    fn default() -> Self {
        Self::gravity()
    }
}

impl StaticOptions {
    /// 10 steps, NormDispIncr 1e-5 with 25 iterations
    pub fn gravity() -> Self {
        Self {
            steps: 10,
            tolerance: 1e-5,
            max_iterations: 25,
            config: AnalysisConfig::default(),
        }
    }

    /// Gravity settings with up to 300 iterations per step
    pub fn standard() -> Self {
        Self {
            max_iterations: 300,
            ..Self::gravity()
        }
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }
}

/// Displacement-controlled pushover settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushoverOptions {
    pub control_node: u32,
    /// 1-based DOF of the control node
    pub dof: u8,
    /// Target displacements visited in order, starting from zero
    pub protocol: Vec<f64>,
    /// Largest displacement increment of one step
    pub max_step: f64,
    #[serde(default)]
    pub smart: SmartConfig,
    #[serde(default)]
    pub config: AnalysisConfig,
}

impl PushoverOptions {
    pub fn new(control_node: u32, dof: u8, protocol: Vec<f64>, max_step: f64) -> Self {
        Self {
            control_node,
            dof,
            protocol,
            max_step,
            smart: SmartConfig::default(),
            config: AnalysisConfig::default(),
        }
    }
}

/// Ground-motion time-history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeHistoryOptions {
    pub record: GroundMotionRecord,
    pub excitation: Excitation,
    pub dt: f64,
    pub steps: usize,
    #[serde(default)]
    pub damping: Option<RayleighDamping>,
    /// Nodes excited by a multiple-support stage; fixed supports when unset
    #[serde(default)]
    pub support_nodes: Option<Vec<u32>>,
    #[serde(default = "SmartConfig::transient")]
    pub smart: SmartConfig,
    #[serde(default)]
    pub config: AnalysisConfig,
}

impl TimeHistoryOptions {
    pub fn new(record: GroundMotionRecord, excitation: Excitation, dt: f64, steps: usize) -> Self {
        Self {
            record,
            excitation,
            dt,
            steps,
            damping: None,
            support_nodes: None,
            smart: SmartConfig::transient(),
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_damping(mut self, damping: RayleighDamping) -> Self {
        self.damping = Some(damping);
        self
    }

    pub fn with_support_nodes(mut self, nodes: Vec<u32>) -> Self {
        self.support_nodes = Some(nodes);
        self
    }
}
