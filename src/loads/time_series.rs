//! Time series driving load patterns

use crate::command::Command;
use crate::error::{BuildError, BuildResult};
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Path series options; only non-default values are emitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSeries {
    /// Spacing of equally spaced values; zero when `time` is given
    pub dt: f64,
    pub values: Vec<f64>,
    pub time: Vec<f64>,
    pub file_path: Option<PathBuf>,
    pub file_time: Option<PathBuf>,
    pub factor: f64,
    pub start_time: f64,
    /// Hold the last value beyond the end of the path
    pub use_last: bool,
    pub prepend_zero: bool,
}

impl Default for PathSeries {
    fn default() -> Self {
        Self {
            dt: 0.0,
            values: Vec::new(),
            time: Vec::new(),
            file_path: None,
            file_time: None,
            factor: 1.0,
            start_time: 0.0,
            use_last: false,
            prepend_zero: false,
        }
    }
}

impl PathSeries {
    /// Equally spaced inline values
    pub fn uniform(dt: f64, values: Vec<f64>) -> Self {
        Self {
            dt,
            values,
            ..Self::default()
        }
    }

    /// Inline values at explicit times
    pub fn timed(time: Vec<f64>, values: Vec<f64>) -> Self {
        Self {
            time,
            values,
            ..Self::default()
        }
    }

    /// Values read by the engine from a file
    pub fn from_file(dt: f64, file_path: impl Into<PathBuf>) -> Self {
        Self {
            dt,
            file_path: Some(file_path.into()),
            ..Self::default()
        }
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn use_last(mut self) -> Self {
        self.use_last = true;
        self
    }

    pub fn prepend_zero(mut self) -> Self {
        self.prepend_zero = true;
        self
    }

    fn validate(&self) -> BuildResult<()> {
        if !self.values.is_empty() && !self.time.is_empty() && self.values.len() != self.time.len()
        {
            return Err(BuildError::length_mismatch(
                "path time",
                self.values.len(),
                self.time.len(),
            ));
        }
        Ok(())
    }

    fn append_to(&self, mut cmd: Command) -> Command {
        if self.dt != 0.0 {
            cmd = cmd.arg("-dt").arg(self.dt);
        }
        if !self.time.is_empty() {
            cmd = cmd.arg("-time").args(self.time.iter().copied());
        }
        if !self.values.is_empty() {
            cmd = cmd.arg("-values").args(self.values.iter().copied());
        }
        if let Some(path) = &self.file_time {
            cmd = cmd.arg("-fileTime").arg(path.display().to_string());
        }
        if let Some(path) = &self.file_path {
            cmd = cmd.arg("-filePath").arg(path.display().to_string());
        }
        if self.factor != 1.0 {
            cmd = cmd.arg("-factor").arg(self.factor);
        }
        if self.start_time != 0.0 {
            cmd = cmd.arg("-startTime").arg(self.start_time);
        }
        if self.use_last {
            cmd = cmd.arg("-useLast");
        }
        if self.prepend_zero {
            cmd = cmd.arg("-prependZero");
        }
        cmd
    }
}

/// Time series variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimeSeriesKind {
    Constant { factor: f64 },
    Linear { factor: f64 },
    Path(PathSeries),
}

impl TimeSeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constant { .. } => "Constant",
            Self::Linear { .. } => "Linear",
            Self::Path(_) => "Path",
        }
    }
}

/// A tagged time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub tag: u32,
    pub kind: TimeSeriesKind,

    #[serde(skip)]
    pub(crate) realized: bool,
}

impl TimeSeries {
    pub fn new(tag: u32, kind: TimeSeriesKind) -> BuildResult<Self> {
        if tag == 0 {
            return Err(BuildError::invalid("time series tag must be a positive integer"));
        }
        if let TimeSeriesKind::Path(path) = &kind {
            path.validate()?;
        }
        Ok(Self {
            tag,
            kind,
            realized: false,
        })
    }

    pub fn constant(tag: u32, factor: f64) -> BuildResult<Self> {
        Self::new(tag, TimeSeriesKind::Constant { factor })
    }

    pub fn linear(tag: u32, factor: f64) -> BuildResult<Self> {
        Self::new(tag, TimeSeriesKind::Linear { factor })
    }

    pub fn path(tag: u32, path: PathSeries) -> BuildResult<Self> {
        Self::new(tag, TimeSeriesKind::Path(path))
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    pub fn command(&self) -> Command {
        let cmd = Command::new("timeSeries").arg(self.kind.as_str()).arg(self.tag);
        match &self.kind {
            TimeSeriesKind::Constant { factor } | TimeSeriesKind::Linear { factor } => {
                cmd.arg("-factor").arg(*factor)
            }
            TimeSeriesKind::Path(path) => path.append_to(cmd),
        }
    }

    pub fn realize(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        if self.realized {
            return Ok(());
        }
        session.execute(&self.command())?;
        self.realized = true;
        log::debug!("Realized {} time series {}", self.kind.as_str(), self.tag);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RecordingSession;

    #[test]
    fn test_constant_and_linear_commands() {
        let c = TimeSeries::constant(1, 1.0).unwrap();
        assert_eq!(c.command().to_string(), "timeSeries Constant 1 -factor 1.0");
        let l = TimeSeries::linear(2, 2.5).unwrap();
        assert_eq!(l.command().to_string(), "timeSeries Linear 2 -factor 2.5");
    }

    #[test]
    fn test_zero_tag_is_rejected() {
        assert!(TimeSeries::constant(0, 1.0).is_err());
    }

    #[test]
    fn test_path_emits_only_non_defaults_in_order() {
        let series = TimeSeries::path(
            3,
            PathSeries::timed(vec![0.0, 1.0], vec![0.0, 2.0])
                .with_factor(9.81)
                .use_last()
                .prepend_zero(),
        )
        .unwrap();
        assert_eq!(
            series.command().to_string(),
            "timeSeries Path 3 -time 0.0 1.0 -values 0.0 2.0 -factor 9.81 -useLast -prependZero"
        );

        let plain = TimeSeries::path(4, PathSeries::uniform(0.01, vec![0.1, 0.2])).unwrap();
        assert_eq!(
            plain.command().to_string(),
            "timeSeries Path 4 -dt 0.01 -values 0.1 0.2"
        );
    }

    #[test]
    fn test_path_length_mismatch() {
        let err = TimeSeries::path(5, PathSeries::timed(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, BuildError::LengthMismatch { .. }));
    }

    #[test]
    fn test_realize_once() {
        let mut series = TimeSeries::linear(1, 1.0).unwrap();
        let mut session = RecordingSession::new();
        series.realize(&mut session).unwrap();
        series.realize(&mut session).unwrap();
        assert_eq!(session.commands().len(), 1);
    }
}
