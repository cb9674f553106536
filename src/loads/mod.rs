//! Time series, loads and load patterns

mod load;
mod pattern;
mod time_series;

pub use load::{BeamLoad, Load, NodalLoad};
pub use pattern::{
    GroundMotion, ImposedMotion, LoadPattern, PatternKind, TimeSeriesRef, UniformExcitation,
};
pub use time_series::{PathSeries, TimeSeries, TimeSeriesKind};
