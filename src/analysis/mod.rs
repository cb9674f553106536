//! Analysis stages: method selection and the multi-stage driver

mod config;
mod stager;

pub use config::{
    AnalysisConfig, Excitation, GroundMotionRecord, PushoverOptions, RayleighDamping, SmartConfig,
    StageReset, StaticOptions, TimeHistoryOptions, DIRECTIVES,
};
pub use stager::{split_protocol, Stager, DEFAULT_EIGEN_SOLVER};
