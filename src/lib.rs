//! Structural Stager - deferred construction of 3D structural analysis cases
//!
//! Models are assembled in memory without touching the analysis engine:
//! - Materials, elastic and fiber sections, beam integrations
//! - Nodes, beam-column, general and geometry-only line elements
//! - Single-point and multi-point constraints
//! - Time series and load patterns (plain, uniform excitation, multiple support)
//!
//! A single build then emits every entity once, in dependency order, through
//! an [`EngineSession`](session::EngineSession). Analysis stages (modal,
//! gravity, static, pushover, time history) run on top of the built model.
//!
//! ## Example
//! ```rust
//! use structural_stager::prelude::*;
//!
//! let mut model = StructuralModel::new("portal", ModelParams::default(), RecordingSession::new());
//!
//! // Section
//! let spec = ElasticSectionSpec::new(SectionShape::rectangle(0.4, 0.4), 30e9, 12.5e9);
//! model
//!     .properties_mut()
//!     .create_elastic_section(1, "C40", StructuralType::Column, &spec)
//!     .unwrap();
//!
//! // Geometry
//! let geo = model.geometry_mut();
//! let base = geo.create_node(0.0, 0.0, 0.0);
//! let top = geo.create_node(0.0, 0.0, 3.0);
//! geo.create_element(None, base, top, StructuralType::Column, BeamColumn::elastic("C40"))
//!     .unwrap();
//!
//! // Supports and loads
//! model.constraints_mut().create_constraint(base, [true; 6]);
//! model.loading_mut().create_linear_time_series(1, 1.0).unwrap();
//! model
//!     .loading_mut()
//!     .create_load_pattern(1, Some(TimeSeriesRef::Registered(1)));
//! model
//!     .loading_mut()
//!     .create_node_load(1, NodalLoad::force(top, 0.0, 0.0, -10e3))
//!     .unwrap();
//!
//! // Realize and analyze
//! model.build_model().unwrap();
//! let gravity = model
//!     .analysis()
//!     .run_gravity_analysis(1, &StaticOptions::gravity())
//!     .unwrap();
//! assert!(gravity.is_complete());
//! ```

pub mod analysis;
pub mod command;
pub mod config;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod model;
pub mod registry;
pub mod results;
pub mod sections;
pub mod session;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{
        split_protocol, AnalysisConfig, Excitation, GroundMotionRecord, PushoverOptions,
        RayleighDamping, SmartConfig, StageReset, Stager, StaticOptions, TimeHistoryOptions,
    };
    pub use crate::command::{Arg, Command, Params};
    pub use crate::config::ModelParams;
    pub use crate::elements::{
        BeamColumn, BeamIntegration, ElasticSectionSpec, Element, ElementKind, FiberSectionSpec,
        Fixity, Formulation, GeneralElement, HingeRegion, MpConstraint, Node, NodeRef,
        RigidLinkKind, Section, Segment, StructuralType, TransformKind, UniaxialMaterial,
    };
    pub use crate::error::{BuildError, BuildResult, ErrorKind};
    pub use crate::loads::{
        BeamLoad, GroundMotion, Load, LoadPattern, NodalLoad, PathSeries, PatternKind, TimeSeries,
        TimeSeriesRef, UniformExcitation,
    };
    pub use crate::model::{
        BuildState, Constraints, DirectCommand, Geometry, GridOptions, GridSummary, Loading,
        Properties, StructuralModel,
    };
    pub use crate::registry::Registry;
    pub use crate::results::{ModalResults, StageKind, StageResults, StepSnapshot};
    pub use crate::sections::{
        PolygonAnalyzer, RebarGroup, SectionAnalyzer, SectionGeometry, SectionShape,
    };
    pub use crate::session::{EngineSession, RecordingSession, StepRequest};
}
