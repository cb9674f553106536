//! Structural entities module

mod constraint;
mod element;
mod integration;
mod material;
mod node;
mod section;
mod transformation;

pub use constraint::{Fixity, MpConstraint, MpConstraintKind, RigidLinkKind};
pub use element::{
    BeamColumn, Element, ElementKind, Formulation, GeneralElement, NodeRef, RealizeContext,
    Segment, StructuralType, TransformAttachment,
};
pub use integration::{BeamIntegration, HingeRegion, HingeScheme, IntegrationRule, Quadrature};
pub use material::UniaxialMaterial;
pub use node::Node;
pub use section::{ElasticSectionSpec, FiberSectionSpec, Section, SectionKind};
pub use transformation::{TransformKind, Transformation, TransformationCache};
