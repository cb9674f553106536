//! Planar cross-section geometry and properties
//!
//! Sections are described by a closed outline (with optional holes). The
//! [`SectionAnalyzer`] service turns that outline into integrated properties
//! and, for fiber sections, a fiber mesh. It runs when a section is created,
//! never when it is realized.

mod polygon;
mod rebar;
mod shape;

pub use polygon::PolygonAnalyzer;
pub use rebar::{RebarGroup, RebarLayout, RebarPlacement};
pub use shape::{Point2, SectionGeometry, SectionShape};

use shape::rotate_point;

use crate::error::BuildResult;
use serde::{Deserialize, Serialize};

/// Integrated properties of a cross-section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionProperties {
    /// Cross-sectional area
    pub area: f64,
    /// Area centroid in section coordinates
    pub centroid: Point2,
    /// Second moment about the local z-axis
    pub iz: f64,
    /// Second moment about the local y-axis
    pub iy: f64,
    /// Torsion constant
    pub j: f64,
    /// Shear area along local y
    pub asy: f64,
    /// Shear area along local z
    pub asz: f64,
}

/// One fiber of a meshed section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fiber {
    pub y: f64,
    pub z: f64,
    pub area: f64,
    pub material: u32,
}

/// Material zones of a fiber mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiberZones {
    /// Cover depth measured from the outer boundary; zero means all core
    pub cover: f64,
    pub cover_material: Option<u32>,
    pub core_material: u32,
}

/// Geometric-properties service consumed at section creation
pub trait SectionAnalyzer {
    /// Area, centroid, inertia, torsion and shear properties
    fn properties(&self, geometry: &SectionGeometry) -> BuildResult<SectionProperties>;

    /// Fiber centroids, areas and material assignments
    fn fibers(&self, geometry: &SectionGeometry, zones: &FiberZones) -> BuildResult<Vec<Fiber>>;
}

/// Apply a section's rotation and centring offset to a point
pub(crate) fn rotate_rebar(p: Point2, angle_deg: f64, offset: Point2) -> Point2 {
    let r = rotate_point(p, angle_deg);
    [r[0] + offset[0], r[1] + offset[1]]
}
