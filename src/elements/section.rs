//! Cross-sections for frame elements
//!
//! Geometry is resolved eagerly: creating a section generates its outline,
//! applies the rotation, centres it on its centroid and asks the
//! [`SectionAnalyzer`] for properties (and fibers). Realization only emits
//! what was computed here.

use super::StructuralType;
use crate::command::Command;
use crate::error::{BuildError, BuildResult};
use crate::sections::{
    rotate_rebar, Fiber, FiberZones, RebarGroup, RebarPlacement, SectionAnalyzer, SectionGeometry,
    SectionProperties, SectionShape,
};
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};

/// Inputs for an elastic section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticSectionSpec {
    pub shape: SectionShape,
    /// Young's modulus
    pub e_mod: f64,
    /// Shear modulus
    pub g_mod: f64,
    /// Rotation of the outline in degrees
    #[serde(default)]
    pub rotate_angle: f64,
    /// Include shear deformation (emits shear factors)
    #[serde(default)]
    pub shear: bool,
}

impl ElasticSectionSpec {
    pub fn new(shape: SectionShape, e_mod: f64, g_mod: f64) -> Self {
        Self {
            shape,
            e_mod,
            g_mod,
            rotate_angle: 0.0,
            shear: false,
        }
    }

    pub fn with_rotation(mut self, angle_deg: f64) -> Self {
        self.rotate_angle = angle_deg;
        self
    }

    pub fn with_shear(mut self) -> Self {
        self.shear = true;
        self
    }
}

/// Inputs for a fiber section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiberSectionSpec {
    pub shape: SectionShape,
    /// Cover depth; zero makes the whole section core
    #[serde(default)]
    pub cover: f64,
    pub cover_material: Option<u32>,
    pub core_material: Option<u32>,
    #[serde(default)]
    pub rebars: Vec<RebarGroup>,
    #[serde(default)]
    pub rotate_angle: f64,
    /// Shear modulus, used for GJ = G * J when `gj` is not given
    pub g: Option<f64>,
    /// Torsional stiffness
    pub gj: Option<f64>,
}

impl FiberSectionSpec {
    pub fn new(shape: SectionShape, core_material: u32) -> Self {
        Self {
            shape,
            cover: 0.0,
            cover_material: None,
            core_material: Some(core_material),
            rebars: Vec::new(),
            rotate_angle: 0.0,
            g: None,
            gj: None,
        }
    }

    pub fn with_cover(mut self, cover: f64, material: u32) -> Self {
        self.cover = cover;
        self.cover_material = Some(material);
        self
    }

    pub fn with_rebar(mut self, group: RebarGroup) -> Self {
        self.rebars.push(group);
        self
    }

    pub fn with_rotation(mut self, angle_deg: f64) -> Self {
        self.rotate_angle = angle_deg;
        self
    }

    pub fn with_shear_modulus(mut self, g: f64) -> Self {
        self.g = Some(g);
        self
    }

    pub fn with_torsional_stiffness(mut self, gj: f64) -> Self {
        self.gj = Some(gj);
        self
    }
}

/// Formulation-specific data of a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionKind {
    Elastic {
        e_mod: f64,
        g_mod: f64,
        shear: bool,
    },
    Fiber {
        fibers: Vec<Fiber>,
        rebars: Vec<RebarPlacement>,
        g: Option<f64>,
        gj: Option<f64>,
    },
}

/// A named cross-section with precomputed geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Section tag
    pub tag: u32,
    /// Unique name used as the registry key
    pub name: String,
    /// Element role this section is meant for
    pub structural_type: StructuralType,
    /// Rotated and centred outline
    pub geometry: SectionGeometry,
    /// Properties of the centred outline
    pub properties: SectionProperties,
    pub kind: SectionKind,

    #[serde(skip)]
    pub(crate) realized: bool,
}

impl Section {
    /// Create an elastic section
    pub fn elastic(
        tag: u32,
        name: impl Into<String>,
        structural_type: StructuralType,
        spec: &ElasticSectionSpec,
        analyzer: &dyn SectionAnalyzer,
    ) -> BuildResult<Self> {
        let (geometry, properties, _) = prepare(&spec.shape, spec.rotate_angle, analyzer)?;
        Ok(Self {
            tag,
            name: name.into(),
            structural_type,
            geometry,
            properties,
            kind: SectionKind::Elastic {
                e_mod: spec.e_mod,
                g_mod: spec.g_mod,
                shear: spec.shear,
            },
            realized: false,
        })
    }

    /// Create a fiber section, meshing cover, core and rebars now
    pub fn fiber(
        tag: u32,
        name: impl Into<String>,
        structural_type: StructuralType,
        spec: &FiberSectionSpec,
        analyzer: &dyn SectionAnalyzer,
    ) -> BuildResult<Self> {
        let core_material = spec.core_material.ok_or_else(|| BuildError::MissingArgument {
            key: "core_mat_tag".to_string(),
        })?;
        let (geometry, properties, offset) = prepare(&spec.shape, spec.rotate_angle, analyzer)?;
        let zones = FiberZones {
            cover: spec.cover,
            cover_material: spec.cover_material,
            core_material,
        };
        let fibers = analyzer.fibers(&geometry, &zones)?;
        let rebars = spec
            .rebars
            .iter()
            .map(|group| {
                Ok(RebarPlacement {
                    group: group.name.clone(),
                    positions: group
                        .positions()?
                        .into_iter()
                        .map(|p| rotate_rebar(p, spec.rotate_angle, offset))
                        .collect(),
                    diameter: group.diameter,
                    material: group.material,
                })
            })
            .collect::<BuildResult<Vec<_>>>()?;

        Ok(Self {
            tag,
            name: name.into(),
            structural_type,
            geometry,
            properties,
            kind: SectionKind::Fiber {
                fibers,
                rebars,
                g: spec.g,
                gj: spec.gj,
            },
            realized: false,
        })
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Engine commands for this section, in emission order
    pub fn commands(&self) -> BuildResult<Vec<Command>> {
        let p = &self.properties;
        match &self.kind {
            SectionKind::Elastic {
                e_mod,
                g_mod,
                shear,
            } => {
                let mut cmd = Command::new("section")
                    .arg("Elastic")
                    .arg(self.tag)
                    .args([*e_mod, p.area, p.iz, p.iy, *g_mod, p.j]);
                if *shear {
                    cmd = cmd.args([p.asy, p.asz]);
                }
                Ok(vec![cmd])
            }
            SectionKind::Fiber {
                fibers,
                rebars,
                g,
                gj,
            } => {
                let gj = match (gj, g) {
                    (Some(gj), _) => *gj,
                    (None, Some(g)) => g * p.j,
                    (None, None) => {
                        return Err(BuildError::invalid(format!(
                            "either GJ or G must be provided for fiber section '{}'",
                            self.name
                        )))
                    }
                };
                let mut cmds = vec![Command::new("section")
                    .arg("Fiber")
                    .arg(self.tag)
                    .arg("-GJ")
                    .arg(gj)];
                cmds.extend(fibers.iter().map(|f| {
                    Command::new("fiber")
                        .args([f.y, f.z, f.area])
                        .arg(f.material)
                }));
                for rebar in rebars {
                    let area = rebar.bar_area();
                    cmds.extend(rebar.positions.iter().map(|xy| {
                        Command::new("fiber")
                            .args([xy[0], xy[1], area])
                            .arg(rebar.material)
                    }));
                }
                Ok(cmds)
            }
        }
    }

    pub fn realize(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        if self.realized {
            return Ok(());
        }
        for cmd in self.commands()? {
            session.execute(&cmd)?;
        }
        self.realized = true;
        log::debug!("Realized section {} (tag={})", self.name, self.tag);
        Ok(())
    }
}

/// Generate, rotate and centre an outline; returns the centring offset too
fn prepare(
    shape: &SectionShape,
    rotate_angle: f64,
    analyzer: &dyn SectionAnalyzer,
) -> BuildResult<(SectionGeometry, SectionProperties, [f64; 2])> {
    let rotated = shape.geometry()?.rotated(rotate_angle);
    let raw = analyzer.properties(&rotated)?;
    let offset = [-raw.centroid[0], -raw.centroid[1]];
    let centred = rotated.translated(offset[0], offset[1]);
    let properties = analyzer.properties(&centred)?;
    Ok((centred, properties, offset))
}
