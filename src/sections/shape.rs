//! Section outlines

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};

/// A point in the section plane (local y, local z)
pub type Point2 = [f64; 2];

/// Closed outline with optional holes, in section coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionGeometry {
    /// Outer boundary, first point repeated at the end
    pub outline: Vec<Point2>,
    /// Inner boundaries, each closed
    pub holes: Vec<Vec<Point2>>,
}

impl SectionGeometry {
    /// Build a geometry, closing any open ring
    pub fn new(outline: Vec<Point2>, holes: Vec<Vec<Point2>>) -> BuildResult<Self> {
        let outline = close_ring(outline, "section outline")?;
        let holes = holes
            .into_iter()
            .map(|hole| close_ring(hole, "section hole"))
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(Self { outline, holes })
    }

    /// Rotate every ring about the origin, angle in degrees
    pub fn rotated(&self, angle_deg: f64) -> Self {
        let map = |ring: &Vec<Point2>| -> Vec<Point2> {
            ring.iter().map(|p| rotate_point(*p, angle_deg)).collect()
        };
        Self {
            outline: map(&self.outline),
            holes: self.holes.iter().map(map).collect(),
        }
    }

    pub fn translated(&self, dy: f64, dz: f64) -> Self {
        let map = |ring: &Vec<Point2>| -> Vec<Point2> {
            ring.iter().map(|p| [p[0] + dy, p[1] + dz]).collect()
        };
        Self {
            outline: map(&self.outline),
            holes: self.holes.iter().map(map).collect(),
        }
    }

    /// Axis-aligned bounds as ([min_y, min_z], [max_y, max_z])
    pub fn bounds(&self) -> (Point2, Point2) {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in &self.outline {
            for k in 0..2 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        (min, max)
    }
}

/// Shape families a section outline can be generated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SectionShape {
    Rectangle {
        width: f64,
        height: f64,
    },
    TSection {
        flange_width: f64,
        height: f64,
        flange_thickness: f64,
        web_thickness: f64,
    },
    LSection {
        flange_width: f64,
        height: f64,
        flange_thickness: f64,
        web_thickness: f64,
    },
    ISection {
        width: f64,
        height: f64,
        flange_thickness: f64,
        web_thickness: f64,
    },
    Circular {
        radius: f64,
        num_points: usize,
    },
    User {
        outline: Vec<Point2>,
        #[serde(default)]
        holes: Vec<Vec<Point2>>,
    },
}

impl SectionShape {
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::Rectangle { width, height }
    }

    /// Circular outline approximated by 16 points
    pub fn circular(radius: f64) -> Self {
        Self::Circular {
            radius,
            num_points: 16,
        }
    }

    pub fn i_section(width: f64, height: f64, flange_thickness: f64, web_thickness: f64) -> Self {
        Self::ISection {
            width,
            height,
            flange_thickness,
            web_thickness,
        }
    }

    /// Generate the outline for this shape
    pub fn geometry(&self) -> BuildResult<SectionGeometry> {
        match self {
            Self::Rectangle { width: w, height: h } => {
                positive("width", *w)?;
                positive("height", *h)?;
                SectionGeometry::new(vec![[0.0, 0.0], [*w, 0.0], [*w, *h], [0.0, *h]], vec![])
            }
            Self::TSection {
                flange_width: b,
                height: h,
                flange_thickness: tf,
                web_thickness: tw,
            } => {
                check_flanged(*b, *h, *tf, *tw, 1.0)?;
                let x0 = (b - tw) / 2.0;
                SectionGeometry::new(
                    vec![
                        [x0, 0.0],
                        [x0 + tw, 0.0],
                        [x0 + tw, h - tf],
                        [*b, h - tf],
                        [*b, *h],
                        [0.0, *h],
                        [0.0, h - tf],
                        [x0, h - tf],
                    ],
                    vec![],
                )
            }
            Self::LSection {
                flange_width: b,
                height: h,
                flange_thickness: tf,
                web_thickness: tw,
            } => {
                check_flanged(*b, *h, *tf, *tw, 1.0)?;
                SectionGeometry::new(
                    vec![
                        [0.0, 0.0],
                        [*tw, 0.0],
                        [*tw, h - tf],
                        [*b, h - tf],
                        [*b, *h],
                        [0.0, *h],
                    ],
                    vec![],
                )
            }
            Self::ISection {
                width: b,
                height: h,
                flange_thickness: tf,
                web_thickness: tw,
            } => {
                check_flanged(*b, *h, *tf, *tw, 2.0)?;
                let x0 = (b - tw) / 2.0;
                SectionGeometry::new(
                    vec![
                        [0.0, 0.0],
                        [*b, 0.0],
                        [*b, *tf],
                        [x0 + tw, *tf],
                        [x0 + tw, h - tf],
                        [*b, h - tf],
                        [*b, *h],
                        [0.0, *h],
                        [0.0, h - tf],
                        [x0, h - tf],
                        [x0, *tf],
                        [0.0, *tf],
                    ],
                    vec![],
                )
            }
            Self::Circular { radius, num_points } => {
                positive("radius", *radius)?;
                if *num_points < 3 {
                    return Err(BuildError::invalid(
                        "circular section needs at least 3 outline points",
                    ));
                }
                let n = *num_points as f64;
                let outline = (0..*num_points)
                    .map(|i| {
                        let theta = 2.0 * std::f64::consts::PI * i as f64 / n;
                        [radius * theta.cos(), radius * theta.sin()]
                    })
                    .collect();
                SectionGeometry::new(outline, vec![])
            }
            Self::User { outline, holes } => SectionGeometry::new(outline.clone(), holes.clone()),
        }
    }
}

/// Rotate a point about the origin, angle in degrees
pub(crate) fn rotate_point(p: Point2, angle_deg: f64) -> Point2 {
    let (s, c) = angle_deg.to_radians().sin_cos();
    [c * p[0] - s * p[1], s * p[0] + c * p[1]]
}

fn close_ring(mut ring: Vec<Point2>, what: &str) -> BuildResult<Vec<Point2>> {
    if ring.len() < 3 {
        return Err(BuildError::InvalidGeometry(format!(
            "{what} needs at least 3 points, got {}",
            ring.len()
        )));
    }
    if ring.first() != ring.last() {
        ring.push(ring[0]);
    }
    Ok(ring)
}

fn positive(name: &str, value: f64) -> BuildResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(BuildError::invalid(format!("{name} must be positive, got {value}")))
    }
}

fn check_flanged(b: f64, h: f64, tf: f64, tw: f64, flanges: f64) -> BuildResult<()> {
    positive("flange width", b)?;
    positive("height", h)?;
    positive("flange thickness", tf)?;
    positive("web thickness", tw)?;
    if tw >= b || flanges * tf >= h {
        return Err(BuildError::InvalidGeometry(
            "web and flange thicknesses must fit inside the section".to_string(),
        ));
    }
    Ok(())
}
