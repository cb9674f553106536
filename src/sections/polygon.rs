//! Polygon integration and grid fiber meshing

use super::shape::{Point2, SectionGeometry};
use super::{Fiber, FiberZones, SectionAnalyzer, SectionProperties};
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};

/// Default section service: exact polygon moments and a regular fiber grid
///
/// Torsion uses the Saint-Venant compact-section estimate `A^4 / (4 pi^2 Ip)`
/// (exact for a circle) and both shear areas are taken as `5/6 A`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonAnalyzer {
    /// Grid cells per side of the bounding box
    pub divisions: usize,
}

impl Default for PolygonAnalyzer {
    fn default() -> Self {
        Self { divisions: 20 }
    }
}

impl PolygonAnalyzer {
    pub fn new(divisions: usize) -> Self {
        Self { divisions }
    }
}

/// Raw area integrals of one ring: A, first and second moments
#[derive(Debug, Default, Clone, Copy)]
struct RingIntegrals {
    area: f64,
    sy: f64,
    sz: f64,
    iyy: f64,
    izz: f64,
}

impl RingIntegrals {
    fn of(ring: &[Point2]) -> Self {
        let mut out = Self::default();
        for pair in ring.windows(2) {
            let [y0, z0] = pair[0];
            let [y1, z1] = pair[1];
            let c = y0 * z1 - y1 * z0;
            out.area += c / 2.0;
            out.sy += (y0 + y1) * c / 6.0;
            out.sz += (z0 + z1) * c / 6.0;
            out.iyy += (y0 * y0 + y0 * y1 + y1 * y1) * c / 12.0;
            out.izz += (z0 * z0 + z0 * z1 + z1 * z1) * c / 12.0;
        }
        if out.area < 0.0 {
            out.scale(-1.0);
        }
        out
    }

    fn scale(&mut self, k: f64) {
        self.area *= k;
        self.sy *= k;
        self.sz *= k;
        self.iyy *= k;
        self.izz *= k;
    }

    fn subtract(&mut self, other: &Self) {
        self.area -= other.area;
        self.sy -= other.sy;
        self.sz -= other.sz;
        self.iyy -= other.iyy;
        self.izz -= other.izz;
    }
}

impl SectionAnalyzer for PolygonAnalyzer {
    fn properties(&self, geometry: &SectionGeometry) -> BuildResult<SectionProperties> {
        let mut total = RingIntegrals::of(&geometry.outline);
        for hole in &geometry.holes {
            total.subtract(&RingIntegrals::of(hole));
        }
        if total.area <= f64::EPSILON {
            return Err(BuildError::InvalidGeometry(
                "section has no positive area".to_string(),
            ));
        }

        let area = total.area;
        let cy = total.sy / area;
        let cz = total.sz / area;
        // Iz bends about local z, so it integrates the y-coordinate
        let iz = total.iyy - area * cy * cy;
        let iy = total.izz - area * cz * cz;
        let polar = iz + iy;
        let j = area.powi(4) / (4.0 * std::f64::consts::PI.powi(2) * polar);

        Ok(SectionProperties {
            area,
            centroid: [cy, cz],
            iz,
            iy,
            j,
            asy: 5.0 / 6.0 * area,
            asz: 5.0 / 6.0 * area,
        })
    }

    fn fibers(&self, geometry: &SectionGeometry, zones: &FiberZones) -> BuildResult<Vec<Fiber>> {
        if self.divisions == 0 {
            return Err(BuildError::invalid("fiber grid needs at least one division"));
        }
        let cover_material = match (zones.cover > 0.0, zones.cover_material) {
            (true, None) => {
                return Err(BuildError::MissingArgument {
                    key: "cover_mat_tag".to_string(),
                })
            }
            (true, Some(tag)) => Some(tag),
            (false, _) => None,
        };

        let (min, max) = geometry.bounds();
        let n = self.divisions;
        let dy = (max[0] - min[0]) / n as f64;
        let dz = (max[1] - min[1]) / n as f64;
        let cell_area = dy * dz;

        let mut fibers = Vec::new();
        for i in 0..n {
            for k in 0..n {
                let c = [
                    min[0] + (i as f64 + 0.5) * dy,
                    min[1] + (k as f64 + 0.5) * dz,
                ];
                if !contains(&geometry.outline, c)
                    || geometry.holes.iter().any(|hole| contains(hole, c))
                {
                    continue;
                }
                let material = match cover_material {
                    Some(tag) if distance_to_ring(&geometry.outline, c) < zones.cover => tag,
                    _ => zones.core_material,
                };
                fibers.push(Fiber {
                    y: c[0],
                    z: c[1],
                    area: cell_area,
                    material,
                });
            }
        }
        Ok(fibers)
    }
}

/// Even-odd point-in-polygon test on a closed ring
fn contains(ring: &[Point2], p: Point2) -> bool {
    let mut inside = false;
    for pair in ring.windows(2) {
        let [y0, z0] = pair[0];
        let [y1, z1] = pair[1];
        if (z0 > p[1]) != (z1 > p[1]) {
            let y_cross = y0 + (p[1] - z0) * (y1 - y0) / (z1 - z0);
            if p[0] < y_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn distance_to_ring(ring: &[Point2], p: Point2) -> f64 {
    ring.windows(2)
        .map(|pair| distance_to_segment(pair[0], pair[1], p))
        .fold(f64::INFINITY, f64::min)
}

fn distance_to_segment(a: Point2, b: Point2, p: Point2) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let len2 = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len2 > 0.0 {
        ((ap[0] * ab[0] + ap[1] * ab[1]) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let dy = ap[0] - t * ab[0];
    let dz = ap[1] - t * ab[1];
    (dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::SectionShape;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle_properties() {
        let geo = SectionShape::rectangle(0.3, 0.5).geometry().unwrap();
        let props = PolygonAnalyzer::default().properties(&geo).unwrap();
        assert_relative_eq!(props.area, 0.15, epsilon = 1e-12);
        assert_relative_eq!(props.centroid[0], 0.15, epsilon = 1e-12);
        assert_relative_eq!(props.centroid[1], 0.25, epsilon = 1e-12);
        assert_relative_eq!(props.iz, 0.5 * 0.3_f64.powi(3) / 12.0, epsilon = 1e-12);
        assert_relative_eq!(props.iy, 0.3 * 0.5_f64.powi(3) / 12.0, epsilon = 1e-12);
        assert_relative_eq!(props.asy, 0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_clockwise_outline_and_holes() {
        let outline = vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        let hole = vec![[0.25, 0.25], [0.75, 0.25], [0.75, 0.75], [0.25, 0.75]];
        let geo = SectionGeometry::new(outline, vec![hole]).unwrap();
        let props = PolygonAnalyzer::default().properties(&geo).unwrap();
        assert_relative_eq!(props.area, 0.75, epsilon = 1e-12);
        let expected = 1.0 / 12.0 - 0.5_f64.powi(4) / 12.0;
        assert_relative_eq!(props.iz, expected, epsilon = 1e-12);
        assert_relative_eq!(props.iy, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_circle_torsion_matches_polar_moment() {
        let geo = SectionShape::Circular {
            radius: 0.4,
            num_points: 256,
        }
        .geometry()
        .unwrap();
        let props = PolygonAnalyzer::default().properties(&geo).unwrap();
        let exact = std::f64::consts::PI * 0.4_f64.powi(4) / 2.0;
        assert_relative_eq!(props.j, exact, max_relative = 1e-3);
    }

    #[test]
    fn test_rectangle_fibers_cover_whole_area() {
        let geo = SectionShape::rectangle(0.4, 0.6).geometry().unwrap();
        let zones = FiberZones {
            cover: 0.0,
            cover_material: None,
            core_material: 2,
        };
        let fibers = PolygonAnalyzer::new(10).fibers(&geo, &zones).unwrap();
        assert_eq!(fibers.len(), 100);
        let area: f64 = fibers.iter().map(|f| f.area).sum();
        assert_relative_eq!(area, 0.24, epsilon = 1e-12);
        assert!(fibers.iter().all(|f| f.material == 2));
    }

    #[test]
    fn test_cover_ring_uses_cover_material() {
        let geo = SectionShape::rectangle(1.0, 1.0).geometry().unwrap();
        let zones = FiberZones {
            cover: 0.1,
            cover_material: Some(1),
            core_material: 2,
        };
        let fibers = PolygonAnalyzer::new(10).fibers(&geo, &zones).unwrap();
        let cover = fibers.iter().filter(|f| f.material == 1).count();
        let core = fibers.iter().filter(|f| f.material == 2).count();
        // outermost ring of a 10x10 grid has 36 cells
        assert_eq!(cover, 36);
        assert_eq!(core, 64);
    }

    #[test]
    fn test_hollow_section_has_no_fibers_in_the_void() {
        let outline = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let hole = vec![[0.1, 0.1], [0.9, 0.1], [0.9, 0.9], [0.1, 0.9]];
        let geo = SectionGeometry::new(outline, vec![hole]).unwrap();
        let zones = FiberZones {
            cover: 0.2,
            cover_material: Some(1),
            core_material: 2,
        };
        let analyzer = PolygonAnalyzer::new(40);
        let fibers = analyzer.fibers(&geo, &zones).unwrap();

        let solid = analyzer.properties(&geo).unwrap().area;
        let meshed: f64 = fibers.iter().map(|f| f.area).sum();
        assert_relative_eq!(solid, 0.36, epsilon = 1e-12);
        assert_relative_eq!(meshed, solid, epsilon = 1e-9);
        assert_eq!(fibers.len(), 576);
        assert!(fibers.iter().all(|f| !contains(&geo.holes[0], [f.y, f.z])));
        // the 0.1 wall lies entirely within the 0.2 cover
        assert!(fibers.iter().all(|f| f.material == 1));
    }

    #[test]
    fn test_cover_without_material_is_rejected() {
        let geo = SectionShape::rectangle(1.0, 1.0).geometry().unwrap();
        let zones = FiberZones {
            cover: 0.05,
            cover_material: None,
            core_material: 2,
        };
        assert!(PolygonAnalyzer::default().fibers(&geo, &zones).is_err());
    }
}
