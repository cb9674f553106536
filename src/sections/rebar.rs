//! Reinforcing bar layouts for fiber sections

use super::shape::{rotate_point, Point2};
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};

/// Where the bars of one group sit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum RebarLayout {
    /// Bars at explicit points
    Points { points: Vec<Point2> },
    /// `count` bars spread evenly along a polyline, ends included
    Line { points: Vec<Point2>, count: usize },
    /// Bars on a circle at the given angles (degrees)
    Circle {
        center: Point2,
        radius: f64,
        angles: Vec<f64>,
    },
}

/// A named group of identical bars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebarGroup {
    pub name: String,
    pub layout: RebarLayout,
    /// Bar diameter
    pub diameter: f64,
    /// Material tag of the bars
    pub material: u32,
}

impl RebarGroup {
    pub fn points(name: impl Into<String>, points: Vec<Point2>, diameter: f64, material: u32) -> Self {
        Self {
            name: name.into(),
            layout: RebarLayout::Points { points },
            diameter,
            material,
        }
    }

    pub fn line(
        name: impl Into<String>,
        points: Vec<Point2>,
        count: usize,
        diameter: f64,
        material: u32,
    ) -> Self {
        Self {
            name: name.into(),
            layout: RebarLayout::Line { points, count },
            diameter,
            material,
        }
    }

    /// `count` bars evenly spaced around a circle, starting at 0 degrees
    pub fn circle(
        name: impl Into<String>,
        center: Point2,
        radius: f64,
        count: usize,
        diameter: f64,
        material: u32,
    ) -> Self {
        let angles = (0..count)
            .map(|i| 360.0 * i as f64 / count as f64)
            .collect();
        Self {
            name: name.into(),
            layout: RebarLayout::Circle {
                center,
                radius,
                angles,
            },
            diameter,
            material,
        }
    }

    /// Area of one bar
    pub fn bar_area(&self) -> f64 {
        std::f64::consts::PI / 4.0 * self.diameter * self.diameter
    }

    /// Bar centres in section coordinates
    pub fn positions(&self) -> BuildResult<Vec<Point2>> {
        if self.diameter <= 0.0 {
            return Err(BuildError::invalid(format!(
                "rebar group '{}' needs a positive diameter",
                self.name
            )));
        }
        match &self.layout {
            RebarLayout::Points { points } => Ok(points.clone()),
            RebarLayout::Line { points, count } => spread_along(points, *count, &self.name),
            RebarLayout::Circle {
                center,
                radius,
                angles,
            } => Ok(angles
                .iter()
                .map(|a| {
                    let p = rotate_point([*radius, 0.0], *a);
                    [center[0] + p[0], center[1] + p[1]]
                })
                .collect()),
        }
    }
}

/// Bar records after the section transform has been applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebarPlacement {
    pub group: String,
    pub positions: Vec<Point2>,
    pub diameter: f64,
    pub material: u32,
}

impl RebarPlacement {
    pub fn bar_area(&self) -> f64 {
        std::f64::consts::PI / 4.0 * self.diameter * self.diameter
    }
}

fn spread_along(points: &[Point2], count: usize, name: &str) -> BuildResult<Vec<Point2>> {
    if points.len() < 2 {
        return Err(BuildError::invalid(format!(
            "rebar line '{name}' needs at least two points"
        )));
    }
    if count == 0 {
        return Ok(Vec::new());
    }
    let seg_len: Vec<f64> = points
        .windows(2)
        .map(|w| ((w[1][0] - w[0][0]).powi(2) + (w[1][1] - w[0][1]).powi(2)).sqrt())
        .collect();
    let total: f64 = seg_len.iter().sum();
    if count == 1 {
        return Ok(vec![point_at(points, &seg_len, total / 2.0)]);
    }
    let step = total / (count - 1) as f64;
    Ok((0..count)
        .map(|i| point_at(points, &seg_len, step * i as f64))
        .collect())
}

fn point_at(points: &[Point2], seg_len: &[f64], mut s: f64) -> Point2 {
    for (i, len) in seg_len.iter().enumerate() {
        if s <= *len || i == seg_len.len() - 1 {
            let t = if *len > 0.0 { (s / len).min(1.0) } else { 0.0 };
            let (a, b) = (points[i], points[i + 1]);
            return [a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1])];
        }
        s -= len;
    }
    points[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_line_includes_both_ends() {
        let group = RebarGroup::line("bottom", vec![[0.0, 0.0], [0.3, 0.0]], 4, 0.016, 3);
        let pos = group.positions().unwrap();
        assert_eq!(pos.len(), 4);
        assert_abs_diff_eq!(pos[0][0], 0.0);
        assert_abs_diff_eq!(pos[1][0], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(pos[3][0], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_line_follows_polyline() {
        let group = RebarGroup::line("l", vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]], 3, 0.02, 1);
        let pos = group.positions().unwrap();
        assert_abs_diff_eq!(pos[1][0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pos[1][1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pos[2][1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_circle_positions() {
        let group = RebarGroup::circle("ring", [0.0, 0.0], 0.2, 4, 0.02, 1);
        let pos = group.positions().unwrap();
        assert_eq!(pos.len(), 4);
        assert_abs_diff_eq!(pos[1][0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pos[1][1], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_bar_area() {
        let group = RebarGroup::points("p", vec![[0.0, 0.0]], 0.02, 1);
        assert_abs_diff_eq!(group.bar_area(), std::f64::consts::PI * 1e-4, epsilon = 1e-15);
        let bad = RebarGroup::points("p", vec![[0.0, 0.0]], 0.0, 1);
        assert!(bad.positions().is_err());
    }
}
