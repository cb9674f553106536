//! Orientation utilities for frame elements

use crate::error::{BuildError, BuildResult};
use nalgebra::{Rotation3, Vector3};

pub type Vec3 = Vector3<f64>;

/// Compute the `vecxz` orientation vector of a frame element
///
/// Non-vertical members get a local z-axis that points "up": global Z with the
/// member axis projected out. Vertical members align their local y-axis with
/// global Y and take z = x × y.
///
/// # Arguments
/// * `start` - Start node coordinates
/// * `end` - End node coordinates
/// * `tol` - Geometric tolerance for the length and verticality checks
pub fn calculate_aligned_vecxz(start: &Vec3, end: &Vec3, tol: f64) -> BuildResult<Vec3> {
    let axis = end - start;
    let length = axis.norm();
    if length < tol {
        return Err(BuildError::InvalidGeometry(
            "Element length is too small".to_string(),
        ));
    }
    let x = axis / length;

    if (x.z.abs() - 1.0).abs() < tol {
        let mut y = project_off(&Vec3::y(), &x);
        if y.norm() > tol {
            y = y.normalize();
        } else {
            let reference = if x.x.abs() < tol && x.y.abs() < tol {
                Vec3::x()
            } else {
                Vec3::z()
            };
            y = project_off(&reference, &x).normalize();
        }
        Ok(x.cross(&y))
    } else {
        let z = project_off(&Vec3::z(), &x);
        if z.norm() < tol {
            Ok(project_off(&Vec3::y(), &x).normalize())
        } else {
            Ok(z.normalize())
        }
    }
}

/// Orientation (`vecx`, `vecyp`) for a zero-length element acting along `direction`
pub fn zero_length_orientation(direction: &Vec3, tol: f64) -> BuildResult<(Vec3, Vec3)> {
    let length = direction.norm();
    if length < tol {
        return Err(BuildError::InvalidGeometry(
            "Direction vector length is too small".to_string(),
        ));
    }
    let z = calculate_aligned_vecxz(&Vec3::zeros(), direction, tol)?;
    let x = direction / length;
    let y = z.cross(&x).normalize();
    Ok((x, y))
}

/// Rotate a point about a vertical axis through `center`, angle in degrees
pub fn rotate_about_z(point: &Vec3, angle_deg: f64, center: &Vec3) -> Vec3 {
    let rotation = Rotation3::from_axis_angle(&Vec3::z_axis(), angle_deg.to_radians());
    center + rotation * (point - center)
}

fn project_off(v: &Vec3, unit: &Vec3) -> Vec3 {
    v - unit * v.dot(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_horizontal_member_points_up() {
        let v = calculate_aligned_vecxz(&Vec3::zeros(), &Vec3::new(5.0, 0.0, 0.0), 1e-6).unwrap();
        assert_abs_diff_eq!(v, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-12);

        let v = calculate_aligned_vecxz(&Vec3::zeros(), &Vec3::new(0.0, -3.0, 0.0), 1e-6).unwrap();
        assert_abs_diff_eq!(v, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_vertical_member_uses_global_y() {
        let up = calculate_aligned_vecxz(&Vec3::zeros(), &Vec3::new(0.0, 0.0, 3.0), 1e-6).unwrap();
        assert_abs_diff_eq!(up, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);

        let down =
            calculate_aligned_vecxz(&Vec3::new(0.0, 0.0, 3.0), &Vec3::zeros(), 1e-6).unwrap();
        assert_abs_diff_eq!(down, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_inclined_member_is_orthogonal() {
        let start = Vec3::new(0.0, 0.0, 0.0);
        let end = Vec3::new(1.0, 2.0, 3.0);
        let v = calculate_aligned_vecxz(&start, &end, 1e-6).unwrap();
        assert_abs_diff_eq!(v.dot(&(end - start)), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.norm(), 1.0, epsilon = 1e-12);
        assert!(v.z > 0.0);
    }

    #[test]
    fn test_zero_length_is_rejected() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        assert!(calculate_aligned_vecxz(&p, &p, 1e-6).is_err());
        assert!(zero_length_orientation(&Vec3::zeros(), 1e-6).is_err());
    }

    #[test]
    fn test_zero_length_orientation_is_right_handed() {
        let (x, y) = zero_length_orientation(&Vec3::new(2.0, 0.0, 0.0), 1e-6).unwrap();
        assert_abs_diff_eq!(x, Vec3::x(), epsilon = 1e-12);
        assert_abs_diff_eq!(y, Vec3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_about_z() {
        let p = rotate_about_z(&Vec3::new(2.0, 1.0, 5.0), 90.0, &Vec3::new(1.0, 1.0, 0.0));
        assert_abs_diff_eq!(p, Vec3::new(1.0, 2.0, 5.0), epsilon = 1e-12);
    }
}
