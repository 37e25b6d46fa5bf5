use glam::{DMat3, DVec3};
use scanalign_linalg::rigid::dmat3_to_array;

use crate::linalg::{dot_product3, transpose33};

/// Compute the rotation matrix from an axis and angle.
///
/// # Arguments
///
/// * `axis` - The axis of rotation.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The row-major rotation matrix.
///
/// Example:
///
/// ```
/// use scanalign_3d::transforms::axis_angle_to_rotation_matrix;
///
/// let axis = [0.0, 0.0, 2.0];
/// let angle = std::f64::consts::PI / 2.0;
/// let rotation = axis_angle_to_rotation_matrix(&axis, angle).unwrap();
/// assert!((rotation[0][1] + 1.0).abs() < 1e-12);
/// assert!((rotation[1][0] - 1.0).abs() < 1e-12);
/// ```
pub fn axis_angle_to_rotation_matrix(
    axis: &[f64; 3],
    angle: f64,
) -> Result<[[f64; 3]; 3], &'static str> {
    let axis = DVec3::from_array(*axis)
        .try_normalize()
        .ok_or("cannot compute rotation matrix from a zero vector")?;
    Ok(dmat3_to_array(&DMat3::from_axis_angle(axis, angle)))
}

/// Invert a rigid transformation: `(R, t) -> (R^T, -R^T * t)`.
pub fn invert_rigid(
    dst_r_src: &[[f64; 3]; 3],
    dst_t_src: &[f64; 3],
) -> ([[f64; 3]; 3], [f64; 3]) {
    let src_r_dst = transpose33(dst_r_src);
    let src_t_dst = [
        -dot_product3(&src_r_dst[0], dst_t_src),
        -dot_product3(&src_r_dst[1], dst_t_src),
        -dot_product3(&src_r_dst[2], dst_t_src),
    ];
    (src_r_dst, src_t_dst)
}
