use glam::DVec3;
use scanalign_linalg::rigid::array_to_dmat3;

use crate::pointcloud::PointCloud;

/// Error types for the linalg module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LinalgError {
    /// Source and destination buffers differ in length
    #[error("Source and destination must have the same length. Got {0} and {1}")]
    MismatchedLengths(usize, usize),
}

/// Transform a set of points using a rotation and translation.
///
/// # Arguments
///
/// * `src_points` - A set of points to be transformed.
/// * `dst_r_src` - A row-major rotation matrix.
/// * `dst_t_src` - A translation vector.
/// * `dst_points` - A pre-allocated vector to store the transformed points.
///
/// PRECONDITION: dst_points is a pre-allocated vector of the same size as source.
///
/// Example:
///
/// ```
/// use scanalign_3d::linalg::transform_points3d;
///
/// let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
/// let rotation = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let translation = [0.0, 0.0, 0.0];
/// let mut dst_points = vec![[0.0; 3]; src_points.len()];
/// transform_points3d(&src_points, &rotation, &translation, &mut dst_points)?;
/// assert_eq!(dst_points, src_points);
/// # Ok::<(), scanalign_3d::linalg::LinalgError>(())
/// ```
pub fn transform_points3d(
    src_points: &[[f64; 3]],
    dst_r_src: &[[f64; 3]; 3],
    dst_t_src: &[f64; 3],
    dst_points: &mut [[f64; 3]],
) -> Result<(), LinalgError> {
    if src_points.len() != dst_points.len() {
        return Err(LinalgError::MismatchedLengths(
            src_points.len(),
            dst_points.len(),
        ));
    }

    let r = array_to_dmat3(dst_r_src);
    let t = DVec3::from_array(*dst_t_src);

    for (point_dst, point_src) in dst_points.iter_mut().zip(src_points.iter()) {
        *point_dst = (r * DVec3::from_array(*point_src) + t).to_array();
    }

    Ok(())
}

/// Apply a rigid transformation to a point cloud, returning a new cloud.
pub fn transform_pointcloud(
    cloud: &PointCloud,
    dst_r_src: &[[f64; 3]; 3],
    dst_t_src: &[f64; 3],
) -> PointCloud {
    let r = array_to_dmat3(dst_r_src);
    let t = DVec3::from_array(*dst_t_src);
    cloud
        .points()
        .iter()
        .map(|p| (r * DVec3::from_array(*p) + t).to_array())
        .collect::<Vec<_>>()
        .into()
}

/// Dot product of two 3D vectors.
#[inline]
pub fn dot_product3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product of two 3D vectors.
#[inline]
pub fn cross_product3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Squared Euclidean distance between two points.
#[inline]
pub fn squared_distance3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    dot_product3(&d, &d)
}

/// Euclidean distance between two points.
///
/// Example:
/// ```
/// use scanalign_3d::linalg::distance3;
///
/// let a = [1.0, 2.0, 3.0];
/// let b = [1.0, 2.0, 5.0];
/// assert_eq!(distance3(&a, &b), 2.0);
/// ```
#[inline]
pub fn distance3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    squared_distance3(a, b).sqrt()
}

/// Multiply two 3x3 row-major matrices, `m = a * b`.
pub fn matmul33(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3], m: &mut [[f64; 3]; 3]) {
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
}

/// Transpose of a 3x3 matrix.
pub fn transpose33(a: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    [
        [a[0][0], a[1][0], a[2][0]],
        [a[0][1], a[1][1], a[2][1]],
        [a[0][2], a[1][2], a[2][2]],
    ]
}

/// Determinant of a 3x3 matrix.
pub fn determinant33(a: &[[f64; 3]; 3]) -> f64 {
    dot_product3(&a[0], &cross_product3(&a[1], &a[2]))
}
