//! Rigid alignment utilities (Kabsch / orthogonal Procrustes)

use glam::{DMat3, DVec3};
use thiserror::Error;

/// Minimum number of correspondences that constrain a 3D rotation.
pub const MIN_CORRESPONDENCES: usize = 3;

/// Rotation (R) and translation (t) such that `dst ≈ R * src + t`.
pub type KabschOutput = ([[f64; 3]; 3], [f64; 3]);

/// Error type for Kabsch rigid alignment operations.
#[derive(Debug, Error, PartialEq)]
pub enum KabschError {
    /// Source and destination arrays must have the same length
    #[error("Source and destination arrays must have the same length. Got {src} and {dst}")]
    MismatchedInputLengths {
        /// Number of source points.
        src: usize,
        /// Number of destination points.
        dst: usize,
    },

    /// Not enough correspondences to constrain a rotation
    #[error("Need at least {required} correspondences, got {actual}")]
    InsufficientPoints {
        /// Minimum number of correspondences.
        required: usize,
        /// Number of correspondences given.
        actual: usize,
    },

    /// The decomposition produced non-finite values
    #[error("Rigid transformation contains non-finite values")]
    NonFiniteSolution,
}

/// Result type alias for Kabsch.
pub type KabschResult = Result<KabschOutput, KabschError>;

/// Convert a point from [f64; 3] to DVec3.
#[inline]
fn point_to_dvec3(point: &[f64; 3]) -> DVec3 {
    DVec3::from_array(*point)
}

/// Row-major array of a glam matrix.
#[inline]
pub fn dmat3_to_array(m: &DMat3) -> [[f64; 3]; 3] {
    m.transpose().to_cols_array_2d()
}

/// Glam matrix from a row-major array.
#[inline]
pub fn array_to_dmat3(m: &[[f64; 3]; 3]) -> DMat3 {
    DMat3::from_cols_array_2d(m).transpose()
}

/// Arithmetic mean of a set of points.
///
/// PRECONDITION: `points` is not empty.
pub fn centroid(points: &[[f64; 3]]) -> DVec3 {
    let sum = points
        .iter()
        .fold(DVec3::ZERO, |acc, p| acc + point_to_dvec3(p));
    sum / points.len() as f64
}

/// Least squares rigid transformation between two sets of corresponding points.
///
/// Finds the rotation `R` (det = +1) and translation `t` minimizing
/// `Σ ‖dst_i - (R * src_i + t)‖²`.
///
/// # Arguments
///
/// * `points_in_src` - Points in the source frame.
/// * `points_in_dst` - The same points observed in the destination frame.
///
/// # Returns
///
/// The row-major rotation `dst_r_src` and the translation `dst_t_src`.
///
/// Example:
///
/// ```
/// use scanalign_linalg::rigid::kabsch;
///
/// let src = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
/// let dst = [[1.0, 2.0, 3.0], [2.0, 2.0, 3.0], [1.0, 3.0, 3.0]];
/// let (rotation, translation) = kabsch(&src, &dst)?;
/// assert!((translation[0] - 1.0).abs() < 1e-9);
/// assert!((rotation[0][0] - 1.0).abs() < 1e-9);
/// # Ok::<(), scanalign_linalg::rigid::KabschError>(())
/// ```
pub fn kabsch(points_in_src: &[[f64; 3]], points_in_dst: &[[f64; 3]]) -> KabschResult {
    if points_in_src.len() != points_in_dst.len() {
        return Err(KabschError::MismatchedInputLengths {
            src: points_in_src.len(),
            dst: points_in_dst.len(),
        });
    }

    if points_in_src.len() < MIN_CORRESPONDENCES {
        return Err(KabschError::InsufficientPoints {
            required: MIN_CORRESPONDENCES,
            actual: points_in_src.len(),
        });
    }

    // Identity transformation is a special case
    if points_in_src == points_in_dst {
        return Ok((dmat3_to_array(&DMat3::IDENTITY), [0.0; 3]));
    }

    let src_centroid = centroid(points_in_src);
    let dst_centroid = centroid(points_in_dst);

    // H = Σ (dst - dst_mean) * (src - src_mean)^T
    let mut h = DMat3::ZERO;
    for (p_in_src, p_in_dst) in points_in_src.iter().zip(points_in_dst.iter()) {
        let src_centered = point_to_dvec3(p_in_src) - src_centroid;
        let dst_centered = point_to_dvec3(p_in_dst) - dst_centroid;
        h += DMat3::from_cols(
            dst_centered * src_centered.x,
            dst_centered * src_centered.y,
            dst_centered * src_centered.z,
        );
    }

    let svd_result = crate::svd::svd3(&h);
    let mut u = *svd_result.u();
    let v = *svd_result.v();

    // Handle reflection: R = U * diag(1, 1, -1) * V^T
    if u.determinant() * v.determinant() < 0.0 {
        u.z_axis = -u.z_axis;
    }
    let r = u * v.transpose();

    let t = dst_centroid - r * src_centroid;

    let rotation = dmat3_to_array(&r);
    let translation = t.to_array();

    if !rotation.iter().flatten().chain(translation.iter()).all(|x| x.is_finite()) {
        return Err(KabschError::NonFiniteSolution);
    }

    Ok((rotation, translation))
}
