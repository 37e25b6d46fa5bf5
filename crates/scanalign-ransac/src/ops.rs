use rand::Rng;
use scanalign_3d::linalg::{cross_product3, dot_product3, squared_distance3};

/// Number of correspondences in a minimal sample.
pub const SAMPLE_SIZE: usize = 3;

/// Samples whose triangle is smaller than this are collinear.
pub const DEGENERATE_AREA_EPSILON: f64 = 1e-10;

/// Draw `SAMPLE_SIZE` distinct indices uniformly from `0..num_points`.
///
/// PRECONDITION: `num_points >= SAMPLE_SIZE`.
pub fn sample_indices<R: Rng + ?Sized>(rng: &mut R, num_points: usize) -> [usize; SAMPLE_SIZE] {
    let indices = rand::seq::index::sample(rng, num_points, SAMPLE_SIZE);
    [indices.index(0), indices.index(1), indices.index(2)]
}

/// Pick the points at `indices`.
#[inline]
pub fn gather(points: &[[f64; 3]], indices: &[usize; SAMPLE_SIZE]) -> [[f64; 3]; SAMPLE_SIZE] {
    [points[indices[0]], points[indices[1]], points[indices[2]]]
}

/// Check whether the three points of a sample are (nearly) collinear.
///
/// The magnitude of `(p1 - p0) x (p2 - p0)` is compared against
/// [`DEGENERATE_AREA_EPSILON`].
pub fn is_degenerate_sample(sample: &[[f64; 3]; SAMPLE_SIZE]) -> bool {
    let v1 = [
        sample[1][0] - sample[0][0],
        sample[1][1] - sample[0][1],
        sample[1][2] - sample[0][2],
    ];
    let v2 = [
        sample[2][0] - sample[0][0],
        sample[2][1] - sample[0][1],
        sample[2][2] - sample[0][2],
    ];
    let normal = cross_product3(&v1, &v2);
    dot_product3(&normal, &normal).sqrt() < DEGENERATE_AREA_EPSILON
}

/// Count the indices whose points lie closer than `threshold`.
///
/// PRECONDITION: both slices have the same length.
pub fn count_inliers(reference: &[[f64; 3]], transformed: &[[f64; 3]], threshold: f64) -> usize {
    let threshold_sq = threshold * threshold;
    reference
        .iter()
        .zip(transformed.iter())
        .filter(|(a, b)| squared_distance3(a, b) < threshold_sq)
        .count()
}

/// Indices whose points lie closer than `threshold`, with their squared residuals.
pub fn inlier_indices(
    reference: &[[f64; 3]],
    transformed: &[[f64; 3]],
    threshold: f64,
) -> (Vec<usize>, Vec<f64>) {
    let threshold_sq = threshold * threshold;
    reference
        .iter()
        .zip(transformed.iter())
        .enumerate()
        .map(|(i, (a, b))| (i, squared_distance3(a, b)))
        .filter(|(_, d)| *d < threshold_sq)
        .unzip()
}

/// Minimum inlier count that ends the search early, `ceil(ratio * num_points)`.
#[inline]
pub fn early_stop_count(num_points: usize, ratio: f64) -> usize {
    (ratio * num_points as f64).ceil() as usize
}
