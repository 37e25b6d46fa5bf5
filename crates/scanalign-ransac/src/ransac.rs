//! RANSAC consensus search around the Kabsch solver.

use rand::{rngs::StdRng, Rng, SeedableRng};
use scanalign_3d::linalg::transform_points3d;
use scanalign_linalg::rigid::kabsch;
use serde::{Deserialize, Serialize};

use crate::error::RansacError;
use crate::ops::{
    count_inliers, early_stop_count, gather, inlier_indices, is_degenerate_sample,
    sample_indices, SAMPLE_SIZE,
};

const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Parameters for RANSAC alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Maximum number of RANSAC iterations.
    pub max_iterations: usize,
    /// Distance below which a transformed point of B agrees with its point in A.
    pub inlier_threshold: f64,
    /// Stop once `ceil(early_stop_ratio * N)` inliers are found. Values above
    /// one disable the early stop.
    pub early_stop_ratio: f64,
    /// Optional fixed seed for reproducible sampling.
    pub random_seed: Option<u64>,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            inlier_threshold: 0.5,
            early_stop_ratio: 0.8,
            random_seed: None,
        }
    }
}

/// Outcome of a consensus search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentStatus {
    /// The early stop inlier count was reached.
    Converged,
    /// The iteration budget ran out; the best transform has at least one inlier.
    BudgetExhausted,
    /// No trial produced a single inlier; the transform is the identity.
    NoConsensus,
    /// A cloud has fewer than three points; the transform is the identity.
    InsufficientPoints,
}

/// RANSAC result for rigid alignment.
///
/// The transformation maps cloud B onto cloud A: `A ≈ rotation * B + translation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RansacResult {
    /// Estimated row-major rotation matrix.
    pub rotation: [[f64; 3]; 3],
    /// Estimated translation vector.
    pub translation: [f64; 3],
    /// Number of inliers of the returned transformation.
    pub num_inliers: usize,
    /// Indices of the inlier correspondences.
    pub inliers: Vec<usize>,
    /// Root mean square distance over the inliers, zero without inliers.
    pub rmse: f64,
    /// Number of trials drawn.
    pub num_iterations: usize,
    /// Trials discarded because the sample of A was collinear.
    pub num_degenerate_samples: usize,
    /// Trials discarded because the solver returned no valid transformation.
    pub num_invalid_solutions: usize,
    /// How the search ended.
    pub status: AlignmentStatus,
}

impl RansacResult {
    pub(crate) fn identity(status: AlignmentStatus) -> Self {
        Self {
            rotation: IDENTITY,
            translation: [0.0; 3],
            num_inliers: 0,
            inliers: Vec::new(),
            rmse: 0.0,
            num_iterations: 0,
            num_degenerate_samples: 0,
            num_invalid_solutions: 0,
            status,
        }
    }

    /// Whether a transformation supported by at least one inlier was found.
    pub fn is_aligned(&self) -> bool {
        matches!(
            self.status,
            AlignmentStatus::Converged | AlignmentStatus::BudgetExhausted
        )
    }

    /// Apply the estimated transformation to a set of points.
    pub fn transform_points(&self, points: &[[f64; 3]]) -> Result<Vec<[f64; 3]>, RansacError> {
        let mut transformed = vec![[0.0; 3]; points.len()];
        transform_points3d(points, &self.rotation, &self.translation, &mut transformed)?;
        Ok(transformed)
    }
}

/// Best model found by a run of trials.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BestModel {
    pub rotation: [[f64; 3]; 3],
    pub translation: [f64; 3],
    pub num_inliers: usize,
}

/// Book keeping of a run of trials.
#[derive(Debug, Clone, Default)]
pub(crate) struct TrialSearch {
    pub best: Option<BestModel>,
    pub num_iterations: usize,
    pub num_degenerate_samples: usize,
    pub num_invalid_solutions: usize,
}

/// Validate the arguments shared by every entry point.
///
/// Returns `false` when a cloud is too small to sample from.
pub(crate) fn validate_inputs(
    points_a: &[[f64; 3]],
    points_b: &[[f64; 3]],
    params: &RansacParams,
) -> Result<bool, RansacError> {
    if !params.inlier_threshold.is_finite() || params.inlier_threshold <= 0.0 {
        return Err(RansacError::InvalidThreshold(params.inlier_threshold));
    }
    if !params.early_stop_ratio.is_finite() || params.early_stop_ratio <= 0.0 {
        return Err(RansacError::InvalidEarlyStopRatio(params.early_stop_ratio));
    }

    if points_a.len() < SAMPLE_SIZE || points_b.len() < SAMPLE_SIZE {
        log::warn!(
            "Point clouds must have at least {} points for RANSAC. Got {} and {}",
            SAMPLE_SIZE,
            points_a.len(),
            points_b.len()
        );
        return Ok(false);
    }

    if points_a.len() != points_b.len() {
        return Err(RansacError::MismatchedInputLengths {
            a: points_a.len(),
            b: points_b.len(),
        });
    }

    Ok(true)
}

/// Run `budget` trials, sampling the same indices from both clouds.
///
/// PRECONDITION: inputs passed [`validate_inputs`].
pub(crate) fn run_trials<R: Rng + ?Sized>(
    points_a: &[[f64; 3]],
    points_b: &[[f64; 3]],
    params: &RansacParams,
    budget: usize,
    rng: &mut R,
) -> Result<TrialSearch, RansacError> {
    let num_points = points_a.len();
    let stop_count = early_stop_count(num_points, params.early_stop_ratio);

    let mut search = TrialSearch::default();
    let mut transformed_b = vec![[0.0; 3]; num_points];

    for iter in 0..budget {
        search.num_iterations += 1;

        let indices = sample_indices(rng, num_points);
        let sample_a = gather(points_a, &indices);
        if is_degenerate_sample(&sample_a) {
            search.num_degenerate_samples += 1;
            log::trace!("Iteration {}: degenerate sample {:?}", iter, indices);
            continue;
        }
        let sample_b = gather(points_b, &indices);

        let (rotation, translation) = match kabsch(&sample_b, &sample_a) {
            Ok(model) => model,
            Err(e) => {
                search.num_invalid_solutions += 1;
                log::trace!("Iteration {}: {}", iter, e);
                continue;
            }
        };

        transform_points3d(points_b, &rotation, &translation, &mut transformed_b)?;
        let num_inliers = count_inliers(points_a, &transformed_b, params.inlier_threshold);

        let best_inliers = search.best.map_or(0, |b| b.num_inliers);
        if num_inliers > best_inliers {
            log::debug!("Iteration {}: {} inliers", iter, num_inliers);
            search.best = Some(BestModel {
                rotation,
                translation,
                num_inliers,
            });
            if num_inliers >= stop_count {
                break;
            }
        }
    }

    Ok(search)
}

/// Turn the best trial into the public result.
pub(crate) fn finalize(
    points_a: &[[f64; 3]],
    points_b: &[[f64; 3]],
    params: &RansacParams,
    search: TrialSearch,
) -> Result<RansacResult, RansacError> {
    let mut result = match search.best {
        None => RansacResult::identity(AlignmentStatus::NoConsensus),
        Some(best) => {
            let mut transformed_b = vec![[0.0; 3]; points_b.len()];
            transform_points3d(points_b, &best.rotation, &best.translation, &mut transformed_b)?;
            let (inliers, residuals) =
                inlier_indices(points_a, &transformed_b, params.inlier_threshold);
            let rmse = if residuals.is_empty() {
                0.0
            } else {
                (residuals.iter().sum::<f64>() / residuals.len() as f64).sqrt()
            };

            let stop_count = early_stop_count(points_a.len(), params.early_stop_ratio);
            let status = if best.num_inliers >= stop_count {
                AlignmentStatus::Converged
            } else {
                AlignmentStatus::BudgetExhausted
            };

            RansacResult {
                rotation: best.rotation,
                translation: best.translation,
                num_inliers: inliers.len(),
                inliers,
                rmse,
                status,
                ..RansacResult::identity(status)
            }
        }
    };

    result.num_iterations = search.num_iterations;
    result.num_degenerate_samples = search.num_degenerate_samples;
    result.num_invalid_solutions = search.num_invalid_solutions;

    log::debug!(
        "RANSAC finished after {} iterations with {} inliers ({:?})",
        result.num_iterations,
        result.num_inliers,
        result.status
    );

    Ok(result)
}

/// RANSAC rigid alignment with a caller owned random number generator.
///
/// # Arguments
///
/// * `points_a` - The reference cloud A.
/// * `points_b` - The cloud B to bring into the frame of A, index aligned with A.
/// * `params` - RANSAC parameters; `random_seed` is ignored in favor of `rng`.
/// * `rng` - Source of the random samples.
///
/// # Returns
///
/// The best transformation found. Clouds with fewer than three points or
/// searches without any inlier yield the identity with the matching
/// [`AlignmentStatus`].
pub fn align_with_rng<R: Rng + ?Sized>(
    points_a: &[[f64; 3]],
    points_b: &[[f64; 3]],
    params: &RansacParams,
    rng: &mut R,
) -> Result<RansacResult, RansacError> {
    if !validate_inputs(points_a, points_b, params)? {
        return Ok(RansacResult::identity(AlignmentStatus::InsufficientPoints));
    }

    let search = run_trials(points_a, points_b, params, params.max_iterations, rng)?;
    finalize(points_a, points_b, params, search)
}

/// RANSAC rigid alignment, seeded from `params.random_seed` when set.
pub fn align_with_params(
    points_a: &[[f64; 3]],
    points_b: &[[f64; 3]],
    params: &RansacParams,
) -> Result<RansacResult, RansacError> {
    let mut rng = match params.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    align_with_rng(points_a, points_b, params, &mut rng)
}

/// Align cloud B onto cloud A.
///
/// Uses the default iteration budget and an entropy seeded generator.
///
/// # Arguments
///
/// * `points_a` - The reference cloud A.
/// * `points_b` - The cloud B, index aligned with A.
/// * `threshold` - Inlier distance threshold.
/// * `early_stop_ratio` - Fraction of inliers that ends the search early.
pub fn align(
    points_a: &[[f64; 3]],
    points_b: &[[f64; 3]],
    threshold: f64,
    early_stop_ratio: f64,
) -> Result<RansacResult, RansacError> {
    let params = RansacParams {
        inlier_threshold: threshold,
        early_stop_ratio,
        ..Default::default()
    };
    align_with_params(points_a, points_b, &params)
}
