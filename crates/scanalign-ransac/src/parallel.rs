use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

use crate::error::RansacError;
use crate::ransac::{finalize, run_trials, validate_inputs, TrialSearch};
use crate::{AlignmentStatus, RansacParams, RansacResult};

/// Split `max_iterations` into `num_shards` contiguous budgets.
///
/// The remainder goes to the first shards.
fn shard_budgets(max_iterations: usize, num_shards: usize) -> Vec<usize> {
    let base = max_iterations / num_shards;
    let remainder = max_iterations % num_shards;
    (0..num_shards)
        .map(|shard| base + usize::from(shard < remainder))
        .collect()
}

/// Merge the searches of all shards in shard order.
///
/// The highest inlier count wins and ties go to the lowest shard.
fn merge_searches(searches: Vec<TrialSearch>) -> TrialSearch {
    searches
        .into_iter()
        .fold(TrialSearch::default(), |mut merged, search| {
            merged.num_iterations += search.num_iterations;
            merged.num_degenerate_samples += search.num_degenerate_samples;
            merged.num_invalid_solutions += search.num_invalid_solutions;

            let merged_inliers = merged.best.map_or(0, |b| b.num_inliers);
            if let Some(best) = search.best {
                if best.num_inliers > merged_inliers {
                    merged.best = Some(best);
                }
            }
            merged
        })
}

/// RANSAC rigid alignment with the iteration budget sharded over rayon workers.
///
/// Shard `k` samples from its own generator seeded with `seed + k`, where the
/// seed is `params.random_seed` or drawn once from the OS. Shards stop early
/// on their own consensus and do not share state, so a fixed seed gives the
/// same result regardless of scheduling.
///
/// # Arguments
///
/// * `points_a` - The reference cloud A.
/// * `points_b` - The cloud B, index aligned with A.
/// * `params` - RANSAC parameters; `max_iterations` is the total budget.
/// * `num_shards` - Number of independent shards.
pub fn align_parallel(
    points_a: &[[f64; 3]],
    points_b: &[[f64; 3]],
    params: &RansacParams,
    num_shards: usize,
) -> Result<RansacResult, RansacError> {
    if num_shards == 0 {
        return Err(RansacError::InvalidShardCount);
    }
    if !validate_inputs(points_a, points_b, params)? {
        return Ok(RansacResult::identity(AlignmentStatus::InsufficientPoints));
    }

    let seed = params.random_seed.unwrap_or_else(rand::random);
    log::debug!(
        "Running {} iterations over {} shards with seed {}",
        params.max_iterations,
        num_shards,
        seed
    );

    let searches = shard_budgets(params.max_iterations, num_shards)
        .into_par_iter()
        .enumerate()
        .map(|(shard, budget)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(shard as u64));
            run_trials(points_a, points_b, params, budget, &mut rng)
        })
        .collect::<Result<Vec<_>, _>>()?;

    finalize(points_a, points_b, params, merge_searches(searches))
}
