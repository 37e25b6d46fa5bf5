#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Scanalign RANSAC
//!
//! Estimates the rigid transformation `A ≈ R * B + t` between two point clouds
//! whose points correspond index by index, tolerating a fraction of wrong
//! correspondences.
//!
//! ## Example
//!
//! ```rust
//! use scanalign_ransac::{align_with_params, AlignmentStatus, RansacParams};
//!
//! let cloud_a = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 1.0]];
//! // cloud B is cloud A shifted along x
//! let cloud_b = cloud_a
//!     .iter()
//!     .map(|p| [p[0] + 2.0, p[1], p[2]])
//!     .collect::<Vec<_>>();
//!
//! let params = RansacParams {
//!     inlier_threshold: 0.01,
//!     random_seed: Some(0),
//!     ..Default::default()
//! };
//! let result = align_with_params(&cloud_a, &cloud_b, &params)?;
//!
//! assert_eq!(result.status, AlignmentStatus::Converged);
//! assert_eq!(result.num_inliers, 4);
//! assert!((result.translation[0] + 2.0).abs() < 1e-9);
//! # Ok::<(), scanalign_ransac::RansacError>(())
//! ```

mod error;
pub use error::RansacError;

/// Sampling and scoring primitives of the consensus loop.
pub mod ops;

mod parallel;
pub use parallel::align_parallel;

mod ransac;
pub use ransac::{
    align, align_with_params, align_with_rng, AlignmentStatus, RansacParams, RansacResult,
};
