use scanalign_3d::linalg::LinalgError;

/// Errors reported for misuse of the alignment entry points.
///
/// Numerical trouble inside the consensus loop is never reported here: failed
/// trials are discarded and an unsuccessful search is described by
/// [`crate::AlignmentStatus`].
#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum RansacError {
    /// The clouds must correspond index by index
    #[error("Point clouds must have the same length. Got {a} and {b}")]
    MismatchedInputLengths {
        /// Number of points in cloud A.
        a: usize,
        /// Number of points in cloud B.
        b: usize,
    },

    /// The inlier threshold must be finite and positive
    #[error("Inlier threshold must be finite and positive. Got {0}")]
    InvalidThreshold(f64),

    /// The early stop ratio must be finite and positive
    #[error("Early stop ratio must be finite and positive. Got {0}")]
    InvalidEarlyStopRatio(f64),

    /// At least one shard is needed
    #[error("Number of shards must be at least one")]
    InvalidShardCount,

    /// Transforming the cloud failed
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}
