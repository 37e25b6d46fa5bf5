use scanalign_linalg::rigid::centroid;
use serde::{Deserialize, Serialize};

/// An ordered set of 3D points.
///
/// The order matters: two clouds taken from the same scene are expected to
/// describe the same feature at the same index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
}

impl PointCloud {
    /// Create a new point cloud from points.
    pub fn new(points: Vec<[f64; 3]>) -> Self {
        Self { points }
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Arithmetic mean of the points, `None` for an empty cloud.
    pub fn centroid(&self) -> Option<[f64; 3]> {
        if self.points.is_empty() {
            return None;
        }
        Some(centroid(&self.points).to_array())
    }
}

impl From<Vec<[f64; 3]>> for PointCloud {
    fn from(points: Vec<[f64; 3]>) -> Self {
        Self::new(points)
    }
}
