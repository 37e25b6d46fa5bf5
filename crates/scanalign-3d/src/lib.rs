#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// I/O utilities for reading and writing 3D data.
pub mod io;

/// Linear algebra utilities.
pub mod linalg;

/// Point cloud container.
pub mod pointcloud;

/// 3D transforms algorithms.
pub mod transforms;
