#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use scanalign_linalg as linalg;

#[doc(inline)]
pub use scanalign_3d as k3d;

#[doc(inline)]
pub use scanalign_ransac as ransac;
