//! Single-channel filters shared by the reference sampler and mask builders.

pub mod blur;
pub mod guided;
pub mod median;
pub mod sobel;

pub use blur::{box_mean, gaussian_blur, gaussian_blur_lab, gaussian_kernel};
pub use guided::{DEFAULT_EPS, guided_filter};
pub use median::median3x3;
pub use sobel::{mean_interior, sobel_magnitude};
