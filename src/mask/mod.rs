//! Masks consumed by the compositor as multiplicative factors.

pub mod curve;
pub mod structure;
pub mod user;

pub use curve::MaskCurve;
pub use structure::{StructureMask, StructureTerm, build_structure_mask};
pub use user::{LabMask, UserMaskCurves, build_user_mask};
