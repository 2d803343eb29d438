//! Camera models.
//!
//! Only the pinhole intrinsics are needed: the road-plane solvers consume `K`
//! directly and never model distortion.

mod intrinsics;

pub use intrinsics::*;
