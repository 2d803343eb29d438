//! Core math and geometry primitives for `roadplane`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Pt2`, `Mat3`, ...),
//! - the pinhole intrinsics accessor ([`Intrinsics`]),
//! - lane primitives: image lines, normalized windows and point pairs,
//! - deterministic synthetic road scenes for tests ([`synthetic`]).
//!
//! Road frame used throughout the workspace:
//! the origin lies on the road plane (`Y = 0`) halfway between the two lane
//! boundaries, `X` is lateral, `Y` points up and `Z` runs along the road.
//! A road point `(X, Z)` is imaged by `x ~ H (X, Z, 1)^T`.

/// Linear algebra type aliases and helpers.
pub mod math;
/// Camera intrinsics.
pub mod models;
/// Deterministic synthetic road scenes.
pub mod synthetic;
/// Lane primitives: lines, windows, point pairs.
pub mod types;

pub use math::*;
pub use models::*;
pub use types::*;
