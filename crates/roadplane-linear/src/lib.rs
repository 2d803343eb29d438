//! Linear recovery of the road-plane homography from two lane boundaries.
//!
//! Given the camera matrix `K`, the image lines of the left and right lane
//! boundaries and a window on each, [`estimate_planar_homography`] samples
//! point pairs straight across the lane, solves for the rotation columns
//! `r1`, `r3` and the translation `T`, and assembles
//!
//! ```text
//! H = K [r1 | r3 | T]
//! ```
//!
//! which maps road points `(X, Z, 1)` to raster pixels. The individual
//! stages are public and can be used on their own.
//!
//! # Example
//!
//! ```no_run
//! use roadplane_core::{ImageSize, Line2, NormWindow};
//! use roadplane_linear::{
//!     estimate_planar_homography, HomographyConfig, NoDiagnostics, RoadPlaneInput,
//! };
//!
//! let input = RoadPlaneInput {
//!     intrinsics: [
//!         [309.4362, 0.0, 317.9034],
//!         [0.0, 344.2161, 256.5352],
//!         [0.0, 0.0, 1.0],
//!     ],
//!     left_line: Line2::new(-1.35431663, 1.0, 124.12336564),
//!     right_line: Line2::new(1.23775052, 1.0, -695.71784631),
//!     left_window: NormWindow::new(0.4, 0.6, 0.2, 0.25),
//!     right_window: NormWindow::new(0.62, 0.6, 0.2, 0.25),
//!     image_size: ImageSize::new(640, 480),
//! };
//! let solution =
//!     estimate_planar_homography(&input, &HomographyConfig::default(), &mut NoDiagnostics)?;
//! println!("H = {}", solution.homography);
//! # Ok::<(), roadplane_linear::SolveError>(())
//! ```

mod diagnostics;
mod error;
mod homography;
pub mod math;
mod pipeline;
mod rotation;
mod sampler;
mod translation;
mod vanishing;

pub use diagnostics::*;
pub use error::*;
pub use homography::*;
pub use math::NullspaceReport;
pub use pipeline::*;
pub use rotation::*;
pub use sampler::*;
pub use translation::*;
pub use vanishing::*;
