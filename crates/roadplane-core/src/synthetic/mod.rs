//! Deterministic synthetic data generation helpers.
//!
//! The helpers build a road camera with a known pose, image the two lane
//! boundaries and expose ground-truth rotation columns, translation and
//! homography for tests and examples.
//!
//! # Example
//!
//! ```
//! use roadplane_core::{synthetic::road, ImageSize, RowOrigin};
//!
//! let camera = road::dashboard_camera();
//! let scene = road::lane_scene(&camera, 3.66, ImageSize::new(640, 480), RowOrigin::Top).unwrap();
//! assert!(scene.left_line.x_at(400.0).is_some());
//! ```

pub mod road;
