//! Road-to-image homography assembly.
//!
//! Given the rotation columns `r1`, `r3` and the translation `T`, the road
//! plane `Y = 0` is imaged by
//!
//! ```text
//! H = K [r1 | r3 | T]
//! ```
//!
//! The translation recovered from lane widths is only known up to scale, so
//! it is rescaled with the mounting height of the camera first.

use crate::{LinearSystem, SolveError};
use log::debug;
use roadplane_core::{from_homogeneous, Mat3, Pt2, Real, Vec3};
use serde::{Deserialize, Serialize};

/// Mounting height of the camera above the road in metres.
pub const DEFAULT_CAMERA_HEIGHT: Real = 2.1798;

const SCALE_EPS: Real = 1e-12;

/// Depths of the probe points on the lane centre line.
const CENTER_DEPTHS: [Real; 8] = [0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 10_000.0];
/// Depths of the probe points on the lane boundaries.
const BOUNDARY_DEPTHS: [Real; 5] = [0.0, 2.0, 4.0, 8.0, 10_000.0];

/// Assembled homography and the translation that went into it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssembledHomography {
    pub h: Mat3,
    /// `T` after the height rescale and the `T[2] = 1` pin.
    pub translation: Vec3,
}

/// Build `H = K [r1 | r3 | T']`.
///
/// `T' = T * camera_height / T[1]`, then `T'[2]` is pinned to 1.
pub fn assemble_homography(
    kmtx: &Mat3,
    r1: &Vec3,
    r3: &Vec3,
    translation: &Vec3,
    camera_height: Real,
) -> Result<AssembledHomography, SolveError> {
    if !camera_height.is_finite() || camera_height <= 0.0 {
        return Err(SolveError::InvalidCameraHeight(camera_height));
    }
    let ty = translation.y;
    if !ty.is_finite() || ty.abs() <= SCALE_EPS * translation.norm().max(1.0) {
        return Err(SolveError::DegenerateSolution(LinearSystem::Homography));
    }

    let mut t = translation * (camera_height / ty);
    debug!("homography: T rescaled to camera height {camera_height}: {t:?}");
    t.z = 1.0;

    let mut m = Mat3::zeros();
    m.set_column(0, r1);
    m.set_column(1, r3);
    m.set_column(2, &t);
    let h = kmtx * m;

    if h.iter().any(|v| !v.is_finite()) {
        return Err(SolveError::DegenerateSolution(LinearSystem::Homography));
    }
    Ok(AssembledHomography { h, translation: t })
}

/// Scale `H` so that `det(H) = 1`.
///
/// The factor is `sign(det H) * |1 / det H|^(1/3)`.
pub fn normalize_determinant(h: &Mat3) -> Result<Mat3, SolveError> {
    let det = h.determinant();
    let scale = h.norm().powi(3);
    if !det.is_finite() || det.abs() <= SCALE_EPS * scale {
        return Err(SolveError::SingularHomography);
    }
    let c = det.signum() * det.abs().recip().cbrt();
    Ok(h * c)
}

/// Raster pixel of the road point `(X, Z)`; `None` for points mapped to infinity.
pub fn project_road_point(h: &Mat3, x: Real, z: Real) -> Option<Pt2> {
    let v = h * Vec3::new(x, z, 1.0);
    if !v.iter().all(|c| c.is_finite()) || v.z.abs() <= SCALE_EPS * v.norm() {
        return None;
    }
    Some(from_homogeneous(&v))
}

/// Road points `(X, Z)` used to visualize a homography.
///
/// Three series: the left boundary `X = -w/2`, the lane centre `X = 0` and
/// the right boundary `X = +w/2`, each running from the road origin to a
/// far depth.
pub fn road_probe_series(lane_width: Real) -> [Vec<Pt2>; 3] {
    let half = 0.5 * lane_width;
    let boundary = |x: Real| -> Vec<Pt2> {
        BOUNDARY_DEPTHS.iter().map(|&z| Pt2::new(x, z)).collect()
    };
    [
        boundary(-half),
        CENTER_DEPTHS.iter().map(|&z| Pt2::new(0.0, z)).collect(),
        boundary(half),
    ]
}
