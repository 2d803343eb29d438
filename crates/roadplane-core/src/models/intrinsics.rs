use crate::{Mat3, Pt2, Real, Vec3};
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics `(fx, fy, cx, cy)` read from an upper-triangular `K`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    /// Focal length in pixels along X.
    pub fx: Real,
    /// Focal length in pixels along Y.
    pub fy: Real,
    /// Principal point X coordinate in pixels.
    pub cx: Real,
    /// Principal point Y coordinate in pixels.
    pub cy: Real,
}

impl Intrinsics {
    /// Extract `(fx, fy, cx, cy)` from a 3x3 camera matrix.
    ///
    /// Skew and the bottom row are ignored; no validation is performed.
    pub fn from_k_matrix(kmtx: &Mat3) -> Self {
        Self {
            fx: kmtx[(0, 0)],
            fy: kmtx[(1, 1)],
            cx: kmtx[(0, 2)],
            cy: kmtx[(1, 2)],
        }
    }

    /// Return the 3x3 camera intrinsics matrix K (zero skew).
    pub fn k_matrix(&self) -> Mat3 {
        Mat3::new(
            self.fx, 0.0, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0,
        )
    }

    /// Both focal lengths are finite and strictly positive.
    pub fn has_positive_focal_lengths(&self) -> bool {
        self.fx.is_finite() && self.fy.is_finite() && self.fx > 0.0 && self.fy > 0.0
    }

    /// All four parameters are finite.
    pub fn is_finite(&self) -> bool {
        [self.fx, self.fy, self.cx, self.cy]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Back-project a pixel onto the normalized image plane `z = 1`.
    pub fn pixel_to_ray(&self, pixel: &Pt2) -> Vec3 {
        Vec3::new(
            (pixel.x - self.cx) / self.fx,
            (pixel.y - self.cy) / self.fy,
            1.0,
        )
    }

    /// Project a camera-frame point; `None` when it lies on the camera plane.
    pub fn project(&self, p_cam: &Vec3) -> Option<Pt2> {
        if p_cam.z.abs() <= Real::EPSILON {
            return None;
        }
        Some(Pt2::new(
            self.fx * p_cam.x / p_cam.z + self.cx,
            self.fy * p_cam.y / p_cam.z + self.cy,
        ))
    }
}
