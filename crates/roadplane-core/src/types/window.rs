//! Image sizes and normalized search windows.

use crate::Real;
use serde::{Deserialize, Serialize};

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

impl ImageSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

/// Window given as fractions of the image dimensions.
///
/// `(x, y)` is the window centre and `(w, h)` its extent. Serialized as the
/// plain array `[x, y, w, h]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[Real; 4]", into = "[Real; 4]")]
pub struct NormWindow {
    pub x: Real,
    pub y: Real,
    pub w: Real,
    pub h: Real,
}

/// Integer pixel rectangle (top-left corner plus extent).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl NormWindow {
    pub fn new(x: Real, y: Real, w: Real, h: Real) -> Self {
        Self { x, y, w, h }
    }

    /// Window centre row in pixels, rounded half away from zero.
    pub fn center_row(&self, size: ImageSize) -> i64 {
        (size.height as Real * self.y).round() as i64
    }

    /// Window centre column in pixels, rounded half away from zero.
    pub fn center_col(&self, size: ImageSize) -> i64 {
        (size.width as Real * self.x).round() as i64
    }

    /// Window height in pixels, rounded half away from zero.
    pub fn height_px(&self, size: ImageSize) -> i64 {
        (size.height as Real * self.h).round() as i64
    }

    /// Window width in pixels, rounded half away from zero.
    pub fn width_px(&self, size: ImageSize) -> i64 {
        (size.width as Real * self.w).round() as i64
    }

    /// Pixel rectangle covered by the window.
    pub fn pixel_rect(&self, size: ImageSize) -> PixelRect {
        let width = self.width_px(size);
        let height = self.height_px(size);
        PixelRect {
            x: self.center_col(size) - width / 2,
            y: self.center_row(size) - height / 2,
            width,
            height,
        }
    }
}

impl From<[Real; 4]> for NormWindow {
    fn from(v: [Real; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<NormWindow> for [Real; 4] {
    fn from(w: NormWindow) -> Self {
        [w.x, w.y, w.w, w.h]
    }
}
