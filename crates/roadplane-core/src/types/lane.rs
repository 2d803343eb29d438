//! Image lines and lane-boundary point pairs.

use crate::{to_homogeneous, Pt2, Real, Vec3};
use serde::{Deserialize, Serialize};

const LINE_EPS: Real = 1e-12;

/// Image line `a x + b y + c = 0`.
///
/// Serialized as the plain array `[a, b, c]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[Real; 3]", into = "[Real; 3]")]
pub struct Line2 {
    pub a: Real,
    pub b: Real,
    pub c: Real,
}

impl Line2 {
    pub fn new(a: Real, b: Real, c: Real) -> Self {
        Self { a, b, c }
    }

    /// Line through two points (cross product of their homogeneous forms).
    pub fn through(p: &Pt2, q: &Pt2) -> Self {
        Self::from(to_homogeneous(p).cross(&to_homogeneous(q)))
    }

    pub fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.a, self.b, self.c)
    }

    /// `a` and `b` both vanish: the vector does not describe a line.
    pub fn is_degenerate(&self) -> bool {
        self.a.abs() <= LINE_EPS && self.b.abs() <= LINE_EPS
    }

    /// X coordinate of the line at row `y`.
    ///
    /// Returns `None` for (near-)horizontal lines, which have no unique
    /// crossing with a row.
    pub fn x_at(&self, y: Real) -> Option<Real> {
        if self.a.abs() <= LINE_EPS {
            return None;
        }
        Some(-(self.b * y + self.c) / self.a)
    }

    /// Homogeneous intersection with another line (`l1 x l2`).
    pub fn intersection(&self, other: &Line2) -> Vec3 {
        self.to_vec3().cross(&other.to_vec3())
    }
}

impl From<[Real; 3]> for Line2 {
    fn from(v: [Real; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Line2> for [Real; 3] {
    fn from(l: Line2) -> Self {
        [l.a, l.b, l.c]
    }
}

impl From<Vec3> for Line2 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Where the row axis of the line coordinates starts.
///
/// Sampled points and vanishing points are always reported in raster
/// coordinates (row 0 at the top). Lane detectors working in a Cartesian
/// frame express their lines with row 0 at the bottom of the image instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrigin {
    /// Rows grow downwards from the top edge.
    Top,
    /// Rows grow upwards from the bottom edge.
    #[default]
    Bottom,
}

impl RowOrigin {
    /// Map a row between raster and line coordinates.
    ///
    /// The mapping is an involution, so the same call converts both ways.
    pub fn flip_row(self, row: Real, image_height: Real) -> Real {
        match self {
            RowOrigin::Top => row,
            RowOrigin::Bottom => image_height - row,
        }
    }
}

/// Two pixels on the left and right lane boundaries at the same image row.
///
/// Both points are raster pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointPair {
    pub left: Pt2,
    pub right: Pt2,
}

impl PointPair {
    pub fn new(left: Pt2, right: Pt2) -> Self {
        Self { left, right }
    }

    /// Horizontal pixel distance between the boundaries.
    pub fn pixel_width(&self) -> Real {
        self.right.x - self.left.x
    }

    /// Both points have finite coordinates.
    pub fn is_finite(&self) -> bool {
        [self.left.x, self.left.y, self.right.x, self.right.y]
            .iter()
            .all(|v| v.is_finite())
    }
}
