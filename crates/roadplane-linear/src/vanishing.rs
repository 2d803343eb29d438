//! Vanishing point of the two lane boundaries.

use crate::SolveError;
use roadplane_core::{ImageSize, Line2, Real, RowOrigin, Vec3};

/// Homogeneous scales below this are treated as parallel lines.
const PARALLEL_EPS: Real = 1e-12;

/// Intersection `l1 x l2` of the lane lines as a raster point `(x, y, 1)`.
///
/// For lines expressed with [`RowOrigin::Bottom`] the row is flipped back to
/// raster coordinates.
pub fn vanishing_point(
    left: &Line2,
    right: &Line2,
    size: ImageSize,
    row_origin: RowOrigin,
) -> Result<Vec3, SolveError> {
    if left.is_degenerate() || right.is_degenerate() {
        return Err(SolveError::DegenerateLine);
    }

    let v = left.intersection(right);
    let scale = left.to_vec3().norm() * right.to_vec3().norm();
    if v.z.abs() <= PARALLEL_EPS * scale {
        return Err(SolveError::ParallelLines);
    }

    let mut vp = v / v.z;
    vp.y = row_origin.flip_row(vp.y, size.height as Real);
    Ok(vp)
}
