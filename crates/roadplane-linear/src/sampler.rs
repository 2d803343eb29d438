//! Point-pair sampling along the two lane boundaries.

use crate::SolveError;
use roadplane_core::{ImageSize, Line2, NormWindow, PointPair, Pt2, Real, RowOrigin};

/// Default number of sampled rows.
pub const DEFAULT_SAMPLES: usize = 10;

/// Sample `samples` corresponding pairs at evenly spaced rows of `window`.
///
/// The vertical extent comes from `window` (the left window; both windows are
/// assumed to share their height). Row `i` is
/// `round(y_c - floor(h_w / 2) + (i / N) h_w)` with the window centre `y_c`
/// and height `h_w` rounded to whole pixels. Each line is evaluated at that
/// row, converted to the line's own row convention first. Output pairs keep
/// the row order and are raster pixel coordinates.
pub fn sample_point_pairs(
    left: &Line2,
    right: &Line2,
    window: &NormWindow,
    size: ImageSize,
    samples: usize,
    row_origin: RowOrigin,
) -> Result<Vec<PointPair>, SolveError> {
    if samples == 0 {
        return Err(SolveError::NotEnoughPairs {
            required: 1,
            got: 0,
        });
    }
    if left.is_degenerate() || right.is_degenerate() {
        return Err(SolveError::DegenerateLine);
    }

    let height = size.height as Real;
    let y_center = window.center_row(size);
    let h_win = window.height_px(size);
    let top = (y_center - h_win.div_euclid(2)) as Real;

    let mut pairs = Vec::with_capacity(samples);
    for i in 0..samples {
        let frac = i as Real / samples as Real;
        let row = (top + frac * h_win as Real).round();
        let line_row = row_origin.flip_row(row, height);

        let x_left = left.x_at(line_row).ok_or(SolveError::HorizontalLine)?;
        let x_right = right.x_at(line_row).ok_or(SolveError::HorizontalLine)?;
        pairs.push(PointPair::new(Pt2::new(x_left, row), Pt2::new(x_right, row)));
    }
    Ok(pairs)
}
