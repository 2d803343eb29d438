//! Optional side channel for intermediate results.
//!
//! The pipeline reports what it sampled and what it assembled to a
//! [`DiagnosticSink`]. Sinks only observe; nothing they do feeds back into
//! the estimate. The command line tool renders these callbacks as image
//! overlays.

use roadplane_core::{ImageSize, Mat3, PixelRect, PointPair, Pt2, Real};

/// Everything known once the lane lines have been sampled.
#[derive(Debug, Clone, Copy)]
pub struct SampleDiagnostics<'a> {
    pub pairs: &'a [PointPair],
    /// Raster vanishing point of the lane lines.
    pub vanishing_point: Pt2,
    pub left_window: PixelRect,
    pub right_window: PixelRect,
    pub size: ImageSize,
}

/// Receiver of intermediate pipeline results. All callbacks default to no-ops.
pub trait DiagnosticSink {
    /// Called after point pairs and the vanishing point are available.
    fn sampled_pairs(&mut self, _samples: &SampleDiagnostics<'_>) {}

    /// Called with the final (possibly determinant-normalized) homography.
    fn homography(&mut self, _h: &Mat3, _lane_width: Real) {}
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl DiagnosticSink for NoDiagnostics {}
