//! Diagnostic image overlays.

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use log::debug;
use roadplane_core::{ImageSize, Mat3, PixelRect, Pt2, Real};
use roadplane_linear::{project_road_point, road_probe_series, DiagnosticSink, SampleDiagnostics};
use std::path::{Path, PathBuf};

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const WINDOW: Rgb<u8> = Rgb([255, 255, 0]);
/// Left boundary, lane centre, right boundary.
const PROBE_COLORS: [Rgb<u8>; 3] = [Rgb([255, 0, 255]), Rgb([0, 255, 255]), Rgb([255, 128, 0])];

const SAMPLE_RADIUS: i32 = 5;
const PROBE_RADIUS: i32 = 3;
/// Points further than this outside the canvas are not drawn.
const CANVAS_MARGIN: Real = 1.0e5;

pub const SAMPLES_FILE: &str = "samples.png";
pub const ROAD_POINTS_FILE: &str = "road_points.png";

/// Renders pipeline diagnostics on top of a background image.
pub struct ImageOverlay {
    background: RgbImage,
    samples: Option<RgbImage>,
    road_points: Option<RgbImage>,
}

impl ImageOverlay {
    pub fn new(background: RgbImage) -> Self {
        Self {
            background,
            samples: None,
            road_points: None,
        }
    }

    /// Black canvas of the given size.
    pub fn blank(size: ImageSize) -> Self {
        Self::new(RgbImage::new(size.width as u32, size.height as u32))
    }

    /// Write every rendered overlay into `dir`, creating it when needed.
    pub fn save(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let mut written = Vec::new();
        for (name, canvas) in [
            (SAMPLES_FILE, &self.samples),
            (ROAD_POINTS_FILE, &self.road_points),
        ] {
            let Some(canvas) = canvas else {
                continue;
            };
            let path = dir.join(name);
            canvas
                .save(&path)
                .with_context(|| format!("failed to save {}", path.display()))?;
            debug!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

fn to_canvas(p: &Pt2) -> Option<(i32, i32)> {
    if !p.x.is_finite() || !p.y.is_finite() {
        return None;
    }
    if p.x.abs() > CANVAS_MARGIN || p.y.abs() > CANVAS_MARGIN {
        return None;
    }
    Some((p.x.round() as i32, p.y.round() as i32))
}

fn draw_window(canvas: &mut RgbImage, rect: &PixelRect) {
    if rect.width <= 0 || rect.height <= 0 {
        return;
    }
    let r = Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width as u32, rect.height as u32);
    draw_hollow_rect_mut(canvas, r, WINDOW);
}

impl DiagnosticSink for ImageOverlay {
    fn sampled_pairs(&mut self, samples: &SampleDiagnostics<'_>) {
        let mut canvas = self.background.clone();

        draw_window(&mut canvas, &samples.left_window);
        draw_window(&mut canvas, &samples.right_window);

        for (i, pair) in samples.pairs.iter().enumerate() {
            let color = if i % 2 == 0 { RED } else { GREEN };
            for p in [pair.left, pair.right] {
                if let Some(c) = to_canvas(&p) {
                    draw_hollow_circle_mut(&mut canvas, c, SAMPLE_RADIUS, color);
                }
            }
        }

        if let Some(c) = to_canvas(&samples.vanishing_point) {
            draw_filled_circle_mut(&mut canvas, c, SAMPLE_RADIUS, BLUE);
        }
        self.samples = Some(canvas);
    }

    fn homography(&mut self, h: &Mat3, lane_width: Real) {
        let mut canvas = self.background.clone();
        for (series, color) in road_probe_series(lane_width).iter().zip(PROBE_COLORS) {
            for road in series {
                let Some(pixel) = project_road_point(h, road.x, road.y) else {
                    continue;
                };
                if let Some(c) = to_canvas(&pixel) {
                    draw_hollow_circle_mut(&mut canvas, c, PROBE_RADIUS, color);
                }
            }
        }
        self.road_points = Some(canvas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadplane_core::PointPair;

    #[test]
    fn sampled_pairs_alternate_colors() {
        let size = ImageSize::new(100, 80);
        let mut overlay = ImageOverlay::blank(size);
        let pairs = [
            PointPair::new(Pt2::new(20.0, 30.0), Pt2::new(70.0, 30.0)),
            PointPair::new(Pt2::new(18.0, 50.0), Pt2::new(74.0, 50.0)),
        ];
        let rect = PixelRect {
            x: 10,
            y: 20,
            width: 30,
            height: 40,
        };
        overlay.sampled_pairs(&SampleDiagnostics {
            pairs: &pairs,
            vanishing_point: Pt2::new(45.0, 5.0),
            left_window: rect,
            right_window: PixelRect { width: 0, ..rect },
            size,
        });

        let canvas = overlay.samples.as_ref().unwrap();
        assert_eq!(canvas.dimensions(), (100, 80));
        assert_eq!(canvas.get_pixel(75, 30), &RED);
        assert_eq!(canvas.get_pixel(79, 50), &GREEN);
        assert_eq!(canvas.get_pixel(45, 5), &BLUE);
        assert_eq!(canvas.get_pixel(10, 59), &WINDOW);
        assert!(overlay.road_points.is_none());
    }

    #[test]
    fn points_far_outside_are_skipped() {
        assert_eq!(to_canvas(&Pt2::new(1.4, -2.6)), Some((1, -3)));
        assert_eq!(to_canvas(&Pt2::new(Real::NAN, 0.0)), None);
        assert_eq!(to_canvas(&Pt2::new(0.0, 1e9)), None);
    }

    #[test]
    fn save_writes_rendered_overlays() {
        let dir = tempfile::tempdir().unwrap();
        let mut overlay = ImageOverlay::blank(ImageSize::new(64, 48));
        overlay.homography(&Mat3::identity(), 3.66);

        let written = overlay.save(&dir.path().join("diag")).unwrap();
        assert_eq!(written, vec![dir.path().join("diag").join(ROAD_POINTS_FILE)]);
        let img = image::open(&written[0]).unwrap();
        assert_eq!((img.width(), img.height()), (64, 48));
    }
}
