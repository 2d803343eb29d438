//! End-to-end road-plane homography estimation.
//!
//! The stages run in a fixed order:
//! 1. sample point pairs along both lane lines,
//! 2. intersect the lines for the vanishing point,
//! 3. solve `r1` and `r3`,
//! 4. solve the translation,
//! 5. assemble (and optionally normalize) `H`.

use crate::diagnostics::{DiagnosticSink, SampleDiagnostics};
use crate::homography::{assemble_homography, normalize_determinant, DEFAULT_CAMERA_HEIGHT};
use crate::math::NullspaceReport;
use crate::rotation::{solve_r1, solve_r3, validate_lane_width};
use crate::sampler::{sample_point_pairs, DEFAULT_SAMPLES};
use crate::translation::solve_translation;
use crate::vanishing::vanishing_point;
use crate::SolveError;
use log::{debug, info};
use roadplane_core::{
    mat3_from_rows, mat3_to_rows, ImageSize, Intrinsics, Line2, Mat3, NormWindow, PointPair, Pt2,
    Real, RowOrigin, Vec3,
};
use serde::{Deserialize, Serialize};

/// Lane width of the Caltech lanes recordings (12 ft) in metres.
pub const DEFAULT_LANE_WIDTH: Real = 3.66;

/// Tunables of [`estimate_planar_homography`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomographyConfig {
    /// Number of sampled rows per window.
    pub samples: usize,
    /// Distance between the two lane boundaries in metres.
    pub lane_width: Real,
    /// Camera height above the road in metres; fixes the scale of `T`.
    pub camera_height: Real,
    /// Row convention of the input lines.
    pub row_origin: RowOrigin,
    /// Scale the result to `det(H) = 1`.
    pub normalize_determinant: bool,
}

impl Default for HomographyConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            lane_width: DEFAULT_LANE_WIDTH,
            camera_height: DEFAULT_CAMERA_HEIGHT,
            row_origin: RowOrigin::default(),
            normalize_determinant: false,
        }
    }
}

impl HomographyConfig {
    fn validate(&self) -> Result<(), SolveError> {
        if self.samples == 0 {
            return Err(SolveError::NotEnoughPairs {
                required: 1,
                got: 0,
            });
        }
        validate_lane_width(self.lane_width)?;
        if !self.camera_height.is_finite() || self.camera_height <= 0.0 {
            return Err(SolveError::InvalidCameraHeight(self.camera_height));
        }
        Ok(())
    }
}

/// Camera and lane observations of a single image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadPlaneInput {
    /// Camera matrix `K`, row-major.
    pub intrinsics: [[Real; 3]; 3],
    pub left_line: Line2,
    pub right_line: Line2,
    /// Window on the left boundary; its rows drive the sampler.
    pub left_window: NormWindow,
    pub right_window: NormWindow,
    pub image_size: ImageSize,
}

impl RoadPlaneInput {
    pub fn k_matrix(&self) -> Mat3 {
        mat3_from_rows(&self.intrinsics)
    }
}

/// Result of [`estimate_planar_homography`].
#[derive(Debug, Clone)]
pub struct RoadPlaneSolution {
    /// Road-to-image homography, mapping `(X, Z, 1)` to raster pixels.
    pub homography: Mat3,
    pub r1: Vec3,
    pub r3: Vec3,
    /// Translation as returned by the linear solve.
    pub raw_translation: Vec3,
    /// Translation after the height rescale and the `T[2] = 1` pin.
    pub translation: Vec3,
    pub vanishing_point: Pt2,
    pub pairs: Vec<PointPair>,
    pub r1_report: NullspaceReport,
    pub translation_report: NullspaceReport,
    pub determinant_normalized: bool,
}

/// Serializable summary of a [`RoadPlaneSolution`]; matrices are row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadPlaneReport {
    pub homography: [[Real; 3]; 3],
    pub r1: [Real; 3],
    pub r3: [Real; 3],
    pub raw_translation: [Real; 3],
    pub translation: [Real; 3],
    pub vanishing_point: [Real; 2],
    pub pairs: Vec<PointPair>,
    pub r1_system: NullspaceReport,
    pub translation_system: NullspaceReport,
    pub determinant_normalized: bool,
}

impl RoadPlaneSolution {
    pub fn report(&self) -> RoadPlaneReport {
        RoadPlaneReport {
            homography: mat3_to_rows(&self.homography),
            r1: self.r1.into(),
            r3: self.r3.into(),
            raw_translation: self.raw_translation.into(),
            translation: self.translation.into(),
            vanishing_point: [self.vanishing_point.x, self.vanishing_point.y],
            pairs: self.pairs.clone(),
            r1_system: self.r1_report,
            translation_system: self.translation_report,
            determinant_normalized: self.determinant_normalized,
        }
    }
}

/// Estimate the homography between the road plane and the image.
///
/// `sink` observes the sampled pairs and the final homography; pass
/// [`NoDiagnostics`](crate::NoDiagnostics) when nothing should be recorded.
pub fn estimate_planar_homography(
    input: &RoadPlaneInput,
    config: &HomographyConfig,
    sink: &mut dyn DiagnosticSink,
) -> Result<RoadPlaneSolution, SolveError> {
    config.validate()?;

    let kmtx = input.k_matrix();
    let intrinsics = Intrinsics::from_k_matrix(&kmtx);
    if !kmtx.iter().all(|v| v.is_finite())
        || !intrinsics.has_positive_focal_lengths()
        || kmtx.try_inverse().is_none()
    {
        return Err(SolveError::SingularIntrinsics);
    }
    let size = input.image_size;

    let pairs = sample_point_pairs(
        &input.left_line,
        &input.right_line,
        &input.left_window,
        size,
        config.samples,
        config.row_origin,
    )?;
    debug!("sampled {} point pairs", pairs.len());

    let vp = vanishing_point(&input.left_line, &input.right_line, size, config.row_origin)?;
    let vanishing_point = Pt2::new(vp.x, vp.y);
    debug!("vanishing point: ({:.3}, {:.3})", vp.x, vp.y);

    sink.sampled_pairs(&SampleDiagnostics {
        pairs: &pairs,
        vanishing_point,
        left_window: input.left_window.pixel_rect(size),
        right_window: input.right_window.pixel_rect(size),
        size,
    });

    let r1 = solve_r1(&pairs, &intrinsics, config.lane_width)?;
    let r3 = solve_r3(&vp, &kmtx)?;
    debug!("r1 = {:?}, r3 = {:?}", r1.vector, r3);

    let t = solve_translation(&pairs, &intrinsics, &r1.vector, &r3, config.lane_width)?;
    let assembled = assemble_homography(&kmtx, &r1.vector, &r3, &t.vector, config.camera_height)?;

    let homography = if config.normalize_determinant {
        normalize_determinant(&assembled.h)?
    } else {
        assembled.h
    };
    sink.homography(&homography, config.lane_width);

    info!(
        "road-plane homography from {} pairs (r1 rank {}, translation rank {})",
        pairs.len(),
        r1.report.rank,
        t.report.rank
    );

    Ok(RoadPlaneSolution {
        homography,
        r1: r1.vector,
        r3,
        raw_translation: t.vector,
        translation: assembled.translation,
        vanishing_point,
        pairs,
        r1_report: r1.report,
        translation_report: t.report,
        determinant_normalized: config.normalize_determinant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NoDiagnostics;
    use crate::homography::project_road_point;
    use crate::LinearSystem;

    fn caltech_input() -> RoadPlaneInput {
        RoadPlaneInput {
            intrinsics: [
                [309.4362, 0.0, 317.9034],
                [0.0, 344.2161, 256.5352],
                [0.0, 0.0, 1.0],
            ],
            left_line: Line2::new(-1.35431663, 1.0, 124.12336564),
            right_line: Line2::new(1.23775052, 1.0, -695.71784631),
            left_window: NormWindow::new(0.4, 0.60, 0.2, 0.25),
            right_window: NormWindow::new(0.62, 0.60, 0.2, 0.25),
            image_size: ImageSize::new(640, 480),
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        pairs: usize,
        vanishing_point: Option<Pt2>,
        windows: Vec<roadplane_core::PixelRect>,
        homographies: Vec<(Mat3, Real)>,
    }

    impl DiagnosticSink for RecordingSink {
        fn sampled_pairs(&mut self, samples: &SampleDiagnostics<'_>) {
            self.pairs = samples.pairs.len();
            self.vanishing_point = Some(samples.vanishing_point);
            self.windows = vec![samples.left_window, samples.right_window];
        }

        fn homography(&mut self, h: &Mat3, lane_width: Real) {
            self.homographies.push((*h, lane_width));
        }
    }

    #[test]
    fn default_config_matches_caltech_rig() {
        let cfg = HomographyConfig::default();
        assert_eq!(cfg.samples, 10);
        assert_eq!(cfg.lane_width, 3.66);
        assert_eq!(cfg.camera_height, 2.1798);
        assert_eq!(cfg.row_origin, RowOrigin::Bottom);
        assert!(!cfg.normalize_determinant);

        let partial: HomographyConfig =
            serde_json::from_str(r#"{ "samples": 4, "row_origin": "top" }"#).unwrap();
        assert_eq!(partial.samples, 4);
        assert_eq!(partial.row_origin, RowOrigin::Top);
        assert_eq!(partial.lane_width, 3.66);
    }

    #[test]
    fn caltech_scene_gives_finite_homography() {
        let input = caltech_input();
        let cfg = HomographyConfig::default();
        let mut sink = RecordingSink::default();

        let sol = estimate_planar_homography(&input, &cfg, &mut sink).unwrap();
        assert!(sol.homography.iter().all(|v| v.is_finite()), "H = {}", sol.homography);
        assert_eq!(sol.pairs.len(), 10);
        assert!((sol.translation.y - 2.1798).abs() < 1e-12);
        assert_eq!(sol.translation.z, 1.0);
        assert_eq!(sol.r3.z, 1.0);
        assert!(sol.r1_report.approximated);

        assert_eq!(sink.pairs, 10);
        assert_eq!(sink.vanishing_point, Some(sol.vanishing_point));
        assert_eq!(sink.windows[0].y, 228);
        assert_eq!(sink.windows[1].x, 333);
        assert_eq!(sink.homographies.len(), 1);
        assert_eq!(sink.homographies[0], (sol.homography, 3.66));

        // The far end of the road converges on the vanishing point.
        let far = project_road_point(&sol.homography, 0.0, 1e7).unwrap();
        assert!((far - sol.vanishing_point).norm() < 1e-2, "far point {far}");
    }

    #[test]
    fn normalized_homography_has_unit_determinant() {
        let input = caltech_input();
        let cfg = HomographyConfig {
            normalize_determinant: true,
            ..HomographyConfig::default()
        };
        let sol = estimate_planar_homography(&input, &cfg, &mut NoDiagnostics).unwrap();
        assert!(sol.determinant_normalized);
        let det = sol.homography.determinant();
        assert!((det - 1.0).abs() < 1e-9, "det {det}");
    }

    #[test]
    fn report_is_row_major() {
        let sol = estimate_planar_homography(
            &caltech_input(),
            &HomographyConfig::default(),
            &mut NoDiagnostics,
        )
        .unwrap();
        let report = sol.report();
        assert_eq!(report.homography[0][2], sol.homography[(0, 2)]);
        assert_eq!(report.homography[2][0], sol.homography[(2, 0)]);
        assert_eq!(report.translation[1], sol.translation.y);

        let json = serde_json::to_string(&report).unwrap();
        let back: RoadPlaneReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pairs.len(), report.pairs.len());
        assert_eq!(back.r1_system, report.r1_system);
    }

    #[test]
    fn invalid_inputs_fail_before_solving() {
        let mut input = caltech_input();
        input.intrinsics[1][1] = 0.0;
        let mut sink = RecordingSink::default();
        let err =
            estimate_planar_homography(&input, &HomographyConfig::default(), &mut sink).unwrap_err();
        assert!(matches!(err, SolveError::SingularIntrinsics));
        assert_eq!(sink.pairs, 0);

        let cfg = HomographyConfig {
            camera_height: 0.0,
            ..HomographyConfig::default()
        };
        assert!(matches!(
            estimate_planar_homography(&caltech_input(), &cfg, &mut NoDiagnostics),
            Err(SolveError::InvalidCameraHeight(_))
        ));

        let mut input = caltech_input();
        input.right_line = input.left_line;
        assert!(matches!(
            estimate_planar_homography(&input, &HomographyConfig::default(), &mut NoDiagnostics),
            Err(SolveError::ParallelLines)
        ));
    }

    #[test]
    fn non_finite_inputs_fail_fast() {
        let mut input = caltech_input();
        input.intrinsics[0][2] = Real::NAN;
        let mut sink = RecordingSink::default();
        let err =
            estimate_planar_homography(&input, &HomographyConfig::default(), &mut sink).unwrap_err();
        assert!(matches!(err, SolveError::SingularIntrinsics));
        assert_eq!(sink.pairs, 0);

        let mut input = caltech_input();
        input.intrinsics[2][0] = Real::INFINITY;
        assert!(matches!(
            estimate_planar_homography(&input, &HomographyConfig::default(), &mut NoDiagnostics),
            Err(SolveError::SingularIntrinsics)
        ));

        let mut input = caltech_input();
        input.left_line.c = Real::NAN;
        // The sampled x coordinates are NaN; the lines still intersect.
        let err = estimate_planar_homography(&input, &HomographyConfig::default(), &mut NoDiagnostics)
            .unwrap_err();
        assert!(
            matches!(err, SolveError::NonFiniteInput(LinearSystem::RotationR1)),
            "unexpected error: {err}"
        );
    }
}
