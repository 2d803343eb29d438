//! Synthetic road scenes.
//!
//! A [`RoadCamera`] maps road coordinates into its camera frame with
//! `p_cam = R (X, 0, Z)^T + T`. The road frame has `Y` up while the camera
//! frame has `y` down, so `R` includes that axis flip.

use crate::{from_homogeneous, ImageSize, Intrinsics, Line2, Mat3, Pt2, Real, RowOrigin, Vec3};
use anyhow::Result;
use nalgebra::{Rotation3, Vector3};

/// Road-facing pinhole camera with known extrinsics.
#[derive(Debug, Clone, Copy)]
pub struct RoadCamera {
    pub intrinsics: Intrinsics,
    /// Road-to-camera axis mapping; columns are `r1, r2, r3`.
    pub rotation: Mat3,
    pub translation: Vec3,
}

/// Two imaged lane boundaries of a synthetic camera.
#[derive(Debug, Clone, Copy)]
pub struct LaneScene {
    pub camera: RoadCamera,
    pub lane_width: Real,
    pub size: ImageSize,
    pub row_origin: RowOrigin,
    pub left_line: Line2,
    pub right_line: Line2,
}

impl RoadCamera {
    pub fn new(intrinsics: Intrinsics, rotation: Mat3, translation: Vec3) -> Self {
        Self {
            intrinsics,
            rotation,
            translation,
        }
    }

    /// Camera looking along the road, pitched down by `pitch_rad` and turned
    /// by `yaw_rad` about the vertical axis.
    pub fn looking_along_road(
        intrinsics: Intrinsics,
        pitch_rad: Real,
        yaw_rad: Real,
        translation: Vec3,
    ) -> Self {
        let flip = Mat3::from_diagonal(&Vec3::new(1.0, -1.0, 1.0));
        let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), pitch_rad);
        let yaw = Rotation3::from_axis_angle(&Vector3::y_axis(), yaw_rad);
        let rotation = pitch.matrix() * yaw.matrix() * flip;
        Self::new(intrinsics, rotation, translation)
    }

    pub fn r1(&self) -> Vec3 {
        self.rotation.column(0).into_owned()
    }

    pub fn r3(&self) -> Vec3 {
        self.rotation.column(2).into_owned()
    }

    /// Road point `(X, Z)` expressed in the camera frame.
    pub fn road_to_camera(&self, x: Real, z: Real) -> Vec3 {
        self.r1() * x + self.r3() * z + self.translation
    }

    /// Raster pixel of a road point; `None` behind the camera.
    pub fn project_road_point(&self, x: Real, z: Real) -> Option<Pt2> {
        let p = self.road_to_camera(x, z);
        if p.z <= 0.0 {
            return None;
        }
        self.intrinsics.project(&p)
    }

    /// Ground-truth road-to-image homography `K [r1 r3 T]`.
    pub fn homography(&self) -> Mat3 {
        let mut m = Mat3::zeros();
        m.set_column(0, &self.r1());
        m.set_column(1, &self.r3());
        m.set_column(2, &self.translation);
        self.intrinsics.k_matrix() * m
    }

    /// Raster vanishing point of the road direction.
    pub fn vanishing_point(&self) -> Option<Pt2> {
        let v = self.intrinsics.k_matrix() * self.r3();
        if v.z.abs() <= Real::EPSILON {
            return None;
        }
        Some(from_homogeneous(&v))
    }

    /// Image line of the road line `X = x_offset`, expressed with `row_origin`.
    pub fn lane_line(
        &self,
        x_offset: Real,
        size: ImageSize,
        row_origin: RowOrigin,
    ) -> Result<Line2> {
        let height = size.height as Real;
        let mut pts = Vec::with_capacity(2);
        for z in [5.0, 40.0] {
            let Some(px) = self.project_road_point(x_offset, z) else {
                anyhow::bail!("road point ({x_offset}, {z}) is behind the camera");
            };
            pts.push(Pt2::new(px.x, row_origin.flip_row(px.y, height)));
        }
        Ok(Line2::through(&pts[0], &pts[1]))
    }
}

/// Image both lane boundaries (`X = -w/2` and `X = +w/2`).
pub fn lane_scene(
    camera: &RoadCamera,
    lane_width: Real,
    size: ImageSize,
    row_origin: RowOrigin,
) -> Result<LaneScene> {
    let half = 0.5 * lane_width;
    Ok(LaneScene {
        camera: *camera,
        lane_width,
        size,
        row_origin,
        left_line: camera.lane_line(-half, size, row_origin)?,
        right_line: camera.lane_line(half, size, row_origin)?,
    })
}

/// Camera roughly matching the Caltech lanes rig: 2.1798 m above the road,
/// slightly pitched down, with the road origin one metre ahead.
pub fn dashboard_camera() -> RoadCamera {
    let intrinsics = Intrinsics {
        fx: 309.4362,
        fy: 344.2161,
        cx: 317.9034,
        cy: 256.5352,
    };
    RoadCamera::looking_along_road(intrinsics, 0.05, 0.02, Vec3::new(0.2, 2.1798, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homography_matches_projection() {
        let cam = dashboard_camera();
        let h = cam.homography();
        for (x, z) in [(-1.83, 4.0), (0.0, 12.0), (1.83, 30.0)] {
            let expected = cam.project_road_point(x, z).unwrap();
            let got = from_homogeneous(&(h * Vec3::new(x, z, 1.0)));
            assert!((got - expected).norm() < 1e-9, "({x}, {z}): {got} vs {expected}");
        }
    }

    #[test]
    fn lane_lines_meet_at_vanishing_point() {
        let cam = dashboard_camera();
        let size = ImageSize::new(640, 480);
        let scene = lane_scene(&cam, 3.66, size, RowOrigin::Top).unwrap();
        let v = scene.left_line.intersection(&scene.right_line);
        let vp = from_homogeneous(&v);
        let expected = cam.vanishing_point().unwrap();
        assert!((vp - expected).norm() < 1e-6, "vp={vp} expected={expected}");
    }

    #[test]
    fn bottom_origin_lines_flip_rows() {
        let cam = dashboard_camera();
        let size = ImageSize::new(640, 480);
        let top = cam.lane_line(-1.83, size, RowOrigin::Top).unwrap();
        let bottom = cam.lane_line(-1.83, size, RowOrigin::Bottom).unwrap();
        let x_top = top.x_at(350.0).unwrap();
        let x_bottom = bottom.x_at(480.0 - 350.0).unwrap();
        assert!((x_top - x_bottom).abs() < 1e-9);
    }
}
