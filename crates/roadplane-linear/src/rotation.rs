//! Rotation columns `r1` (lateral road axis) and `r3` (road direction).
//!
//! `r1` comes from a stacked homogeneous system over the sampled point pairs;
//! `r3` is read directly off the vanishing point of the lane lines.

use crate::math::{constrain_rank, dehomogenize, solve_nullspace, NullspaceReport};
use crate::{LinearSystem, SolveError};
use log::debug;
use nalgebra::DMatrix;
use roadplane_core::{Intrinsics, Mat3, PointPair, Real, Vec3};
use serde::{Deserialize, Serialize};

/// Exact-data rank of the `r1` system (four unknowns, one-dimensional null space).
pub const R1_SYSTEM_RANK: usize = 3;

/// Directions shorter than this (for a unit null vector) count as vanishing.
const DIRECTION_EPS: Real = 1e-9;

/// A recovered 3-vector together with the diagnostics of its linear solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearEstimate {
    pub vector: Vec3,
    pub report: NullspaceReport,
}

pub(crate) fn validate_lane_width(lane_width: Real) -> Result<(), SolveError> {
    if !lane_width.is_finite() || lane_width <= 0.0 {
        return Err(SolveError::InvalidLaneWidth(lane_width));
    }
    Ok(())
}

/// Stack the `2N x 4` system in `(r11, r21, r31, s)`.
///
/// For a pair `(xi, yi)`, `(xj, yj)` the rows are
/// `(0, -fy, yj - cy, yi - yj)` and `(fx, 0, cx - xj, xi - xj)`.
pub fn r1_system(pairs: &[PointPair], intrinsics: &Intrinsics) -> DMatrix<Real> {
    let Intrinsics { fx, fy, cx, cy } = *intrinsics;
    let mut a = DMatrix::<Real>::zeros(2 * pairs.len(), 4);

    for (i, pair) in pairs.iter().enumerate() {
        let (xi, yi) = (pair.left.x, pair.left.y);
        let (xj, yj) = (pair.right.x, pair.right.y);

        let r0 = 2 * i;
        let r1 = 2 * i + 1;

        a[(r0, 1)] = -fy;
        a[(r0, 2)] = yj - cy;
        a[(r0, 3)] = yi - yj;

        a[(r1, 0)] = fx;
        a[(r1, 2)] = cx - xj;
        a[(r1, 3)] = xi - xj;
    }
    a
}

/// Recover the first rotation column `r1` from lane point pairs.
///
/// Each pair holds two pixels straight across the lane, i.e. road points
/// `lane_width` apart along `X`. The stacked system must have rank 3; a
/// full-rank (noisy) system is replaced by its rank-3 approximation. The
/// null vector is normalized by its homogeneous component.
pub fn solve_r1(
    pairs: &[PointPair],
    intrinsics: &Intrinsics,
    lane_width: Real,
) -> Result<LinearEstimate, SolveError> {
    validate_lane_width(lane_width)?;
    if !intrinsics.is_finite() {
        return Err(SolveError::SingularIntrinsics);
    }
    if pairs.is_empty() {
        return Err(SolveError::NotEnoughPairs {
            required: 1,
            got: 0,
        });
    }

    let system = LinearSystem::RotationR1;
    if !pairs.iter().all(PointPair::is_finite) {
        return Err(SolveError::NonFiniteInput(system));
    }
    let constrained = constrain_rank(r1_system(pairs, intrinsics), R1_SYSTEM_RANK, system)?;
    let sol = solve_nullspace(&constrained.matrix, system)?;
    debug!("{system}: residual = {:e}", sol.residual);

    if sol.vector.rows(0, 3).norm() <= DIRECTION_EPS {
        return Err(SolveError::DegenerateSolution(system));
    }
    let v = dehomogenize(&sol.vector, system)?;

    Ok(LinearEstimate {
        vector: Vec3::new(v[0], v[1], v[2]),
        report: NullspaceReport {
            rank: constrained.rank,
            approximated: constrained.approximated,
            residual: sol.residual,
            sign_flipped: sol.sign_flipped,
        },
    })
}

/// Recover the third rotation column `r3` from the vanishing point.
///
/// `r3 = K^{-1} v / (K^{-1} v)_z`, exact under the pinhole model.
pub fn solve_r3(vanishing_point: &Vec3, kmtx: &Mat3) -> Result<Vec3, SolveError> {
    if !kmtx.iter().all(|v| v.is_finite()) {
        return Err(SolveError::SingularIntrinsics);
    }
    if !vanishing_point.iter().all(|v| v.is_finite()) {
        return Err(SolveError::NonFiniteInput(LinearSystem::RotationR3));
    }
    let k_inv = kmtx.try_inverse().ok_or(SolveError::SingularIntrinsics)?;
    let r3 = k_inv * vanishing_point;
    if !r3.z.is_finite() || r3.z.abs() <= Real::EPSILON {
        return Err(SolveError::DegenerateSolution(LinearSystem::RotationR3));
    }
    Ok(r3 / r3.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadplane_core::Pt2;

    fn square_intrinsics() -> Intrinsics {
        Intrinsics {
            fx: 300.0,
            fy: 300.0,
            cx: 250.0,
            cy: 250.0,
        }
    }

    fn pair(xl: Real, xr: Real, y: Real) -> PointPair {
        PointPair::new(Pt2::new(xl, y), Pt2::new(xr, y))
    }

    #[test]
    fn parallel_image_lines_give_lateral_axis() {
        let pairs = [pair(100.0, 400.0, 200.0), pair(100.0, 400.0, 300.0)];
        let k = square_intrinsics();

        let est = solve_r1(&pairs, &k, 3.66).unwrap();
        let a = r1_system(&pairs, &k);

        assert!(est.report.residual < 1e-6, "residual {}", est.report.residual);
        assert!((est.vector.norm() - 1.0).abs() < 1e-6, "r1 = {}", est.vector);
        assert!((est.vector - Vec3::new(1.0, 0.0, 0.0)).norm() < 1e-6);

        // The homogeneous solution also annihilates the constructed system.
        let v = nalgebra::DVector::from_vec(vec![est.vector.x, est.vector.y, est.vector.z, 1.0]);
        assert!((&a * v).norm() < 1e-6);
    }

    #[test]
    fn caltech_pairs_need_rank_approximation() {
        let k = Intrinsics {
            fx: 309.4362,
            fy: 344.2161,
            cx: 317.9034,
            cy: 256.5352,
        };
        let l1 = roadplane_core::Line2::new(-1.35431663, 1.0, 124.12336564);
        let l2 = roadplane_core::Line2::new(1.23775052, 1.0, -695.71784631);
        let pairs: Vec<PointPair> = (0..10)
            .map(|i| {
                let y = 228.0 + 12.0 * i as Real;
                let yl = 480.0 - y;
                pair(l1.x_at(yl).unwrap(), l2.x_at(yl).unwrap(), y)
            })
            .collect();

        let est = solve_r1(&pairs, &k, 3.66).unwrap();
        assert_eq!(est.report.rank, 4);
        assert!(est.report.approximated);
        let scale = r1_system(&pairs, &k).norm();
        assert!(est.report.residual < 1e-9 * scale, "residual {}", est.report.residual);
        assert!(est.vector.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn single_pair_is_under_constrained() {
        let err = solve_r1(&[pair(100.0, 400.0, 200.0)], &square_intrinsics(), 3.66).unwrap_err();
        assert!(matches!(
            err,
            SolveError::InsufficientConstraint {
                system: LinearSystem::RotationR1,
                required: 3,
                ..
            }
        ));
    }

    #[test]
    fn zero_pixel_width_is_detected() {
        let pairs: Vec<PointPair> = (0..6)
            .map(|i| {
                let y = 240.0 + 10.0 * i as Real;
                let x = 120.0 + 0.5 * y;
                pair(x, x, y)
            })
            .collect();
        let err = solve_r1(&pairs, &square_intrinsics(), 3.66).unwrap_err();
        assert!(
            matches!(
                err,
                SolveError::DegenerateSolution(LinearSystem::RotationR1)
                    | SolveError::InsufficientConstraint { .. }
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn lane_width_is_validated() {
        let pairs = [pair(100.0, 400.0, 200.0), pair(100.0, 400.0, 300.0)];
        for w in [0.0, -3.66, Real::NAN] {
            assert!(matches!(
                solve_r1(&pairs, &square_intrinsics(), w),
                Err(SolveError::InvalidLaneWidth(_))
            ));
        }
        assert!(matches!(
            solve_r1(&[], &square_intrinsics(), 3.66),
            Err(SolveError::NotEnoughPairs { got: 0, .. })
        ));
    }

    #[test]
    fn r3_is_exact_back_projection() {
        let kmtx = Mat3::new(
            309.4362, 0.0, 317.9034, 0.0, 344.2161, 256.5352, 0.0, 0.0, 1.0,
        );
        let vp = Vec3::new(316.25, 175.75, 1.0);
        let r3 = solve_r3(&vp, &kmtx).unwrap();

        assert_eq!(r3.z, 1.0);
        assert!((r3.x - (316.25 - 317.9034) / 309.4362).abs() < 1e-12);
        assert!((r3.y - (175.75 - 256.5352) / 344.2161).abs() < 1e-12);
        let back = kmtx * r3;
        assert!((back - vp).norm() < 1e-12, "K r3 = {back}");
    }

    #[test]
    fn r3_requires_invertible_intrinsics() {
        let err = solve_r3(&Vec3::new(1.0, 2.0, 1.0), &Mat3::zeros()).unwrap_err();
        assert!(matches!(err, SolveError::SingularIntrinsics));

        let mut kmtx = Mat3::new(300.0, 0.0, 250.0, 0.0, 300.0, 250.0, 0.0, 0.0, 1.0);
        kmtx[(0, 2)] = Real::NAN;
        let err = solve_r3(&Vec3::new(1.0, 2.0, 1.0), &kmtx).unwrap_err();
        assert!(matches!(err, SolveError::SingularIntrinsics));
    }

    #[test]
    fn r3_rejects_non_finite_vanishing_point() {
        let kmtx = square_intrinsics().k_matrix();
        let err = solve_r3(&Vec3::new(Real::NAN, 2.0, 1.0), &kmtx).unwrap_err();
        assert!(matches!(
            err,
            SolveError::NonFiniteInput(LinearSystem::RotationR3)
        ));
    }

    #[test]
    fn non_finite_pairs_and_intrinsics_are_rejected() {
        let mut pairs = vec![pair(100.0, 400.0, 200.0), pair(100.0, 400.0, 300.0)];
        pairs.push(pair(Real::NAN, 400.0, 250.0));
        let err = solve_r1(&pairs, &square_intrinsics(), 3.66).unwrap_err();
        assert!(matches!(
            err,
            SolveError::NonFiniteInput(LinearSystem::RotationR1)
        ));

        pairs.pop();
        let mut k = square_intrinsics();
        k.cx = Real::NAN;
        let err = solve_r1(&pairs, &k, 3.66).unwrap_err();
        assert!(matches!(err, SolveError::SingularIntrinsics));
    }
}
