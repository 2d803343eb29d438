//! Translation `T` from lane point pairs and the recovered rotation columns.
//!
//! Every pixel `p` of a pair is back-projected to `b = ((x - cx)/fx, (y - cy)/fy, 1)`.
//! With `X = -w/2` for the left boundary and `X = +w/2` for the right one,
//! each pixel contributes the three equations
//!
//! ```text
//! Z r3 + T + s (X r1 - b) = 0
//! ```
//!
//! in the unknowns `(Z, tx, ty, tz, s)`. The depth-like `Z` is discarded
//! after solving.
//!
//! `(Z, T, s) = (1, -r3, 0)` satisfies every row, so the recovered null
//! vector may carry a vanishing scale `s`. `T` is then only known up to
//! scale, which is all the homography assembler needs: it rescales `T` by
//! the camera height.

use crate::math::{constrain_rank, dehomogenize, solve_nullspace, NullspaceReport};
use crate::rotation::validate_lane_width;
use crate::{LinearSystem, SolveError};
use log::{debug, warn};
use nalgebra::DMatrix;
use roadplane_core::{Intrinsics, PointPair, Real, Vec3};
use serde::{Deserialize, Serialize};

/// Required rank of the translation system (five unknowns).
pub const TRANSLATION_SYSTEM_RANK: usize = 4;

/// Homogeneous scales below this leave `T` defined up to scale only.
const SCALE_EPS: Real = 1e-12;

/// Recovered translation with the diagnostics of its linear solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TranslationEstimate {
    /// `(tx, ty, tz)`, divided by `scale` unless that vanishes.
    pub vector: Vec3,
    /// Homogeneous component `s` of the unit null vector.
    pub scale: Real,
    pub report: NullspaceReport,
}

impl TranslationEstimate {
    /// `vector` was normalized by a non-vanishing homogeneous scale.
    pub fn is_dehomogenized(&self) -> bool {
        self.scale.abs() > SCALE_EPS
    }
}

/// Stack the `6N x 5` translation system.
pub fn translation_system(
    pairs: &[PointPair],
    intrinsics: &Intrinsics,
    r1: &Vec3,
    r3: &Vec3,
    lane_width: Real,
) -> DMatrix<Real> {
    let half = 0.5 * lane_width;
    let mut a = DMatrix::<Real>::zeros(6 * pairs.len(), 5);

    for (i, pair) in pairs.iter().enumerate() {
        for (side, (pixel, x_offset)) in [(pair.left, -half), (pair.right, half)]
            .into_iter()
            .enumerate()
        {
            let b = intrinsics.pixel_to_ray(&pixel);
            let base = 6 * i + 3 * side;
            for k in 0..3 {
                a[(base + k, 0)] = r3[k];
                a[(base + k, 1 + k)] = 1.0;
                a[(base + k, 4)] = x_offset * r1[k] - b[k];
            }
        }
    }
    a
}

/// Recover the translation `T = (tx, ty, tz)`.
///
/// The stacked system must have rank 4; a system of higher rank is replaced
/// by its rank-4 approximation before the null vector is extracted. The
/// null vector is normalized by its homogeneous component when that is
/// non-zero; otherwise its `T` part is returned as a direction.
pub fn solve_translation(
    pairs: &[PointPair],
    intrinsics: &Intrinsics,
    r1: &Vec3,
    r3: &Vec3,
    lane_width: Real,
) -> Result<TranslationEstimate, SolveError> {
    validate_lane_width(lane_width)?;
    if !intrinsics.has_positive_focal_lengths() || !intrinsics.is_finite() {
        return Err(SolveError::SingularIntrinsics);
    }
    if pairs.is_empty() {
        return Err(SolveError::NotEnoughPairs {
            required: 1,
            got: 0,
        });
    }

    let system = LinearSystem::Translation;
    if !pairs.iter().all(PointPair::is_finite) {
        return Err(SolveError::NonFiniteInput(system));
    }
    let a = translation_system(pairs, intrinsics, r1, r3, lane_width);
    let constrained = constrain_rank(a, TRANSLATION_SYSTEM_RANK, system)?;
    let sol = solve_nullspace(&constrained.matrix, system)?;
    debug!("{system}: residual = {:e}", sol.residual);

    let scale = sol.vector[4];
    let vector = if scale.abs() > SCALE_EPS {
        let v = dehomogenize(&sol.vector, system)?;
        debug!("{system}: depth term Z = {:.6}", v[0]);
        Vec3::new(v[1], v[2], v[3])
    } else {
        warn!("{system}: homogeneous scale vanishes ({scale:e}), T is known up to scale only");
        Vec3::new(sol.vector[1], sol.vector[2], sol.vector[3])
    };
    if vector.norm() <= SCALE_EPS || vector.iter().any(|c| !c.is_finite()) {
        return Err(SolveError::DegenerateSolution(system));
    }

    Ok(TranslationEstimate {
        vector,
        scale,
        report: NullspaceReport {
            rank: constrained.rank,
            approximated: constrained.approximated,
            residual: sol.residual,
            sign_flipped: sol.sign_flipped,
        },
    })
}
