//! SVD helpers shared by the rank-constrained solvers.
//!
//! Both the `r1` and the translation solvers stack an overdetermined
//! homogeneous system `A x = 0` whose required rank is known (3 and 4
//! respectively). Noisy data can make `A` full rank; the helpers here project it
//! back onto the required rank and extract the null-space direction with a
//! uniform sign convention.
//!
//! # Rank tolerance
//!
//! [`numerical_rank`] counts singular values above
//! `sigma_max * max(rows, cols) * eps`, the usual LAPACK/NumPy convention.
//!
//! Every decomposition runs through [`checked_svd`]: non-finite systems are
//! rejected up front and the QR sweep is capped at [`SVD_MAX_ITERATIONS`].

use crate::{LinearSystem, SolveError};
use log::{debug, warn};
use nalgebra::linalg::SVD;
use nalgebra::{DMatrix, DVector, Dyn};
use roadplane_core::Real;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Homogeneous scales below this are treated as points at infinity.
const SCALE_EPS: Real = 1e-12;

/// Upper bound on SVD sweeps before the decomposition is reported as failed.
pub const SVD_MAX_ITERATIONS: usize = 1000;

/// Diagnostics of a rank-constrained null-space solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NullspaceReport {
    /// Numerical rank of the raw stacked system.
    pub rank: usize,
    /// A fixed-rank approximation replaced the raw system.
    pub approximated: bool,
    /// `||A v||` for the unit null vector `v` of the solved system.
    pub residual: Real,
    /// The sign convention negated the null-space singular pair.
    pub sign_flipped: bool,
}

/// System after the rank policy has been applied.
#[derive(Debug, Clone)]
pub struct ConstrainedSystem {
    pub matrix: DMatrix<Real>,
    /// Rank of the raw system.
    pub rank: usize,
    pub approximated: bool,
}

/// Unit null-space direction of a system.
#[derive(Debug, Clone)]
pub struct NullspaceSolution {
    pub vector: DVector<Real>,
    pub residual: Real,
    /// The sign convention negated the null-space singular pair.
    pub sign_flipped: bool,
}

/// SVD of `a` with a bounded number of iterations.
///
/// Fails with [`SolveError::NonFiniteInput`] when `a` holds a NaN or an
/// infinity, and with [`SolveError::SvdFailed`] when the decomposition does
/// not converge within [`SVD_MAX_ITERATIONS`].
pub fn checked_svd(
    a: DMatrix<Real>,
    compute_vectors: bool,
    system: LinearSystem,
) -> Result<SVD<Real, Dyn, Dyn>, SolveError> {
    if a.iter().any(|v| !v.is_finite()) {
        return Err(SolveError::NonFiniteInput(system));
    }
    a.try_svd(
        compute_vectors,
        compute_vectors,
        Real::EPSILON,
        SVD_MAX_ITERATIONS,
    )
    .ok_or(SolveError::SvdFailed(system))
}

/// Number of singular values above `sigma_max * max(rows, cols) * eps`.
pub fn numerical_rank(a: &DMatrix<Real>, system: LinearSystem) -> Result<usize, SolveError> {
    if a.nrows() == 0 || a.ncols() == 0 {
        return Ok(0);
    }
    let sv = checked_svd(a.clone(), false, system)?.singular_values;
    let sigma_max = sv.iter().cloned().fold(0.0, Real::max);
    let tol = sigma_max * a.nrows().max(a.ncols()) as Real * Real::EPSILON;
    Ok(sv.iter().filter(|&&s| s > tol).count())
}

/// Nearest matrix of rank `target` (Eckart–Young).
///
/// All but the `target` largest singular values are zeroed before the SVD is
/// recomposed. The result is verified with [`numerical_rank`]; a mismatch is
/// reported as [`SolveError::RankApproximationFailure`].
pub fn fixed_rank_approximation(
    a: &DMatrix<Real>,
    target: usize,
    system: LinearSystem,
) -> Result<DMatrix<Real>, SolveError> {
    let mut svd = checked_svd(a.clone(), true, system)?;

    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&i, &j| {
        svd.singular_values[j]
            .partial_cmp(&svd.singular_values[i])
            .unwrap_or(Ordering::Equal)
    });
    for &idx in order.iter().skip(target) {
        svd.singular_values[idx] = 0.0;
    }

    let approx = svd
        .recompose()
        .map_err(|_| SolveError::SvdFailed(system))?;

    let rank = numerical_rank(&approx, system)?;
    debug!("{system}: rank after fixed-rank approximation = {rank}");
    if rank != target {
        return Err(SolveError::RankApproximationFailure {
            system,
            rank,
            target,
        });
    }
    Ok(approx)
}

/// Apply the rank policy shared by the stacked solvers.
///
/// - `rank == required`: the system is used as is,
/// - `rank < required`: [`SolveError::InsufficientConstraint`],
/// - `rank > required`: replaced by its fixed-rank approximation.
pub fn constrain_rank(
    a: DMatrix<Real>,
    required: usize,
    system: LinearSystem,
) -> Result<ConstrainedSystem, SolveError> {
    let rank = numerical_rank(&a, system)?;
    debug!(
        "{system}: rank(A) = {rank} for a {}x{} system",
        a.nrows(),
        a.ncols()
    );

    match rank.cmp(&required) {
        Ordering::Less => Err(SolveError::InsufficientConstraint {
            system,
            rank,
            required,
        }),
        Ordering::Equal => Ok(ConstrainedSystem {
            matrix: a,
            rank,
            approximated: false,
        }),
        Ordering::Greater => {
            warn!("{system}: system has rank {rank}, projecting onto rank {required}");
            let matrix = fixed_rank_approximation(&a, required, system)?;
            Ok(ConstrainedSystem {
                matrix,
                rank,
                approximated: true,
            })
        }
    }
}

/// Make `det(V) >= 0` by negating one singular pair.
///
/// Column `column` of `U` and row `column` of `V^T` are negated together, so
/// `U Σ V^T` is unchanged while the determinant of `V` changes sign for any
/// size of `V`. Returns whether a flip happened.
pub fn enforce_non_negative_det(
    u: &mut DMatrix<Real>,
    v_t: &mut DMatrix<Real>,
    column: usize,
) -> bool {
    if v_t.determinant() < 0.0 {
        v_t.row_mut(column).neg_mut();
        u.column_mut(column).neg_mut();
        true
    } else {
        false
    }
}

/// Solve `A x = 0` for a unit `x` via SVD.
///
/// Systems with fewer rows than columns are zero-padded to square so that
/// `V` is complete. The returned vector is the right singular vector of the
/// smallest singular value, after [`enforce_non_negative_det`].
pub fn solve_nullspace(
    a: &DMatrix<Real>,
    system: LinearSystem,
) -> Result<NullspaceSolution, SolveError> {
    let mut a_work = a.clone();
    if a_work.nrows() < a_work.ncols() {
        let rows = a_work.nrows();
        let cols = a_work.ncols();
        let mut a_pad = DMatrix::<Real>::zeros(cols, cols);
        a_pad.view_mut((0, 0), (rows, cols)).copy_from(&a_work);
        a_work = a_pad;
    }

    let svd = checked_svd(a_work, true, system)?;
    let mut u = svd.u.ok_or(SolveError::SvdFailed(system))?;
    let mut v_t = svd.v_t.ok_or(SolveError::SvdFailed(system))?;
    let idx = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|(_, x), (_, y)| x.partial_cmp(y).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .ok_or(SolveError::SvdFailed(system))?;

    let sign_flipped = enforce_non_negative_det(&mut u, &mut v_t, idx);
    let vector = v_t.row(idx).transpose();
    let residual = (a * &vector).norm();

    Ok(NullspaceSolution {
        vector,
        residual,
        sign_flipped,
    })
}

/// Divide a homogeneous solution by its last component.
pub fn dehomogenize(
    v: &DVector<Real>,
    system: LinearSystem,
) -> Result<DVector<Real>, SolveError> {
    let gamma = v[v.len() - 1];
    if !gamma.is_finite() || gamma.abs() <= SCALE_EPS {
        return Err(SolveError::DegenerateSolution(system));
    }
    Ok(v / gamma)
}
