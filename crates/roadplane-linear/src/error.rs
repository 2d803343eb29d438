use roadplane_core::Real;
use std::fmt;
use thiserror::Error;

/// Identifies which stacked linear system an error or report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearSystem {
    /// First rotation column `r1` (`2N x 4`).
    RotationR1,
    /// Third rotation column `r3` (closed form).
    RotationR3,
    /// Translation `T` (`6N x 5`).
    Translation,
    /// Homography assembly.
    Homography,
}

impl fmt::Display for LinearSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinearSystem::RotationR1 => "r1",
            LinearSystem::RotationR3 => "r3",
            LinearSystem::Translation => "translation",
            LinearSystem::Homography => "homography",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while recovering the road-plane homography.
///
/// None of them is transient: every error is surfaced to the caller as is.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The stacked system is rank deficient: too few or degenerate pairs.
    #[error("{system} system has rank {rank}, need {required}")]
    InsufficientConstraint {
        system: LinearSystem,
        rank: usize,
        required: usize,
    },
    /// The fixed-rank projection did not reach its target rank.
    #[error("fixed-rank approximation of the {system} system gave rank {rank}, expected {target}")]
    RankApproximationFailure {
        system: LinearSystem,
        rank: usize,
        target: usize,
    },
    /// `K` has no inverse.
    #[error("intrinsics matrix is not invertible")]
    SingularIntrinsics,
    /// Linear solve (SVD) failed or did not converge.
    #[error("svd failed in the {0} system")]
    SvdFailed(LinearSystem),
    /// A NaN or infinite value reached a linear system.
    #[error("non-finite input to the {0} system")]
    NonFiniteInput(LinearSystem),
    /// Not enough point pairs were provided or requested.
    #[error("need at least {required} point pairs, got {got}")]
    NotEnoughPairs { required: usize, got: usize },
    #[error("lane width must be finite and positive, got {0}")]
    InvalidLaneWidth(Real),
    #[error("camera height must be finite and positive, got {0}")]
    InvalidCameraHeight(Real),
    /// A line vector with `a = b = 0`.
    #[error("line coefficients a and b are both zero")]
    DegenerateLine,
    /// A horizontal line has no unique column per image row.
    #[error("lane line is horizontal and cannot be sampled per row")]
    HorizontalLine,
    /// The two lane lines do not meet at a finite vanishing point.
    #[error("lane lines are parallel in the image")]
    ParallelLines,
    /// The solution vanishes or has no finite homogeneous scale.
    #[error("degenerate {0} solution")]
    DegenerateSolution(LinearSystem),
    /// `det(H)` is numerically zero.
    #[error("homography is singular and cannot be normalized")]
    SingularHomography,
}
