use thiserror::Error;

/// Fatal errors raised while building or re-shaping an S-curve leg, or
/// setting up a mission.
///
/// These are configuration errors, not runtime states: a leg that failed to
/// build is never advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SCurveError {
    /// Snap, jerk, acceleration or velocity limit was not positive.
    #[error("invalid kinematic parameters")]
    InvalidKinematicParameters,

    /// The timing solver produced a non-finite or negative duration.
    #[error("invalid path outputs")]
    InvalidPathOutputs,

    /// The segment table failed its invariants.
    #[error("invalid path")]
    InvalidPath,

    /// A mission was asked to tick at 0 Hz.
    #[error("invalid tick frequency")]
    InvalidFrequency,
}
