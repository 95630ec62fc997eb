use thiserror::Error;

/// Errors surfaced to a caller. Per spec these cover input validation only —
/// degenerate geometry, numeric singularities, and stale structural indices
/// are handled in place and never reach this type.
#[derive(Debug, Error)]
pub enum MazeError {
    #[error("particle index {index} out of range (have {len} particles)")]
    ParticleIndexOutOfRange { index: usize, len: usize },

    #[error("mass must be positive, got {0}")]
    NonPositiveMass(f64),

    #[error("radius must be positive, got {0}")]
    NonPositiveRadius(f64),

    #[error("invalid JSON maze file: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MazeError>;

impl PartialEq for MazeError {
    /// `Malformed` wraps a `serde_json::Error`, which has no `PartialEq`
    /// impl; two `Malformed` values compare equal iff their messages match,
    /// everything else compares structurally.
    fn eq(&self, other: &Self) -> bool {
        use MazeError::*;
        match (self, other) {
            (ParticleIndexOutOfRange { index: i1, len: l1 }, ParticleIndexOutOfRange { index: i2, len: l2 }) => {
                i1 == i2 && l1 == l2
            }
            (NonPositiveMass(a), NonPositiveMass(b)) => a == b,
            (NonPositiveRadius(a), NonPositiveRadius(b)) => a == b,
            (Malformed(a), Malformed(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
