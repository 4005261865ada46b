use thiserror::Error;

/// Errors raised by the statistics core. Configuration problems fail fast;
/// numerical trouble is reported so that callers can degrade gracefully.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("a die needs at least 2 faces, got {0}")]
    InvalidFaces(u32),
    #[error("a dice set needs at least 1 die, got {0}")]
    InvalidNumDice(usize),
    #[error("significance level must lie strictly between 0 and 1, got {0}")]
    InvalidAlpha(f64),
    #[error("face value {value} is outside 1..={faces}")]
    FaceOutOfRange { value: u32, faces: u32 },
    #[error("roll {index} has {found} dice but the history uses {expected}")]
    MixedArity {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("expected {expected} categories, got {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("expected probabilities are invalid: {0}")]
    InvalidProbabilities(String),
    #[error("category {0} has observations but zero expected count")]
    DegenerateExpectation(usize),
    #[error("numerical evaluation failed: {0}")]
    Numerical(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

pub(crate) fn check_faces(faces: u32) -> Result<()> {
    if faces < 2 {
        return Err(StatsError::InvalidFaces(faces));
    }
    Ok(())
}

pub(crate) fn check_alpha(alpha: f64) -> Result<()> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(StatsError::InvalidAlpha(alpha));
    }
    Ok(())
}
