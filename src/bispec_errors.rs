use thiserror::Error;

#[derive(Error, Debug)]
pub enum BispecError {
    #[error("Field grid is not cubic: {0}x{1}x{2}")]
    NonCubicField(usize, usize, usize),

    #[error("Field grid is empty")]
    EmptyField,

    #[error("Box size must be positive and finite, got {0}")]
    InvalidBoxSize(f64),

    #[error("Wavenumber bin must be positive and finite, got {0}")]
    InvalidKBin(f64),

    #[error("Opening angle must lie strictly inside (0, pi), got {0}")]
    InvalidAngle(f64),

    #[error("Power spectrum bin edges must be finite, positive and strictly increasing")]
    InvalidBinEdges,

    #[error("Power spectrum binning needs at least one bin")]
    EmptyBinning,

    #[error("Unable to build the worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl PartialEq for BispecError {
    fn eq(&self, other: &Self) -> bool {
        use BispecError::*;
        match (self, other) {
            (NonCubicField(a, b, c), NonCubicField(d, e, f)) => (a, b, c) == (d, e, f),
            (EmptyField, EmptyField) => true,
            (InvalidBoxSize(a), InvalidBoxSize(b)) => a == b,
            (InvalidKBin(a), InvalidKBin(b)) => a == b,
            (InvalidAngle(a), InvalidAngle(b)) => a == b,
            (InvalidBinEdges, InvalidBinEdges) => true,
            (EmptyBinning, EmptyBinning) => true,

            // The pool build error is not comparable: equal if same variant
            (WorkerPool(_), WorkerPool(_)) => true,

            _ => false,
        }
    }
}
