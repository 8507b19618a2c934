use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpotError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Degenerate shape: {0}")]
    DegenerateShape(String),

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Frame dimensions mismatch: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Empty frame stack")]
    EmptyStack,

    #[error("Peak search cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SpotError>;
