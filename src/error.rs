use std::path::PathBuf;

pub type GvResult<T> = Result<T, GvError>;

#[derive(thiserror::Error, Debug)]
pub enum GvError {
    #[error("io error: {0}")]
    Io(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error(
        "dimension mismatch: '{path}' is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}"
    )]
    DimensionMismatch {
        path: PathBuf,
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("encode cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GvError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
