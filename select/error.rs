use thiserror::Error;

/// Every way a selection call can fail. All of these are detected before any
/// result is assembled; no partial selections are ever returned.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Eigendecomposition failed: {0}")]
    Eigendecomposition(#[from] ndarray_linalg::error::LinalgError),
}

impl SelectionError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SelectionError::InvalidArgument(msg.into())
    }

    pub(crate) fn numerical(msg: impl Into<String>) -> Self {
        SelectionError::Numerical(msg.into())
    }
}
