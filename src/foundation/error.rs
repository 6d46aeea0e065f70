/// Convenience result type used across spreadmap.
pub type SpreadResult<T> = Result<T, SpreadError>;

/// Top-level error taxonomy used by the fetch, dataset and render APIs.
#[derive(thiserror::Error, Debug)]
pub enum SpreadError {
    /// Invalid user-provided options.
    #[error("validation error: {0}")]
    Validation(String),

    /// Upstream tables that do not have the expected shape.
    #[error("data error: {0}")]
    Data(String),

    /// Errors while downloading the case tables.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Errors while building or rasterising a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem errors on the frame or data directories.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpreadError {
    /// Build a [`SpreadError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SpreadError::Data`] value.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Build a [`SpreadError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`SpreadError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`SpreadError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
