/// Convenience result type used across layermix.
pub type LayermixResult<T> = Result<T, LayermixError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Per-combination failures during export are not surfaced through this type; they are
/// aggregated into [`crate::ExportReport`] instead.
#[derive(thiserror::Error, Debug)]
pub enum LayermixError {
    /// Invalid layer model, canvas or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image variant could not be decoded into a raster.
    #[error("decode error: {0}")]
    Decode(String),

    /// A combination could not be blended (size mismatch, malformed raster).
    #[error("composite error: {0}")]
    Composite(String),

    /// Filesystem failures outside per-combination writes.
    #[error("io error: {0}")]
    Io(String),

    /// Errors when serializing or deserializing project files.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LayermixError {
    /// Build a [`LayermixError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LayermixError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`LayermixError::Composite`] value.
    pub fn composite(msg: impl Into<String>) -> Self {
        Self::Composite(msg.into())
    }

    /// Build a [`LayermixError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`LayermixError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
