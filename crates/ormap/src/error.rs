//! Facade error types.

use thiserror::Error;

/// Errors from any ORMAP layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Model, translation, batch, sort or schema error.
    #[error(transparent)]
    Core(#[from] ormap_core::Error),

    /// SQL template error.
    #[cfg(feature = "template")]
    #[error(transparent)]
    Template(#[from] ormap_template::TemplateError),
}

impl From<ormap_core::ParseError> for Error {
    fn from(err: ormap_core::ParseError) -> Self {
        Error::Core(err.into())
    }
}

/// Result type alias for facade operations.
pub type Result<T> = std::result::Result<T, Error>;
