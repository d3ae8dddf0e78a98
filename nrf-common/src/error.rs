//! Common error types for the NRF quote wizard

use thiserror::Error;

/// Common result type for wizard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the core and the HTTP service
///
/// User input problems are not represented here: those surface as
/// [`crate::FieldError`] lists and are rendered back to the citizen.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page graph defect, e.g. a page that must advance has no next edge
    #[error("Page configuration error: {0}")]
    Configuration(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
