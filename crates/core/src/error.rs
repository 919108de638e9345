//! Error types for the folio core.

use thiserror::Error;

/// Errors produced while building or configuring a particle field.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Width or height was zero when sizing a canvas or flow field.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A CSS color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A palette could not be constructed from the given colors.
    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    /// No preset is registered under the given name.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// No built-in palette has the given name.
    #[error("unknown palette: {0}")]
    UnknownPalette(String),

    /// Writing a snapshot or other output failed.
    #[error("i/o failure: {0}")]
    Io(String),
}
