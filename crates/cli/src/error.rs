//! Failures of a `folio` invocation and the exit status each one ends with.
//!
//! | Code | Meaning |
//! |---|---|
//! | 2 | bad arguments (reported by clap) |
//! | 10 | the particle field could not be built |
//! | 11 | the PNG could not be written |
//! | 12 | a flag value was rejected: palette, colour or `--params` |
//! | 13 | the `--json` report could not be produced |

use folio_core::FieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Field(FieldError),

    #[error("{0}")]
    Io(String),

    /// Rejected user input; the message names the offending flag or value.
    #[error("{0}")]
    Input(String),

    #[error("could not encode report: {0}")]
    Serialization(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Field(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

/// Palette and colour lookups only fail on values the user typed, so they
/// count as input errors rather than simulation errors.
impl From<FieldError> for CliError {
    fn from(e: FieldError) -> Self {
        match e {
            FieldError::Io(msg) => CliError::Io(msg),
            FieldError::UnknownPalette(_) | FieldError::InvalidColor(_) => {
                CliError::Input(e.to_string())
            }
            other => CliError::Field(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
