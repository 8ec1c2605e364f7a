use crate::ir::Location;
use thiserror::Error;

/// Everything that can go wrong while reading, building, or printing IR.
///
/// None of these are recovered from internally. A failure aborts the current
/// parse or construction and is handed back to the caller as is.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// Invalid character or unterminated string in the input text.
    #[error("lex error at {location}: {message}")]
    Lex { location: Location, message: String },
    /// Token mismatch, unknown mnemonic, or malformed op syntax.
    #[error("parse error at {location}: expected {expected}, but got {actual}{snippet}")]
    Parse {
        location: Location,
        expected: String,
        actual: String,
        /// Source excerpt pointing at the offending token (may be empty).
        snippet: String,
    },
    /// A structural invariant of an operation does not hold.
    #[error("verification error at {location}: {message}")]
    Verification { location: Location, message: String },
    /// `%name` or `@name` used before it was defined in a visible scope.
    #[error("unresolved symbol `{name}` at {location}")]
    UnresolvedSymbol { location: Location, name: String },
}

impl Error {
    pub fn verification(location: &Location, message: impl Into<String>) -> Self {
        Error::Verification {
            location: location.clone(),
            message: message.into(),
        }
    }
    pub fn unresolved(location: &Location, name: impl Into<String>) -> Self {
        Error::UnresolvedSymbol {
            location: location.clone(),
            name: name.into(),
        }
    }
    pub fn location(&self) -> &Location {
        match self {
            Error::Lex { location, .. } => location,
            Error::Parse { location, .. } => location,
            Error::Verification { location, .. } => location,
            Error::UnresolvedSymbol { location, .. } => location,
        }
    }
    pub fn is_verification(&self) -> bool {
        matches!(self, Error::Verification { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
