use crate::lexer::Location;
use thiserror::Error;

/// Errors of the toy front end.
///
/// IR errors raised while building operations pass through unchanged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("lex error at {location}: {message}")]
    Lex { location: Location, message: String },
    #[error("parse error at {location}: {message}")]
    Parse { location: Location, message: String },
    #[error("codegen error at {location}: {message}")]
    Gen { location: Location, message: String },
    #[error(transparent)]
    Ir(#[from] toyir::Error),
}

impl Error {
    pub fn gen(location: &Location, message: impl Into<String>) -> Self {
        Error::Gen {
            location: location.clone(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
