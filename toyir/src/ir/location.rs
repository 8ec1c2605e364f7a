use crate::parser::Parser;
use crate::parser::TokenKind;
use crate::Result;
use std::fmt::Display;
use std::fmt::Formatter;

/// Source location attached to operations.
///
/// Printed as `loc(unknown)` or `loc("file.toy":1:2)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Location {
    #[default]
    Unknown,
    FileLineCol {
        file: String,
        line: usize,
        column: usize,
    },
}

impl Location {
    pub fn file_line_col(file: &str, line: usize, column: usize) -> Self {
        Location::FileLineCol {
            file: file.to_string(),
            line,
            column,
        }
    }
    pub fn is_unknown(&self) -> bool {
        matches!(self, Location::Unknown)
    }
}

pub fn escape(src: &str) -> String {
    src.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

/// Inverse of [escape] for the body of a string literal (without quotes).
pub fn unescape(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Unknown => write!(f, "loc(unknown)"),
            Location::FileLineCol { file, line, column } => {
                write!(f, "loc(\"{}\":{line}:{column})", escape(file))
            }
        }
    }
}

impl Parser {
    /// Parse `loc(unknown)` or `loc("file":line:col)`.
    pub fn parse_location(&mut self) -> Result<Location> {
        self.expect_lexeme(TokenKind::BareIdentifier, "loc")?;
        self.expect(TokenKind::LParen)?;
        let location = if self.check(TokenKind::String) {
            let file = self.parse_string()?;
            self.expect(TokenKind::Colon)?;
            let line = self.parse_usize()?;
            self.expect(TokenKind::Colon)?;
            let column = self.parse_usize()?;
            Location::FileLineCol { file, line, column }
        } else {
            self.expect_lexeme(TokenKind::BareIdentifier, "unknown")?;
            Location::Unknown
        };
        self.expect(TokenKind::RParen)?;
        Ok(location)
    }
    /// Parse a location if the next token starts one.
    pub fn parse_optional_location(&mut self) -> Result<Option<Location>> {
        if self.check_lexeme(TokenKind::BareIdentifier, "loc") {
            Ok(Some(self.parse_location()?))
        } else {
            Ok(None)
        }
    }
    /// Parse the location that ends an operation; a missing one is unknown.
    pub fn parse_trailing_location(&mut self) -> Result<Location> {
        Ok(self.parse_optional_location()?.unwrap_or_default())
    }
}
