use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Markers
    Eof,

    // Identifiers
    /// foo, toy.add, xf64
    BareIdentifier,
    /// @foo
    AtIdentifier,
    /// %foo
    PercentIdentifier,

    // Literals
    /// 1.0, 2.5e-3
    FloatLiteral,
    /// 42
    Integer,
    /// "foo"
    String,

    // Punctuation
    /// ->
    Arrow,
    /// :
    Colon,
    /// ,
    Comma,
    /// =
    Equal,
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// -
    Minus,
    /// +
    Plus,
    /// !
    Exclamation,
    /// >
    Greater,
    /// <
    Less,
    /// *
    Star,
    /// ?
    Question,
}

impl TokenKind {
    pub fn is_number(&self) -> bool {
        matches!(self, TokenKind::FloatLiteral | TokenKind::Integer)
    }
}

/// Position of a token inside the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// The line number of the token (1-based).
    line: usize,
    /// The column number of the token (1-based).
    column: usize,
    /// The character offset in the raw source string.
    start: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Position {
    pub fn new(line: usize, column: usize, start: usize) -> Self {
        Self {
            line,
            column,
            start,
        }
    }
    pub fn line(&self) -> usize {
        self.line
    }
    pub fn column(&self) -> usize {
        self.column
    }
    pub fn start(&self) -> usize {
        self.start
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The kind of token, such as `@foo` (AtIdentifier) or `42` (Integer).
    pub kind: TokenKind,
    /// The text of the token, such as `@foo` or `42`.
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, position: Position) -> Self {
        Self {
            kind,
            lexeme,
            position,
        }
    }
    pub fn line(&self) -> usize {
        self.position.line()
    }
    pub fn column(&self) -> usize {
        self.position.column()
    }
    /// Human-readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", self.lexeme),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} \"{}\" {}", self.kind, self.lexeme, self.position)
    }
}
