use crate::Error;
use crate::Result;
use std::fmt::Display;
use std::fmt::Formatter;

/// Position of a token in a toy source file (1-based).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: &str, line: usize, column: usize) -> Self {
        Location {
            file: file.to_string(),
            line,
            column,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl From<&Location> for toyir::ir::Location {
    fn from(location: &Location) -> Self {
        toyir::ir::Location::file_line_col(&location.file, location.line, location.column)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Eof,

    // Keywords
    Def,
    Var,
    Return,

    Identifier(String),
    Number(f64),

    // Punctuation
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Less,
    Greater,
    Equal,
    Plus,
    Minus,
    Star,
}

impl TokenKind {
    /// The operator character for the binary operator tokens.
    pub fn binary_operator(&self) -> Option<char> {
        match self {
            TokenKind::Plus => Some('+'),
            TokenKind::Minus => Some('-'),
            TokenKind::Star => Some('*'),
            _ => None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Def => write!(f, "def"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Identifier(name) => write!(f, "{name}"),
            TokenKind::Number(value) => write!(f, "{value}"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Less => write!(f, "<"),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::Equal => write!(f, "="),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

/// Turns toy source text into tokens.
///
/// The token list always ends with a single [TokenKind::Eof].
pub struct Lexer {
    source: Vec<char>,
    file: String,
    tokens: Vec<Token>,
    start: usize,
    start_line: usize,
    start_column: usize,
    current: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(source: &str, file: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            file: file.to_string(),
            tokens: vec![],
            start: 0,
            start_line: 1,
            start_column: 1,
            current: 0,
            line: 1,
            column: 1,
        }
    }
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }
    fn peek_n(&self, n: usize) -> char {
        match self.source.get(self.current + n) {
            Some(c) => *c,
            None => '\0',
        }
    }
    fn peek(&self) -> char {
        self.peek_n(0)
    }
    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }
    fn location(&self) -> Location {
        Location::new(&self.file, self.start_line, self.start_column)
    }
    fn add_token(&mut self, kind: TokenKind) {
        let location = self.location();
        self.tokens.push(Token { kind, location });
    }
    fn digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }
    /// Scan `42`, `4.2`, `4.2e-1`, or `4e2`.
    fn number(&mut self) -> Result<()> {
        self.digits();
        if self.peek() == '.' && self.peek_n(1).is_ascii_digit() {
            self.advance();
            self.digits();
        }
        if self.peek() == 'e' || self.peek() == 'E' {
            let next = self.peek_n(1);
            let signed = (next == '+' || next == '-') && self.peek_n(2).is_ascii_digit();
            if next.is_ascii_digit() || signed {
                self.advance();
                if signed {
                    self.advance();
                }
                self.digits();
            }
        }
        let lexeme = self.lexeme();
        match lexeme.parse::<f64>() {
            Ok(value) => {
                self.add_token(TokenKind::Number(value));
                Ok(())
            }
            Err(_) => Err(Error::Lex {
                location: self.location(),
                message: format!("invalid number `{lexeme}`"),
            }),
        }
    }
    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }
        let kind = match self.lexeme().as_str() {
            "def" => TokenKind::Def,
            "var" => TokenKind::Var,
            "return" => TokenKind::Return,
            name => TokenKind::Identifier(name.to_string()),
        };
        self.add_token(kind);
    }
    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();
        let kind = match c {
            ' ' | '\t' | '\r' | '\n' => return Ok(()),
            '#' => {
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
                return Ok(());
            }
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            '=' => TokenKind::Equal,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            c if c.is_ascii_digit() => return self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => {
                self.identifier();
                return Ok(());
            }
            c => {
                return Err(Error::Lex {
                    location: self.location(),
                    message: format!("unexpected character `{c}`"),
                })
            }
        };
        self.add_token(kind);
        Ok(())
    }
    /// Tokenize `source`, attributing every token to `file`.
    pub fn scan(source: &str, file: &str) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(source, file);
        while !lexer.is_at_end() {
            lexer.start = lexer.current;
            lexer.start_line = lexer.line;
            lexer.start_column = lexer.column;
            lexer.scan_token()?;
        }
        lexer.start = lexer.current;
        lexer.start_line = lexer.line;
        lexer.start_column = lexer.column;
        lexer.add_token(TokenKind::Eof);
        Ok(lexer.tokens)
    }
}
