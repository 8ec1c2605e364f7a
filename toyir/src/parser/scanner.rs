use crate::ir::Location;
use crate::parser::token::Position;
use crate::parser::token::Token;
use crate::parser::token::TokenKind;
use crate::Error;
use crate::Result;

pub struct Scanner {
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

impl Scanner {
    fn new(source: &str, file: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            file: file.to_string(),
            tokens: Vec::new(),
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
    fn peek(&self) -> char {
        self.peek_n(0)
    }
    fn peek_next(&self) -> char {
        self.peek_n(1)
    }
    fn peek_n(&self, n: usize) -> char {
        match self.source.get(self.current + n) {
            Some(c) => *c,
            None => '\0',
        }
    }
    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }
    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = if kind == TokenKind::Eof {
            "".to_string()
        } else {
            self.lexeme()
        };
        let position = Position::new(self.start_line, self.start_column, self.start);
        self.tokens.push(Token::new(kind, lexeme, position));
    }
    fn lex_error(&self, msg: &str) -> Error {
        let position = Position::new(self.start_line, self.start_column, self.start);
        let src: String = self.source.iter().collect();
        let snippet = Scanner::error(&src, &position, msg);
        Error::Lex {
            location: Location::file_line_col(&self.file, position.line(), position.column()),
            message: format!("{msg}\n{snippet}"),
        }
    }
    fn digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }
    /// Scan `42`, `4.2`, `4.2e-1`, or `4e2`.
    ///
    /// Signs are separate tokens. A dimension list such as `2x3xf64` scans as
    /// `2` followed by the identifier `x3xf64`.
    fn number(&mut self) {
        self.digits();
        let mut is_float = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance();
            self.digits();
        }
        if self.peek() == 'e' || self.peek() == 'E' {
            let next = self.peek_next();
            let signed = (next == '+' || next == '-') && self.peek_n(2).is_ascii_digit();
            if next.is_ascii_digit() || signed {
                is_float = true;
                self.advance();
                if signed {
                    self.advance();
                }
                self.digits();
            }
        }
        if is_float {
            self.add_token(TokenKind::FloatLiteral);
        } else {
            self.add_token(TokenKind::Integer);
        }
    }
    // Whether the character is a valid identifier start character.
    fn is_identifier_start(c: char) -> bool {
        c.is_alphabetic() || c == '_'
    }
    // Whether the character is a valid identifier character.
    fn is_identifier(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c == '.' || c == '$'
    }
    fn identifier(&mut self, kind: TokenKind) -> Result<()> {
        if kind != TokenKind::BareIdentifier && !Scanner::is_identifier(self.peek()) {
            return Err(self.lex_error("Expected an identifier after the sigil"));
        }
        while Scanner::is_identifier(self.peek()) {
            self.advance();
        }
        self.add_token(kind);
        Ok(())
    }
    fn arrow_or_minus(&mut self) {
        if self.peek() == '>' {
            self.advance();
            self.add_token(TokenKind::Arrow);
        } else {
            self.add_token(TokenKind::Minus);
        }
    }
    /// Scan a double-quoted string; backslash escapes the next character.
    fn string(&mut self) -> Result<()> {
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(self.lex_error("Unterminated string"));
            }
            match self.advance() {
                '"' => break,
                '\\' => {
                    if self.is_at_end() {
                        return Err(self.lex_error("Unterminated string"));
                    }
                    self.advance();
                }
                _ => (),
            }
        }
        self.add_token(TokenKind::String);
        Ok(())
    }
    fn comment(&mut self) {
        while self.peek() != '\n' && !self.is_at_end() {
            self.advance();
        }
    }
    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LParen),
            ')' => self.add_token(TokenKind::RParen),
            '{' => self.add_token(TokenKind::LBrace),
            '}' => self.add_token(TokenKind::RBrace),
            '[' => self.add_token(TokenKind::LBracket),
            ']' => self.add_token(TokenKind::RBracket),
            ':' => self.add_token(TokenKind::Colon),
            ',' => self.add_token(TokenKind::Comma),
            '=' => self.add_token(TokenKind::Equal),
            '!' => self.add_token(TokenKind::Exclamation),
            '>' => self.add_token(TokenKind::Greater),
            '<' => self.add_token(TokenKind::Less),
            '*' => self.add_token(TokenKind::Star),
            '?' => self.add_token(TokenKind::Question),
            ' ' | '\r' | '\t' | '\n' => (),
            '/' if self.peek() == '/' => self.comment(),
            '-' => self.arrow_or_minus(),
            '+' => self.add_token(TokenKind::Plus),
            '"' => self.string()?,
            '@' => self.identifier(TokenKind::AtIdentifier)?,
            '%' => self.identifier(TokenKind::PercentIdentifier)?,
            s if s.is_ascii_digit() => self.number(),
            s if Scanner::is_identifier_start(s) => self.identifier(TokenKind::BareIdentifier)?,
            _ => {
                return Err(self.lex_error(&format!("Scanning failed starting at: {c}")));
            }
        }
        Ok(())
    }
    fn scan_tokens(&mut self) -> Result<()> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token()?;
        }
        self.start = self.current;
        self.start_line = self.line;
        self.start_column = self.column;
        self.add_token(TokenKind::Eof);
        Ok(())
    }
    /// Scan the whole source into tokens, ending with [TokenKind::Eof].
    pub fn scan(src: &str, file: &str) -> Result<Vec<Token>> {
        let mut scanner = Scanner::new(src, file);
        scanner.scan_tokens()?;
        Ok(scanner.tokens)
    }
    /// Render a source excerpt with a caret under `position`.
    pub fn error(src: &str, position: &Position, msg: &str) -> String {
        let lines = src.split('\n').collect::<Vec<&str>>();
        let n = position.line();
        let prev_line = if n > 1 {
            let prev_n = n - 1;
            let prev = lines.get(prev_n - 1).copied().unwrap_or("");
            format!("\n{prev_n}  | {prev}")
        } else {
            "".to_string()
        };
        let line = lines.get(n - 1).copied().unwrap_or("");
        let line_num_width = 4 + n.to_string().len();
        let err_indent = " ".repeat(position.column() - 1 + line_num_width);
        format!("```{prev_line}\n{n}  | {line}\n{err_indent}^ {msg}\n```")
    }
}
