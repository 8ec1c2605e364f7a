use crate::dialect::func::FuncOp;
use crate::ir::registry;
use crate::ir::AnyOp;
use crate::ir::FunctionType;
use crate::ir::Location;
use crate::ir::ModuleOp;
use crate::ir::Type;
use crate::ir::Value;
use crate::parser::scanner::Scanner;
use crate::parser::token::Token;
use crate::parser::token::TokenKind;
use crate::scope::SymbolTable;
use crate::Error;
use crate::Result;
use tracing::debug;
use tracing::trace;

/// Interface to define parsing of operations.
///
/// The base parser has already consumed the result names and the mnemonic
/// when `op` is called. The implementation parses the rest of the line,
/// including the trailing location, and builds the op through its verifying
/// constructor.
pub trait Parse {
    fn op(parser: &mut Parser) -> Result<AnyOp>
    where
        Self: Sized;
}

/// Parser for textual IR.
///
/// Holds the token stream plus two name tables: `%name` to [Value] for the
/// scopes that are currently open and `@name` to the signature of every
/// function in the module.
pub struct Parser {
    src: String,
    file: String,
    tokens: Vec<Token>,
    current: usize,
    values: SymbolTable<Value>,
    functions: SymbolTable<FunctionType>,
}

impl Parser {
    pub fn new(src: &str, file: &str) -> Result<Self> {
        Ok(Parser {
            src: src.to_string(),
            file: file.to_string(),
            tokens: Scanner::scan(src, file)?,
            current: 0,
            values: SymbolTable::new(),
            functions: SymbolTable::new(),
        })
    }
    /// Parse a module from `src`.
    ///
    /// Top-level functions without a surrounding `module { ... }` are wrapped
    /// in an implicit module.
    pub fn parse(src: &str) -> Result<ModuleOp> {
        Parser::parse_file(src, "-")
    }
    pub fn parse_file(src: &str, file: &str) -> Result<ModuleOp> {
        let mut parser = Parser::new(src, file)?;
        let module = parser.parse_module()?;
        parser.expect(TokenKind::Eof)?;
        Ok(module)
    }
    pub fn file(&self) -> &str {
        &self.file
    }
    pub fn current_token(&self) -> &Token {
        // The token list always ends with Eof and `advance` never moves past it.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }
    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }
    pub fn peek_n(&self, n: usize) -> &Token {
        let index = (self.current + n).min(self.tokens.len() - 1);
        &self.tokens[index]
    }
    /// Remember the position in the token stream so it can be restored with
    /// [Parser::rewind].
    pub fn checkpoint(&self) -> usize {
        self.current
    }
    pub fn rewind(&mut self, checkpoint: usize) {
        self.current = checkpoint;
    }
    pub fn is_at_end(&self) -> bool {
        self.current_token_kind() == TokenKind::Eof
    }
    /// Move past the current token and return it.
    pub fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }
    pub fn check(&self, kind: TokenKind) -> bool {
        self.current_token_kind() == kind
    }
    pub fn check_lexeme(&self, kind: TokenKind, lexeme: &str) -> bool {
        let token = self.current_token();
        token.kind == kind && token.lexeme == lexeme
    }
    /// Drop the current token after checking it against the expectations.
    pub fn drop_token(&mut self, expected: Option<&str>, kind: Option<TokenKind>) -> Result<Token> {
        let token = self.current_token().clone();
        if let Some(kind) = kind {
            if token.kind != kind {
                return Err(self.error_at(&token, &format!("{kind:?}")));
            }
        }
        if let Some(expected) = expected {
            if token.lexeme != expected {
                return Err(self.error_at(&token, &format!("`{expected}`")));
            }
        }
        Ok(self.advance())
    }
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        self.drop_token(None, Some(kind))
    }
    pub fn expect_lexeme(&mut self, kind: TokenKind, lexeme: &str) -> Result<Token> {
        self.drop_token(Some(lexeme), Some(kind))
    }
    /// Location of a token in the text that is being parsed.
    pub fn location_of(&self, token: &Token) -> Location {
        Location::file_line_col(&self.file, token.line(), token.column())
    }
    pub fn error_with(&self, token: &Token, expected: &str, actual: &str) -> Error {
        let msg = format!("Expected {expected}, but got {actual}");
        let snippet = Scanner::error(&self.src, &token.position, &msg);
        Error::Parse {
            location: self.location_of(token),
            expected: expected.to_string(),
            actual: actual.to_string(),
            snippet: format!("\n{snippet}"),
        }
    }
    /// Parse error saying that `expected` was wanted instead of `token`.
    pub fn error_at(&self, token: &Token, expected: &str) -> Error {
        self.error_with(token, expected, &token.describe())
    }
    pub fn parse_string(&mut self) -> Result<String> {
        let token = self.expect(TokenKind::String)?;
        let lexeme = token.lexeme.as_str();
        let body = &lexeme[1..lexeme.len() - 1];
        Ok(crate::ir::unescape(body))
    }
    pub fn parse_usize(&mut self) -> Result<usize> {
        let token = self.expect(TokenKind::Integer)?;
        token
            .lexeme
            .parse::<usize>()
            .map_err(|_| self.error_at(&token, "a non-negative integer"))
    }
}

impl Parser {
    pub fn enter_scope(&mut self) {
        self.values.push();
        trace!("Entered scope {}", self.values.depth());
    }
    /// Enter a scope in which values of the enclosing scopes are invisible.
    pub fn enter_isolated_scope(&mut self) {
        self.values.push_isolated();
        trace!("Entered isolated scope {}", self.values.depth());
    }
    pub fn leave_scope(&mut self) {
        trace!("Leaving scope {}", self.values.depth());
        self.values.pop();
    }
    /// Bind `%name` to `value` in the innermost scope.
    pub fn define_var(&mut self, name: &str, value: Value) -> Result<()> {
        if self.values.contains_in_current(&name.to_string()) {
            let token = self.current_token().clone();
            let actual = format!("redefinition of `{name}`");
            return Err(self.error_with(&token, "a fresh value name", &actual));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }
    pub fn lookup_var(&self, name: &str) -> Option<Value> {
        self.values.lookup(&name.to_string()).cloned()
    }
    /// Register the signature of `@name` at module level.
    ///
    /// Declaring the same signature twice is fine; a different signature
    /// under the same name is not.
    pub fn define_function(&mut self, token: &Token, name: &str, typ: FunctionType) -> Result<()> {
        if let Some(existing) = self.functions.lookup(&name.to_string()) {
            if *existing == typ {
                return Ok(());
            }
            let msg = format!("function @{name} is already defined with type {existing}");
            return Err(Error::verification(&self.location_of(token), msg));
        }
        self.functions.insert(name.to_string(), typ);
        Ok(())
    }
    pub fn lookup_function(&self, name: &str) -> Option<&FunctionType> {
        self.functions.lookup(&name.to_string())
    }
    /// Parse `%name` and resolve it in the visible scopes.
    pub fn parse_operand(&mut self) -> Result<Value> {
        let token = self.expect(TokenKind::PercentIdentifier)?;
        match self.lookup_var(&token.lexeme) {
            Some(value) => Ok(value),
            None => Err(Error::unresolved(&self.location_of(&token), &token.lexeme)),
        }
    }
    /// Parse `%a, %b, ...` up to (not including) `end`.
    pub fn parse_operand_list(&mut self, end: TokenKind) -> Result<Vec<Value>> {
        let mut operands = vec![];
        if self.check(end) {
            return Ok(operands);
        }
        operands.push(self.parse_operand()?);
        while self.check(TokenKind::Comma) {
            self.advance();
            operands.push(self.parse_operand()?);
        }
        Ok(operands)
    }
    /// Parse `%x : type` and check the annotation against the value.
    pub fn parse_typed_operand(&mut self) -> Result<Value> {
        let token = self.current_token().clone();
        let operand = self.parse_operand()?;
        self.expect(TokenKind::Colon)?;
        let typ = self.parse_type()?;
        self.verify_type(&token, &operand, &typ)?;
        Ok(operand)
    }
    /// Check that a type written next to an operand is the operand's type.
    pub fn verify_type(&self, token: &Token, operand: &Value, typ: &Type) -> Result<()> {
        if operand.typ() == typ {
            Ok(())
        } else {
            let msg = format!(
                "Expected {} due to {}, but got {typ}",
                operand.typ(),
                token.lexeme
            );
            Err(Error::verification(&self.location_of(token), msg))
        }
    }
    /// Parse one operation: `(%res (, %res)* =)? mnemonic <format> loc(...)`.
    pub fn parse_op(&mut self) -> Result<AnyOp> {
        let names = self.parse_op_result_names()?;
        let token = self.current_token().clone();
        let name = self.parse_operation_name()?;
        let kind = match registry().get_kind(name.as_str()) {
            Some(kind) => kind,
            None => return Err(self.error_at(&token, "a registered operation")),
        };
        debug!("Parsing {name}");
        let op = kind.parse(self)?;
        let results = op.operation().results();
        if !names.is_empty() && names.len() != results.len() {
            let expected = format!("{} result name(s) for `{name}`", results.len());
            let actual = format!("{} name(s)", names.len());
            return Err(self.error_with(&token, &expected, &actual));
        }
        for (name, value) in names.iter().zip(results) {
            self.define_var(name, value.clone())?;
        }
        Ok(op)
    }
    /// Parse ops until the closing `}` (which is not consumed).
    pub fn parse_ops_until_rbrace(&mut self) -> Result<Vec<AnyOp>> {
        let mut ops = vec![];
        while !self.check(TokenKind::RBrace) {
            if self.is_at_end() {
                let token = self.current_token().clone();
                return Err(self.error_at(&token, "`}`"));
            }
            let token = self.current_token().clone();
            if token.kind == TokenKind::BareIdentifier && FuncOp::is_mnemonic(&token.lexeme) {
                let expected = "an operation inside a function body";
                return Err(self.error_with(&token, expected, "a nested function"));
            }
            ops.push(self.parse_op()?);
        }
        Ok(ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_token_checks_expectations() {
        let mut parser = Parser::new("module { }", "in.mlir").unwrap();
        assert_eq!(parser.current_token().lexeme, "module");
        assert_eq!(parser.current_token_kind(), TokenKind::BareIdentifier);
        let err = parser.drop_token(Some("func"), None).unwrap_err();
        match err {
            Error::Parse {
                location,
                expected,
                actual,
                ..
            } => {
                assert_eq!(location, Location::file_line_col("in.mlir", 1, 1));
                assert_eq!(expected, "`func`");
                assert_eq!(actual, "`module`");
            }
            _ => panic!("expected a parse error"),
        }
        parser.drop_token(Some("module"), None).unwrap();
        parser.expect(TokenKind::LBrace).unwrap();
        parser.expect(TokenKind::RBrace).unwrap();
        assert!(parser.is_at_end());
        // Advancing at the end stays at the end.
        assert_eq!(parser.advance().kind, TokenKind::Eof);
        assert_eq!(parser.advance().kind, TokenKind::Eof);
    }

    #[test]
    fn error_contains_snippet() {
        let mut parser = Parser::new("module {\n  toy.foo\n}", "-").unwrap();
        parser.expect(TokenKind::BareIdentifier).unwrap();
        let err = parser.expect(TokenKind::RBrace).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("parse error at loc(\"-\":1:8)"), "{msg}");
        assert!(msg.contains("1  | module {"), "{msg}");
    }

    #[test]
    fn scopes() {
        let mut parser = Parser::new("%a %b", "-").unwrap();
        let a = Value::op_result(Type::f64_tensor(), 0);
        parser.define_var("%a", a.clone()).unwrap();
        assert!(parser.define_var("%a", a.clone()).is_err());
        parser.enter_scope();
        assert_eq!(parser.lookup_var("%a"), Some(a.clone()));
        parser.leave_scope();
        parser.enter_isolated_scope();
        assert_eq!(parser.lookup_var("%a"), None);
        let err = parser.parse_operand().unwrap_err();
        assert!(matches!(err, Error::UnresolvedSymbol { .. }));
        parser.leave_scope();
        let err = parser.parse_operand().unwrap_err();
        assert_eq!(
            err,
            Error::unresolved(&Location::file_line_col("-", 1, 4), "%b")
        );
    }

    #[test]
    fn unknown_mnemonic() {
        let mut parser = Parser::new("%0 = toy.unknown %1", "-").unwrap();
        let err = parser.parse_op().unwrap_err();
        match err {
            Error::Parse {
                expected, actual, ..
            } => {
                assert_eq!(expected, "a registered operation");
                assert_eq!(actual, "`toy.unknown`");
            }
            _ => panic!("expected a parse error"),
        }
    }
}
