use crate::ast::ExprAst;
use crate::ast::FunctionAst;
use crate::ast::ModuleAst;
use crate::ast::PrototypeAst;
use crate::lexer::Lexer;
use crate::lexer::Location;
use crate::lexer::Token;
use crate::lexer::TokenKind;
use crate::Error;
use crate::Result;
use tracing::debug;

/// Recursive descent parser for toy source.
///
/// ```ebnf
/// module     ::= definition*
/// definition ::= prototype block
/// prototype  ::= 'def' id '(' (id (',' id)*)? ')'
/// block      ::= '{' (stmt ';'+)* '}'
/// stmt       ::= decl | 'return' expr? | expr
/// decl       ::= 'var' id ('<' num (',' num)* '>')? '=' expr
/// primary    ::= id | id '(' args ')' | num | '(' expr ')' | literal
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

/// Binding strength of a binary operator, or `None` for anything else.
fn precedence(kind: &TokenKind) -> Option<i32> {
    match kind.binary_operator()? {
        '-' | '+' => Some(20),
        '*' => Some(40),
        _ => None,
    }
}

impl Parser {
    pub fn new(src: &str, file: &str) -> Result<Self> {
        let tokens = Lexer::scan(src, file)?;
        Ok(Parser { tokens, current: 0 })
    }
    /// Parse a whole toy file.
    pub fn parse(src: &str, file: &str) -> Result<ModuleAst> {
        let mut parser = Parser::new(src, file)?;
        parser.parse_module()
    }
    fn current(&self) -> &Token {
        // The lexer always ends the tokens with `Eof`, which is never consumed.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }
    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }
    fn location(&self) -> Location {
        self.current().location.clone()
    }
    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }
    fn error(&self, expected: &str, context: &str) -> Error {
        Error::Parse {
            location: self.location(),
            message: format!("expected \"{expected}\" {context}, but got `{}`", self.kind()),
        }
    }
    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token> {
        if *self.kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.error(&kind.to_string(), context))
        }
    }
    fn expect_identifier(&mut self, what: &str, context: &str) -> Result<String> {
        match self.kind().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(what, context)),
        }
    }
    pub fn parse_module(&mut self) -> Result<ModuleAst> {
        let mut functions = vec![];
        while *self.kind() != TokenKind::Eof {
            functions.push(self.parse_definition()?);
        }
        Ok(ModuleAst { functions })
    }
    fn parse_definition(&mut self) -> Result<FunctionAst> {
        let proto = self.parse_prototype()?;
        debug!("Parsing toy function {}", proto.name);
        let body = self.parse_block()?;
        Ok(FunctionAst { proto, body })
    }
    fn parse_prototype(&mut self) -> Result<PrototypeAst> {
        let location = self.location();
        self.expect(TokenKind::Def, "in prototype")?;
        let name = self.expect_identifier("function name", "in prototype")?;
        self.expect(TokenKind::LParen, "in prototype")?;
        let mut args = vec![];
        if *self.kind() != TokenKind::RParen {
            loop {
                args.push(self.expect_identifier("identifier", "in argument list")?);
                if *self.kind() != TokenKind::Comma {
                    break;
                }
                self.advance();
            }
        }
        self.expect(TokenKind::RParen, "to end function prototype")?;
        Ok(PrototypeAst {
            location,
            name,
            args,
        })
    }
    fn skip_semicolons(&mut self) {
        while *self.kind() == TokenKind::Semicolon {
            self.advance();
        }
    }
    fn parse_block(&mut self) -> Result<Vec<ExprAst>> {
        self.expect(TokenKind::LBrace, "to begin block")?;
        let mut exprs = vec![];
        self.skip_semicolons();
        while !matches!(self.kind(), TokenKind::RBrace | TokenKind::Eof) {
            let expr = match self.kind() {
                TokenKind::Var => self.parse_declaration()?,
                TokenKind::Return => self.parse_return()?,
                _ => self.parse_expression()?,
            };
            exprs.push(expr);
            if *self.kind() != TokenKind::Semicolon {
                return Err(self.error(";", "after expression"));
            }
            self.skip_semicolons();
        }
        self.expect(TokenKind::RBrace, "to close block")?;
        Ok(exprs)
    }
    fn parse_return(&mut self) -> Result<ExprAst> {
        let location = self.expect(TokenKind::Return, "in return")?.location;
        let value = if *self.kind() == TokenKind::Semicolon {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        Ok(ExprAst::Return { location, value })
    }
    fn parse_dimension(&mut self) -> Result<i64> {
        match self.kind().clone() {
            TokenKind::Number(value)
                if value.fract() == 0.0 && 0.0 <= value && value < i64::MAX as f64 =>
            {
                self.advance();
                Ok(value as i64)
            }
            _ => Err(self.error("non-negative integer", "in type")),
        }
    }
    /// Parse `<2, 3>`.
    fn parse_shape(&mut self) -> Result<Vec<i64>> {
        self.expect(TokenKind::Less, "to begin type")?;
        let mut shape = vec![self.parse_dimension()?];
        while *self.kind() == TokenKind::Comma {
            self.advance();
            shape.push(self.parse_dimension()?);
        }
        self.expect(TokenKind::Greater, "to end type")?;
        Ok(shape)
    }
    fn parse_declaration(&mut self) -> Result<ExprAst> {
        let location = self.expect(TokenKind::Var, "in declaration")?.location;
        let name = self.expect_identifier("identifier", "after 'var' declaration")?;
        let shape = if *self.kind() == TokenKind::Less {
            self.parse_shape()?
        } else {
            vec![]
        };
        self.expect(TokenKind::Equal, "in variable declaration")?;
        let init = self.parse_expression()?;
        Ok(ExprAst::VarDecl {
            location,
            name,
            shape,
            init: Box::new(init),
        })
    }
    pub fn parse_expression(&mut self) -> Result<ExprAst> {
        let lhs = self.parse_primary()?;
        self.parse_binary_rhs(0, lhs)
    }
    /// Fold binary operators binding at least as tight as `min_precedence`
    /// into `lhs`.
    fn parse_binary_rhs(&mut self, min_precedence: i32, mut lhs: ExprAst) -> Result<ExprAst> {
        loop {
            let precedence_here = match precedence(self.kind()) {
                Some(p) if min_precedence <= p => p,
                _ => return Ok(lhs),
            };
            let token = self.advance();
            let op = match token.kind.binary_operator() {
                Some(op) => op,
                None => return Err(self.error("binary operator", "in expression")),
            };
            let mut rhs = self.parse_primary()?;
            if let Some(next) = precedence(self.kind()) {
                if precedence_here < next {
                    rhs = self.parse_binary_rhs(precedence_here + 1, rhs)?;
                }
            }
            lhs = ExprAst::BinOp {
                location: token.location,
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }
    fn parse_primary(&mut self) -> Result<ExprAst> {
        match self.kind().clone() {
            TokenKind::Identifier(_) => self.parse_identifier_expr(),
            TokenKind::Number(value) => {
                let location = self.advance().location;
                Ok(ExprAst::Number { location, value })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "to close expression with parentheses")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_literal(),
            _ => Err(self.error("expression", "to start with identifier, number, [ or (")),
        }
    }
    /// Parse `name`, `name(args)`, or `print(arg)`.
    fn parse_identifier_expr(&mut self) -> Result<ExprAst> {
        let location = self.location();
        let name = self.expect_identifier("identifier", "in expression")?;
        if *self.kind() != TokenKind::LParen {
            return Ok(ExprAst::Var { location, name });
        }
        self.advance();
        let mut args = vec![];
        if *self.kind() != TokenKind::RParen {
            loop {
                args.push(self.parse_expression()?);
                if *self.kind() == TokenKind::RParen {
                    break;
                }
                self.expect(TokenKind::Comma, "in argument list")?;
            }
        }
        self.advance();
        if name == "print" {
            if args.len() != 1 {
                return Err(Error::Parse {
                    location,
                    message: format!(
                        "expected \"<single argument>\" as print(<arg>), but got {} arguments",
                        args.len()
                    ),
                });
            }
            let arg = Box::new(args.remove(0));
            return Ok(ExprAst::Print { location, arg });
        }
        Ok(ExprAst::Call {
            location,
            callee: name,
            args,
        })
    }
    /// Parse a (nested) tensor literal and infer its dims.
    fn parse_literal(&mut self) -> Result<ExprAst> {
        let location = self.expect(TokenKind::LBracket, "in literal expression")?.location;
        let mut values = vec![];
        loop {
            match self.kind().clone() {
                TokenKind::LBracket => values.push(self.parse_literal()?),
                TokenKind::Number(value) => {
                    let location = self.advance().location;
                    values.push(ExprAst::Number { location, value });
                }
                _ => return Err(self.error("<num> or [", "in literal expression")),
            }
            if *self.kind() == TokenKind::RBracket {
                break;
            }
            self.expect(TokenKind::Comma, "in literal expression")?;
        }
        self.advance();

        let mut dims = vec![values.len() as i64];
        let nested: Vec<Option<&Vec<i64>>> = values
            .iter()
            .map(|value| match value {
                ExprAst::Literal { dims, .. } => Some(dims),
                _ => None,
            })
            .collect();
        if nested.iter().any(Option::is_some) {
            let uniform = match nested[0] {
                Some(first) => nested.iter().all(|d| *d == Some(first)),
                None => false,
            };
            if !uniform {
                return Err(Error::Parse {
                    location,
                    message: "expected \"uniform well-nested dimensions\" inside literal expression"
                        .to_string(),
                });
            }
            if let Some(first) = nested[0] {
                dims.extend(first.iter().copied());
            }
        }
        Ok(ExprAst::Literal {
            location,
            values,
            dims,
        })
    }
}
