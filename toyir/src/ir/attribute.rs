use crate::ir::Type;
use crate::parser::Parser;
use crate::parser::Token;
use crate::parser::TokenKind;
use crate::Result;
use std::fmt::Display;
use std::fmt::Formatter;

/// Dense f64 tensor literal, like `dense<[1.0,2.0,3.0,4.0]>`.
///
/// Elements are stored flat in row-major order. An empty shape is a scalar,
/// which prints without brackets (`dense<5.0>`).
#[derive(Clone, Debug, PartialEq)]
pub struct DenseAttr {
    shape: Vec<i64>,
    values: Vec<f64>,
}

impl DenseAttr {
    pub fn new(shape: Vec<i64>, values: Vec<f64>) -> Self {
        DenseAttr { shape, values }
    }
    pub fn scalar(value: f64) -> Self {
        DenseAttr {
            shape: vec![],
            values: vec![value],
        }
    }
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }
    pub fn values(&self) -> &[f64] {
        &self.values
    }
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }
    /// Number of elements the shape asks for, if the shape is valid.
    pub fn expected_len(&self) -> Option<usize> {
        let mut len: usize = 1;
        for dim in &self.shape {
            let dim = usize::try_from(*dim).ok()?;
            len = len.checked_mul(dim)?;
        }
        Some(len)
    }
    /// Type of a tensor holding this literal.
    ///
    /// Scalars produce `tensor<*xf64>`.
    pub fn typ(&self) -> Type {
        if self.is_scalar() {
            Type::f64_tensor()
        } else {
            Type::ranked_f64_tensor(self.shape.clone())
        }
    }
}

impl Display for DenseAttr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "dense<")?;
        if self.is_scalar() && self.values.len() == 1 {
            write!(f, "{:?}", self.values[0])?;
        } else {
            write!(f, "[")?;
            for (i, value) in self.values.iter().enumerate() {
                if 0 < i {
                    write!(f, ",")?;
                }
                write!(f, "{value:?}")?;
            }
            write!(f, "]")?;
        }
        write!(f, ">")
    }
}

impl Parser {
    /// Parse a number such as `-1.5`, `+2e3`, `0x1F`, or `0o17`.
    pub fn parse_f64(&mut self) -> Result<f64> {
        let negative = self.check(TokenKind::Minus);
        if negative || self.check(TokenKind::Plus) {
            self.advance();
        }
        let token = self.current_token().clone();
        if !token.kind.is_number() {
            return Err(self.error_at(&token, "a number"));
        }
        self.advance();
        let value = match self.parse_radix_digits(&token)? {
            Some(value) => value,
            None => token
                .lexeme
                .parse::<f64>()
                .map_err(|_| self.error_at(&token, "a number"))?,
        };
        Ok(if negative { -value } else { value })
    }
    /// Parse the `x1F` in `0x1F` (or the `o17` in `0o17`).
    ///
    /// The scanner splits these literals into `0` and an identifier, since
    /// `0x4xf64` has to scan as a dimension inside tensor types.
    fn parse_radix_digits(&mut self, zero: &Token) -> Result<Option<f64>> {
        let next = self.current_token().clone();
        let adjacent = next.position.start() == zero.position.start() + zero.lexeme.len();
        if zero.lexeme != "0" || next.kind != TokenKind::BareIdentifier || !adjacent {
            return Ok(None);
        }
        let (radix, digits) = if let Some(digits) = next.lexeme.strip_prefix('x') {
            (16, digits)
        } else if let Some(digits) = next.lexeme.strip_prefix('o') {
            (8, digits)
        } else {
            return Ok(None);
        };
        self.advance();
        match u64::from_str_radix(digits, radix) {
            Ok(value) => Ok(Some(value as f64)),
            Err(_) => Err(self.error_at(&next, "hexadecimal or octal digits")),
        }
    }
    /// Parse `[1.0, [2.0, 3.0]]` or a single number into a flat list.
    fn parse_dense_elements(&mut self, values: &mut Vec<f64>) -> Result<()> {
        if !self.check(TokenKind::LBracket) {
            values.push(self.parse_f64()?);
            return Ok(());
        }
        self.advance();
        if !self.check(TokenKind::RBracket) {
            self.parse_dense_elements(values)?;
            while self.check(TokenKind::Comma) {
                self.advance();
                self.parse_dense_elements(values)?;
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(())
    }
    /// Parse `dense<...>` and return the flat element list.
    ///
    /// The shape is not part of the literal; it comes from the type that
    /// follows it.
    pub fn parse_dense_values(&mut self) -> Result<Vec<f64>> {
        self.expect_lexeme(TokenKind::BareIdentifier, "dense")?;
        self.expect(TokenKind::Less)?;
        let mut values = vec![];
        self.parse_dense_elements(&mut values)?;
        self.expect(TokenKind::Greater)?;
        Ok(values)
    }
}
