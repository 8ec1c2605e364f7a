use crate::parser::Parser;
use crate::parser::Token;
use crate::parser::TokenKind;
use crate::Result;
use std::fmt::Display;
use std::fmt::Formatter;

/// Types of IR values.
///
/// Types are plain values that are compared structurally. The order between
/// types is [Type::is_subtype_of], and two types are equal when each is a
/// subtype of the other.
#[derive(Clone, Debug)]
pub enum Type {
    None,
    Index,
    Integer { bits: u32, signed: bool },
    F32,
    F64,
    /// `tensor<*xT>`, a tensor of unknown rank.
    Tensor(Box<Type>),
    /// `tensor<2x?xT>`. A negative dimension means the size is unknown.
    RankedTensor { element: Box<Type>, shape: Vec<i64> },
    Function(FunctionType),
    Tuple(Vec<Type>),
    Complex(Box<Type>),
    /// A type owned by some dialect, like `!toy.struct`.
    Opaque { dialect: String, name: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionType {
    inputs: Vec<Type>,
    outputs: Vec<Type>,
}

impl FunctionType {
    pub fn new(inputs: Vec<Type>, outputs: Vec<Type>) -> Self {
        FunctionType { inputs, outputs }
    }
    pub fn inputs(&self) -> &[Type] {
        &self.inputs
    }
    pub fn outputs(&self) -> &[Type] {
        &self.outputs
    }
    fn is_subtype_of(&self, other: &FunctionType) -> bool {
        self.inputs == other.inputs && self.outputs == other.outputs
    }
}

impl Type {
    /// `tensor<*xf64>`, the supertype of every f64 tensor.
    pub fn f64_tensor() -> Type {
        Type::Tensor(Box::new(Type::F64))
    }
    pub fn ranked_f64_tensor(shape: Vec<i64>) -> Type {
        Type::RankedTensor {
            element: Box::new(Type::F64),
            shape,
        }
    }
    pub fn integer(bits: u32, signed: bool) -> Type {
        Type::Integer { bits, signed }
    }
    pub fn function(inputs: Vec<Type>, outputs: Vec<Type>) -> Type {
        Type::Function(FunctionType::new(inputs, outputs))
    }
    /// Whether `self <= other`.
    ///
    /// Requires the same variant and equal substructure, except that a
    /// ranked tensor is a subtype of the unranked tensor with the same
    /// element type. Dimensions of two ranked tensors are compared value for
    /// value, so `?` only matches `?`.
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::None, Type::None) => true,
            (Type::Index, Type::Index) => true,
            (Type::F32, Type::F32) => true,
            (Type::F64, Type::F64) => true,
            (
                Type::Integer { bits, signed },
                Type::Integer {
                    bits: other_bits,
                    signed: other_signed,
                },
            ) => bits == other_bits && signed == other_signed,
            (Type::Tensor(element), Type::Tensor(other_element)) => element == other_element,
            (Type::RankedTensor { element, .. }, Type::Tensor(other_element)) => {
                element == other_element
            }
            (
                Type::RankedTensor { element, shape },
                Type::RankedTensor {
                    element: other_element,
                    shape: other_shape,
                },
            ) => element == other_element && shape == other_shape,
            (Type::Function(a), Type::Function(b)) => a.is_subtype_of(b),
            (Type::Tuple(a), Type::Tuple(b)) => a == b,
            (Type::Complex(a), Type::Complex(b)) => a == b,
            (
                Type::Opaque { dialect, name },
                Type::Opaque {
                    dialect: other_dialect,
                    name: other_name,
                },
            ) => dialect == other_dialect && name == other_name,
            _ => false,
        }
    }
    pub fn is_tensor(&self) -> bool {
        matches!(self, Type::Tensor(_) | Type::RankedTensor { .. })
    }
    pub fn is_ranked_tensor(&self) -> bool {
        matches!(self, Type::RankedTensor { .. })
    }
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Tensor(element) => Some(element),
            Type::RankedTensor { element, .. } => Some(element),
            Type::Complex(element) => Some(element),
            _ => None,
        }
    }
    pub fn shape(&self) -> Option<&[i64]> {
        match self {
            Type::RankedTensor { shape, .. } => Some(shape),
            _ => None,
        }
    }
    /// Whether this is a ranked tensor without dynamic dimensions.
    pub fn has_static_shape(&self) -> bool {
        match self.shape() {
            Some(shape) => shape.iter().all(|dim| 0 <= *dim),
            None => false,
        }
    }
    /// Number of elements for a ranked tensor without dynamic dimensions.
    ///
    /// `None` when the shape is not static or the count does not fit in an
    /// `i64`.
    pub fn num_elements(&self) -> Option<i64> {
        if !self.has_static_shape() {
            return None;
        }
        let mut count: i64 = 1;
        for dim in self.shape()? {
            count = count.checked_mul(*dim)?;
        }
        Some(count)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.is_subtype_of(other) && other.is_subtype_of(self)
    }
}

impl Eq for Type {}

fn write_type_list(f: &mut Formatter<'_>, types: &[Type]) -> std::fmt::Result {
    for (i, typ) in types.iter().enumerate() {
        if 0 < i {
            write!(f, ", ")?;
        }
        write!(f, "{typ}")?;
    }
    Ok(())
}

impl Display for FunctionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        write_type_list(f, &self.inputs)?;
        write!(f, ") -> ")?;
        if self.outputs.len() == 1 {
            write!(f, "{}", self.outputs[0])
        } else {
            write!(f, "(")?;
            write_type_list(f, &self.outputs)?;
            write!(f, ")")
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::None => write!(f, "none"),
            Type::Index => write!(f, "index"),
            Type::Integer { bits, signed } => {
                let sign = if *signed { "s" } else { "u" };
                write!(f, "{sign}{bits}i")
            }
            Type::F32 => write!(f, "f32"),
            Type::F64 => write!(f, "f64"),
            Type::Tensor(element) => write!(f, "tensor<*x{element}>"),
            Type::RankedTensor { element, shape } => {
                write!(f, "tensor<")?;
                for dim in shape {
                    if *dim < 0 {
                        write!(f, "?x")?;
                    } else {
                        write!(f, "{dim}x")?;
                    }
                }
                write!(f, "{element}>")
            }
            Type::Function(function_type) => write!(f, "{function_type}"),
            Type::Tuple(types) => {
                write!(f, "tuple<")?;
                write_type_list(f, types)?;
                write!(f, ">")
            }
            Type::Complex(element) => write!(f, "complex<{element}>"),
            Type::Opaque { dialect, name } => write!(f, "!{dialect}.{name}"),
        }
    }
}

/// Scalar types that are written as a single bare identifier.
fn scalar_type(name: &str) -> Option<Type> {
    match name {
        "none" => Some(Type::None),
        "index" => Some(Type::Index),
        "f32" => Some(Type::F32),
        "f64" => Some(Type::F64),
        _ => integer_type(name),
    }
}

/// `s32i` or `u8i`.
fn integer_type(name: &str) -> Option<Type> {
    let signed = match name.chars().next()? {
        's' => true,
        'u' => false,
        _ => return None,
    };
    let bits = name[1..].strip_suffix('i')?;
    if bits.is_empty() || !bits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let bits = bits.parse::<u32>().ok()?;
    Some(Type::Integer { bits, signed })
}

impl Parser {
    pub fn parse_type(&mut self) -> Result<Type> {
        let token = self.current_token().clone();
        match token.kind {
            TokenKind::LParen => Ok(Type::Function(self.parse_function_type()?)),
            TokenKind::Exclamation => self.parse_opaque_type(),
            TokenKind::BareIdentifier => {
                self.advance();
                self.parse_named_type(&token, &token.lexeme)
            }
            _ => Err(self.error_at(&token, "a type")),
        }
    }
    /// Parse the rest of a type whose name was already consumed.
    fn parse_named_type(&mut self, token: &Token, name: &str) -> Result<Type> {
        match name {
            "tensor" => self.parse_tensor_type(),
            "tuple" => {
                self.expect(TokenKind::Less)?;
                let types = if self.check(TokenKind::Greater) {
                    vec![]
                } else {
                    self.parse_type_list()?
                };
                self.expect(TokenKind::Greater)?;
                Ok(Type::Tuple(types))
            }
            "complex" => {
                self.expect(TokenKind::Less)?;
                let element = self.parse_type()?;
                self.expect(TokenKind::Greater)?;
                Ok(Type::Complex(Box::new(element)))
            }
            name => match scalar_type(name) {
                Some(typ) => Ok(typ),
                None => Err(self.error_at(token, "a type")),
            },
        }
    }
    /// Parse `a, b, c` (at least one type).
    pub fn parse_type_list(&mut self) -> Result<Vec<Type>> {
        let mut types = vec![self.parse_type()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            types.push(self.parse_type()?);
        }
        Ok(types)
    }
    /// Parse `(a, b) -> c` or `(a) -> (b, c)`.
    pub fn parse_function_type(&mut self) -> Result<FunctionType> {
        self.expect(TokenKind::LParen)?;
        let inputs = if self.check(TokenKind::RParen) {
            vec![]
        } else {
            self.parse_type_list()?
        };
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;
        let outputs = self.parse_function_outputs()?;
        Ok(FunctionType::new(inputs, outputs))
    }
    /// Parse the part after `->`: a single type or a parenthesized list.
    pub fn parse_function_outputs(&mut self) -> Result<Vec<Type>> {
        if self.check(TokenKind::LParen) {
            self.advance();
            let outputs = if self.check(TokenKind::RParen) {
                vec![]
            } else {
                self.parse_type_list()?
            };
            self.expect(TokenKind::RParen)?;
            Ok(outputs)
        } else {
            Ok(vec![self.parse_type()?])
        }
    }
    fn parse_opaque_type(&mut self) -> Result<Type> {
        self.expect(TokenKind::Exclamation)?;
        let token = self.expect(TokenKind::BareIdentifier)?;
        match token.lexeme.split_once('.') {
            Some((dialect, name)) if !dialect.is_empty() && !name.is_empty() => Ok(Type::Opaque {
                dialect: dialect.to_string(),
                name: name.to_string(),
            }),
            _ => Err(self.error_at(&token, "a dialect type like `!dialect.name`")),
        }
    }
    fn parse_dimension(&mut self) -> Result<i64> {
        let token = self.current_token().clone();
        match token.kind {
            TokenKind::Question => {
                self.advance();
                Ok(-1)
            }
            TokenKind::Integer => {
                self.advance();
                token
                    .lexeme
                    .parse::<i64>()
                    .map_err(|_| self.error_at(&token, "a dimension size"))
            }
            _ => Err(self.error_at(&token, "a dimension size or `?`")),
        }
    }
    /// Parse the part of a tensor type after `tensor`.
    ///
    /// The scanner does not know about shapes, so `2x3xf64` arrives as the
    /// integer `2` followed by the identifier `x3xf64`. The identifier is
    /// split here: leading digit runs are more dimensions and whatever
    /// remains after the last `x` names the element type.
    fn parse_tensor_type(&mut self) -> Result<Type> {
        self.expect(TokenKind::Less)?;
        let unranked = self.check(TokenKind::Star);
        let mut shape = vec![];
        if unranked {
            self.advance();
        } else {
            shape.push(self.parse_dimension()?);
        }
        let element = loop {
            let token = self.current_token().clone();
            let rest = match token.lexeme.strip_prefix('x') {
                Some(rest) if token.kind == TokenKind::BareIdentifier => rest,
                _ => return Err(self.error_at(&token, "`x` in tensor shape")),
            };
            self.advance();
            let rest = self.split_dimensions(&token, rest, unranked, &mut shape)?;
            if !rest.is_empty() {
                break self.parse_named_type(&token, rest)?;
            }
            if self.check(TokenKind::Question) {
                if unranked {
                    return Err(self.error_at(&token, "an element type in unranked tensor"));
                }
                self.advance();
                shape.push(-1);
                continue;
            }
            break self.parse_type()?;
        };
        self.expect(TokenKind::Greater)?;
        let element = Box::new(element);
        if unranked {
            Ok(Type::Tensor(element))
        } else {
            Ok(Type::RankedTensor { element, shape })
        }
    }
    fn split_dimensions<'a>(
        &self,
        token: &Token,
        mut rest: &'a str,
        unranked: bool,
        shape: &mut Vec<i64>,
    ) -> Result<&'a str> {
        loop {
            let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 {
                return Ok(rest);
            }
            if unranked {
                return Err(self.error_at(token, "an element type in unranked tensor"));
            }
            let dim = rest[..digits]
                .parse::<i64>()
                .map_err(|_| self.error_at(token, "a dimension size"))?;
            shape.push(dim);
            rest = match rest[digits..].strip_prefix('x') {
                Some(after) => after,
                None => return Err(self.error_at(token, "`x` in tensor shape")),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Type {
        let mut parser = Parser::new(src, "-").unwrap();
        parser.parse_type().unwrap()
    }

    #[test]
    fn subtyping() {
        let ranked = Type::ranked_f64_tensor(vec![2, 3]);
        let unranked = Type::f64_tensor();
        assert!(ranked.is_subtype_of(&unranked));
        assert!(!unranked.is_subtype_of(&ranked));
        assert!(ranked.is_subtype_of(&ranked));
        assert_ne!(ranked, unranked);

        let dynamic = Type::ranked_f64_tensor(vec![2, -1]);
        assert!(!ranked.is_subtype_of(&dynamic));
        assert!(!dynamic.is_subtype_of(&ranked));
        assert!(dynamic.is_subtype_of(&Type::ranked_f64_tensor(vec![2, -1])));

        let f32_tensor = Type::Tensor(Box::new(Type::F32));
        assert!(!ranked.is_subtype_of(&f32_tensor));

        assert!(Type::integer(32, true).is_subtype_of(&Type::integer(32, true)));
        assert!(!Type::integer(32, true).is_subtype_of(&Type::integer(32, false)));
        assert!(!Type::F32.is_subtype_of(&Type::F64));
        assert!(!Type::None.is_subtype_of(&Type::Index));
    }

    #[test]
    fn equality_is_mutual_subtyping() {
        let types = vec![
            Type::None,
            Type::Index,
            Type::integer(8, false),
            Type::F32,
            Type::F64,
            Type::f64_tensor(),
            Type::ranked_f64_tensor(vec![2, 2]),
            Type::function(vec![Type::f64_tensor()], vec![Type::f64_tensor()]),
            Type::Tuple(vec![Type::F64, Type::Index]),
            Type::Complex(Box::new(Type::F32)),
            Type::Opaque {
                dialect: "toy".to_string(),
                name: "struct".to_string(),
            },
        ];
        for (i, a) in types.iter().enumerate() {
            for (j, b) in types.iter().enumerate() {
                let mutual = a.is_subtype_of(b) && b.is_subtype_of(a);
                assert_eq!(a == b, mutual);
                assert_eq!(a == b, i == j, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn display() {
        assert_eq!(Type::f64_tensor().to_string(), "tensor<*xf64>");
        let typ = Type::ranked_f64_tensor(vec![2, -1, 3]);
        assert_eq!(typ.to_string(), "tensor<2x?x3xf64>");
        assert_eq!(Type::integer(32, true).to_string(), "s32i");
        let typ = Type::function(vec![Type::F64, Type::F32], vec![Type::F64]);
        assert_eq!(typ.to_string(), "(f64, f32) -> f64");
        let typ = Type::function(vec![], vec![Type::F64, Type::Index]);
        assert_eq!(typ.to_string(), "() -> (f64, index)");
        let typ = Type::function(vec![], vec![]);
        assert_eq!(typ.to_string(), "() -> ()");
        let typ = Type::Tuple(vec![Type::F64, Type::None]);
        assert_eq!(typ.to_string(), "tuple<f64, none>");
    }

    #[test]
    fn parse_types() {
        let cases = vec![
            "none",
            "index",
            "f32",
            "f64",
            "u8i",
            "s64i",
            "tensor<*xf64>",
            "tensor<2x3xf64>",
            "tensor<?xf64>",
            "tensor<2x?x3xf64>",
            "tensor<?x?xs32i>",
            "tensor<0x4xindex>",
            "tensor<4x!toy.struct>",
            "tensor<*xcomplex<f64>>",
            "(tensor<*xf64>, tensor<*xf64>) -> tensor<*xf64>",
            "() -> (f64, f32)",
            "tuple<f64, tensor<1xf64>>",
            "!toy.struct",
        ];
        for src in cases {
            assert_eq!(parse(src).to_string(), src);
        }
        let typ = parse("tensor<2x3xf64>");
        assert_eq!(typ, Type::ranked_f64_tensor(vec![2, 3]));
        assert_eq!(typ.num_elements(), Some(6));
        assert_eq!(parse("tensor<2x?xf64>").num_elements(), None);
        assert_eq!(parse("tensor<4294967296x4294967296xf64>").num_elements(), None);
        assert!(parse("tensor<4294967296x4294967296xf64>").has_static_shape());
    }

    #[test]
    fn parse_errors() {
        for src in ["tensor<2xfoo>", "tensor<*x3xf64>", "tensor<2f64>", "i32", "!toy"] {
            let mut parser = Parser::new(src, "-").unwrap();
            assert!(parser.parse_type().is_err(), "{src}");
        }
    }
}
