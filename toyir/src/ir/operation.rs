use crate::ir::Block;
use crate::ir::Location;
use crate::ir::Type;
use crate::ir::Value;
use crate::parser::Parser;
use crate::parser::TokenKind;
use crate::Result;
use std::fmt::Display;
use std::fmt::Formatter;

/// Namespaced mnemonic of an operation, such as `toy.add`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OperationName {
    name: String,
}

impl OperationName {
    pub fn new(name: String) -> Self {
        Self { name }
    }
    pub fn as_str(&self) -> &str {
        &self.name
    }
    /// The part before the first dot, if any (`toy` for `toy.add`).
    pub fn dialect(&self) -> Option<&str> {
        self.name.split_once('.').map(|(dialect, _)| dialect)
    }
}

impl Display for OperationName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The data every operation has, independent of its kind.
///
/// Operands are shared handles to values defined elsewhere. Results and
/// blocks are owned. An operation is built once by the constructor of its
/// kind and not changed afterwards.
#[derive(Debug)]
pub struct Operation {
    location: Location,
    name: OperationName,
    operands: Vec<Value>,
    results: Vec<Value>,
    blocks: Vec<Block>,
}

impl Operation {
    pub fn new(location: Location, name: OperationName) -> Self {
        Operation {
            location,
            name,
            operands: vec![],
            results: vec![],
            blocks: vec![],
        }
    }
    pub fn with_operands(mut self, operands: Vec<Value>) -> Self {
        self.operands = operands;
        self
    }
    /// Create one fresh result value per type.
    pub fn with_result_types(mut self, types: Vec<Type>) -> Self {
        self.results = types
            .into_iter()
            .enumerate()
            .map(|(index, typ)| Value::op_result(typ, index))
            .collect();
        self
    }
    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = blocks;
        self
    }
    pub fn location(&self) -> &Location {
        &self.location
    }
    pub fn name(&self) -> &OperationName {
        &self.name
    }
    pub fn operands(&self) -> &[Value] {
        &self.operands
    }
    pub fn operand(&self, index: usize) -> Option<&Value> {
        self.operands.get(index)
    }
    pub fn results(&self) -> &[Value] {
        &self.results
    }
    pub fn result(&self, index: usize) -> Option<&Value> {
        self.results.get(index)
    }
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
    pub fn result_types(&self) -> Vec<Type> {
        self.results.iter().map(|v| v.typ().clone()).collect()
    }
}

impl Parser {
    /// Parse `%0, %1 =` if present and return the names.
    pub fn parse_op_result_names(&mut self) -> Result<Vec<String>> {
        let mut names = vec![];
        if !self.check(TokenKind::PercentIdentifier) {
            return Ok(names);
        }
        loop {
            let name = self.expect(TokenKind::PercentIdentifier)?;
            names.push(name.lexeme);
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::Equal)?;
        Ok(names)
    }
    /// Parse a mnemonic like `toy.generic_call`.
    pub fn parse_operation_name(&mut self) -> Result<OperationName> {
        let token = self.expect(TokenKind::BareIdentifier)?;
        Ok(OperationName::new(token.lexeme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_name() {
        let name = OperationName::new("toy.generic_call".to_string());
        assert_eq!(name.dialect(), Some("toy"));
        assert_eq!(name.to_string(), "toy.generic_call");
        assert_eq!(OperationName::new("func".to_string()).dialect(), None);
    }

    #[test]
    fn fresh_results() {
        let name = OperationName::new("toy.transpose".to_string());
        let operation = Operation::new(Location::Unknown, name)
            .with_result_types(vec![Type::f64_tensor(), Type::F64]);
        assert_eq!(operation.results().len(), 2);
        assert_ne!(operation.results()[0], operation.results()[1]);
        assert_eq!(operation.result_types(), vec![Type::f64_tensor(), Type::F64]);
        assert!(operation.operand(0).is_none());
    }

    #[test]
    fn parse_result_names() {
        let mut parser = Parser::new("%0, %res = toy.add", "-").unwrap();
        let names = parser.parse_op_result_names().unwrap();
        assert_eq!(names, vec!["%0".to_string(), "%res".to_string()]);
        let name = parser.parse_operation_name().unwrap();
        assert_eq!(name.as_str(), "toy.add");

        let mut parser = Parser::new("toy.print", "-").unwrap();
        assert!(parser.parse_op_result_names().unwrap().is_empty());
    }
}
