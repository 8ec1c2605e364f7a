use crate::ir::AnyOp;
use crate::ir::Type;
use crate::ir::Value;

/// An ordered list of operations with formal arguments.
///
/// Blocks are owned by the operation that contains them, such as the body
/// of a function.
#[derive(Debug, Default)]
pub struct Block {
    arguments: Vec<Value>,
    ops: Vec<AnyOp>,
}

impl Block {
    /// Create an empty block with one fresh argument per type.
    pub fn new(argument_types: Vec<Type>) -> Self {
        let arguments = argument_types
            .into_iter()
            .enumerate()
            .map(|(index, typ)| Value::block_argument(typ, index))
            .collect();
        Block {
            arguments,
            ops: vec![],
        }
    }
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }
    pub fn argument(&self, index: usize) -> Option<&Value> {
        self.arguments.get(index)
    }
    pub fn ops(&self) -> &[AnyOp] {
        &self.ops
    }
    /// Append an op and return the values it defines.
    pub fn push(&mut self, op: AnyOp) -> Vec<Value> {
        let results = op.operation().results().to_vec();
        self.ops.push(op);
        results
    }
    pub fn last_op(&self) -> Option<&AnyOp> {
        self.ops.last()
    }
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
    /// Whether the block ends with a terminator such as `toy.return`.
    pub fn has_terminator(&self) -> bool {
        self.ops
            .last()
            .map(|op| op.as_op().is_terminator())
            .unwrap_or(false)
    }
}
