use crate::dialect::func::FuncOp;
use crate::dialect::toy::AddOp;
use crate::dialect::toy::ConstantOp;
use crate::dialect::toy::GenericCallOp;
use crate::dialect::toy::MulOp;
use crate::dialect::toy::PrintOp;
use crate::dialect::toy::ReshapeOp;
use crate::dialect::toy::ReturnOp;
use crate::dialect::toy::TransposeOp;
use crate::ir::Block;
use crate::ir::Location;
use crate::ir::Operation;
use crate::ir::OperationName;
use crate::ir::Value;
use crate::printer::Printer;
use crate::Result;
use std::collections::HashMap;

/// This is the trait that is implemented by all operations.
///
/// Every op wraps an [Operation] with the generic data (location, operands,
/// results, and blocks) plus whatever the op kind needs on top, like the
/// literal of `toy.constant` or the callee of `toy.generic_call`. Ops are
/// only created through the constructor of their kind, which verifies the
/// kind's constraints.
pub trait Op {
    fn operation_name() -> OperationName
    where
        Self: Sized;
    fn operation(&self) -> &Operation;
    /// Returns the name of the operation.
    /// Unlike `Self::operation_name()`, this method is available on a `dyn Op`.
    fn name(&self) -> &OperationName {
        self.operation().name()
    }
    fn location(&self) -> &Location {
        self.operation().location()
    }
    fn operands(&self) -> &[Value] {
        self.operation().operands()
    }
    fn results(&self) -> &[Value] {
        self.operation().results()
    }
    fn is_terminator(&self) -> bool {
        false
    }
    fn is_func(&self) -> bool {
        false
    }
    /// Print everything between the mnemonic and the location.
    ///
    /// The output starts with a space unless it is empty.
    fn print_format(&self, printer: &mut Printer) -> Result<()>;
}

/// One of the op kinds that this crate knows about.
///
/// The set of kinds is closed, so code that walks the IR can match on this
/// enum instead of downcasting.
#[derive(Debug)]
pub enum AnyOp {
    Constant(ConstantOp),
    Add(AddOp),
    Mul(MulOp),
    GenericCall(GenericCallOp),
    Reshape(ReshapeOp),
    Transpose(TransposeOp),
    Print(PrintOp),
    Return(ReturnOp),
    Func(FuncOp),
}

impl AnyOp {
    pub fn as_op(&self) -> &dyn Op {
        match self {
            AnyOp::Constant(op) => op,
            AnyOp::Add(op) => op,
            AnyOp::Mul(op) => op,
            AnyOp::GenericCall(op) => op,
            AnyOp::Reshape(op) => op,
            AnyOp::Transpose(op) => op,
            AnyOp::Print(op) => op,
            AnyOp::Return(op) => op,
            AnyOp::Func(op) => op,
        }
    }
    pub fn operation(&self) -> &Operation {
        self.as_op().operation()
    }
    pub fn name(&self) -> &OperationName {
        self.as_op().name()
    }
    pub fn location(&self) -> &Location {
        self.as_op().location()
    }
    pub fn as_func(&self) -> Option<&FuncOp> {
        match self {
            AnyOp::Func(op) => Some(op),
            _ => None,
        }
    }
    /// Whether both ops have the same structure.
    ///
    /// Values are compared by where they are defined, not by identity. So an
    /// op is structurally equal to the result of printing and parsing it.
    pub fn structurally_eq(&self, other: &AnyOp) -> bool {
        Correspondence::default().ops_eq(self, other)
    }
    /// Compare the data that lives outside the generic [Operation].
    fn properties_eq(&self, other: &AnyOp) -> bool {
        match (self, other) {
            (AnyOp::Constant(a), AnyOp::Constant(b)) => a.value() == b.value(),
            (AnyOp::GenericCall(a), AnyOp::GenericCall(b)) => a.callee() == b.callee(),
            (AnyOp::Func(a), AnyOp::Func(b)) => {
                a.sym_name() == b.sym_name()
                    && a.function_type() == b.function_type()
                    && a.argument_locations() == b.argument_locations()
            }
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// Maps values on the left to the values on the right that sit at the same
/// place in the IR.
#[derive(Default)]
struct Correspondence {
    values: HashMap<Value, Value>,
}

impl Correspondence {
    fn define(&mut self, left: &[Value], right: &[Value]) -> bool {
        if left.len() != right.len() {
            return false;
        }
        for (l, r) in left.iter().zip(right) {
            if l.typ() != r.typ() || l.kind() != r.kind() {
                return false;
            }
            self.values.insert(l.clone(), r.clone());
        }
        true
    }
    fn uses_eq(&self, left: &[Value], right: &[Value]) -> bool {
        left.len() == right.len()
            && left
                .iter()
                .zip(right)
                .all(|(l, r)| self.values.get(l) == Some(r))
    }
    fn blocks_eq(&mut self, left: &Block, right: &Block) -> bool {
        self.define(left.arguments(), right.arguments())
            && left.ops().len() == right.ops().len()
            && left
                .ops()
                .iter()
                .zip(right.ops())
                .all(|(l, r)| self.ops_eq(l, r))
    }
    fn ops_eq(&mut self, left: &AnyOp, right: &AnyOp) -> bool {
        let l = left.operation();
        let r = right.operation();
        l.name() == r.name()
            && l.location() == r.location()
            && left.properties_eq(right)
            && self.uses_eq(l.operands(), r.operands())
            && l.blocks().len() == r.blocks().len()
            && l
                .blocks()
                .iter()
                .zip(r.blocks())
                .all(|(lb, rb)| self.blocks_eq(lb, rb))
            && self.define(l.results(), r.results())
    }
}

macro_rules! any_op_from {
    ($($variant:ident($op:ty)),* $(,)?) => {
        $(
            impl From<$op> for AnyOp {
                fn from(op: $op) -> Self {
                    AnyOp::$variant(op)
                }
            }
        )*
    };
}

any_op_from!(
    Constant(ConstantOp),
    Add(AddOp),
    Mul(MulOp),
    GenericCall(GenericCallOp),
    Reshape(ReshapeOp),
    Transpose(TransposeOp),
    Print(PrintOp),
    Return(ReturnOp),
    Func(FuncOp),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DenseAttr;
    use crate::ir::Type;

    fn constant(value: f64) -> AnyOp {
        ConstantOp::new(Location::Unknown, DenseAttr::scalar(value))
            .unwrap()
            .into()
    }

    #[test]
    fn structural_equality() {
        let a = constant(1.0);
        let b = constant(1.0);
        let c = constant(2.0);
        assert!(a.structurally_eq(&b));
        assert!(!a.structurally_eq(&c));
        // Different values, but at the same place.
        assert_ne!(a.operation().results()[0], b.operation().results()[0]);
        assert_eq!(a.name().as_str(), "toy.constant");
        assert!(!a.as_op().is_terminator());
        assert!(a.as_func().is_none());
    }

    #[test]
    fn operands_follow_definitions() {
        let mut left = Block::new(vec![Type::f64_tensor(), Type::f64_tensor()]);
        let mut right = Block::new(vec![Type::f64_tensor(), Type::f64_tensor()]);
        let (l0, l1) = (left.arguments()[0].clone(), left.arguments()[1].clone());
        let (r0, r1) = (right.arguments()[0].clone(), right.arguments()[1].clone());
        left.push(AddOp::new(Location::Unknown, l0, l1).unwrap().into());
        // Swapped operands.
        right.push(AddOp::new(Location::Unknown, r1, r0).unwrap().into());
        let mut correspondence = Correspondence::default();
        assert!(!correspondence.blocks_eq(&left, &right));
    }
}
