use crate::ir::Type;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

/// Where a [Value] comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// The `index`th result of an operation.
    OpResult { index: usize },
    /// The `index`th argument of a block.
    BlockArgument { index: usize },
}

struct ValueImpl {
    typ: Type,
    kind: ValueKind,
}

/// Handle to an SSA value.
///
/// A value is created once by the operation or block that defines it and is
/// then shared by every operation that uses it. Clones point to the same
/// value. Equality and hashing go by identity, so two values with the same
/// type are still different values.
///
/// Values do not have names. Names like `%0` only exist while printing or
/// parsing.
#[derive(Clone)]
pub struct Value(Arc<ValueImpl>);

impl Value {
    pub(crate) fn op_result(typ: Type, index: usize) -> Self {
        Value(Arc::new(ValueImpl {
            typ,
            kind: ValueKind::OpResult { index },
        }))
    }
    pub(crate) fn block_argument(typ: Type, index: usize) -> Self {
        Value(Arc::new(ValueImpl {
            typ,
            kind: ValueKind::BlockArgument { index },
        }))
    }
    pub fn typ(&self) -> &Type {
        &self.0.typ
    }
    pub fn kind(&self) -> ValueKind {
        self.0.kind
    }
    pub fn is_block_argument(&self) -> bool {
        matches!(self.kind(), ValueKind::BlockArgument { .. })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ValueKind::OpResult { index } => write!(f, "OpResult#{index}: {}", self.typ()),
            ValueKind::BlockArgument { index } => {
                write!(f, "BlockArgument#{index}: {}", self.typ())
            }
        }
    }
}

/// Types of the given values, in order.
pub fn types_of(values: &[Value]) -> Vec<Type> {
    values.iter().map(|value| value.typ().clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity() {
        let a = Value::op_result(Type::f64_tensor(), 0);
        let b = Value::op_result(Type::f64_tensor(), 0);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.typ(), b.typ());

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(a.clone());
        set.insert(b.clone());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn kinds() {
        let arg = Value::block_argument(Type::F64, 1);
        assert!(arg.is_block_argument());
        assert_eq!(arg.kind(), ValueKind::BlockArgument { index: 1 });
        assert_eq!(format!("{arg:?}"), "BlockArgument#1: f64");
        assert_eq!(types_of(&[arg]), vec![Type::F64]);
    }
}
