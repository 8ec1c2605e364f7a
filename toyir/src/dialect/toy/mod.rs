//! Toy dialect.
//!
//! Operations on tensors of f64 for the toy language: literals, element-wise
//! arithmetic, calls, shape manipulation, printing, and returning.
mod op;

pub use op::AddOp;
pub use op::ConstantOp;
pub use op::GenericCallOp;
pub use op::MulOp;
pub use op::PrintOp;
pub use op::ReshapeOp;
pub use op::ReturnOp;
pub use op::TransposeOp;

use crate::dialect::func::FuncOp;
use crate::ir::OpRegistry;
use crate::Dialect;

pub struct ToyDialect;

impl Dialect for ToyDialect {
    fn name(&self) -> &'static str {
        "toy"
    }
    fn description(&self) -> &'static str {
        "Tensor operations for the toy language."
    }
    fn register(&self, registry: &mut OpRegistry) {
        registry.register::<ConstantOp>();
        registry.register::<AddOp>();
        registry.register::<MulOp>();
        registry.register::<GenericCallOp>();
        registry.register::<ReshapeOp>();
        registry.register::<TransposeOp>();
        registry.register::<PrintOp>();
        registry.register::<ReturnOp>();
        registry.register_alias::<FuncOp>("toy.func");
    }
}
