//! Function dialect.
//!
//! This dialect is meant to hold operations that are related to functions.
mod op;

pub use op::FuncHeader;
pub use op::FuncOp;

use crate::ir::OpRegistry;
use crate::Dialect;

pub struct FuncDialect;

impl Dialect for FuncDialect {
    fn name(&self) -> &'static str {
        "func"
    }
    fn description(&self) -> &'static str {
        "Named functions with an isolated body."
    }
    fn register(&self, registry: &mut OpRegistry) {
        registry.register::<FuncOp>();
    }
}
