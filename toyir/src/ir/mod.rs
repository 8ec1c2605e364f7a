//! Intermediate representation (IR) for the compiler.
//!
//! These data structures are used as the basis for the compiler.
//! For example, this module defines core types such as [Operation], [Op],
//! and [Value].

mod attribute;
mod block;
mod location;
mod module;
mod op;
mod operation;
mod registry;
mod typ;
mod value;

pub use attribute::DenseAttr;
pub use block::Block;
pub use location::escape;
pub use location::unescape;
pub use location::Location;
pub use module::ModuleOp;
pub use op::AnyOp;
pub use op::Op;
pub use operation::Operation;
pub use operation::OperationName;
pub use registry::get_kind;
pub use registry::registry;
pub use registry::KindDescriptor;
pub use registry::OpRegistry;
pub use typ::FunctionType;
pub use typ::Type;
pub use value::types_of;
pub use value::Value;
pub use value::ValueKind;

pub fn spaces(indent: usize) -> String {
    "  ".repeat(indent)
}
