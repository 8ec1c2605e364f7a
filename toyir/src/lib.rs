//! toyir is a small MLIR-like intermediate representation for the toy
//! tensor language.
//!
//! The IR is a tree of operations. Every operation has a name such as
//! `toy.add`, a source location, operands that refer to values defined by
//! earlier operations, results that later operations can use, and optionally
//! blocks holding nested operations. A function, for example, is an
//! operation whose single block holds the function body.
//!
//! The crate can print the IR as text and parse that text back. Printing and
//! then parsing gives a module that is structurally equal to the original:
//!
//! ```mlir
//! module {
//!   func @main() {
//!     %0 = toy.constant dense<[1.0,2.0,3.0,4.0,5.0,6.0]> : tensor<6xf64> loc("in.toy":2:11)
//!     %1 = toy.reshape(%0 : tensor<6xf64>) to tensor<2x3xf64> loc("in.toy":2:3)
//!     toy.print %1 : tensor<2x3xf64> loc("in.toy":3:3)
//!     toy.return loc("in.toy":1:1)
//!   } loc("in.toy":1:1)
//! }
//! ```
//!
//! Operations are verified when they are constructed. Invalid IR, like an
//! add of an integer or a call with the wrong number of arguments, is
//! rejected with an [Error] instead of being built.
//!
//! Operation kinds are grouped into dialects. The `func` dialect defines
//! functions and the `toy` dialect defines the tensor operations. The parser
//! finds the kind for a mnemonic in a registry that holds both dialects.

pub mod dialect;
mod error;
pub mod ir;
mod logging;
pub mod parser;
pub mod printer;
pub mod scope;
#[cfg(feature = "test-utils")]
pub mod tester;

pub use error::Error;
pub use error::Result;
pub use logging::init_subscriber;

use ir::OpRegistry;

/// Dialects can define new operations.
/// Each dialect is given an unique namespace that is prefixed.
pub trait Dialect {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Add the op kinds of this dialect to `registry`.
    fn register(&self, registry: &mut OpRegistry);
}
