//! Front end for the toy tensor language.
//!
//! ```toy
//! def multiply_transpose(a, b) {
//!   return transpose(a) * transpose(b);
//! }
//!
//! def main() {
//!   var a<2, 3> = [[1, 2, 3], [4, 5, 6]];
//!   var b<2, 3> = [1, 2, 3, 4, 5, 6];
//!   print(multiply_transpose(a, b));
//! }
//! ```
//!
//! Source is tokenized by [lexer], parsed into an [ast] by [parser], and
//! lowered to `toyir` operations by [mlir_gen].

pub mod ast;
mod compile;
mod error;
pub mod lexer;
pub mod mlir_gen;
pub mod parser;

pub use compile::compile;
pub use compile::Emit;
pub use compile::InputKind;
pub use error::Error;
pub use error::Result;
