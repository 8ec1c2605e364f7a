//! Dialect definitions.
//!
//! Dialects are collections of operations and types. This module contains
//! the `func` dialect for functions and the `toy` dialect for tensor
//! computations.

pub mod func;
pub mod toy;
