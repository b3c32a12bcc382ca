//! Tree-walking interpreter for MiniLisp
//!
//! Evaluates forms directly against a chain of environment frames.

pub mod builtins;
pub mod env;
pub mod eval;
pub mod output;
pub mod value;

pub use env::Environment;
pub use eval::{Interpreter, StatementResult};
pub use output::Output;
pub use value::{Arity, Function, TypeConstraint, Value, ValueType};
