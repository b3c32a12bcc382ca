//! MiniLisp interpreter
//!
//! A tree-walking interpreter for a minimal Lisp with:
//! - 64-bit integers and booleans
//! - `define`, `fun` closures with local static definitions, and `if`
//! - arity and type checked builtins
//! - direct self-recursion through `define`, without a separate `letrec`
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Parser → Forms → Interpreter (Environment + Builtins) → Value
//! ```
//!
//! # Example
//!
//! ```lisp
//! (define fact (fun (n) (if (< n 1) 1 (* n (fact (- n 1))))))
//! (print-num (fact 5))
//! ```

pub mod ast;
pub mod common;
pub mod config;
pub mod diagnostics;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

// Re-export diagnostics for convenience
pub use diagnostics::{LispError, SourceFile};

// Re-exports for convenience
pub use ast::{Form, FormKind};
pub use config::{InterpreterConfig, Verbosity};
pub use interp::{Interpreter, StatementResult, Value};

/// Interpreter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse source code into top-level forms
pub fn parse(source: &str) -> Result<Vec<Form>, LispError> {
    let tokens = lexer::lex(source)?;
    parser::parse(&tokens)
}

/// Run a whole program in a fresh interpreter, one result per statement
pub fn run_program(source: &str) -> Vec<StatementResult> {
    Interpreter::new().run_program(source)
}

/// Interpret source code and return the value of its last statement
pub fn interpret(source: &str) -> miette::Result<Option<Value>> {
    let forms = parse(source)?;
    let mut interpreter = Interpreter::new();
    let mut last = None;
    for form in &forms {
        last = interpreter.execute(form)?;
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_interpret_last_value() {
        let value = interpret("(define x 4) (* x x)").unwrap();
        assert_eq!(value, Some(Value::Int(16)));
    }

    #[test]
    fn test_interpret_stops_at_first_error() {
        assert!(interpret("(+ 1 #t) 5").is_err());
    }
}
