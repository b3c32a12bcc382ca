//! Builtin function library
//!
//! Each builtin declares its arity and argument types. The evaluator checks both
//! before calling the native operation, so the operations below can rely on
//! well-typed arguments.

use miette::SourceSpan;
use thiserror::Error;

use crate::diagnostics::LispError;

use super::env::Environment;
use super::output::Output;
use super::value::{Arity, Function, NativeFn, TypeConstraint, Value, ValueType};

use std::rc::Rc;

/// Failure inside a native operation, before a span is attached
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
}

impl NativeError {
    /// Attach the failing call's name and location
    pub fn at(self, function: &str, span: SourceSpan) -> LispError {
        let function = function.to_string();
        match self {
            NativeError::DivisionByZero => LispError::DivisionByZero { function, span },
            NativeError::Overflow => LispError::Overflow { function, span },
        }
    }
}

/// Static description of a builtin
struct BuiltinDef {
    name: &'static str,
    arity: Arity,
    constraint: Option<TypeConstraint>,
    op: NativeFn,
}

const INT: Option<TypeConstraint> = Some(TypeConstraint::Only(ValueType::Int));
const BOOL: Option<TypeConstraint> = Some(TypeConstraint::Only(ValueType::Bool));
const SAME: Option<TypeConstraint> = Some(TypeConstraint::Same);

const BUILTINS: &[BuiltinDef] = &[
    BuiltinDef { name: "+", arity: Arity::AtLeast(2), constraint: INT, op: add },
    BuiltinDef { name: "-", arity: Arity::Exactly(2), constraint: INT, op: sub },
    BuiltinDef { name: "*", arity: Arity::AtLeast(2), constraint: INT, op: mul },
    BuiltinDef { name: "/", arity: Arity::Exactly(2), constraint: INT, op: div },
    BuiltinDef { name: "mod", arity: Arity::Exactly(2), constraint: INT, op: modulo },
    BuiltinDef { name: "=", arity: Arity::AtLeast(2), constraint: SAME, op: equal },
    BuiltinDef { name: ">", arity: Arity::Exactly(2), constraint: INT, op: greater },
    BuiltinDef { name: "<", arity: Arity::Exactly(2), constraint: INT, op: less },
    BuiltinDef { name: "and", arity: Arity::AtLeast(2), constraint: BOOL, op: and },
    BuiltinDef { name: "or", arity: Arity::AtLeast(2), constraint: BOOL, op: or },
    BuiltinDef { name: "not", arity: Arity::Exactly(1), constraint: BOOL, op: not },
    BuiltinDef { name: "print-num", arity: Arity::Exactly(1), constraint: INT, op: print_num },
    BuiltinDef { name: "print-bool", arity: Arity::Exactly(1), constraint: BOOL, op: print_bool },
];

/// Bind every builtin in `env`
pub fn install(env: &Environment) {
    for def in BUILTINS {
        let func = Function::builtin(def.name, def.arity, def.constraint, def.op);
        env.bind(def.name, Value::Function(Rc::new(func)));
    }
    tracing::trace!("Installed {} builtins", BUILTINS.len());
}

/// Names of all builtins, in table order
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|def| def.name)
}

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.iter().any(|def| def.name == name)
}

fn int_at(args: &[Value], index: usize) -> i64 {
    match args.get(index).and_then(Value::as_int) {
        Some(n) => n,
        None => unreachable!("argument types are checked before the call"),
    }
}

fn bool_at(args: &[Value], index: usize) -> bool {
    match args.get(index).and_then(Value::as_bool) {
        Some(b) => b,
        None => unreachable!("argument types are checked before the call"),
    }
}

fn ints(args: &[Value]) -> impl Iterator<Item = i64> + '_ {
    (0..args.len()).map(|i| int_at(args, i))
}

fn bools(args: &[Value]) -> impl Iterator<Item = bool> + '_ {
    (0..args.len()).map(|i| bool_at(args, i))
}

/// Integer division rounding toward negative infinity
pub fn floor_div(a: i64, b: i64) -> Result<i64, NativeError> {
    if b == 0 {
        return Err(NativeError::DivisionByZero);
    }
    let q = a.checked_div(b).ok_or(NativeError::Overflow)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Remainder that takes the sign of the divisor, so `a == b * floor_div(a, b) + floor_mod(a, b)`
pub fn floor_mod(a: i64, b: i64) -> Result<i64, NativeError> {
    if b == 0 {
        return Err(NativeError::DivisionByZero);
    }
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn add(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    ints(args)
        .try_fold(0i64, |acc, n| acc.checked_add(n))
        .map(Value::Int)
        .ok_or(NativeError::Overflow)
}

fn sub(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    int_at(args, 0)
        .checked_sub(int_at(args, 1))
        .map(Value::Int)
        .ok_or(NativeError::Overflow)
}

fn mul(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    ints(args)
        .try_fold(1i64, |acc, n| acc.checked_mul(n))
        .map(Value::Int)
        .ok_or(NativeError::Overflow)
}

fn div(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    floor_div(int_at(args, 0), int_at(args, 1)).map(Value::Int)
}

fn modulo(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    floor_mod(int_at(args, 0), int_at(args, 1)).map(Value::Int)
}

fn equal(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    let (first, rest) = match args.split_first() {
        Some(split) => split,
        None => return Ok(Value::Bool(true)),
    };
    Ok(Value::Bool(rest.iter().all(|v| v == first)))
}

fn greater(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    Ok(Value::Bool(int_at(args, 0) > int_at(args, 1)))
}

fn less(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    Ok(Value::Bool(int_at(args, 0) < int_at(args, 1)))
}

fn and(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    Ok(Value::Bool(bools(args).all(|b| b)))
}

fn or(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    Ok(Value::Bool(bools(args).any(|b| b)))
}

fn not(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
    Ok(Value::Bool(!bool_at(args, 0)))
}

fn print_num(args: &[Value], out: &mut Output) -> Result<Value, NativeError> {
    out.emit(int_at(args, 0).to_string());
    Ok(Value::Nothing)
}

fn print_bool(args: &[Value], out: &mut Output) -> Result<Value, NativeError> {
    out.emit(Value::Bool(bool_at(args, 0)).to_string());
    Ok(Value::Nothing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_div() {
        assert_eq!(floor_div(7, 2), Ok(3));
        assert_eq!(floor_div(-7, 2), Ok(-4));
        assert_eq!(floor_div(7, -2), Ok(-4));
        assert_eq!(floor_div(-7, -2), Ok(3));
        assert_eq!(floor_div(-8, 2), Ok(-4));
        assert_eq!(floor_div(1, 0), Err(NativeError::DivisionByZero));
        assert_eq!(floor_div(i64::MIN, -1), Err(NativeError::Overflow));
    }

    #[test]
    fn test_floor_mod() {
        assert_eq!(floor_mod(7, 3), Ok(1));
        assert_eq!(floor_mod(-7, 3), Ok(2));
        assert_eq!(floor_mod(7, -3), Ok(-2));
        assert_eq!(floor_mod(-7, -3), Ok(-1));
        assert_eq!(floor_mod(i64::MIN, -1), Ok(0));
        assert_eq!(floor_mod(5, 0), Err(NativeError::DivisionByZero));
    }

    #[test]
    fn test_install_binds_every_builtin() {
        let env = Environment::new();
        install(&env);
        for name in builtin_names() {
            let value = env.lookup(name).expect("builtin should be bound");
            let func = value.as_function().expect("builtin should be a function");
            assert_eq!(func.name(), name);
            assert!(!func.is_locked());
        }
        assert_eq!(builtin_names().count(), 13);
    }

    #[test]
    fn test_add_overflow() {
        let mut out = Output::capture();
        let args = [Value::Int(i64::MAX), Value::Int(1)];
        assert_eq!(add(&args, &mut out), Err(NativeError::Overflow));
    }

    #[test]
    fn test_print_returns_nothing() {
        let mut out = Output::capture();
        assert_eq!(print_num(&[Value::Int(42)], &mut out), Ok(Value::Nothing));
        assert_eq!(
            print_bool(&[Value::Bool(false)], &mut out),
            Ok(Value::Nothing)
        );
        assert_eq!(out.captured(), ["42", "#f"]);
    }
}
