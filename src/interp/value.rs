//! Runtime values for the interpreter

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Form;
use crate::diagnostics::LispError;

use super::builtins::NativeError;
use super::env::Environment;
use super::output::Output;

/// Runtime value
#[derive(Clone)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// Boolean
    Bool(bool),
    /// Builtin or closure, shared by reference
    Function(Rc<Function>),
    /// Result of the print builtins; never echoed, rejected by typed builtins
    Nothing,
}

/// Runtime type tags, used by type constraints and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    Bool,
    Function,
    Nothing,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Function => "function",
            ValueType::Nothing => "nothing",
        };
        write!(f, "{}", name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Bool(_) => ValueType::Bool,
            Value::Function(_) => ValueType::Function,
            Value::Nothing => ValueType::Nothing,
        }
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Function(_) => "function",
            Value::Nothing => "nothing",
        }
    }

    /// Truth value used by `if`: `#f`, `0` and nothing are false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::Function(_) => true,
            Value::Nothing => false,
        }
    }

    /// Try to get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Function(func) => write!(f, "{}", func),
            Value::Nothing => write!(f, "Nothing"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(true) => write!(f, "#t"),
            Value::Bool(false) => write!(f, "#f"),
            Value::Function(func) => write!(f, "{}", func),
            Value::Nothing => write!(f, "<nothing>"),
        }
    }
}

/// Integers and booleans compare by value, functions by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Nothing, Value::Nothing) => true,
            _ => false,
        }
    }
}

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, n) = match self {
            Arity::Exactly(n) => ("exactly", *n),
            Arity::AtLeast(n) => ("at least", *n),
        };
        let noun = if n == 1 { "argument" } else { "arguments" };
        write!(f, "{} {} {}", prefix, n, noun)
    }
}

/// Argument type requirement of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeConstraint {
    /// Every argument has this type
    Only(ValueType),
    /// Every argument has the type of the first one
    Same,
}

/// Native operation behind a builtin
pub type NativeFn = fn(&[Value], &mut Output) -> Result<Value, NativeError>;

/// A user function created by `fun`
pub struct Closure {
    pub params: Vec<String>,
    /// Frame holding the local defines, chained onto the captured environment
    pub env: Rc<Environment>,
    pub body: Rc<Form>,
}

#[derive(Clone)]
pub enum CallableKind {
    Builtin { name: &'static str, op: NativeFn },
    Closure(Rc<Closure>),
}

/// Everything needed to check and perform a call
#[derive(Clone)]
pub struct Callable {
    pub arity: Arity,
    pub constraint: Option<TypeConstraint>,
    pub kind: CallableKind,
}

impl Callable {
    /// Validate argument count, then argument types in order
    pub fn check_args(
        &self,
        name: &str,
        args: &[Value],
        span: miette::SourceSpan,
    ) -> Result<(), LispError> {
        if !self.arity.accepts(args.len()) {
            return Err(LispError::Arity {
                function: name.to_string(),
                expected: self.arity.to_string(),
                found: args.len(),
                span,
            });
        }

        let expected = match self.constraint {
            None => return Ok(()),
            Some(TypeConstraint::Only(ty)) => ty,
            Some(TypeConstraint::Same) => match args.first() {
                Some(first) => first.value_type(),
                None => return Ok(()),
            },
        };

        for (i, arg) in args.iter().enumerate() {
            if arg.value_type() != expected {
                return Err(LispError::Type {
                    function: name.to_string(),
                    position: i + 1,
                    expected: expected.to_string(),
                    found: arg.type_name().to_string(),
                    span,
                });
            }
        }
        Ok(())
    }
}

/// Whether a function has received its behaviour yet
#[derive(Clone)]
pub enum FunctionState {
    /// Placeholder bound while its own `define` is still evaluating
    Locked,
    Ready(Callable),
}

/// A function value
///
/// The state sits in a `RefCell` so that a locked placeholder can be completed in
/// place. Every `Rc` handle to it, including the one in a closure's captured
/// frame, observes the completion.
pub struct Function {
    name: String,
    state: RefCell<FunctionState>,
}

impl Function {
    pub fn builtin(
        name: &'static str,
        arity: Arity,
        constraint: Option<TypeConstraint>,
        op: NativeFn,
    ) -> Self {
        Function {
            name: name.to_string(),
            state: RefCell::new(FunctionState::Ready(Callable {
                arity,
                constraint,
                kind: CallableKind::Builtin { name, op },
            })),
        }
    }

    pub fn closure(closure: Closure) -> Self {
        let arity = Arity::Exactly(closure.params.len());
        Function {
            name: "anonymous".to_string(),
            state: RefCell::new(FunctionState::Ready(Callable {
                arity,
                constraint: None,
                kind: CallableKind::Closure(Rc::new(closure)),
            })),
        }
    }

    pub fn locked(name: impl Into<String>) -> Self {
        Function {
            name: name.into(),
            state: RefCell::new(FunctionState::Locked),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_locked(&self) -> bool {
        matches!(*self.state.borrow(), FunctionState::Locked)
    }

    /// Snapshot of the call behaviour, `None` while locked
    pub fn callable(&self) -> Option<Callable> {
        match &*self.state.borrow() {
            FunctionState::Locked => None,
            FunctionState::Ready(callable) => Some(callable.clone()),
        }
    }

    pub fn arity(&self) -> Option<Arity> {
        self.callable().map(|c| c.arity)
    }

    /// Name of the builtin behind this function, whatever it is bound as
    pub fn builtin_name(&self) -> Option<&'static str> {
        match &*self.state.borrow() {
            FunctionState::Ready(Callable {
                kind: CallableKind::Builtin { name, .. },
                ..
            }) => Some(*name),
            _ => None,
        }
    }

    /// Complete a placeholder with the behaviour of `source`
    ///
    /// Returns `false` and leaves `self` untouched if `source` is itself locked.
    pub fn unlock_from(&self, source: &Function) -> bool {
        let Some(callable) = source.callable() else {
            return false;
        };
        *self.state.borrow_mut() = FunctionState::Ready(callable);
        true
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function '{}'", self.name)?;
        match &*self.state.borrow() {
            FunctionState::Locked => write!(f, " (locked)")?,
            FunctionState::Ready(callable) => {
                write!(f, " ({})", callable.arity)?;
                match callable.constraint {
                    Some(TypeConstraint::Only(ty)) => write!(f, " (type {})", ty)?,
                    Some(TypeConstraint::Same) => write!(f, " (type same)")?,
                    None => {}
                }
            }
        }
        write!(f, ">")
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(args: &[Value], _out: &mut Output) -> Result<Value, NativeError> {
        Ok(args[0].clone())
    }

    fn span() -> miette::SourceSpan {
        (0, 0).into()
    }

    #[test]
    fn test_arity_accepts() {
        assert!(Arity::Exactly(2).accepts(2));
        assert!(!Arity::Exactly(2).accepts(3));
        assert!(Arity::AtLeast(2).accepts(5));
        assert!(!Arity::AtLeast(2).accepts(1));
    }

    #[test]
    fn test_arity_display() {
        assert_eq!(Arity::Exactly(1).to_string(), "exactly 1 argument");
        assert_eq!(Arity::AtLeast(2).to_string(), "at least 2 arguments");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Bool(true).to_string(), "#t");
        assert_eq!(Value::Bool(false).to_string(), "#f");
        assert_eq!(Value::Nothing.to_string(), "<nothing>");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-2).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Nothing.is_truthy());
        let id = Function::builtin("id", Arity::Exactly(1), None, identity);
        assert!(Value::Function(Rc::new(id)).is_truthy());
    }

    #[test]
    fn test_function_display() {
        let plus = Function::builtin(
            "+",
            Arity::AtLeast(2),
            Some(TypeConstraint::Only(ValueType::Int)),
            identity,
        );
        assert_eq!(
            plus.to_string(),
            "<function '+' (at least 2 arguments) (type int)>"
        );
        assert_eq!(Function::locked("f").to_string(), "<function 'f' (locked)>");
    }

    #[test]
    fn test_unlock_copies_behaviour() {
        let placeholder = Function::locked("f");
        let source = Function::builtin("id", Arity::Exactly(1), None, identity);
        assert!(placeholder.is_locked());
        assert!(placeholder.unlock_from(&source));
        assert!(!placeholder.is_locked());
        assert_eq!(placeholder.name(), "f");
        assert_eq!(placeholder.arity(), Some(Arity::Exactly(1)));
        assert_eq!(placeholder.builtin_name(), Some("id"));
    }

    #[test]
    fn test_unlock_from_locked_is_refused() {
        let placeholder = Function::locked("f");
        let other = Function::locked("g");
        assert!(!placeholder.unlock_from(&other));
        assert!(placeholder.is_locked());
    }

    #[test]
    fn test_same_constraint_reports_first_mismatch() {
        let callable = Callable {
            arity: Arity::AtLeast(2),
            constraint: Some(TypeConstraint::Same),
            kind: CallableKind::Builtin {
                name: "=",
                op: identity,
            },
        };
        let args = [Value::Int(1), Value::Int(2), Value::Bool(true)];
        match callable.check_args("=", &args, span()) {
            Err(LispError::Type {
                position,
                expected,
                found,
                ..
            }) => {
                assert_eq!(position, 3);
                assert_eq!(expected, "int");
                assert_eq!(found, "bool");
            }
            other => panic!("expected type error, got {:?}", other),
        }
    }

    #[test]
    fn test_arity_checked_before_types() {
        let callable = Callable {
            arity: Arity::Exactly(1),
            constraint: Some(TypeConstraint::Only(ValueType::Int)),
            kind: CallableKind::Builtin {
                name: "not-int",
                op: identity,
            },
        };
        let args = [Value::Bool(true), Value::Bool(false)];
        assert!(matches!(
            callable.check_args("not-int", &args, span()),
            Err(LispError::Arity { found: 2, .. })
        ));
    }

    #[test]
    fn test_function_equality_is_identity() {
        let a = Rc::new(Function::locked("a"));
        let b = Rc::new(Function::locked("a"));
        assert_eq!(Value::Function(a.clone()), Value::Function(a.clone()));
        assert_ne!(Value::Function(a), Value::Function(b));
        assert_ne!(Value::Int(1), Value::Bool(true));
    }
}
