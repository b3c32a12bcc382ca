//! Tree-walking evaluator for MiniLisp forms

use std::rc::Rc;

use crate::ast::{Form, FormKind, is_identifier};
use crate::common::Span;
use crate::config::InterpreterConfig;
use crate::diagnostics::LispError;

use super::builtins;
use super::env::Environment;
use super::output::Output;
use super::value::{CallableKind, Closure, Function, Value};

/// Outcome of one top-level statement: a value, nothing (for `define`), or an error
pub type StatementResult = Result<Option<Value>, LispError>;

/// Tree-walking interpreter
pub struct Interpreter {
    config: InterpreterConfig,
    /// Global frame, seeded with the builtins
    global: Rc<Environment>,
    /// Destination of the print builtins
    output: Output,
}

impl Interpreter {
    /// Create a new interpreter
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        let global = Environment::new();
        builtins::install(&global);
        let output = if config.capture_output {
            Output::capture()
        } else {
            Output::stdout()
        };
        Interpreter {
            config,
            global,
            output,
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn global(&self) -> &Rc<Environment> {
        &self.global
    }

    pub fn output_mut(&mut self) -> &mut Output {
        &mut self.output
    }

    /// Get captured output (for testing)
    pub fn get_output(&self) -> &[String] {
        self.output.captured()
    }

    /// Clear output buffer
    pub fn clear_output(&mut self) {
        self.output.take_captured();
    }

    /// Read and run every statement of `source` in the global environment
    ///
    /// A statement that fails is skipped; the statements after it still run. A
    /// source that cannot be read at all yields a single error and runs nothing.
    pub fn run_program(&mut self, source: &str) -> Vec<StatementResult> {
        let forms = match crate::parse(source) {
            Ok(forms) => forms,
            Err(error) => return vec![Err(error)],
        };
        forms.iter().map(|form| self.execute(form)).collect()
    }

    /// Run one top-level statement in the global environment
    pub fn execute(&mut self, form: &Form) -> StatementResult {
        tracing::debug!(statement = %form, "executing");
        let global = Rc::clone(&self.global);
        let result = self.eval_statement(form, &global, 0);
        match &result {
            Ok(Some(value)) => tracing::debug!(%value, "statement finished"),
            Ok(None) => tracing::debug!("statement finished without a value"),
            Err(error) => tracing::debug!(%error, "statement failed"),
        }
        result
    }

    fn eval_statement(
        &mut self,
        form: &Form,
        env: &Rc<Environment>,
        depth: usize,
    ) -> StatementResult {
        match &form.kind {
            FormKind::List(items) if form.is_special("define") => {
                self.eval_define(items, form.span, env, depth)?;
                Ok(None)
            }
            // A print statement has nothing to report
            _ => self.eval(form, env, depth).map(|value| match value {
                Value::Nothing => None,
                value => Some(value),
            }),
        }
    }

    fn eval(&mut self, form: &Form, env: &Rc<Environment>, depth: usize) -> Result<Value, LispError> {
        if let Some(limit) = self.config.max_depth {
            if depth > limit {
                return Err(LispError::RecursionLimit {
                    limit,
                    span: form.span.into(),
                });
            }
        }

        match &form.kind {
            FormKind::Atom(text) => eval_atom(text, form.span, env),
            FormKind::List(items) => self.eval_list(form, items, env, depth),
        }
    }

    fn eval_list(
        &mut self,
        form: &Form,
        items: &[Form],
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<Value, LispError> {
        let Some((head, args)) = items.split_first() else {
            return Err(LispError::MissingFunction {
                span: form.span.into(),
            });
        };

        if self.config.verbosity.dumps_scopes() {
            dump_scope(form, env, depth);
        }

        match head.as_atom() {
            Some("define") => {
                return Err(LispError::Syntax {
                    message: "`define` is a statement and has no value".into(),
                    span: form.span.into(),
                });
            }
            Some("fun") => return self.eval_fun(items, form.span, env, depth),
            Some("if") => return self.eval_if(items, form.span, env, depth),
            _ => {}
        }

        let function = self.resolve_callee(head, env, depth)?;

        // Arguments are evaluated left to right in the caller's environment
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, env, depth + 1)?);
        }

        self.apply(&function, values, form.span, depth)
    }

    /// `(define <id> <expr>)`
    fn eval_define(
        &mut self,
        items: &[Form],
        span: Span,
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<(), LispError> {
        let [_, target, expr] = items else {
            return Err(LispError::Syntax {
                message: "`define` expects a name and a value".into(),
                span: span.into(),
            });
        };

        let name = match target.as_atom() {
            Some(name) if is_identifier(name) => name,
            _ => {
                return Err(LispError::InvalidIdentifier {
                    name: target.to_string(),
                    span: target.span.into(),
                });
            }
        };

        if expr.is_list() {
            if let Some(function) = self.define_recursive(name, expr, env, depth)? {
                env.bind(name, Value::Function(function));
                return Ok(());
            }
        }

        let value = self.eval(expr, env, depth + 1)?;
        tracing::trace!(depth, define = name, %value, "define");
        env.bind(name, value);
        Ok(())
    }

    /// Trial-evaluate `expr` with `name` bound to a locked placeholder
    ///
    /// Returns the completed placeholder when `expr` produced a genuine function.
    /// Closures created during the trial captured the trial frame, so their
    /// references to `name` resolve to that same placeholder. `None` means the
    /// caller must evaluate `expr` again in `env`; output printed during the trial
    /// is dropped in that case.
    fn define_recursive(
        &mut self,
        name: &str,
        expr: &Form,
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<Option<Rc<Function>>, LispError> {
        let placeholder = Rc::new(Function::locked(name));
        let trial = env.child();
        trial.bind(name, Value::Function(Rc::clone(&placeholder)));

        self.output.stage();
        let outcome = self.eval(expr, &trial, depth + 1);

        let completed = match &outcome {
            Ok(Value::Function(result)) => {
                !Rc::ptr_eq(result, &placeholder) && placeholder.unlock_from(result)
            }
            _ => false,
        };

        if completed {
            self.output.commit();
            tracing::trace!(depth, define = name, "completed recursive definition");
            return Ok(Some(placeholder));
        }

        self.output.discard();
        match outcome {
            Err(error @ LispError::IncompleteFunction { .. }) => Err(error),
            _ => Ok(None),
        }
    }

    /// `(fun (<params>) <local-define>* <body>)`
    fn eval_fun(
        &mut self,
        items: &[Form],
        span: Span,
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<Value, LispError> {
        let (body, defines) = match items {
            [_, _, defines @ .., body] => (body, defines),
            _ => {
                return Err(LispError::Syntax {
                    message: "`fun` expects a parameter list and a body".into(),
                    span: span.into(),
                });
            }
        };
        let params = parse_params(&items[1])?;

        // Local defines are evaluated once, in a frame shared by every call
        let statics = env.child();
        for local in defines {
            match &local.kind {
                FormKind::List(local_items) if local.is_special("define") => {
                    self.eval_define(local_items, local.span, &statics, depth + 1)?;
                }
                _ => {
                    return Err(LispError::Syntax {
                        message: "only `define` forms may precede the body of `fun`".into(),
                        span: local.span.into(),
                    });
                }
            }
        }

        let closure = Closure {
            params,
            env: statics,
            body: Rc::new(body.clone()),
        };
        Ok(Value::Function(Rc::new(Function::closure(closure))))
    }

    /// `(if <cond> <then> <else>)`
    fn eval_if(
        &mut self,
        items: &[Form],
        span: Span,
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<Value, LispError> {
        let [_, condition, then_branch, else_branch] = items else {
            return Err(LispError::Syntax {
                message: "`if` expects a condition and two branches".into(),
                span: span.into(),
            });
        };

        if self.eval(condition, env, depth + 1)?.is_truthy() {
            self.eval(then_branch, env, depth + 1)
        } else {
            self.eval(else_branch, env, depth + 1)
        }
    }

    /// Find the function named or produced by the head of an application
    fn resolve_callee(
        &mut self,
        head: &Form,
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<Rc<Function>, LispError> {
        let value = match &head.kind {
            FormKind::List(_) => self.eval(head, env, depth + 1)?,
            FormKind::Atom(name) => match eval_atom(name, head.span, env) {
                Ok(value) => value,
                Err(LispError::UndefinedVariable { name, span }) => {
                    return Err(LispError::UndefinedFunction { name, span });
                }
                Err(LispError::Syntax { span, .. }) => {
                    return Err(LispError::Syntax {
                        message: format!("invalid function name: {}", name),
                        span,
                    });
                }
                Err(error) => return Err(error),
            },
        };

        match value {
            Value::Function(function) => Ok(function),
            other => Err(LispError::NotCallable {
                found: other.type_name().into(),
                span: head.span.into(),
            }),
        }
    }

    /// Call `function` with already evaluated arguments
    fn apply(
        &mut self,
        function: &Rc<Function>,
        args: Vec<Value>,
        span: Span,
        depth: usize,
    ) -> Result<Value, LispError> {
        let Some(callable) = function.callable() else {
            return Err(LispError::IncompleteFunction {
                name: function.name().to_string(),
                span: span.into(),
            });
        };
        callable.check_args(function.name(), &args, span.into())?;

        tracing::trace!(depth, function = function.name(), ?args, "call");

        let result = match &callable.kind {
            CallableKind::Builtin { op, .. } => {
                op(&args, &mut self.output).map_err(|e| e.at(function.name(), span.into()))?
            }
            CallableKind::Closure(closure) => {
                // Fresh frame per call, chained onto the closure's captured frame
                let frame = closure.env.child();
                for (param, arg) in closure.params.iter().zip(args) {
                    frame.bind(param.as_str(), arg);
                }
                self.eval(&closure.body, &frame, depth + 1)?
            }
        };

        tracing::trace!(depth, function = function.name(), %result, "return");
        Ok(result)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate an atom: literal, then variable
fn eval_atom(text: &str, span: Span, env: &Environment) -> Result<Value, LispError> {
    if let Some(value) = parse_literal(text, span)? {
        return Ok(value);
    }
    if let Some(value) = env.lookup(text) {
        return Ok(value);
    }
    if is_identifier(text) {
        Err(LispError::UndefinedVariable {
            name: text.to_string(),
            span: span.into(),
        })
    } else {
        Err(LispError::Syntax {
            message: text.to_string(),
            span: span.into(),
        })
    }
}

/// Integer literals (base 10, optional `-`) and `#t` / `#f`
fn parse_literal(text: &str, span: Span) -> Result<Option<Value>, LispError> {
    match text {
        "#t" => return Ok(Some(Value::Bool(true))),
        "#f" => return Ok(Some(Value::Bool(false))),
        _ => {}
    }

    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }

    text.parse::<i64>()
        .map(|n| Some(Value::Int(n)))
        .map_err(|_| LispError::Syntax {
            message: format!("integer literal out of range: {}", text),
            span: span.into(),
        })
}

/// Parameter list of a `fun`: distinct identifiers
fn parse_params(form: &Form) -> Result<Vec<String>, LispError> {
    let Some(items) = form.as_list() else {
        return Err(LispError::Syntax {
            message: "`fun` expects a parenthesized parameter list".into(),
            span: form.span.into(),
        });
    };

    let mut params: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let name = match item.as_atom() {
            Some(name) if is_identifier(name) => name,
            _ => {
                return Err(LispError::InvalidIdentifier {
                    name: item.to_string(),
                    span: item.span.into(),
                });
            }
        };
        if params.iter().any(|p| p == name) {
            return Err(LispError::Syntax {
                message: format!("duplicate parameter `{}`", name),
                span: item.span.into(),
            });
        }
        params.push(name.to_string());
    }
    Ok(params)
}

/// Debug view of the frame chain seen by `form`
fn dump_scope(form: &Form, env: &Environment, depth: usize) {
    let bindings = env.visible_bindings();
    let variables: Vec<String> = bindings
        .iter()
        .filter(|(_, value)| value.as_function().is_none())
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    let functions: Vec<&str> = bindings
        .iter()
        .filter(|(_, value)| value.as_function().is_some())
        .map(|(name, _)| name.as_str())
        .collect();

    tracing::debug!(depth, frames = env.depth(), "statement: {}", form);
    tracing::debug!(depth, "| variables: {}", variables.join(" "));
    tracing::debug!(depth, "| functions: {}", functions.join(" "));
}
