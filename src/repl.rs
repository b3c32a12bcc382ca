//! Front-end session: runs source text statement by statement and reports outcomes
//!
//! Reports go through the interpreter's output sink, so `Error:` lines and
//! statement values interleave correctly with what the program prints.

use owo_colors::OwoColorize;

use crate::config::InterpreterConfig;
use crate::diagnostics::{LispError, SourceFile};
use crate::interp::{Interpreter, Value, builtins};

/// How statement values are surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Running a file: only program output and errors are shown
    Batch,
    /// Reading from a prompt: statement values are echoed
    Interactive,
}

/// Counts from one call to [`Session::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub statements: usize,
    pub errors: usize,
}

/// An interpreter with a persistent global environment and a reporting mode
pub struct Session {
    interpreter: Interpreter,
    mode: Mode,
    source_name: String,
    /// Highlight echoed values and errors with ANSI colours
    colour: bool,
}

impl Session {
    pub fn new(mode: Mode, config: InterpreterConfig) -> Self {
        Session {
            interpreter: Interpreter::with_config(config),
            mode,
            source_name: "<input>".to_string(),
            colour: false,
        }
    }

    /// Name shown in rendered diagnostics
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Colour `===>` lines green and `Error:` lines yellow
    pub fn with_colour(mut self, colour: bool) -> Self {
        self.colour = colour;
        self
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    fn echoes_values(&self) -> bool {
        self.mode == Mode::Interactive || self.interpreter.config().verbosity.echoes_values()
    }

    /// Run every statement of `source`, reporting values and errors as they happen
    pub fn run(&mut self, source: &str) -> RunSummary {
        let file = SourceFile::new(self.source_name.clone(), source);
        let mut summary = RunSummary::default();

        let forms = match crate::parse(source) {
            Ok(forms) => forms,
            Err(error) => {
                self.report_error(&file, error);
                summary.errors += 1;
                return summary;
            }
        };

        for form in &forms {
            summary.statements += 1;
            match self.interpreter.execute(form) {
                Ok(Some(value)) => {
                    if self.echoes_values() {
                        let line = format!("===> {}", value);
                        let line = if self.colour {
                            line.bright_green().to_string()
                        } else {
                            line
                        };
                        self.interpreter.output_mut().emit(line);
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    self.report_error(&file, error);
                    summary.errors += 1;
                }
            }
        }

        tracing::debug!(
            statements = summary.statements,
            errors = summary.errors,
            "run finished"
        );
        summary
    }

    fn report_error(&mut self, file: &SourceFile, error: LispError) {
        tracing::debug!(offset = error.span().offset(), %error, "statement error");
        let line = format!("Error: {}", error);
        let line = if self.colour {
            line.bright_yellow().to_string()
        } else {
            line
        };
        self.interpreter.output_mut().emit(line);
        if self.interpreter.config().verbosity.echoes_values() {
            eprintln!("{:?}", file.report(error));
        }
    }

    /// Whether `buffer` is an unfinished statement (an open `(` without its `)`)
    pub fn needs_more_input(buffer: &str) -> bool {
        matches!(crate::parse(buffer), Err(LispError::UnclosedParen { .. }))
    }

    /// Global bindings, builtins first, as display lines
    pub fn environment_listing(&self) -> Vec<String> {
        let bindings = self.interpreter.global().local_bindings();
        let (builtin, user): (Vec<_>, Vec<_>) = bindings
            .into_iter()
            .partition(|(name, value)| is_original_builtin(name, value));

        let mut lines = Vec::new();
        lines.push(format!("Built-in functions ({}):", builtin.len()));
        let names: Vec<String> = builtin.into_iter().map(|(name, _)| name).collect();
        lines.push(format!("  {}", names.join(" ")));
        if user.is_empty() {
            lines.push("No user definitions.".to_string());
        } else {
            lines.push(format!("User definitions ({}):", user.len()));
            for (name, value) in user {
                lines.push(format!("  {} = {}", name, value));
            }
        }
        lines
    }
}

/// A builtin name still bound to that builtin (not redefined by the user)
fn is_original_builtin(name: &str, value: &Value) -> bool {
    builtins::is_builtin(name)
        && value
            .as_function()
            .and_then(|f| f.builtin_name())
            .is_some_and(|builtin| builtin == name)
}

/// Text of the `:help` command
pub const HELP: &str = "\
Commands:
  :help, :h    Show this help
  :env         Show global bindings
  :quit, :q    Exit the REPL

Language:
  (define name value)              bind a name
  (fun (a b) (define k 1) body)    function with local definitions
  (if cond then else)              conditional
  + - * / mod = < > and or not     builtins
  print-num print-bool             output";
