//! Interpreter configuration
//!
//! Passed in when an interpreter is constructed; nothing here is process-global.

/// How much the interpreter and its front ends report beyond program output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Verbosity {
    /// Program output and `Error:` lines only
    #[default]
    Quiet,
    /// Also echo statement values and render full diagnostics
    Verbose,
    /// Also dump the visible scope for every evaluated list form
    Debug,
}

impl Verbosity {
    /// Map a `-v` occurrence count onto a level
    pub fn from_occurrences(count: u8) -> Self {
        match count {
            0 => Verbosity::Quiet,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    }

    pub fn echoes_values(self) -> bool {
        self >= Verbosity::Verbose
    }

    pub fn dumps_scopes(self) -> bool {
        self >= Verbosity::Debug
    }
}

/// Interpreter construction options
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    pub verbosity: Verbosity,
    /// Maximum evaluation depth; `None` leaves recursion bounded by the host stack
    pub max_depth: Option<usize>,
    /// Collect printed output in memory instead of writing it to stdout
    pub capture_output: bool,
}

impl InterpreterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn capturing_output(mut self) -> Self {
        self.capture_output = true;
        self
    }
}
