//! Destination for text produced by the print builtins

/// Where committed lines end up
#[derive(Debug)]
enum Sink {
    Stdout,
    Capture(Vec<String>),
}

/// Output sink with support for staged (tentative) output
///
/// While a stage is open, emitted lines are held back. Committing a stage hands
/// its lines to the enclosing stage or the sink; discarding drops them.
#[derive(Debug)]
pub struct Output {
    sink: Sink,
    staged: Vec<Vec<String>>,
}

impl Output {
    pub fn stdout() -> Self {
        Output {
            sink: Sink::Stdout,
            staged: Vec::new(),
        }
    }

    pub fn capture() -> Self {
        Output {
            sink: Sink::Capture(Vec::new()),
            staged: Vec::new(),
        }
    }

    pub fn emit(&mut self, line: impl Into<String>) {
        let line = line.into();
        match self.staged.last_mut() {
            Some(stage) => stage.push(line),
            None => self.write(line),
        }
    }

    fn write(&mut self, line: String) {
        match &mut self.sink {
            Sink::Stdout => println!("{}", line),
            Sink::Capture(lines) => lines.push(line),
        }
    }

    pub fn stage(&mut self) {
        self.staged.push(Vec::new());
    }

    pub fn commit(&mut self) {
        if let Some(lines) = self.staged.pop() {
            for line in lines {
                self.emit(line);
            }
        }
    }

    pub fn discard(&mut self) {
        self.staged.pop();
    }

    /// Lines captured so far (always empty when writing to stdout)
    pub fn captured(&self) -> &[String] {
        match &self.sink {
            Sink::Stdout => &[],
            Sink::Capture(lines) => lines,
        }
    }

    pub fn take_captured(&mut self) -> Vec<String> {
        match &mut self.sink {
            Sink::Stdout => Vec::new(),
            Sink::Capture(lines) => std::mem::take(lines),
        }
    }
}
