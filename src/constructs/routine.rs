//! Routines
//!
//! A routine is a named, user-defined command: an ordered sequence of
//! raw, uninterpreted lines captured between `routine <name>` and its
//! matching `end`. On completion it is registered as a mutable command
//! whose handler replays the body through the dispatcher, so variable
//! substitution and tokenization happen at call time, per call.

use crate::errors::ShellError;
use crate::shell::Shell;

#[derive(Debug, Clone)]
pub struct Routine {
    name: String,
    lines: Vec<String>,
}

impl Routine {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a raw body line as-is.
    pub fn append(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Run the body with the given invocation arguments. Arguments land
    /// in `%0 … %N` first so the replayed lines can reference them.
    pub fn run(&self, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
        shell.store_args(args);
        Ok(shell.run_lines(&self.lines))
    }
}

// ============================================================================
// Tests
// ============================================================================
