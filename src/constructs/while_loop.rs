//! While Loops
//!
//! An ephemeral construct: a raw condition expression plus the captured
//! body lines. The loop lives only on the construct stack; when its
//! `end` pops the frame the runner executes it and the object is
//! destroyed.

use crate::shell::Shell;

#[derive(Debug, Clone)]
pub struct WhileLoop {
    condition: String,
    lines: Vec<String>,
}

impl WhileLoop {
    pub fn new(condition: &str) -> Self {
        Self {
            condition: condition.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// Store a raw body line as-is; substitution happens per iteration.
    pub fn append(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    /// Substitute and evaluate the condition before every iteration,
    /// dispatching the body lines while it holds. A condition that fails
    /// to evaluate reads as false and ends the loop. The quit flag also
    /// ends the loop so `quit` inside a body takes effect.
    pub fn run(&self, shell: &mut Shell) -> i32 {
        let mut result = 0;
        while !shell.should_quit() && shell.evaluate_condition(&self.condition) != 0 {
            result = shell.run_lines(&self.lines);
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
