//! If/Else Conditionals
//!
//! An ephemeral construct holding a raw condition and two captured line
//! sequences. While the conditional is being defined, `append` targets
//! the then-branch until the `else` modifier flips the target. The
//! runner evaluates the condition once and dispatches the chosen branch.

use crate::shell::Shell;

#[derive(Debug, Clone)]
pub struct Conditional {
    condition: String,
    then_lines: Vec<String>,
    else_lines: Vec<String>,
    in_else: bool,
}

impl Conditional {
    pub fn new(condition: &str) -> Self {
        Self {
            condition: condition.to_string(),
            then_lines: Vec::new(),
            else_lines: Vec::new(),
            in_else: false,
        }
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// Switch `append` from the then-branch to the else-branch.
    pub fn select_else(&mut self) {
        self.in_else = true;
    }

    /// Store a raw line into whichever branch is currently open.
    pub fn append(&mut self, line: &str) {
        if self.in_else {
            self.else_lines.push(line.to_string());
        } else {
            self.then_lines.push(line.to_string());
        }
    }

    /// Evaluate the condition once and run the selected branch.
    pub fn run(&self, shell: &mut Shell) -> i32 {
        if shell.evaluate_condition(&self.condition) != 0 {
            shell.run_lines(&self.then_lines)
        } else {
            shell.run_lines(&self.else_lines)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
