//! Capture Console
//!
//! An in-memory console: input is a scripted queue of lines, output and
//! error streams are recorded strings. This is the test double for every
//! shell-level scenario and a convenient console for embedding hosts
//! that drive the shell programmatically.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::{Console, ScriptInput};

#[derive(Default)]
pub struct CaptureConsole {
    input: RefCell<VecDeque<String>>,
    script: Option<ScriptInput>,
    output: RefCell<String>,
    errors: RefCell<String>,
}

impl CaptureConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lines(lines: &[&str]) -> Self {
        let console = Self::new();
        for line in lines {
            console.input.borrow_mut().push_back(line.to_string());
        }
        console
    }

    pub fn push_line(&self, line: &str) {
        self.input.borrow_mut().push_back(line.to_string());
    }

    /// Everything printed so far, newline-separated.
    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }

    /// Everything reported on the error sink so far.
    pub fn errors(&self) -> String {
        self.errors.borrow().clone()
    }
}

impl Console for CaptureConsole {
    fn get_line(&mut self, _prompt: &str, _interactive: bool) -> Option<String> {
        if let Some(script) = self.script.as_mut() {
            return script.next_line();
        }
        self.input.borrow_mut().pop_front()
    }

    fn print(&self, text: &str) {
        let mut out = self.output.borrow_mut();
        out.push_str(text);
        out.push('\n');
    }

    fn error(&self, text: &str) {
        let mut err = self.errors.borrow_mut();
        err.push_str(text);
        err.push('\n');
    }

    fn input_eof(&self) -> bool {
        match &self.script {
            Some(script) => script.eof(),
            None => self.input.borrow().is_empty(),
        }
    }

    fn swap_input(&mut self, input: Option<ScriptInput>) -> Option<ScriptInput> {
        std::mem::replace(&mut self.script, input)
    }
}

// ============================================================================
// Tests
// ============================================================================
