//! Console Contract
//!
//! The shell core is console-agnostic: it consumes this trait for line
//! input, user-facing output, and the error sink, and hands the console
//! a set of line hooks so the editor can drive registry-aware tab
//! completion and argument hints. Two implementations ship with the
//! crate: the rustyline-backed interactive console and an in-memory
//! capture console for tests and embedding hosts.

pub mod capture;
pub mod interactive;

pub use capture::CaptureConsole;
pub use interactive::InteractiveConsole;

use std::io::BufRead;

use crate::shell::completion::LineHooks;

/// User I/O surface the shell core depends on.
pub trait Console {
    /// Block for one line of input. `None` means "no line this time" —
    /// the caller re-checks `input_eof` and the quit flag and tries
    /// again. The prompt is only rendered when `interactive` is true.
    fn get_line(&mut self, prompt: &str, interactive: bool) -> Option<String>;

    /// Print a line of ordinary output.
    fn print(&self, text: &str);

    /// Report an error to the user. Never fatal.
    fn error(&self, text: &str);

    /// True when the current input source is exhausted.
    fn input_eof(&self) -> bool;

    /// Swap the input source, returning the previous one. `source` uses
    /// this to redirect input to a script file and must restore the
    /// previous source on every exit path.
    fn swap_input(&mut self, input: Option<ScriptInput>) -> Option<ScriptInput>;

    /// Install the tab-completion and argument-hint callbacks. Consoles
    /// without line editing ignore them.
    fn set_line_hooks(&mut self, _hooks: LineHooks) {}
}

/// A redirected input source: lines are read in order until exhaustion,
/// after which `eof` reports true and the console falls back to whatever
/// the host restores.
pub struct ScriptInput {
    reader: Box<dyn BufRead>,
    eof: bool,
}

impl ScriptInput {
    pub fn new(reader: Box<dyn BufRead>) -> Self {
        Self { reader, eof: false }
    }

    pub fn eof(&self) -> bool {
        self.eof
    }

    /// Next line with the trailing newline stripped; `None` at EOF.
    pub fn next_line(&mut self) -> Option<String> {
        let mut buf = String::new();
        match self.reader.read_line(&mut buf) {
            Ok(0) | Err(_) => {
                self.eof = true;
                None
            }
            Ok(_) => {
                while buf.ends_with('\n') || buf.ends_with('\r') {
                    buf.pop();
                }
                Some(buf)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
