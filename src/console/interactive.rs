//! Interactive Console
//!
//! A rustyline-backed console: line editing, persistent history, and a
//! helper that drives registry-aware tab completion and argument hints
//! through the shell's line hooks. Non-interactive reads (piped stdin)
//! bypass the editor, and a `source`d script takes precedence over both.
//!
//! Interrupts are budgeted: consecutive Ctrl-C presses count up, and
//! once the budget is exhausted the console reports EOF so the host
//! tears the shell down cleanly. Any completed line resets the count.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};

use crate::shell::completion::{LineHooks, ARG_HINTS_BOLD, ARG_HINTS_COLOR};

use super::{Console, ScriptInput};

/// Consecutive interrupts tolerated before the console reports EOF.
pub const MAX_INTERRUPTS: u32 = 5;

pub struct InteractiveConsole {
    editor: Editor<EditorHelper, FileHistory>,
    history_path: PathBuf,
    script: Option<ScriptInput>,
    eof: bool,
    interrupts: u32,
}

impl InteractiveConsole {
    /// Create the console, loading history from `history_path` when the
    /// file exists.
    pub fn new(history_path: &str) -> Result<Self, ReadlineError> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .build();
        let mut editor: Editor<EditorHelper, FileHistory> = Editor::with_config(config)?;
        editor.set_helper(Some(EditorHelper { hooks: None }));

        let history_path = PathBuf::from(history_path);
        if editor.load_history(&history_path).is_err() {
            tracing::debug!(path = %history_path.display(), "no history file yet");
        }

        Ok(Self {
            editor,
            history_path,
            script: None,
            eof: false,
            interrupts: 0,
        })
    }
}

impl Console for InteractiveConsole {
    fn get_line(&mut self, prompt: &str, interactive: bool) -> Option<String> {
        if let Some(script) = self.script.as_mut() {
            return script.next_line();
        }

        if !interactive {
            let mut buf = String::new();
            return match io::stdin().read_line(&mut buf) {
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
            };
        }

        match self.editor.readline(prompt) {
            Ok(line) => {
                self.interrupts = 0;
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) => {
                self.interrupts += 1;
                if self.interrupts >= MAX_INTERRUPTS {
                    self.error("interrupted, quitting");
                    self.eof = true;
                }
                None
            }
            Err(ReadlineError::Eof) => {
                self.eof = true;
                None
            }
            Err(err) => {
                self.error(&format!("console read failed: {err}"));
                self.eof = true;
                None
            }
        }
    }

    fn print(&self, text: &str) {
        println!("{text}");
        let _ = io::stdout().flush();
    }

    fn error(&self, text: &str) {
        eprintln!("error: {text}");
    }

    fn input_eof(&self) -> bool {
        match &self.script {
            Some(script) => script.eof(),
            None => self.eof,
        }
    }

    fn swap_input(&mut self, input: Option<ScriptInput>) -> Option<ScriptInput> {
        std::mem::replace(&mut self.script, input)
    }

    fn set_line_hooks(&mut self, hooks: LineHooks) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.hooks = Some(hooks);
        }
    }
}

impl Drop for InteractiveConsole {
    fn drop(&mut self) {
        if let Err(err) = self.editor.save_history(&self.history_path) {
            tracing::warn!(path = %self.history_path.display(), %err, "failed to save history");
        }
    }
}

/// Bridges rustyline's completion/hint traits onto the shell's line
/// hooks.
pub struct EditorHelper {
    hooks: Option<LineHooks>,
}

impl Completer for EditorHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let Some(hooks) = &self.hooks else {
            return Ok((0, Vec::new()));
        };
        let (start, candidates) = hooks.completions(&line[..pos]);
        let pairs = candidates
            .into_iter()
            .map(|replacement| Pair {
                display: replacement.trim().to_string(),
                replacement,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for EditorHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        // Only hint at end-of-line, where the suffix renders cleanly.
        if line.is_empty() || pos < line.len() {
            return None;
        }
        Some(self.hooks.as_ref()?.arg_hint(line)?.text)
    }
}

impl Highlighter for EditorHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        let style = if ARG_HINTS_BOLD {
            format!("1;{ARG_HINTS_COLOR}")
        } else {
            ARG_HINTS_COLOR.to_string()
        };
        Cow::Owned(format!("\x1b[{style}m{hint}\x1b[0m"))
    }
}

impl Validator for EditorHelper {}

impl Helper for EditorHelper {}
