//! Tab Completion and Argument Hints
//!
//! Both engines walk the command tree the same way: tokenize the input
//! buffer non-destructively, follow exact keyword matches as deep as
//! they go, then act at the first unmatched position. Completion offers
//! the partial matches of the last matched command; hints surface the
//! next un-provided token of its argument template.
//!
//! The engines are pure functions over the registry root, wrapped in
//! `LineHooks` — a cheap clone holding the shared registry handle — so
//! the line editor can call them while the shell is blocked reading.

use std::cell::RefCell;
use std::rc::Rc;

use crate::parser::tokenizer::{tokenize_spans, DELIMITERS};
use crate::registry::ShellCmd;

/// ANSI color for argument hints.
pub const ARG_HINTS_COLOR: u8 = 35;
pub const ARG_HINTS_BOLD: bool = false;

/// A context-sensitive hint to render after the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgHint {
    pub text: String,
    pub color: u8,
    pub bold: bool,
}

/// Registry-aware callbacks handed to the console's line editor.
#[derive(Clone)]
pub struct LineHooks {
    commands: Rc<RefCell<ShellCmd>>,
}

impl LineHooks {
    pub fn new(commands: Rc<RefCell<ShellCmd>>) -> Self {
        Self { commands }
    }

    /// Candidate completions for `buffer`: the byte offset where the
    /// replacement begins and the replacement strings themselves.
    pub fn completions(&self, buffer: &str) -> (usize, Vec<String>) {
        completions(&self.commands.borrow(), buffer)
    }

    /// The next argument hint for `buffer`, if any.
    pub fn arg_hint(&self, buffer: &str) -> Option<ArgHint> {
        arg_hint(&self.commands.borrow(), buffer)
    }
}

/// Follow exact keyword matches from `root` along the buffer's tokens.
/// Returns the deepest matched command and the number of tokens it
/// consumed.
fn walk<'a>(root: &'a ShellCmd, buffer: &str, spans: &[crate::parser::TokenSpan]) -> (&'a ShellCmd, usize) {
    let mut current = root;
    let mut matched = 0;
    for span in spans {
        match current.find(span.text(buffer)) {
            Some(child) => {
                current = child;
                matched += 1;
            }
            None => break,
        }
    }
    (current, matched)
}

/// Tab completion per the strategy above. Each candidate is the text to
/// place from the returned offset: the matching keyword followed by the
/// primary delimiter.
pub fn completions(root: &ShellCmd, buffer: &str) -> (usize, Vec<String>) {
    let spans = tokenize_spans(buffer);
    if spans.is_empty() {
        return (0, Vec::new());
    }

    let (parent, matched) = walk(root, buffer, &spans);
    tracing::trace!(buffer, matched, "tab completion walk");

    if matched < spans.len() {
        // Complete the first unmatched word in place.
        let span = spans[matched];
        let (matches, _longest) = parent.partial_matches(span.text(buffer));
        let candidates = matches.iter().map(|kw| format!("{kw} ")).collect();
        (span.start, candidates)
    } else {
        // Every word named a command; offer the sub-commands of the
        // last one, separated from the buffer if it lacks a delimiter.
        let (matches, _longest) = parent.partial_matches("");
        let sep = if buffer.ends_with(DELIMITERS) { "" } else { " " };
        let candidates = matches.iter().map(|kw| format!("{sep}{kw} ")).collect();
        (buffer.len(), candidates)
    }
}

/// Argument hint per the strategy above: the `(argc - depth)`-th token
/// of the last matched command's argument template, preceded by one
/// space.
pub fn arg_hint(root: &ShellCmd, buffer: &str) -> Option<ArgHint> {
    let spans = tokenize_spans(buffer);
    if spans.is_empty() {
        return None;
    }

    let (parent, matched) = walk(root, buffer, &spans);
    let hints = parent.arghints()?;
    let tokens: Vec<&str> = hints.split_whitespace().collect();

    // Hints already fulfilled by typed arguments are not shown.
    let index = spans.len() - matched;
    let token = tokens.get(index)?;

    Some(ArgHint {
        text: format!(" {token}"),
        color: ARG_HINTS_COLOR,
        bold: ARG_HINTS_BOLD,
    })
}

// ============================================================================
// Tests
// ============================================================================
