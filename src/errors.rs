//! Shell Errors
//!
//! Every recoverable failure in the shell is a `ShellError` variant. The
//! display string is the exact text reported on the console error sink;
//! the dispatcher is the single place that turns an `Err` into an error
//! report plus the `%?` error marker. Nothing here is fatal: all errors
//! are recoverable at the prompt.

use thiserror::Error;

use crate::parser::ExprError;

/// Out-of-band result stored in `%?` when a line cannot be executed
/// normally. Chosen far outside the plausible range of handler results.
pub const ERROR_MARKER: i32 = -999_999_999;

#[derive(Debug, Error)]
pub enum ShellError {
    /// The dispatcher could not resolve the first token of a line.
    #[error("unknown command '{0}', try 'help'")]
    UnknownCommand(String),

    /// A `{name}` reference named a variable that is not stored.
    #[error("variable '{0}' not found")]
    UnknownVariable(String),

    /// The dispatch recursion counter exceeded its bound.
    #[error("maximum recursion depth {0} reached")]
    RecursionLimit(usize),

    /// A handler was invoked with too few arguments.
    #[error("expected {0}")]
    Expected(&'static str),

    /// A keyword lookup requested by the user came up empty.
    #[error("command '{0}' not found")]
    CommandNotFound(String),

    /// `register` with a keyword already present under the parent.
    #[error("keyword '{0}' is already registered")]
    DuplicateKeyword(String),

    /// `unreg` on a command without the mutable attribute.
    #[error("can't unregister immutable command '{0}'")]
    ImmutableCommand(String),

    /// `end` with no open construct frame.
    #[error("construct stack is empty")]
    ConstructUnderflow,

    /// `else` executed while no conditional is being defined.
    #[error("else without if construct")]
    ElseWithoutIf,

    /// `routine <name>` where a routine by that name already exists.
    #[error("routine '{0}' already exists")]
    RoutineExists(String),

    /// A routine command fired but its body is missing from the table.
    #[error("routine '{0}' not found")]
    RoutineMissing(String),

    /// A condition handed to `while`/`if` fails the expression heuristic.
    #[error("condition '{0}' is not an expression")]
    NotAnExpression(String),

    #[error(transparent)]
    Expr(#[from] ExprError),

    /// `source` could not open its script file.
    #[error("could not open {path} for reading: {source}")]
    ScriptOpen {
        path: String,
        source: std::io::Error,
    },

    /// `log file` could not open the requested log sink.
    #[error("could not open log file {path}: {source}")]
    LogFile {
        path: String,
        source: std::io::Error,
    },
}

// ============================================================================
// Tests
// ============================================================================
