//! coquille - an embeddable interactive command shell
//!
//! A shell toolkit a host program links in to expose a hierarchical set
//! of named commands at a line-oriented prompt. The same syntactic
//! surface lets the user define named reusable routines, control flow
//! (`while`, `if`/`else`), variables, and arithmetic/string
//! expressions.
//!
//! The host supplies a console (or uses the bundled rustyline-backed
//! one), registers its commands at the registry root, and hands lines
//! to [`Shell::dispatch`] — or lets [`Shell::run_console`] drive the
//! whole loop.

pub mod builtins;
pub mod console;
pub mod constructs;
pub mod errors;
pub mod logging;
pub mod parser;
pub mod registry;
pub mod shell;
pub mod variables;

pub use console::{CaptureConsole, Console, InteractiveConsole, ScriptInput};
pub use constructs::{Conditional, ConstructObject, Routine, WhileLoop};
pub use errors::{ShellError, ERROR_MARKER};
pub use registry::{CommandHandler, ConstructRole, ShellCmd};
pub use shell::{ArgHint, LineHooks, RegistrationFn, Shell, MAX_RECURSION};
pub use variables::VariableStore;
