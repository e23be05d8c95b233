// src/shell/mod.rs
pub mod completion;
pub mod shell;

pub use completion::{ArgHint, LineHooks, ARG_HINTS_BOLD, ARG_HINTS_COLOR};
pub use shell::{RegistrationFn, Shell, MAX_RECURSION};
