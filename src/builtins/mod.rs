//! Built-In Commands
//!
//! The default command set: core shell housekeeping (`help`, `quit`,
//! `alias`, `unreg`, `log`, `source`), the expression-facing commands
//! (`print`, `assign`), and the multi-line language constructs
//! (`routine`, `while`, `if`/`else`, `end`).
//!
//! Everything except the construct keywords registers mutable, so a
//! host (or the user) can unregister or alias the pieces they do not
//! want. The construct keywords are immutable: removing half of a
//! push/pop pair would corrupt every later definition.

pub mod core;
pub mod flow;
pub mod lang;

use std::rc::Rc;

use crate::errors::ShellError;
use crate::registry::{ConstructRole, ShellCmd};
use crate::shell::Shell;

/// Register the complete built-in command set. Pass to `Shell::new`.
pub fn register_all(shell: &mut Shell) -> Result<(), ShellError> {
    shell.register_command(
        ShellCmd::new(
            "help",
            Some("[keyword]"),
            "show a list of commands with hints and descriptions",
            Rc::new(core::help),
        )
        .mutable(),
    )?;

    shell.register_command(
        ShellCmd::new(
            "quit",
            None,
            "exit the command handling loop",
            Rc::new(core::quit),
        )
        .mutable(),
    )?;

    shell.register_command(
        ShellCmd::new(
            "alias",
            Some("<alias-keyword> <original-keyword>"),
            "alias one command keyword to another",
            Rc::new(core::alias),
        )
        .mutable(),
    )?;

    shell.register_command(
        ShellCmd::new(
            "unreg",
            Some("<command-keyword>"),
            "unregister a mutable command",
            Rc::new(core::unregister),
        )
        .mutable(),
    )?;

    let mut log = ShellCmd::new(
        "log",
        Some("<log-command> <...>"),
        "change logger options",
        Rc::new(core::log_group),
    )
    .mutable();
    log.register(ShellCmd::new(
        "level",
        Some("<0..5>"),
        "change the log message level (0=verbose, 5=fatal)",
        Rc::new(core::log_level),
    ))?;
    log.register(ShellCmd::new(
        "stdout",
        Some("<true/false>"),
        "enable or disable logging to stdout",
        Rc::new(core::log_stdout),
    ))?;
    log.register(ShellCmd::new(
        "file",
        Some("<log-file-path>"),
        "change the log file path",
        Rc::new(core::log_file),
    ))?;
    shell.register_command(log)?;

    shell.register_command(
        ShellCmd::new(
            "print",
            Some("[arbitrary-expression(s)]"),
            "print expressions, strings, and variables",
            Rc::new(lang::print),
        )
        .mutable(),
    )?;

    shell.register_command(
        ShellCmd::new(
            "assign",
            Some("<var-name> <value>"),
            "assign a value to a variable",
            Rc::new(lang::assign),
        )
        .mutable(),
    )?;

    shell.register_command(
        ShellCmd::new(
            "source",
            Some("<script-path>"),
            "load and run a command script",
            Rc::new(core::source),
        )
        .mutable(),
    )?;

    shell.register_command(
        ShellCmd::new(
            "routine",
            Some("<routine-name> ..."),
            "define and register a new routine",
            Rc::new(flow::routine),
        )
        .construct(ConstructRole::Push),
    )?;

    shell.register_command(
        ShellCmd::new(
            "while",
            Some("(expression)"),
            "declare a while-loop construct",
            Rc::new(flow::while_loop),
        )
        .construct(ConstructRole::Push),
    )?;

    shell.register_command(
        ShellCmd::new(
            "if",
            Some("(expression)"),
            "declare an if-else construct, else is optional",
            Rc::new(flow::if_else),
        )
        .construct(ConstructRole::Push),
    )?;

    shell.register_command(
        ShellCmd::new(
            "else",
            None,
            "denotes the else part of an if-else construct",
            Rc::new(flow::else_branch),
        )
        .construct(ConstructRole::Modifier),
    )?;

    shell.register_command(
        ShellCmd::new(
            "end",
            None,
            "finalize a multi-line language construct",
            Rc::new(flow::end),
        )
        .construct(ConstructRole::Pop),
    )?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{CaptureConsole, Console};
    use std::cell::RefCell;

    #[test]
    fn test_register_all_provides_the_builtin_set() {
        let console: Rc<RefCell<dyn Console>> = Rc::new(RefCell::new(CaptureConsole::new()));
        let shell = Shell::new(console, register_all, "t").unwrap();
        let commands = shell.commands();
        let commands = commands.borrow();
        for keyword in [
            "help", "quit", "alias", "unreg", "log", "print", "assign", "source", "routine",
            "while", "if", "else", "end",
        ] {
            assert!(commands.find(keyword).is_some(), "missing builtin {keyword}");
        }
        let log = commands.find("log").unwrap();
        for sub in ["level", "stdout", "file"] {
            assert!(log.find(sub).is_some(), "missing log sub-command {sub}");
        }
    }

    #[test]
    fn test_construct_keywords_are_immutable() {
        let console: Rc<RefCell<dyn Console>> = Rc::new(RefCell::new(CaptureConsole::new()));
        let shell = Shell::new(console, register_all, "t").unwrap();
        let commands = shell.commands();
        let commands = commands.borrow();
        for keyword in ["routine", "while", "if", "else", "end"] {
            assert!(!commands.find(keyword).unwrap().is_mutable());
        }
        assert!(commands.find("help").unwrap().is_mutable());
    }
}
