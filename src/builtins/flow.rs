//! Construct Built-Ins
//!
//! The multi-line language keywords: `routine`, `while`, `if`, `else`,
//! and `end`, plus the frame line/pop handlers and the invoker installed
//! for completed routines.
//!
//! Push handlers honour the dry-run flag: replayed inside another
//! definition they push a placeholder frame so the dispatcher's
//! push/pop pairing stays consistent, without creating a live object.

use std::rc::Rc;

use crate::constructs::{Conditional, ConstructObject, Routine, WhileLoop};
use crate::errors::ShellError;
use crate::registry::ShellCmd;
use crate::shell::Shell;

/// `routine <name>` — open a routine definition frame.
pub fn routine(cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("a routine name"));
    }

    let object = if cmd.take_dry_run() {
        ConstructObject::None
    } else {
        if shell.routine_by_name(&args[1]).is_some() {
            return Err(ShellError::RoutineExists(args[1].clone()));
        }
        ConstructObject::Routine(Routine::new(&args[1]))
    };

    shell.construct_push(&args[1], object, routine_line, routine_pop);
    Ok(0)
}

fn routine_line(object: &mut ConstructObject, line: &str) -> Result<i32, ShellError> {
    if let ConstructObject::Routine(routine) = object {
        routine.append(line);
    }
    Ok(0)
}

/// Registers the completed routine as a mutable command and moves the
/// body into the shell's routine table.
fn routine_pop(shell: &mut Shell, object: ConstructObject) -> Result<i32, ShellError> {
    let ConstructObject::Routine(routine) = object else {
        return Ok(0);
    };

    let cmd = ShellCmd::new(
        routine.name(),
        Some("[argument-list]"),
        "user-registered routine",
        Rc::new(invoke_routine),
    )
    .mutable();

    shell.register_command(cmd)?;
    shell.routine_insert(routine);
    Ok(0)
}

/// Handler shared by every registered routine: look the body up by the
/// invoked keyword and replay it with the call's arguments stored.
fn invoke_routine(cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    let routine = shell
        .routine_by_name(cmd.keyword())
        .cloned()
        .ok_or_else(|| ShellError::RoutineMissing(cmd.keyword().to_string()))?;
    routine.run(shell, args)
}

/// `while (<expr>)` — open a loop frame with the raw condition.
pub fn while_loop(cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("a conditional expression"));
    }

    let object = if cmd.take_dry_run() {
        ConstructObject::None
    } else {
        ConstructObject::Loop(WhileLoop::new(&args[1]))
    };

    shell.construct_push("while", object, loop_line, loop_pop);
    Ok(0)
}

fn loop_line(object: &mut ConstructObject, line: &str) -> Result<i32, ShellError> {
    if let ConstructObject::Loop(lp) = object {
        lp.append(line);
    }
    Ok(0)
}

/// Loops execute when popped and then evaporate.
fn loop_pop(shell: &mut Shell, object: ConstructObject) -> Result<i32, ShellError> {
    let ConstructObject::Loop(lp) = object else {
        return Ok(0);
    };
    Ok(lp.run(shell))
}

/// `if (<expr>)` — open a conditional frame with the raw condition.
pub fn if_else(cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("a conditional expression"));
    }

    let object = if cmd.take_dry_run() {
        ConstructObject::None
    } else {
        ConstructObject::Conditional(Conditional::new(&args[1]))
    };

    shell.construct_push("if-else", object, conditional_line, conditional_pop);
    Ok(0)
}

fn conditional_line(object: &mut ConstructObject, line: &str) -> Result<i32, ShellError> {
    if let ConstructObject::Conditional(cond) = object {
        cond.append(line);
    }
    Ok(0)
}

fn conditional_pop(shell: &mut Shell, object: ConstructObject) -> Result<i32, ShellError> {
    let ConstructObject::Conditional(cond) = object else {
        return Ok(0);
    };
    Ok(cond.run(shell))
}

/// `else` — switch the open conditional's append target to the else
/// branch.
pub fn else_branch(cmd: &ShellCmd, shell: &mut Shell, _args: &[String]) -> Result<i32, ShellError> {
    if cmd.take_dry_run() {
        return Ok(0);
    }

    match shell.construct_object() {
        Some(ConstructObject::Conditional(cond)) => {
            cond.select_else();
            Ok(0)
        }
        _ => Err(ShellError::ElseWithoutIf),
    }
}

/// `end` — close the outermost open construct frame.
pub fn end(_cmd: &ShellCmd, shell: &mut Shell, _args: &[String]) -> Result<i32, ShellError> {
    shell.construct_pop()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::builtins::register_all;
    use crate::console::{CaptureConsole, Console};
    use crate::errors::ERROR_MARKER;
    use crate::shell::Shell;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_shell() -> (Rc<RefCell<CaptureConsole>>, Shell) {
        let console = Rc::new(RefCell::new(CaptureConsole::new()));
        let dyn_console: Rc<RefCell<dyn Console>> = console.clone();
        let shell = Shell::new(dyn_console, register_all, "t").unwrap();
        (console, shell)
    }

    #[test]
    fn test_routine_requires_name() {
        let (console, mut shell) = test_shell();
        shell.dispatch("routine");
        assert!(console.borrow().errors().contains("expected a routine name"));
        assert_eq!(shell.construct_depth(), 0);
    }

    #[test]
    fn test_duplicate_routine_name_refused() {
        let (console, mut shell) = test_shell();
        for line in ["routine r", "end", "routine r"] {
            shell.dispatch(line);
        }
        assert!(console.borrow().errors().contains("routine 'r' already exists"));
        assert_eq!(shell.result(), Some(ERROR_MARKER));
        assert_eq!(shell.construct_depth(), 0);
    }

    #[test]
    fn test_routine_name_colliding_with_command_fails_at_end() {
        let (console, mut shell) = test_shell();
        for line in ["routine print", "print oops", "end"] {
            shell.dispatch(line);
        }
        assert!(console
            .borrow()
            .errors()
            .contains("keyword 'print' is already registered"));
        assert_eq!(shell.construct_depth(), 0);
    }

    #[test]
    fn test_while_requires_condition() {
        let (console, mut shell) = test_shell();
        shell.dispatch("while");
        assert!(console
            .borrow()
            .errors()
            .contains("expected a conditional expression"));
        assert_eq!(shell.construct_depth(), 0);
    }

    #[test]
    fn test_false_while_skips_body() {
        let (console, mut shell) = test_shell();
        for line in ["while (0)", "print never", "end"] {
            shell.dispatch(line);
        }
        assert_eq!(console.borrow().output(), "");
    }

    #[test]
    fn test_if_without_else_and_false_condition() {
        let (console, mut shell) = test_shell();
        for line in ["if (1 == 2)", "print nope", "end"] {
            shell.dispatch(line);
        }
        assert_eq!(console.borrow().output(), "");
    }

    #[test]
    fn test_else_inside_nested_if_stays_captured() {
        let (console, mut shell) = test_shell();
        for line in [
            "if (1)",
            "if (0)",
            "print inner-then",
            "else",
            "print inner-else",
            "end",
            "end",
        ] {
            shell.dispatch(line);
        }
        // The inner else belongs to the inner if, replayed at run time.
        assert_eq!(console.borrow().output(), "inner-else\n");
    }

    #[test]
    fn test_construct_push_pop_balance() {
        let (_console, mut shell) = test_shell();
        for line in ["routine deep", "while (1)", "if (1)", "end", "end", "end"] {
            shell.dispatch(line);
        }
        // The outermost declaration closed, so every push was matched.
        assert_eq!(shell.construct_depth(), 0);
        assert!(shell.routine_by_name("deep").is_some());
    }
}
