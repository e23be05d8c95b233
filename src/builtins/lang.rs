//! Expression Built-Ins
//!
//! `print` and `assign`: the two commands that hand tokens to the
//! expression evaluator. Both use the same shallow heuristic — a token
//! containing `(` and `)` looks like an expression — and treat
//! everything else as a verbatim string.

use crate::errors::ShellError;
use crate::parser::{evaluate, is_expression};
use crate::registry::ShellCmd;
use crate::shell::Shell;

/// `print <expr…>` — evaluate each expression-looking argument to an
/// integer, keep other tokens verbatim, and print the pieces joined by
/// single spaces. Returns the last evaluated result.
pub fn print(_cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("an expression to print"));
    }

    let mut result: i64 = 0;
    let mut pieces = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        if is_expression(arg) {
            result = evaluate(arg)?;
            pieces.push(result.to_string());
        } else {
            pieces.push(arg.clone());
        }
    }

    shell.print(&pieces.join(" "));
    Ok(result as i32)
}

/// `assign <name> <value>` — evaluate the value if it looks like an
/// expression and store the decimal result, otherwise store the raw
/// string.
pub fn assign(_cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("a variable name"));
    }
    if args.len() < 3 {
        return Err(ShellError::Expected("a variable value"));
    }

    if is_expression(&args[2]) {
        let value = evaluate(&args[2])?;
        shell.assign_variable(&args[1], &value.to_string());
        Ok(value as i32)
    } else {
        shell.assign_variable(&args[1], &args[2]);
        Ok(0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_all;
    use crate::console::{CaptureConsole, Console};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_shell() -> (Rc<RefCell<CaptureConsole>>, Shell) {
        let console = Rc::new(RefCell::new(CaptureConsole::new()));
        let dyn_console: Rc<RefCell<dyn Console>> = console.clone();
        let shell = Shell::new(dyn_console, register_all, "t").unwrap();
        (console, shell)
    }

    #[test]
    fn test_print_mixes_text_and_expressions() {
        let (console, mut shell) = test_shell();
        shell.dispatch("print result is (6*7)");
        assert_eq!(console.borrow().output(), "result is 42\n");
        assert_eq!(shell.result(), Some(42));
    }

    #[test]
    fn test_print_verbatim_token() {
        let (console, mut shell) = test_shell();
        shell.dispatch("print plain");
        assert_eq!(console.borrow().output(), "plain\n");
        assert_eq!(shell.result(), Some(0));
    }

    #[test]
    fn test_print_requires_arguments() {
        let (console, mut shell) = test_shell();
        shell.dispatch("print");
        assert!(console
            .borrow()
            .errors()
            .contains("expected an expression to print"));
    }

    #[test]
    fn test_assign_expression_stores_decimal() {
        let (_console, mut shell) = test_shell();
        shell.dispatch("assign x (40+2)");
        assert_eq!(shell.variable("x").as_deref(), Some("42"));
        assert_eq!(shell.result(), Some(42));
    }

    #[test]
    fn test_assign_string_stores_raw() {
        let (_console, mut shell) = test_shell();
        shell.dispatch("assign name hello");
        assert_eq!(shell.variable("name").as_deref(), Some("hello"));
    }

    #[test]
    fn test_assign_invalid_expression_leaves_variable_unset() {
        let (console, mut shell) = test_shell();
        shell.dispatch("assign x (1+)");
        assert!(console.borrow().errors().contains("invalid expression"));
        assert_eq!(shell.variable("x"), None);
        assert_eq!(shell.result(), Some(crate::errors::ERROR_MARKER));
    }

    #[test]
    fn test_assign_requires_name_and_value() {
        let (console, mut shell) = test_shell();
        shell.dispatch("assign");
        assert!(console.borrow().errors().contains("expected a variable name"));
        shell.dispatch("assign x");
        assert!(console.borrow().errors().contains("expected a variable value"));
    }

    #[test]
    fn test_reassignment_overwrites() {
        let (console, mut shell) = test_shell();
        shell.dispatch("assign x 1");
        shell.dispatch("assign x ({x}+1)");
        shell.dispatch("print {x}");
        assert_eq!(console.borrow().output(), "2\n");
    }
}
