//! Shell
//!
//! The state owner and orchestrator: one `Shell` holds the command
//! registry, the variable store, the construct stack, the routine table,
//! and the console handle, and drives the line-to-execution pipeline.
//!
//! Dispatch of one raw line:
//! 1. empty-line guard (no `%?` update)
//! 2. recursion depth guard
//! 3. tokenize (encapsulation pairs honoured, comments stripped)
//! 4. resolve `argv[0]` at the registry root
//! 5. construct arbitration: with an open declaration, ordinary lines
//!    are captured verbatim into the outermost frame instead of running
//! 6. execute: substitute variables (pure executions only), re-tokenize,
//!    invoke the handler; construct commands replayed inside an open
//!    declaration run as dry runs so push/pop pairing stays consistent
//! 7. the handler result (or the error marker) lands in `%?`
//!
//! Everything runs on one cooperative thread; the registry and console
//! sit behind `Rc<RefCell<…>>` only so the line editor's completion
//! hooks and embedding hosts can share them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::console::Console;
use crate::constructs::{ConstructFrame, ConstructLineFn, ConstructObject, ConstructPopFn, Routine};
use crate::errors::{ShellError, ERROR_MARKER};
use crate::parser::{evaluate, is_expression, tokenize};
use crate::registry::ShellCmd;
use crate::shell::completion::LineHooks;
use crate::variables::VariableStore;

/// Bound on dispatch re-entry (routines calling routines, loops driving
/// dispatch, and so on).
pub const MAX_RECURSION: usize = 64;

const PROMPT_FINALE: &str = " > ";
const PROMPT_DELIM: &str = ".";

/// Callback registering the initial command set on `Shell::new`. Hosts
/// normally pass `builtins::register_all`, or their own registration to
/// use the engine with an entirely different command set.
pub type RegistrationFn = fn(&mut Shell) -> Result<(), ShellError>;

pub struct Shell {
    console: Rc<RefCell<dyn Console>>,
    commands: Rc<RefCell<ShellCmd>>,
    variables: VariableStore,
    constructs: Vec<ConstructFrame>,
    routines: HashMap<String, Routine>,
    prompt: String,
    prompt_base: String,
    depth: usize,
    quit: bool,
}

impl Shell {
    /// Create a shell bound to a console, register the initial commands,
    /// and cross-link the console's completion and hint callbacks.
    pub fn new(
        console: Rc<RefCell<dyn Console>>,
        registration: RegistrationFn,
        prompt_base: &str,
    ) -> Result<Self, ShellError> {
        let commands = Rc::new(RefCell::new(ShellCmd::root()));
        console
            .borrow_mut()
            .set_line_hooks(LineHooks::new(commands.clone()));

        let mut shell = Self {
            console,
            commands,
            variables: VariableStore::new(),
            constructs: Vec::new(),
            routines: HashMap::new(),
            prompt: String::new(),
            prompt_base: prompt_base.to_string(),
            depth: 0,
            quit: false,
        };
        shell.rebuild_prompt();
        registration(&mut shell)?;
        Ok(shell)
    }

    /// Shared handle to the registry root, for third-party registration
    /// and the completion hooks.
    pub fn commands(&self) -> Rc<RefCell<ShellCmd>> {
        self.commands.clone()
    }

    pub fn console(&self) -> Rc<RefCell<dyn Console>> {
        self.console.clone()
    }

    /// Register a command at the root.
    pub fn register_command(&mut self, cmd: ShellCmd) -> Result<(), ShellError> {
        self.commands.borrow_mut().register(cmd)
    }

    pub fn print(&self, text: &str) {
        self.console.borrow().print(text);
    }

    pub fn report_error(&self, text: &str) {
        self.console.borrow().error(text);
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    pub fn assign_variable(&mut self, name: &str, value: &str) {
        self.variables.assign(name, value);
    }

    pub fn variable(&self, name: &str) -> Option<String> {
        self.variables.get(name).map(str::to_string)
    }

    /// Store invocation arguments as `%0 … %N` for substitution.
    pub fn store_args(&mut self, args: &[String]) {
        self.variables.store_args(args);
    }

    /// `%?` as an integer, when present and numeric.
    pub fn result(&self) -> Option<i32> {
        self.variables.result()
    }

    // ------------------------------------------------------------------
    // Routines
    // ------------------------------------------------------------------

    pub fn routine_by_name(&self, name: &str) -> Option<&Routine> {
        self.routines.get(name)
    }

    pub fn routine_insert(&mut self, routine: Routine) {
        self.routines.insert(routine.name().to_string(), routine);
    }

    /// Remove a routine body. No-op when the name is not a routine.
    pub fn routine_remove(&mut self, name: &str) {
        self.routines.remove(name);
    }

    // ------------------------------------------------------------------
    // Construct stack
    // ------------------------------------------------------------------

    /// Push a construct frame and rebuild the prompt.
    pub fn construct_push(
        &mut self,
        name: &str,
        object: ConstructObject,
        on_line: ConstructLineFn,
        on_pop: ConstructPopFn,
    ) {
        tracing::debug!(name, dry = object.is_none(), "construct push");
        self.constructs.push(ConstructFrame {
            name: name.to_string(),
            object,
            on_line,
            on_pop,
        });
        self.rebuild_prompt();
    }

    /// Pop the most recent frame and run its pop handler. The frame is
    /// removed *before* the handler runs so deferred runners can
    /// re-dispatch lines without the dispatcher mistaking execution for
    /// definition.
    pub fn construct_pop(&mut self) -> Result<i32, ShellError> {
        let frame = self.constructs.pop().ok_or(ShellError::ConstructUnderflow)?;
        tracing::debug!(name = %frame.name, "construct pop");
        let result = (frame.on_pop)(self, frame.object);
        self.rebuild_prompt();
        result
    }

    /// The outermost open declaration's object, for frame modifiers
    /// like `else`.
    pub fn construct_object(&mut self) -> Option<&mut ConstructObject> {
        self.constructs.first_mut().map(|frame| &mut frame.object)
    }

    pub fn construct_depth(&self) -> usize {
        self.constructs.len()
    }

    fn rebuild_prompt(&mut self) {
        let mut prompt = self.prompt_base.clone();
        for frame in &self.constructs {
            prompt.push_str(PROMPT_DELIM);
            prompt.push_str(&frame.name);
        }
        prompt.push_str(PROMPT_FINALE);
        self.prompt = prompt;
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    // ------------------------------------------------------------------
    // Quit
    // ------------------------------------------------------------------

    /// Stop the console loop at the next line read.
    pub fn quit(&mut self) {
        self.quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    // ------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------

    /// Substitute and evaluate a raw condition, as `while` and `if` do
    /// on each (re-)evaluation. Failures are reported on the error sink
    /// and read as false, with `%?` set to the error marker.
    pub fn evaluate_condition(&mut self, condition: &str) -> i64 {
        match self.try_evaluate_condition(condition) {
            Ok(value) => value,
            Err(err) => {
                self.report_error(&err.to_string());
                self.variables.set_result(ERROR_MARKER);
                0
            }
        }
    }

    fn try_evaluate_condition(&self, condition: &str) -> Result<i64, ShellError> {
        let substituted = self.variables.substitute(condition)?;
        if !is_expression(&substituted) {
            return Err(ShellError::NotAnExpression(substituted));
        }
        Ok(evaluate(&substituted)?)
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Process one raw line end-to-end. The handler result — or the
    /// error marker if the line could not run — lands in `%?`; empty
    /// lines leave `%?` untouched.
    pub fn dispatch(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        self.depth += 1;
        tracing::trace!(depth = self.depth, %line, "dispatch");
        let outcome = if self.depth > MAX_RECURSION {
            Err(ShellError::RecursionLimit(MAX_RECURSION))
        } else {
            self.dispatch_line(line)
        };
        self.depth -= 1;

        match outcome {
            Ok(Some(result)) => self.variables.set_result(result),
            Ok(None) => {}
            Err(err) => {
                self.report_error(&err.to_string());
                self.variables.set_result(ERROR_MARKER);
            }
        }
    }

    fn dispatch_line(&mut self, line: &str) -> Result<Option<i32>, ShellError> {
        let args = tokenize(line);
        if args.is_empty() {
            return Ok(None);
        }

        // Resolve at the root only; sub-commands are dispatched by their
        // parent command's handler.
        let command = {
            let commands = self.commands.borrow();
            commands.find(&args[0]).cloned()
        };

        let open_frames = self.constructs.len();
        let has_declaration = open_frames > 0;

        // Inside an open declaration an unknown keyword is an ordinary
        // line: capture it raw and resolve at run time. Routine bodies
        // may reference commands that do not exist yet, the routine
        // itself included.
        let Some(command) = command else {
            if has_declaration {
                let frame = &mut self.constructs[0];
                let result = (frame.on_line)(&mut frame.object, line)?;
                return Ok(Some(result));
            }
            return Err(ShellError::UnknownCommand(args[0].clone()));
        };

        let ends_declaration = command.is_construct_pop() && open_frames == 1;
        let modifies_declaration = command.is_construct_modifier() && open_frames == 1;

        // With an open declaration, everything except the closing pop
        // and a live modifier is defined into the outermost frame, raw.
        let mut result = 0;
        let captured = has_declaration && !ends_declaration && !modifies_declaration;
        if captured {
            let frame = &mut self.constructs[0];
            result = (frame.on_line)(&mut frame.object, line)?;
        }

        if command.is_construct() || !has_declaration {
            // Substitution is for pure executions only: captured lines
            // are stored unmangled, and construct conditions must not be
            // evaluated before the construct actually runs.
            let exec_line = if !captured && !command.is_construct() {
                self.variables.substitute(line)?
            } else {
                line.to_string()
            };

            // A construct keyword replayed inside a definition only
            // tracks nesting; its handler must not create a live object.
            if captured && command.is_construct() {
                command.set_dry_run();
            }

            let args = tokenize(&exec_line);
            result = command.invoke(self, &args)?;
        }

        Ok(Some(result))
    }

    // ------------------------------------------------------------------
    // Run loops
    // ------------------------------------------------------------------

    /// Read and dispatch lines from the console until EOF or quit.
    pub fn run_console(&mut self, interactive: bool) -> i32 {
        loop {
            if self.quit || self.console.borrow().input_eof() {
                break;
            }
            let prompt = self.prompt.clone();
            let line = self.console.borrow_mut().get_line(&prompt, interactive);
            let Some(line) = line else { continue };
            self.dispatch(&line);
        }
        0
    }

    /// Dispatch a captured line sequence in insertion order, as routine
    /// and loop runners do.
    pub fn run_lines(&mut self, lines: &[String]) -> i32 {
        for line in lines {
            self.dispatch(line);
        }
        0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::console::CaptureConsole;

    fn test_shell() -> (Rc<RefCell<CaptureConsole>>, Shell) {
        let console = Rc::new(RefCell::new(CaptureConsole::new()));
        let dyn_console: Rc<RefCell<dyn Console>> = console.clone();
        let shell = Shell::new(dyn_console, builtins::register_all, "test").unwrap();
        (console, shell)
    }

    fn run(shell: &mut Shell, lines: &[&str]) {
        for line in lines {
            shell.dispatch(line);
        }
    }

    #[test]
    fn test_unknown_command_sets_error_marker() {
        let (console, mut shell) = test_shell();
        shell.dispatch("frobnicate");
        assert!(console.borrow().errors().contains("unknown command 'frobnicate'"));
        assert_eq!(shell.result(), Some(ERROR_MARKER));
    }

    #[test]
    fn test_empty_line_leaves_result_untouched() {
        let (_console, mut shell) = test_shell();
        shell.dispatch("assign x 1");
        let before = shell.variable("%?");
        shell.dispatch("");
        shell.dispatch("   ");
        shell.dispatch("# only a comment");
        assert_eq!(shell.variable("%?"), before);
    }

    #[test]
    fn test_result_propagates_handler_return() {
        let (_console, mut shell) = test_shell();
        shell.dispatch("assign x 7");
        shell.dispatch("print ({x}*6)");
        assert_eq!(shell.result(), Some(42));
    }

    #[test]
    fn test_while_loop_counts() {
        let (console, mut shell) = test_shell();
        run(
            &mut shell,
            &[
                "assign i 0",
                "while ({i} < 3)",
                "print {i}",
                "assign i ({i}+1)",
                "end",
            ],
        );
        assert_eq!(console.borrow().output(), "0\n1\n2\n");
    }

    #[test]
    fn test_if_else_string_comparison() {
        let (console, mut shell) = test_shell();
        run(
            &mut shell,
            &[
                r#"if ("foo" == "foo")"#,
                "print yes",
                "else",
                "print no",
                "end",
            ],
        );
        assert_eq!(console.borrow().output(), "yes\n");

        let (console, mut shell) = test_shell();
        run(
            &mut shell,
            &[
                r#"if ("foo" == "bar")"#,
                "print yes",
                "else",
                "print no",
                "end",
            ],
        );
        assert_eq!(console.borrow().output(), "no\n");
    }

    #[test]
    fn test_routine_definition_and_invocation() {
        let (console, mut shell) = test_shell();
        run(
            &mut shell,
            &["routine greet", "print hello {%1}", "end", "greet world"],
        );
        assert_eq!(console.borrow().output(), "hello world\n");
    }

    #[test]
    fn test_routine_sees_fresh_args_each_call() {
        let (console, mut shell) = test_shell();
        run(
            &mut shell,
            &[
                "routine greet",
                "print hello {%1}",
                "end",
                "greet world",
                "greet again",
            ],
        );
        assert_eq!(console.borrow().output(), "hello world\nhello again\n");
    }

    #[test]
    fn test_host_registered_command() {
        let (console, mut shell) = test_shell();
        let commands = shell.commands();
        commands
            .borrow_mut()
            .register(ShellCmd::new(
                "ping",
                None,
                "reply with pong",
                Rc::new(
                    |_cmd: &ShellCmd, shell: &mut Shell, _args: &[String]| {
                        shell.print("pong");
                        Ok(7)
                    },
                ),
            ))
            .unwrap();
        shell.dispatch("ping");
        assert_eq!(console.borrow().output(), "pong\n");
        assert_eq!(shell.result(), Some(7));
    }

    #[test]
    fn test_alias_behaves_like_original() {
        let (_console, mut shell) = test_shell();
        shell.dispatch("alias q quit");
        shell.dispatch("q");
        assert!(shell.should_quit());
    }

    #[test]
    fn test_alias_tracks_unregistration() {
        let (console, mut shell) = test_shell();
        run(&mut shell, &["alias h help", "unreg help", "help"]);
        assert!(console.borrow().errors().contains("unknown command 'help'"));
        shell.dispatch("h");
        assert!(console.borrow().errors().contains("unknown command 'h'"));
    }

    #[test]
    fn test_division_by_zero_reports_and_marks() {
        let (console, mut shell) = test_shell();
        shell.dispatch("print (1/(1-1))");
        assert!(console.borrow().errors().contains("division by zero"));
        assert_eq!(shell.result(), Some(ERROR_MARKER));
        // The shell stays usable.
        shell.dispatch("print (2+2)");
        assert!(console.borrow().output().contains("4"));
    }

    #[test]
    fn test_unknown_variable_aborts_line() {
        let (console, mut shell) = test_shell();
        shell.dispatch("print {nope}");
        assert!(console.borrow().errors().contains("variable 'nope' not found"));
        assert_eq!(shell.result(), Some(ERROR_MARKER));
        assert_eq!(console.borrow().output(), "");
    }

    #[test]
    fn test_recursive_routine_is_bounded() {
        let (console, mut shell) = test_shell();
        run(&mut shell, &["routine loopy", "loopy", "end", "loopy"]);
        assert!(console
            .borrow()
            .errors()
            .contains(&format!("maximum recursion depth {MAX_RECURSION} reached")));
        // Still usable afterwards.
        shell.dispatch("print (1+1)");
        assert!(console.borrow().output().contains("2"));
    }

    #[test]
    fn test_nested_construct_pairing_inside_routine() {
        let (console, mut shell) = test_shell();
        run(
            &mut shell,
            &[
                "routine counter",
                "assign i 0",
                "while ({i} < {%1})",
                "print {i}",
                "assign i ({i}+1)",
                "end",
                "end",
                "counter 2",
            ],
        );
        assert_eq!(console.borrow().output(), "0\n1\n");
        // The routine body kept the while/end pair verbatim.
        let routine = shell.routine_by_name("counter").unwrap();
        assert_eq!(routine.lines().len(), 5);
        assert_eq!(routine.lines()[1], "while ({i} < {%1})");
        assert_eq!(routine.lines()[4], "end");
    }

    #[test]
    fn test_nested_if_inside_while() {
        let (console, mut shell) = test_shell();
        run(
            &mut shell,
            &[
                "assign i 0",
                "while ({i} < 4)",
                "if (({i}/2)*2 == {i})",
                "print {i} even",
                "else",
                "print {i} odd",
                "end",
                "assign i ({i}+1)",
                "end",
            ],
        );
        assert_eq!(
            console.borrow().output(),
            "0 even\n1 odd\n2 even\n3 odd\n"
        );
    }

    #[test]
    fn test_prompt_tracks_construct_stack() {
        let (_console, mut shell) = test_shell();
        assert_eq!(shell.prompt(), "test > ");
        shell.dispatch("routine greet");
        assert_eq!(shell.prompt(), "test.greet > ");
        shell.dispatch("while (1)");
        assert_eq!(shell.prompt(), "test.greet.while > ");
        shell.dispatch("end");
        assert_eq!(shell.prompt(), "test.greet > ");
        shell.dispatch("end");
        assert_eq!(shell.prompt(), "test > ");
    }

    #[test]
    fn test_end_without_open_frame_underflows() {
        let (console, mut shell) = test_shell();
        shell.dispatch("end");
        assert!(console.borrow().errors().contains("construct stack is empty"));
        assert_eq!(shell.result(), Some(ERROR_MARKER));
    }

    #[test]
    fn test_else_without_if_reports() {
        let (console, mut shell) = test_shell();
        shell.dispatch("else");
        assert!(console.borrow().errors().contains("else without if construct"));
    }

    #[test]
    fn test_quit_stops_console_loop() {
        let console = Rc::new(RefCell::new(CaptureConsole::with_lines(&[
            "print (1)",
            "quit",
            "print (2)",
        ])));
        let dyn_console: Rc<RefCell<dyn Console>> = console.clone();
        let mut shell = Shell::new(dyn_console, builtins::register_all, "test").unwrap();
        shell.run_console(false);
        assert!(shell.should_quit());
        let output = console.borrow().output();
        assert!(output.contains("1"));
        assert!(!output.contains("2"));
    }

    #[test]
    fn test_quit_inside_while_body_exits_loop() {
        let (console, mut shell) = test_shell();
        run(&mut shell, &["while (1)", "print tick", "quit", "end"]);
        assert_eq!(console.borrow().output(), "tick\n");
    }

    #[test]
    fn test_condition_that_is_not_an_expression() {
        let (console, mut shell) = test_shell();
        run(&mut shell, &["while plain", "print never", "end"]);
        assert!(console.borrow().errors().contains("is not an expression"));
        assert_eq!(console.borrow().output(), "");
    }

    #[test]
    fn test_comment_stripping_in_dispatch() {
        let (console, mut shell) = test_shell();
        shell.dispatch("print (1+2) # trailing commentary");
        assert_eq!(console.borrow().output(), "3\n");
    }

    #[test]
    fn test_variables_survive_across_lines() {
        let (console, mut shell) = test_shell();
        run(&mut shell, &["assign greeting hello", "print {greeting}"]);
        assert_eq!(console.borrow().output(), "hello\n");
    }

    #[test]
    fn test_source_runs_script_and_restores_input() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "assign from_script 1").unwrap();
        writeln!(file, "print ({{from_script}}+41)").unwrap();
        file.flush().unwrap();

        let (console, mut shell) = test_shell();
        shell.dispatch(&format!("source {}", file.path().display()));
        assert_eq!(console.borrow().output(), "42\n");
        // Script arguments were stored for the script's benefit.
        assert_eq!(shell.variable("%0").as_deref(), Some("source"));
        // The console is back on its primary input.
        console.borrow().push_line("print (7)");
        shell.run_console(false);
        assert!(console.borrow().output().contains("7"));
    }

    #[test]
    fn test_source_missing_file_reports() {
        let (console, mut shell) = test_shell();
        shell.dispatch("source /no/such/file.cmd");
        assert!(console
            .borrow()
            .errors()
            .contains("could not open /no/such/file.cmd"));
        assert_eq!(shell.result(), Some(ERROR_MARKER));
    }
}
