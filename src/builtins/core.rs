//! Core Built-Ins
//!
//! Shell housekeeping commands: `help`, `quit`, `alias`, `unreg`, the
//! `log` group, and `source`.

use std::fs::File;
use std::io::BufReader;

use crate::console::ScriptInput;
use crate::errors::ShellError;
use crate::logging;
use crate::registry::ShellCmd;
use crate::shell::Shell;

/// `help [keyword]` — print the registry tree, optionally rooted at the
/// named command.
pub fn help(_cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    let commands_rc = shell.commands();
    let commands = commands_rc.borrow();

    let mut out = String::from("\ncommands:\n\n");
    if args.len() > 1 {
        let found = commands
            .find(&args[1])
            .ok_or_else(|| ShellError::CommandNotFound(args[1].clone()))?;
        let width = found.rendered_width().max(found.longest());
        found.help_entry(&mut out, 0, width);
    } else {
        commands.help(&mut out, 0, commands.longest());
    }

    shell.print(&out);
    Ok(0)
}

/// `quit` — stop the console loop at the next line read.
pub fn quit(_cmd: &ShellCmd, shell: &mut Shell, _args: &[String]) -> Result<i32, ShellError> {
    shell.quit();
    Ok(0)
}

/// `alias <new> <existing>` — register a new keyword sharing the
/// existing command's handler.
pub fn alias(_cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("an alias keyword"));
    }
    if args.len() < 3 {
        return Err(ShellError::Expected("a command to be aliased"));
    }

    let commands_rc = shell.commands();
    let mut commands = commands_rc.borrow_mut();
    let alias = {
        let target = commands
            .find(&args[2])
            .ok_or_else(|| ShellError::CommandNotFound(args[2].clone()))?;
        target.alias(&args[1])
    };
    commands.register(alias)?;
    Ok(0)
}

/// `unreg <keyword>` — unregister a mutable command, its aliases, and
/// its routine body if it has one.
pub fn unregister(_cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("a command keyword to unregister"));
    }

    let commands_rc = shell.commands();
    {
        let commands = commands_rc.borrow();
        let cmd = commands
            .find(&args[1])
            .ok_or_else(|| ShellError::CommandNotFound(args[1].clone()))?;
        if !cmd.is_mutable() {
            return Err(ShellError::ImmutableCommand(args[1].clone()));
        }
    }

    // The command may be a routine; dropping the body is a no-op when
    // it is not.
    shell.routine_remove(&args[1]);
    commands_rc.borrow_mut().unregister(&args[1])?;
    Ok(0)
}

/// `log <sub-command> …` — dispatch to one of the log sub-commands with
/// the group keyword shifted off.
pub fn log_group(cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("a log sub-command"));
    }
    let sub = cmd
        .find(&args[1])
        .cloned()
        .ok_or_else(|| ShellError::CommandNotFound(args[1].clone()))?;
    sub.invoke(shell, &args[1..])
}

/// `log level <0-5>` — forward to the logger.
pub fn log_level(_cmd: &ShellCmd, _shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("a numeric log level 0-5"));
    }
    let level: u8 = args[1]
        .parse()
        .map_err(|_| ShellError::Expected("a numeric log level 0-5"))?;
    logging::set_level(level);
    Ok(0)
}

/// `log stdout <bool>` — toggle logging to stdout.
pub fn log_stdout(_cmd: &ShellCmd, _shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("a boolean value"));
    }
    logging::set_stdout(parse_bool(&args[1]));
    Ok(0)
}

/// `log file <path>` — redirect log output to a file.
pub fn log_file(_cmd: &ShellCmd, _shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("a file path/name"));
    }
    logging::set_file(&args[1]).map_err(|source| ShellError::LogFile {
        path: args[1].clone(),
        source,
    })?;
    Ok(0)
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "on" | "1"
    )
}

/// `source <path>` — swap console input to the script, run to EOF, then
/// restore the previous input no matter how the script went.
pub fn source(_cmd: &ShellCmd, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
    if args.len() < 2 {
        return Err(ShellError::Expected("a file path argument"));
    }

    let file = File::open(&args[1]).map_err(|source| ShellError::ScriptOpen {
        path: args[1].clone(),
        source,
    })?;

    // Script arguments land in %0… so the script can substitute them.
    shell.store_args(args);

    let console = shell.console();
    let previous = console
        .borrow_mut()
        .swap_input(Some(ScriptInput::new(Box::new(BufReader::new(file)))));

    let result = shell.run_console(false);

    console.borrow_mut().swap_input(previous);
    Ok(result)
}

// ============================================================================
// Tests
// ============================================================================
