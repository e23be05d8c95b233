use std::cell::RefCell;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;

use coquille::builtins;
use coquille::console::{Console, InteractiveConsole};
use coquille::{logging, Shell};

#[derive(Parser)]
#[command(name = "coquille")]
#[command(about = "An embeddable interactive command shell")]
#[command(version)]
struct Cli {
    /// Log verbosity level, 0 (verbose) through 5 (fatal only)
    #[arg(short = 'v', long = "verbosity", value_name = "LEVEL")]
    verbosity: Option<u8>,

    /// Append log output to the given file
    #[arg(short = 'l', long = "log-file", value_name = "PATH")]
    log_file: Option<String>,

    /// Run a command script before entering the prompt loop
    #[arg(short = 's', long = "script", value_name = "PATH")]
    script: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init();
    if let Some(level) = cli.verbosity {
        logging::set_level(level);
    }
    if let Some(path) = &cli.log_file {
        if let Err(err) = logging::set_file(path) {
            eprintln!("error: could not open log file {path}: {err}");
            return ExitCode::FAILURE;
        }
    }

    let progname = "coquille";
    let history_file = format!(".{progname}-history");
    let console = match InteractiveConsole::new(&history_file) {
        Ok(console) => console,
        Err(err) => {
            eprintln!("error: console setup failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    let console: Rc<RefCell<dyn Console>> = Rc::new(RefCell::new(console));

    let mut shell = match Shell::new(console, builtins::register_all, progname) {
        Ok(shell) => shell,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(script) = &cli.script {
        shell.dispatch(&format!("source {script}"));
    }

    let interactive = std::io::stdin().is_terminal();
    let status = shell.run_console(interactive);

    if status == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
