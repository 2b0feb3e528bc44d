use std::fs;
use std::io;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use eliza::{load_script, Engine, LoggingTracer};

/// Built-in script used when no script file is given on the command line.
const BUILTIN_SCRIPT: &str = include_str!("../demos/doctor.eliza");

#[derive(ClapParser)]
#[command(name = "eliza", about = "A faithful reimplementation of Weizenbaum's 1966 ELIZA")]
struct Args {
    /// Path to a `.eliza` script file. Defaults to the built-in DOCTOR script.
    script: Option<String>,

    /// Skip the startup banner.
    #[arg(long)]
    nobanner: bool,

    /// Skip the "Enter '/quit'..." help line and greet immediately.
    #[arg(long)]
    quick: bool,

    /// Print the loaded script's opening remarks and exit without starting a session.
    #[arg(long)]
    showscript: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let source = match &args.script {
        Some(path) => match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("couldn't read script '{}': {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => BUILTIN_SCRIPT.to_string(),
    };

    let script = match load_script(&source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut engine = Engine::new(script);
    engine.set_tracer(Box::new(LoggingTracer));

    if args.showscript {
        println!("{}", engine.greeting());
        return ExitCode::SUCCESS;
    }

    if !args.nobanner {
        println!("ELIZA begin");
    }
    if !args.quick {
        println!();
        println!("Enter '/quit' to leave the session.");
    }

    println!();
    println!("{}", engine.greeting());

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        if io::stdin().read_line(&mut input).unwrap_or(0) == 0 {
            break;
        }
        if input.trim_end() == "/quit" {
            break;
        }

        println!("{}", engine.respond(&input));
    }

    println!();
    println!("GOODBYE. IT WAS NICE TALKING TO YOU");
    ExitCode::SUCCESS
}
