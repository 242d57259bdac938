use std::{
    fs,
    io::{self, BufRead, Write},
};

use clap::Parser;
use mensura::{evaluate, interpreter::env::Environment};

/// mensura is an interactive calculator with variables, functions, matrices
/// and unit-tagged quantities.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Treat the input as a path to a script evaluated line by line.
    #[arg(short, long)]
    file: bool,

    /// An expression to evaluate, or a script path with --file. Reads lines
    /// from standard input when omitted.
    contents: Option<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut env = Environment::new();

    match args.contents {
        Some(path) if args.file => {
            let script = fs::read_to_string(&path).unwrap_or_else(|_| {
                eprintln!("Failed to read the input file '{path}'. Perhaps this file does not exist?");
                std::process::exit(1);
            });

            let mut failed = false;
            for line in script.lines() {
                failed |= !run_line(line, &mut env);
            }
            if failed {
                std::process::exit(1);
            }
        },
        Some(line) => {
            if !run_line(&line, &mut env) {
                std::process::exit(1);
            }
        },
        None => repl(&mut env),
    }
}

/// Evaluates one line against the session, printing the result or the error
/// text. Returns `false` when the line failed; the session itself is left
/// untouched by failing lines.
fn run_line(line: &str, env: &mut Environment) -> bool {
    if line.trim().is_empty() {
        return true;
    }

    match evaluate(line, env) {
        Ok(Some(value)) => {
            println!("{value}");
            true
        },
        Ok(None) => true,
        Err(e) => {
            eprintln!("{e}");
            false
        },
    }
}

/// Reads lines from standard input until end of file, one evaluation per
/// line.
fn repl(env: &mut Environment) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                run_line(&line, env);
            },
        }
    }
}
