//! Interpreter command line.
//!
//! Without an argument it drops into an interactive read-evaluate-print
//! loop whose global scope persists across lines.  With a script path it
//! runs the file once, exiting 65 if the script failed to compile and 70
//! if it failed at runtime.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;

use loxide::interpreter::Interpreter;

fn main() -> anyhow::Result<ExitCode> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    match args.as_slice() {
        [] => {
            run_prompt()?;
            Ok(ExitCode::SUCCESS)
        }
        [script] => run_file(script),
        _ => {
            println!("Usage: loxide [script]");
            Ok(ExitCode::from(64))
        }
    }
}

fn run_file(path: &str) -> anyhow::Result<ExitCode> {
    let source = fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;

    let mut interp = Interpreter::new(io::stdout(), io::stderr());
    interp.run(&source);

    if interp.had_compile_error() {
        return Ok(ExitCode::from(65));
    }
    if interp.had_runtime_error() {
        return Ok(ExitCode::from(70));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_prompt() -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut prompt = io::stdout();

    let mut interp = Interpreter::new(io::stdout(), io::stderr());

    let mut line = String::new();
    loop {
        prompt.write_all(b"> ")?;
        prompt.flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        interp.run(&line);
        // Compile errors do not carry over to the next line.
        interp.clear_compile_error();
    }

    Ok(())
}
