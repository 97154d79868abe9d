//! API to control the interpreter.

use std::io::Write;

use crate::diag::Diagnostics;
use crate::eval::Evaluator;
use crate::parser::Parser;
use crate::scanner::Scanner;

/// Tree-walk interpreter with a persistent global scope.
///
/// Each `run` takes one source text through scanning, parsing, and
/// evaluation.  Program output goes to the first sink, diagnostics to the
/// second, and the sticky error flags say how the run went.  Globals
/// survive across runs, which is what makes the interactive prompt
/// useful.
///
/// # Example
///
/// ```
/// use loxide::interpreter::Interpreter;
///
/// let mut output = Vec::new();
/// let mut errors = Vec::new();
/// let mut interp = Interpreter::new(&mut output, &mut errors);
///
/// interp.run("var greeting = \"hello\";");
/// interp.run("print greeting + \" world\";");
///
/// assert_eq!(output, b"hello world\n");
/// assert!(errors.is_empty());
/// ```
#[derive(Debug)]
pub struct Interpreter<Out: Write, Err: Write> {
    evaluator: Evaluator<Out>,
    diag: Diagnostics<Err>,
}

impl<Out: Write, Err: Write> Interpreter<Out, Err> {
    pub fn new(output: Out, errors: Err) -> Interpreter<Out, Err> {
        Interpreter {
            evaluator: Evaluator::new(output),
            diag: Diagnostics::new(errors),
        }
    }

    /// Execute `source` against the persistent globals.  If scanning or
    /// parsing reported an error, evaluation is skipped entirely.
    pub fn run(&mut self, source: &str) {
        let tokens = Scanner::new(source, &mut self.diag).scan_tokens();
        let statements = Parser::new(tokens, &mut self.diag).parse();

        if self.diag.had_compile_error() {
            return;
        }

        if let Err(error) = self.evaluator.interpret(&statements) {
            self.diag.runtime_error(&error);
        }
    }

    pub fn had_compile_error(&self) -> bool {
        self.diag.had_compile_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.diag.had_runtime_error()
    }

    /// Forget compile errors from previous inputs.  The interactive
    /// prompt calls this between lines; runtime errors stay sticky.
    pub fn clear_compile_error(&mut self) {
        self.diag.clear_compile_error();
    }
}
