//! Diagnostics sink shared by the whole pipeline.
//!
//! Scan and parse errors are formatted as `[line N] Error...: message`,
//! runtime errors as `message` followed by `[line N]`.  The sink also
//! keeps the two sticky flags the driver consults: compile errors suppress
//! evaluation and pick exit code 65 in file mode, runtime errors pick 70.

use std::io::Write;

use crate::eval::RuntimeError;
use crate::token::{Token, TokenKind};

/// Destination for formatted error reports, plus the sticky error flags.
///
/// The sink is threaded explicitly through scanner, parser, and driver
/// rather than living in global state, so a library user (or a test) can
/// capture diagnostics in any `Write` value.
#[derive(Debug)]
pub struct Diagnostics<W: Write> {
    out: W,
    had_compile_error: bool,
    had_runtime_error: bool,
}

impl<W: Write> Diagnostics<W> {
    pub fn new(out: W) -> Diagnostics<W> {
        Diagnostics {
            out,
            had_compile_error: false,
            had_runtime_error: false,
        }
    }

    /// Report a scan error.  There is no lexeme to point at yet, only a
    /// line.
    pub fn scan_error(&mut self, line: u32, message: &str) {
        self.report(line, "", message);
    }

    /// Report a parse error at `token`, pointing at its lexeme (or at the
    /// end of input for the `Eof` token).
    pub fn parse_error(&mut self, token: &Token, message: &str) {
        if token.kind == TokenKind::Eof {
            self.report(token.line, " at end", message);
        } else {
            let location = format!(" at '{}'", token.lexeme);
            self.report(token.line, &location, message);
        }
    }

    /// Report an evaluation error and set the runtime flag.
    pub fn runtime_error(&mut self, error: &RuntimeError) {
        let _ = match error.line() {
            Some(line) => writeln!(self.out, "{}\n[line {}]", error, line),
            None => writeln!(self.out, "{}", error),
        };
        self.had_runtime_error = true;
    }

    fn report(&mut self, line: u32, location: &str, message: &str) {
        let _ = writeln!(self.out, "[line {}] Error{}: {}", line, location, message);
        self.had_compile_error = true;
    }

    pub fn had_compile_error(&self) -> bool {
        self.had_compile_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Forget compile errors from earlier input.  The interactive prompt
    /// calls this between lines so one typo does not poison the session.
    pub fn clear_compile_error(&mut self) {
        self.had_compile_error = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eof(line: u32) -> Token {
        Token::new(TokenKind::Eof, "", None, line)
    }

    #[test]
    fn scan_errors_carry_no_location() {
        let mut out = Vec::new();
        let mut diag = Diagnostics::new(&mut out);
        diag.scan_error(3, "Unexpected character.");
        assert!(diag.had_compile_error());
        assert_eq!(
            String::from_utf8(out).expect("diagnostics are utf-8"),
            "[line 3] Error: Unexpected character.\n"
        );
    }

    #[test]
    fn parse_errors_point_at_the_lexeme() {
        let mut out = Vec::new();
        let mut diag = Diagnostics::new(&mut out);
        let token = Token::new(TokenKind::Plus, "+", None, 2);
        diag.parse_error(&token, "Expect left-hand operand.");
        assert_eq!(
            String::from_utf8(out).expect("diagnostics are utf-8"),
            "[line 2] Error at '+': Expect left-hand operand.\n"
        );
    }

    #[test]
    fn parse_errors_at_eof_point_at_end() {
        let mut out = Vec::new();
        let mut diag = Diagnostics::new(&mut out);
        diag.parse_error(&eof(1), "Expect ';' after expression.");
        assert_eq!(
            String::from_utf8(out).expect("diagnostics are utf-8"),
            "[line 1] Error at end: Expect ';' after expression.\n"
        );
    }

    #[test]
    fn runtime_errors_trail_their_line() {
        let mut out = Vec::new();
        let mut diag = Diagnostics::new(&mut out);
        diag.runtime_error(&RuntimeError::UndefinedVariable {
            name: "foo".to_string(),
            line: 7,
        });
        assert!(diag.had_runtime_error());
        assert!(!diag.had_compile_error());
        assert_eq!(
            String::from_utf8(out).expect("diagnostics are utf-8"),
            "Undefined variable 'foo'.\n[line 7]\n"
        );
    }

    #[test]
    fn compile_flag_can_be_cleared_between_inputs() {
        let mut out = Vec::new();
        let mut diag = Diagnostics::new(&mut out);
        diag.scan_error(1, "Unexpected character.");
        assert!(diag.had_compile_error());
        diag.clear_compile_error();
        assert!(!diag.had_compile_error());
    }
}
