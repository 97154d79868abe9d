//! Recursive-descent parser with panic-mode recovery.
//!
//! Expression precedence, lowest to highest: comma, assignment, ternary,
//! `or`, `and`, equality, comparison, term, factor, unary, primary.
//! Syntax errors are reported to the diagnostics sink as they are found;
//! the raised signal unwinds to the nearest declaration, which skips
//! tokens to a statement boundary and carries on.

use std::io::Write;

use thiserror::Error;

use crate::ast::{Expr, Stmt};
use crate::diag::Diagnostics;
use crate::token::{Literal, Token, TokenKind};

/// Signal raised when the parser loses its footing.  The offending token
/// has already been reported to the diagnostics sink by the time this
/// value exists; it never escapes `declaration`.
#[derive(Debug, Error)]
#[error("syntax error")]
struct SyntaxError;

type ParseResult<T> = Result<T, SyntaxError>;

pub struct Parser<'d, W: Write> {
    tokens: Vec<Token>,
    diag: &'d mut Diagnostics<W>,
    current: usize,
    loop_depth: u32,
}

impl<'d, W: Write> Parser<'d, W> {
    /// `tokens` must end with an `Eof` token, as the scanner guarantees.
    pub fn new(tokens: Vec<Token>, diag: &'d mut Diagnostics<W>) -> Parser<'d, W> {
        debug_assert!(matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof));
        Parser {
            tokens,
            diag,
            current: 0,
            loop_depth: 0,
        }
    }

    /// Parse a whole program.  Declarations that fail to parse are
    /// dropped from the output; the compile-error flag records that they
    /// existed.
    pub fn parse(mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(declaration) = self.declaration() {
                statements.push(declaration);
            }
        }
        statements
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = match self.peek().kind {
            TokenKind::Var => {
                self.advance();
                self.var_declaration()
            }
            _ => self.statement(),
        };
        match result {
            Ok(statement) => Some(statement),
            Err(SyntaxError) => {
                self.synchronize();
                None
            }
        }
    }

    /// The `var` keyword has just been consumed.
    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self
            .consume(TokenKind::Identifier, "Expect variable name.")?
            .clone();

        let initializer = if self.match_kind(TokenKind::Equal) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };

        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Ok(Stmt::Var(name, initializer))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::For => {
                self.advance();
                self.for_statement()
            }
            TokenKind::If => {
                self.advance();
                self.if_statement()
            }
            TokenKind::Print => {
                self.advance();
                self.print_statement()
            }
            TokenKind::While => {
                self.advance();
                self.while_statement()
            }
            TokenKind::Break => {
                self.advance();
                self.break_statement()
            }
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.block()?))
            }
            _ => self.expression_statement(),
        }
    }

    /// `for` is sugar: the loop clauses are rewritten into blocks around
    /// a `while`, so the evaluator never sees a `for` at all.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            TokenKind::Var => {
                self.advance();
                Some(self.var_declaration()?)
            }
            _ => Some(self.expression_statement()?),
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        let mut body = body?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expr(Box::new(increment))]);
        }

        let condition = condition.unwrap_or(Expr::Literal(Literal::Bool(true)));
        body = Stmt::While(Box::new(condition), Box::new(body));

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = self.statement()?;
        // An `else` binds to the nearest unmatched `if`.
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(
            Box::new(condition),
            Box::new(then_branch),
            else_branch,
        ))
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(Box::new(value)))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        Ok(Stmt::While(Box::new(condition), Box::new(body?)))
    }

    /// The `break` keyword has just been consumed.
    fn break_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        if self.loop_depth == 0 {
            return Err(self.error_at(&keyword, "Cannot use 'break' outside of a loop."));
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.")?;
        Ok(Stmt::Break(keyword))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(declaration) = self.declaration() {
                statements.push(declaration);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expr(Box::new(expr)))
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.comma()
    }

    fn comma(&mut self) -> ParseResult<Expr> {
        let mut expr = self.assignment()?;
        while self.match_kind(TokenKind::Comma) {
            let operator = self.previous().clone();
            let right = self.assignment()?;
            expr = Expr::Comma(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.ternary()?;

        if self.match_kind(TokenKind::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable(name) => Ok(Expr::Assign(name, Box::new(value))),
                other => {
                    // Report without raising: the left-hand side is still
                    // a usable expression, so parsing continues here.
                    self.diag.parse_error(&equals, "Invalid assignment target.");
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn ternary(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if self.match_kind(TokenKind::Question) {
            let then_branch = self.expression()?;
            self.consume(
                TokenKind::Colon,
                "Expect ':' after then branch of conditional expression.",
            )?;
            // Right-associative: `a ? b : c ? d : e` nests in the else.
            let else_branch = self.ternary()?;
            return Ok(Expr::Conditional(
                Box::new(expr),
                Box::new(then_branch),
                Box::new(else_branch),
            ));
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;
        while self.match_kind(TokenKind::Or) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while self.match_kind(TokenKind::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;
        while self.match_kinds(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;
        while self.match_kinds(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;
        while self.match_kinds(&[TokenKind::Minus, TokenKind::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        while self.match_kinds(&[TokenKind::Slash, TokenKind::Star]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_kinds(&[TokenKind::Bang, TokenKind::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary(operator, Box::new(right)));
        }
        self.primary()
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        match self.peek().kind {
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Literal(Literal::Nil))
            }
            TokenKind::Number | TokenKind::Str => {
                let literal = self
                    .advance()
                    .literal
                    .clone()
                    .expect("number and string tokens carry a literal");
                Ok(Expr::Literal(literal))
            }
            TokenKind::Identifier => Ok(Expr::Variable(self.advance().clone())),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                Ok(Expr::Grouping(Box::new(expr)))
            }
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::BangEqual
            | TokenKind::EqualEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Question
            | TokenKind::Colon
            | TokenKind::Comma => self.missing_left_operand(),
            _ => Err(self.error_here("Expect expression.")),
        }
    }

    /// A binary operator with no left operand.  Report it, then parse and
    /// throw away a right operand at the operator's own precedence so the
    /// rest of the statement still parses cleanly.
    fn missing_left_operand(&mut self) -> ParseResult<Expr> {
        let operator = self.advance().clone();
        self.diag
            .parse_error(&operator, "Expect left-hand operand.");

        match operator.kind {
            TokenKind::Plus | TokenKind::Minus => {
                self.term()?;
            }
            TokenKind::Star | TokenKind::Slash => {
                self.factor()?;
            }
            TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual => {
                self.comparison()?;
            }
            TokenKind::BangEqual | TokenKind::EqualEqual => {
                self.equality()?;
            }
            TokenKind::Question | TokenKind::Colon => {
                self.ternary()?;
            }
            TokenKind::Comma => {
                self.comma()?;
            }
            _ => (),
        }

        Ok(Expr::Literal(Literal::Nil))
    }

    /// Skip tokens until a likely statement boundary: just past a `;`, or
    /// just before a keyword that starts a declaration or statement.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    fn error_here(&mut self, message: &str) -> SyntaxError {
        let token = self.peek().clone();
        self.error_at(&token, message)
    }

    fn error_at(&mut self, token: &Token, message: &str) -> SyntaxError {
        self.diag.parse_error(token, message);
        SyntaxError
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        self.match_kinds(&[kind])
    }

    fn match_kinds(&mut self, kinds: &[TokenKind]) -> bool {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }
}
