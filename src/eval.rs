//! Tree-walking evaluator and the lexical scope chain it runs against.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{Expr, Stmt};
use crate::token::{Literal, Token, TokenKind};

/// Runtime representation of a language value.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    /// `nil` and `false` are falsy; everything else, `0`, `""`, and `NaN`
    /// included, is truthy.
    fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Value {
        match literal {
            Literal::Nil => Value::Nil,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            // Integral doubles print without a fractional part: `1`, not
            // `1.0`.
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Errors raised during evaluation.  Each carries the source line of the
/// token that triggered it, except failures of the output sink itself.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Operand must be a number.")]
    NumberOperand { line: u32 },
    #[error("Operands must be numbers.")]
    NumberOperands { line: u32 },
    #[error("Operands must be two numbers or two strings.")]
    AddOperands { line: u32 },
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: u32 },
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl RuntimeError {
    /// Line used for `[line N]` reporting; I/O failures have none.
    pub fn line(&self) -> Option<u32> {
        match self {
            RuntimeError::NumberOperand { line }
            | RuntimeError::NumberOperands { line }
            | RuntimeError::AddOperands { line }
            | RuntimeError::UndefinedVariable { line, .. } => Some(*line),
            RuntimeError::Io(_) => None,
        }
    }
}

/// One frame of the lexical scope chain: a bindings map plus a link to
/// the enclosing scope.  The chain is a tree rooted at the globals and is
/// never cyclic, so `Rc` ownership with `RefCell` bindings suffices.
#[derive(Debug)]
struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<HashMap<String, Value>>,
}

impl Env {
    fn new() -> Rc<Env> {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Rc<Env>>) -> Rc<Env> {
        Rc::new(Env {
            parent,
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Bind `name` in this frame.  Re-declaring a name in the same scope
    /// silently overwrites the old binding.
    fn define(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_string(), value);
    }

    fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.bindings.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(name),
            None => Err(RuntimeError::UndefinedVariable {
                name: name.lexeme.clone(),
                line: name.line,
            }),
        }
    }

    /// Rebind an existing name somewhere up the chain.  Unlike `define`,
    /// this never creates a binding.
    fn assign(&self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.bindings.borrow_mut().get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(RuntimeError::UndefinedVariable {
                name: name.lexeme.clone(),
                line: name.line,
            }),
        }
    }
}

/// Walks statements and expressions, writing `print` output to `output`.
///
/// The global environment lives as long as the evaluator, so successive
/// `interpret` calls (the interactive prompt) share their variables.
#[derive(Debug)]
pub struct Evaluator<W: Write> {
    output: W,
    globals: Rc<Env>,

    // Set by a `break` statement, cleared by the loop that catches it.
    // While it is set, statement evaluation unwinds without running
    // anything, which also walks back out of any block scopes in between.
    breaking: bool,
}

impl<W: Write> Evaluator<W> {
    pub fn new(output: W) -> Evaluator<W> {
        Evaluator {
            output,
            globals: Env::new(),
            breaking: false,
        }
    }

    /// Run a program against the persistent global environment.  The
    /// first runtime error aborts the run and leaves already-executed
    /// side effects in place.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        self.eval_stmts(statements, self.globals.clone())
    }

    fn eval_stmts(&mut self, statements: &[Stmt], env: Rc<Env>) -> Result<(), RuntimeError> {
        for statement in statements {
            self.eval_stmt(statement, env.clone())?;
        }
        Ok(())
    }

    fn eval_stmt(&mut self, statement: &Stmt, env: Rc<Env>) -> Result<(), RuntimeError> {
        if self.breaking {
            return Ok(());
        }

        match statement {
            Stmt::Expr(expr) => {
                self.eval_expr(expr, env)?;
            }
            Stmt::Print(expr) => {
                let value = self.eval_expr(expr, env)?;
                writeln!(self.output, "{}", value)?;
            }
            Stmt::Var(name, initializer) => {
                // The initializer runs in the enclosing scope before the
                // name is bound, so `var x = x + 2;` sees the outer `x`.
                let value = match initializer {
                    Some(initializer) => self.eval_expr(initializer, env.clone())?,
                    None => Value::Nil,
                };
                env.define(&name.lexeme, value);
            }
            Stmt::Block(statements) => {
                self.eval_stmts(statements, Env::with_parent(Some(env)))?;
            }
            Stmt::If(condition, then_branch, else_branch) => {
                if self.eval_expr(condition, env.clone())?.is_truthy() {
                    self.eval_stmt(then_branch, env)?;
                } else if let Some(else_branch) = else_branch {
                    self.eval_stmt(else_branch, env)?;
                }
            }
            Stmt::While(condition, body) => {
                while self.eval_expr(condition, env.clone())?.is_truthy() {
                    self.eval_stmt(body, env.clone())?;
                    if self.breaking {
                        self.breaking = false;
                        break;
                    }
                }
            }
            Stmt::Break(_) => {
                debug_assert!(!self.breaking);
                self.breaking = true;
            }
        };
        Ok(())
    }

    fn eval_expr(&mut self, expr: &Expr, env: Rc<Env>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),
            Expr::Grouping(inner) => self.eval_expr(inner, env),
            Expr::Unary(operator, right) => {
                let right = self.eval_expr(right, env)?;
                match operator.kind {
                    TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
                    TokenKind::Minus => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::NumberOperand {
                            line: operator.line,
                        }),
                    },
                    _ => unreachable!("unary operator {:?}", operator.kind),
                }
            }
            Expr::Binary(left, operator, right) => {
                // Both operands evaluate left to right before any type
                // check.
                let left = self.eval_expr(left, env.clone())?;
                let right = self.eval_expr(right, env)?;
                eval_binary(operator, left, right)
            }
            Expr::Logical(left, operator, right) => {
                let left = self.eval_expr(left, env.clone())?;
                if operator.kind == TokenKind::Or {
                    if left.is_truthy() {
                        return Ok(left);
                    }
                } else if !left.is_truthy() {
                    return Ok(left);
                }
                self.eval_expr(right, env)
            }
            Expr::Comma(left, _, right) => {
                self.eval_expr(left, env.clone())?;
                self.eval_expr(right, env)
            }
            Expr::Conditional(condition, then_branch, else_branch) => {
                if self.eval_expr(condition, env.clone())?.is_truthy() {
                    self.eval_expr(then_branch, env)
                } else {
                    self.eval_expr(else_branch, env)
                }
            }
            Expr::Variable(name) => env.get(name),
            Expr::Assign(name, value) => {
                let value = self.eval_expr(value, env.clone())?;
                env.assign(name, value.clone())?;
                Ok(value)
            }
        }
    }
}

fn eval_binary(operator: &Token, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match operator.kind {
        TokenKind::Plus => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::Str(l), Value::Str(r)) => Ok(Value::Str(l + &r)),
            _ => Err(RuntimeError::AddOperands {
                line: operator.line,
            }),
        },
        TokenKind::Minus => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Number(l - r))
        }
        TokenKind::Star => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Number(l * r))
        }
        TokenKind::Slash => {
            // IEEE division: dividing by zero yields an infinity or NaN
            // rather than an error.
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Number(l / r))
        }
        TokenKind::Greater => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Bool(l > r))
        }
        TokenKind::GreaterEqual => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Bool(l >= r))
        }
        TokenKind::Less => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Bool(l < r))
        }
        TokenKind::LessEqual => {
            let (l, r) = number_operands(operator, left, right)?;
            Ok(Value::Bool(l <= r))
        }
        // Derived equality on `Value` is the language's equality:
        // same-type structural comparison, IEEE on numbers, and false
        // across types.
        TokenKind::EqualEqual => Ok(Value::Bool(left == right)),
        TokenKind::BangEqual => Ok(Value::Bool(left != right)),
        _ => unreachable!("binary operator {:?}", operator.kind),
    }
}

fn number_operands(
    operator: &Token,
    left: Value,
    right: Value,
) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((l, r)),
        _ => Err(RuntimeError::NumberOperands {
            line: operator.line,
        }),
    }
}
