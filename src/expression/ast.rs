//! Expression types and AST for trait expressions.
//!
//! Trait expressions are the data-authored formulas attached to attacks
//! (`"2d6 + strength / 4"`). They can include literals, trait references,
//! dice rolls, binary/unary operations, conditionals and function calls.

use thiserror::Error;

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Neq,
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal (e.g., 42.5)
    Literal(f64),
    /// A trait reference (e.g., "strength", "weapon.quality")
    Param(String),
    /// A dice roll (e.g., 2d6)
    Dice { count: u32, sides: u32 },
    /// A binary operation (e.g., left + right)
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// A unary operation (e.g., -x, !condition)
    UnaryOp { op: UnaryOp, operand: Box<Expr> },
    /// A conditional expression (if condition then true_expr else false_expr)
    Conditional {
        condition: Box<Expr>,
        true_expr: Box<Expr>,
        false_expr: Box<Expr>,
    },
    /// A function call (e.g., min(a, b))
    Function { name: String, args: Vec<Expr> },
}

impl Expr {
    /// Every trait name the expression reads, in first-seen order
    pub fn params(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Param(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Literal(_) | Expr::Dice { .. } => {}
            Expr::BinOp { left, right, .. } => {
                left.collect_params(out);
                right.collect_params(out);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_params(out),
            Expr::Conditional {
                condition,
                true_expr,
                false_expr,
            } => {
                condition.collect_params(out);
                true_expr.collect_params(out);
                false_expr.collect_params(out);
            }
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.collect_params(out);
                }
            }
        }
    }
}

/// Error type for expression evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Referenced a trait that doesn't exist in the context
    #[error("Unknown parameter: {0}")]
    UnknownParam(String),
    /// Called a function that doesn't exist
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    /// Attempted to divide by zero
    #[error("Division by zero")]
    DivisionByZero,
    /// Function called with wrong number of arguments
    #[error("Function {func} expected {expected} args, got {got}")]
    InvalidArgCount {
        func: String,
        expected: usize,
        got: usize,
    },
    /// Dice with zero sides
    #[error("Invalid dice: {count}d{sides}")]
    InvalidDice { count: u32, sides: u32 },
}

/// Most dice a single `NdM` term may roll
pub const MAX_DICE: u32 = 1000;

/// Error type for expression parsing
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Parse error: {message}")]
pub struct ParseError {
    pub message: String,
}
