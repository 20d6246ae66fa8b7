//! Pure evaluation of trait expressions.
//!
//! Evaluation never touches global state: every trait value comes from the
//! explicit [`EvalContext`] and every dice roll from the caller's RNG, so a
//! seeded RNG reproduces a formula exactly.

use ahash::AHashMap;
use rand::Rng;

use super::ast::{BinOp, EvalError, Expr, UnaryOp, MAX_DICE};

/// Named trait values visible to an expression
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    values: AHashMap<String, f64>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Insert every entry under `prefix.name`
    pub fn extend_prefixed<'a>(
        &mut self,
        prefix: &str,
        entries: impl IntoIterator<Item = (&'a String, &'a f64)>,
    ) {
        for (name, value) in entries {
            self.values.insert(format!("{}.{}", prefix, name), *value);
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

fn truthy(value: f64) -> bool {
    value != 0.0
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl Expr {
    /// Evaluate with trait values from `ctx` and dice from `rng`
    pub fn evaluate<R: Rng + ?Sized>(&self, ctx: &EvalContext, rng: &mut R) -> Result<f64, EvalError> {
        match self {
            Expr::Literal(value) => Ok(*value),
            Expr::Param(name) => ctx
                .get(name)
                .ok_or_else(|| EvalError::UnknownParam(name.clone())),
            Expr::Dice { count, sides } => {
                if *sides == 0 || *count > MAX_DICE {
                    return Err(EvalError::InvalidDice {
                        count: *count,
                        sides: *sides,
                    });
                }
                let total: u64 = (0..*count).map(|_| rng.gen_range(1..=*sides) as u64).sum();
                Ok(total as f64)
            }
            Expr::UnaryOp { op, operand } => {
                let value = operand.evaluate(ctx, rng)?;
                Ok(match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Not => flag(!truthy(value)),
                })
            }
            Expr::BinOp { op, left, right } => {
                let lhs = left.evaluate(ctx, rng)?;
                // Short-circuit logic operators before touching the right side
                match op {
                    BinOp::And if !truthy(lhs) => return Ok(0.0),
                    BinOp::Or if truthy(lhs) => return Ok(1.0),
                    _ => {}
                }
                let rhs = right.evaluate(ctx, rng)?;
                apply_binary(*op, lhs, rhs)
            }
            Expr::Conditional {
                condition,
                true_expr,
                false_expr,
            } => {
                if truthy(condition.evaluate(ctx, rng)?) {
                    true_expr.evaluate(ctx, rng)
                } else {
                    false_expr.evaluate(ctx, rng)
                }
            }
            Expr::Function { name, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(ctx, rng))
                    .collect::<Result<Vec<_>, _>>()?;
                call_function(name, &values)
            }
        }
    }
}

fn apply_binary(op: BinOp, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    Ok(match op {
        BinOp::Add => lhs + rhs,
        BinOp::Sub => lhs - rhs,
        BinOp::Mul => lhs * rhs,
        BinOp::Div => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs / rhs
        }
        BinOp::Mod => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs % rhs
        }
        BinOp::Gt => flag(lhs > rhs),
        BinOp::Lt => flag(lhs < rhs),
        BinOp::Gte => flag(lhs >= rhs),
        BinOp::Lte => flag(lhs <= rhs),
        BinOp::Eq => flag(lhs == rhs),
        BinOp::Neq => flag(lhs != rhs),
        BinOp::And => flag(truthy(lhs) && truthy(rhs)),
        BinOp::Or => flag(truthy(lhs) || truthy(rhs)),
    })
}

fn expect_args(name: &str, args: &[f64], expected: usize) -> Result<(), EvalError> {
    if args.len() != expected {
        return Err(EvalError::InvalidArgCount {
            func: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn call_function(name: &str, args: &[f64]) -> Result<f64, EvalError> {
    match name {
        "min" => {
            expect_args(name, args, 2)?;
            Ok(args[0].min(args[1]))
        }
        "max" => {
            expect_args(name, args, 2)?;
            Ok(args[0].max(args[1]))
        }
        "clamp" => {
            expect_args(name, args, 3)?;
            Ok(args[0].max(args[1]).min(args[2]))
        }
        "abs" => {
            expect_args(name, args, 1)?;
            Ok(args[0].abs())
        }
        "floor" => {
            expect_args(name, args, 1)?;
            Ok(args[0].floor())
        }
        "ceil" => {
            expect_args(name, args, 1)?;
            Ok(args[0].ceil())
        }
        "round" => {
            expect_args(name, args, 1)?;
            Ok(args[0].round())
        }
        "sqrt" => {
            expect_args(name, args, 1)?;
            Ok(args[0].max(0.0).sqrt())
        }
        "pow" => {
            expect_args(name, args, 2)?;
            Ok(args[0].powf(args[1]))
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}
