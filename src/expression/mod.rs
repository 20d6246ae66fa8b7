//! Trait expressions: data-defined damage, pain and stun formulas
//!
//! Formulas are parsed once when the catalog loads (a syntax error there is a
//! catalog error) and evaluated per attack against an explicit context.

pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::{BinOp, EvalError, Expr, ParseError, UnaryOp};
pub use eval::EvalContext;

use serde::{Deserialize, Serialize};

/// A parsed formula that remembers its source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TraitExpression {
    source: String,
    expr: Expr,
}

impl TraitExpression {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Ok(Self {
            source: source.trim().to_string(),
            expr: Expr::parse(source)?,
        })
    }

    /// Constant formula
    pub fn constant(value: f64) -> Self {
        Self {
            source: value.to_string(),
            expr: Expr::Literal(value),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl TryFrom<String> for TraitExpression {
    type Error = ParseError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        TraitExpression::parse(&source)
    }
}

impl From<TraitExpression> for String {
    fn from(expression: TraitExpression) -> Self {
        expression.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        damage: TraitExpression,
    }

    #[test]
    fn test_deserialize_from_toml_string() {
        let holder: Holder = toml::from_str("damage = \"2d6 + 3\"").unwrap();
        assert_eq!(holder.damage.source(), "2d6 + 3");
        assert!(matches!(holder.damage.expr(), Expr::BinOp { .. }));
    }

    #[test]
    fn test_invalid_formula_fails_deserialization() {
        let result: Result<Holder, _> = toml::from_str("damage = \"2d6 +\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_constant_formula() {
        let expr = TraitExpression::constant(4.0);
        assert_eq!(expr.expr(), &Expr::Literal(4.0));
    }
}
