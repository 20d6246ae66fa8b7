//! nom parser for trait expressions.
//!
//! Precedence, loosest first: `if/then/else`, `||`, `&&`, comparisons,
//! `+ -`, `* / %`, unary `- !`, then atoms (numbers, dice, traits, calls,
//! parentheses).

use nom::character::complete::{char, digit1, satisfy};
use nom::bytes::complete::tag;
use nom::combinator::{opt, recognize};
use nom::error::{Error, ErrorKind};
use nom::multi::many0;
use nom::sequence::pair;
use nom::{IResult, Parser};

use super::ast::{BinOp, Expr, ParseError, UnaryOp, MAX_DICE};

type PResult<'a, O> = IResult<&'a str, O>;

const KEYWORDS: [&str; 3] = ["if", "then", "else"];

impl Expr {
    /// Parse a complete expression; trailing input is an error
    pub fn parse(source: &str) -> Result<Expr, ParseError> {
        match expression(source) {
            Ok((rest, expr)) if rest.trim().is_empty() => Ok(expr),
            Ok((rest, _)) => Err(ParseError {
                message: format!("unexpected input '{}' in '{}'", rest.trim(), source),
            }),
            Err(e) => Err(ParseError {
                message: format!("invalid expression '{}': {}", source, e),
            }),
        }
    }
}

/// Run a nom parser with the error type pinned to `nom::error::Error<&str>`
fn run<'a, O, P>(mut parser: P, input: &'a str) -> PResult<'a, O>
where
    P: Parser<&'a str, Output = O, Error = Error<&'a str>>,
{
    parser.parse(input)
}

fn fail<O>(input: &str, kind: ErrorKind) -> PResult<'_, O> {
    Err(nom::Err::Error(Error::new(input, kind)))
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Match a literal token after optional leading whitespace
fn token<'a>(input: &'a str, text: &'static str) -> PResult<'a, &'a str> {
    run(tag(text), input.trim_start())
}

/// Match a keyword that is not the prefix of a longer identifier
fn keyword<'a>(input: &'a str, word: &'static str) -> PResult<'a, &'a str> {
    let (rest, matched) = token(input, word)?;
    if rest.starts_with(is_ident_char) {
        return fail(input, ErrorKind::Tag);
    }
    Ok((rest, matched))
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::BinOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn expression(input: &str) -> PResult<'_, Expr> {
    if let Ok(result) = conditional(input) {
        return Ok(result);
    }
    or_expr(input)
}

fn conditional(input: &str) -> PResult<'_, Expr> {
    let (input, _) = keyword(input, "if")?;
    let (input, condition) = expression(input)?;
    let (input, _) = keyword(input, "then")?;
    let (input, true_expr) = expression(input)?;
    let (input, _) = keyword(input, "else")?;
    let (input, false_expr) = expression(input)?;
    Ok((
        input,
        Expr::Conditional {
            condition: Box::new(condition),
            true_expr: Box::new(true_expr),
            false_expr: Box::new(false_expr),
        },
    ))
}

fn or_expr(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = and_expr(input)?;
    while let Ok((rest, _)) = token(input, "||") {
        let (rest, right) = and_expr(rest)?;
        left = binary(BinOp::Or, left, right);
        input = rest;
    }
    Ok((input, left))
}

fn and_expr(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = comparison(input)?;
    while let Ok((rest, _)) = token(input, "&&") {
        let (rest, right) = comparison(rest)?;
        left = binary(BinOp::And, left, right);
        input = rest;
    }
    Ok((input, left))
}

fn comparison_op(input: &str) -> PResult<'_, BinOp> {
    // Two-character operators first so ">=" never matches as ">"
    const OPS: [(&str, BinOp); 6] = [
        (">=", BinOp::Gte),
        ("<=", BinOp::Lte),
        ("==", BinOp::Eq),
        ("!=", BinOp::Neq),
        (">", BinOp::Gt),
        ("<", BinOp::Lt),
    ];
    for (text, op) in OPS {
        if let Ok((rest, _)) = token(input, text) {
            return Ok((rest, op));
        }
    }
    fail(input, ErrorKind::Alt)
}

fn comparison(input: &str) -> PResult<'_, Expr> {
    let (input, left) = additive(input)?;
    match comparison_op(input) {
        Ok((rest, op)) => {
            let (rest, right) = additive(rest)?;
            Ok((rest, binary(op, left, right)))
        }
        Err(_) => Ok((input, left)),
    }
}

fn additive(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = multiplicative(input)?;
    loop {
        let op = if let Ok((rest, _)) = token(input, "+") {
            (rest, BinOp::Add)
        } else if let Ok((rest, _)) = token(input, "-") {
            (rest, BinOp::Sub)
        } else {
            return Ok((input, left));
        };
        let (rest, right) = multiplicative(op.0)?;
        left = binary(op.1, left, right);
        input = rest;
    }
}

fn multiplicative(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = unary(input)?;
    loop {
        let op = if let Ok((rest, _)) = token(input, "*") {
            (rest, BinOp::Mul)
        } else if let Ok((rest, _)) = token(input, "/") {
            (rest, BinOp::Div)
        } else if let Ok((rest, _)) = token(input, "%") {
            (rest, BinOp::Mod)
        } else {
            return Ok((input, left));
        };
        let (rest, right) = unary(op.0)?;
        left = binary(op.1, left, right);
        input = rest;
    }
}

fn unary(input: &str) -> PResult<'_, Expr> {
    for (text, op) in [("-", UnaryOp::Neg), ("!", UnaryOp::Not)] {
        if let Ok((rest, _)) = token(input, text) {
            let (rest, operand) = unary(rest)?;
            return Ok((
                rest,
                Expr::UnaryOp {
                    op,
                    operand: Box::new(operand),
                },
            ));
        }
    }
    primary(input)
}

fn primary(input: &str) -> PResult<'_, Expr> {
    let input = input.trim_start();

    if let Ok((rest, _)) = token(input, "(") {
        let (rest, inner) = expression(rest)?;
        let (rest, _) = token(rest, ")")?;
        return Ok((rest, inner));
    }
    if let Ok(result) = conditional(input) {
        return Ok(result);
    }
    match dice(input) {
        Ok(result) => return Ok(result),
        Err(nom::Err::Failure(e)) => return Err(nom::Err::Failure(e)),
        Err(_) => {}
    }
    if let Ok(result) = number(input) {
        return Ok(result);
    }
    call_or_param(input)
}

fn dice(input: &str) -> PResult<'_, Expr> {
    let (rest, (count, _, sides)) = run((opt(digit1), char('d'), digit1), input)?;
    if rest.starts_with(is_ident_char) {
        return fail(input, ErrorKind::Verify);
    }
    let count = match count {
        Some(text) => match text.parse::<u32>() {
            Ok(n) if n <= MAX_DICE => n,
            _ => return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge))),
        },
        None => 1,
    };
    let sides = match sides.parse::<u32>() {
        Ok(n) => n,
        Err(_) => return fail(input, ErrorKind::Digit),
    };
    Ok((rest, Expr::Dice { count, sides }))
}

fn number(input: &str) -> PResult<'_, Expr> {
    let (rest, text) = run(recognize(pair(digit1, opt(pair(char('.'), digit1)))), input)?;
    match text.parse::<f64>() {
        Ok(value) => Ok((rest, Expr::Literal(value))),
        Err(_) => fail(input, ErrorKind::Float),
    }
}

fn identifier(input: &str) -> PResult<'_, &str> {
    let (rest, name) = run(
        recognize(pair(
            satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
            many0(satisfy(is_ident_char)),
        )),
        input,
    )?;
    if KEYWORDS.contains(&name) {
        return fail(input, ErrorKind::Verify);
    }
    Ok((rest, name))
}

fn call_or_param(input: &str) -> PResult<'_, Expr> {
    let (rest, name) = identifier(input)?;
    let Ok((mut rest, _)) = token(rest, "(") else {
        return Ok((rest, Expr::Param(name.to_string())));
    };

    let mut args = Vec::new();
    if let Ok((after, _)) = token(rest, ")") {
        return Ok((
            after,
            Expr::Function {
                name: name.to_string(),
                args,
            },
        ));
    }
    loop {
        let (after, arg) = expression(rest)?;
        args.push(arg);
        if let Ok((after, _)) = token(after, ",") {
            rest = after;
            continue;
        }
        let (after, _) = token(after, ")")?;
        return Ok((
            after,
            Expr::Function {
                name: name.to_string(),
                args,
            },
        ));
    }
}
