//! Arithmetic spelled out in English.
//!
//! Binary operators are applied strictly left to right, so
//! `two plus three times four` is `20`. Functions (`square root of`, `log`)
//! and postfix operators (`squared`, `factorial`) bind to the operand next to
//! them.

use runbar_types::ExecutableCommand;

use crate::format::numeric_result;
use crate::number_words::{parse_number, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Modulo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    SquareRoot,
    CubeRoot,
    Log10,
    Ln,
}

const BINARY_OPS: &[(&[&str], BinaryOp)] = &[
    (&["raised", "to", "the", "power", "of"], BinaryOp::Power),
    (&["to", "the", "power", "of"], BinaryOp::Power),
    (&["raised", "to"], BinaryOp::Power),
    (&["multiplied", "by"], BinaryOp::Multiply),
    (&["multiply", "by"], BinaryOp::Multiply),
    (&["divided", "by"], BinaryOp::Divide),
    (&["divide", "by"], BinaryOp::Divide),
    (&["plus"], BinaryOp::Add),
    (&["minus"], BinaryOp::Subtract),
    (&["times"], BinaryOp::Multiply),
    (&["over"], BinaryOp::Divide),
    (&["modulo"], BinaryOp::Modulo),
    (&["mod"], BinaryOp::Modulo),
];

const FUNCTIONS: &[(&[&str], Function)] = &[
    (&["square", "root", "of"], Function::SquareRoot),
    (&["square", "root"], Function::SquareRoot),
    (&["sqrt", "of"], Function::SquareRoot),
    (&["sqrt"], Function::SquareRoot),
    (&["cube", "root", "of"], Function::CubeRoot),
    (&["cube", "root"], Function::CubeRoot),
    (&["cbrt"], Function::CubeRoot),
    (&["natural", "log", "of"], Function::Ln),
    (&["natural", "log"], Function::Ln),
    (&["ln", "of"], Function::Ln),
    (&["ln"], Function::Ln),
    (&["log", "of"], Function::Log10),
    (&["log"], Function::Log10),
];

const QUESTION_PREFIXES: [&str; 4] = ["what is ", "what's ", "calculate ", "compute "];

/// Nesting limit for functions and `percent of` chains.
const MAX_DEPTH: usize = 256;

/// Largest n for which n! is finite in `f64`.
const MAX_FACTORIAL: f64 = 170.0;

pub fn parse_worded_arithmetic(query: &str) -> Vec<ExecutableCommand> {
    evaluate(query).and_then(numeric_result).into_iter().collect()
}

/// Evaluate worded arithmetic. At least one operation must be present.
pub fn evaluate(query: &str) -> Option<f64> {
    let tokens = tokenize(&normalize(query));
    if tokens.is_empty() {
        return None;
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        operations: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if parser.pos != tokens.len() || parser.operations == 0 || !value.is_finite() {
        return None;
    }
    Some(value)
}

fn normalize(query: &str) -> String {
    let mut text = query.trim().to_lowercase();
    for prefix in QUESTION_PREFIXES {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest.to_string();
            break;
        }
    }
    text.trim_end_matches('?').replace('%', " percent ")
}

fn match_phrase<T: Copy>(tokens: &[String], table: &[(&[&str], T)]) -> Option<(T, usize)> {
    table.iter().find_map(|(phrase, item)| {
        let matches = phrase.len() <= tokens.len() && phrase.iter().zip(tokens).all(|(word, token)| word == token);
        matches.then_some((*item, phrase.len()))
    })
}

struct Parser<'a> {
    tokens: &'a [String],
    pos: usize,
    operations: usize,
    depth: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &[String] {
        &self.tokens[self.pos..]
    }

    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn expression(&mut self) -> Option<f64> {
        let mut value = self.operand()?;
        while let Some((op, len)) = match_phrase(self.rest(), BINARY_OPS) {
            self.pos += len;
            self.operations += 1;
            let rhs = self.operand()?;
            value = apply_binary(op, value, rhs)?;
        }
        Some(value)
    }

    fn operand(&mut self) -> Option<f64> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let value = self.nested_operand();
        self.depth -= 1;
        value
    }

    fn nested_operand(&mut self) -> Option<f64> {
        if self.peek() == Some("the") {
            self.pos += 1;
        }
        if let Some((function, len)) = match_phrase(self.rest(), FUNCTIONS) {
            self.pos += len;
            self.operations += 1;
            let inner = self.operand()?;
            return apply_function(function, inner);
        }

        let (mut value, consumed) = parse_number(self.rest())?;
        self.pos += consumed;

        while let Some(word) = self.peek() {
            value = match word {
                "squared" => value * value,
                "cubed" => value * value * value,
                "factorial" => factorial(value)?,
                _ => break,
            };
            self.pos += 1;
            self.operations += 1;
        }

        if matches!(self.peek(), Some("percent" | "percentage")) {
            self.pos += 1;
            self.operations += 1;
            if self.peek() == Some("of") {
                self.pos += 1;
                let whole = self.operand()?;
                return Some(value / 100.0 * whole);
            }
            return Some(value / 100.0);
        }
        Some(value)
    }
}

fn apply_binary(op: BinaryOp, lhs: f64, rhs: f64) -> Option<f64> {
    match op {
        BinaryOp::Add => Some(lhs + rhs),
        BinaryOp::Subtract => Some(lhs - rhs),
        BinaryOp::Multiply => Some(lhs * rhs),
        BinaryOp::Divide | BinaryOp::Modulo if rhs == 0.0 => None,
        BinaryOp::Divide => Some(lhs / rhs),
        BinaryOp::Modulo => Some(lhs % rhs),
        BinaryOp::Power => Some(lhs.powf(rhs)),
    }
}

fn apply_function(function: Function, value: f64) -> Option<f64> {
    match function {
        Function::SquareRoot if value < 0.0 => None,
        Function::SquareRoot => Some(value.sqrt()),
        Function::CubeRoot => Some(value.cbrt()),
        Function::Log10 | Function::Ln if value <= 0.0 => None,
        Function::Log10 => Some(value.log10()),
        Function::Ln => Some(value.ln()),
    }
}

fn factorial(value: f64) -> Option<f64> {
    if value < 0.0 || value.fract() != 0.0 || value > MAX_FACTORIAL {
        return None;
    }
    Some((2..=value as u64).fold(1.0, |acc, n| acc * n as f64))
}
