//! Symbolic arithmetic: `2 + 2`, `(1 + 2) * 3`, `2^10`, `7 × 6 ÷ 3`.
//!
//! Input containing anything other than digits, operators, parentheses and
//! whitespace is not arithmetic and yields no result. A bare literal such as
//! `42` or `(42)` is not a computation either.

use runbar_types::ExecutableCommand;

use crate::format::numeric_result;

/// Nesting limit for parentheses and unary signs.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Open,
    Close,
}

/// Evaluate `query` as a symbolic expression.
pub fn parse_symbolic_arithmetic(query: &str) -> Vec<ExecutableCommand> {
    evaluate(query).and_then(numeric_result).into_iter().collect()
}

/// Evaluate `input`, returning `None` for anything that is not a finite
/// arithmetic computation.
pub fn evaluate(input: &str) -> Option<f64> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        binary_ops: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if parser.pos != tokens.len() || parser.binary_ops == 0 || !value.is_finite() {
        return None;
    }
    Some(value)
}

/// Split `input` into tokens.
///
/// # Returns
///
/// `None` as soon as a character outside the arithmetic alphabet is seen.
fn tokenize(input: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let token = match ch {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let (number, next) = scan_number(&chars, i)?;
                i = next;
                tokens.push(Token::Number(number));
                continue;
            }
            '+' => Token::Plus,
            '-' | '−' => Token::Minus,
            '*' | '×' => Token::Star,
            '/' | '÷' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::Open,
            ')' => Token::Close,
            _ => return None,
        };
        tokens.push(token);
        i += 1;
    }
    if tokens.is_empty() { None } else { Some(tokens) }
}

fn scan_number(chars: &[char], start: usize) -> Option<(f64, usize)> {
    let mut end = start;
    let mut seen_dot = false;
    while end < chars.len() {
        match chars[end] {
            c if c.is_ascii_digit() => {}
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    let literal: String = chars[start..end].iter().collect();
    literal.parse::<f64>().ok().map(|value| (value, end))
}

/// Recursive descent over the usual precedence levels; `^` is right
/// associative and binds tighter than unary minus.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    binary_ops: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn expression(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            self.binary_ops += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            self.binary_ops += 1;
            let rhs = self.unary()?;
            value = if op == Token::Star {
                value * rhs
            } else {
                if rhs == 0.0 {
                    return None;
                }
                value / rhs
            };
        }
        Some(value)
    }

    fn unary(&mut self) -> Option<f64> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Option<f64> {
        match self.peek()? {
            Token::Minus => {
                self.pos += 1;
                Some(-self.unary()?)
            }
            Token::Plus => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Option<f64> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Caret) {
            self.pos += 1;
            self.binary_ops += 1;
            let exponent = self.unary()?;
            return Some(base.powf(exponent));
        }
        Some(base)
    }

    fn primary(&mut self) -> Option<f64> {
        match self.advance()? {
            Token::Number(value) => Some(value),
            Token::Open => {
                let value = self.expression()?;
                match self.advance()? {
                    Token::Close => Some(value),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
