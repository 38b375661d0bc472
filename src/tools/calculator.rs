//! Calculator tool.
//!
//! Evaluates arithmetic expressions with a small recursive-descent parser:
//! `+ - * / % ^` (with `**` as an alias for `^`), parentheses, unary minus,
//! the usual math functions, and the constants `pi` and `e`. Unparsable or
//! non-finite results are reported in-band so the model can correct itself.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;

use super::Tool;

/// Arithmetic expression evaluator exposed to the model.
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Use this whenever the user asks for \
         arithmetic, percentages, roots, powers, or trigonometry. Supported: \
         + - * / % ^ (or **), parentheses, unary minus; functions sqrt, sin, cos, \
         tan, log, log10, exp, abs, floor, ceil, round, pow(a, b), min(...), \
         max(...); constants pi and e. Examples: \"2 + 2\", \"sqrt(16)\", \
         \"1250 * 0.15\" (15% of 1250), \"2 ^ 10\"."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The arithmetic expression to evaluate"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let expression = args
            .get("expression")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match evaluate(expression) {
            Ok(result) if result.is_finite() => Ok(json!({
                "success": true,
                "expression": expression,
                "result": result
            })
            .to_string()),
            Ok(_) => Ok(json!({
                "success": false,
                "expression": expression,
                "error": "result is not a finite number"
            })
            .to_string()),
            Err(e) => Ok(json!({
                "success": false,
                "expression": expression,
                "error": e
            })
            .to_string()),
        }
    }
}

// ============================================================================
// Expression evaluation
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{}'", literal))?;
                tokens.push(Token::Number(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                // Accept Python-style `**` for exponentiation
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: Token) -> std::result::Result<(), String> {
        match self.next() {
            Some(t) if t == token => Ok(()),
            Some(t) => Err(format!("expected {:?}, found {:?}", token, t)),
            None => Err(format!("expected {:?}, found end of input", token)),
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.next();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.next();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.next();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value /= divisor;
                }
                Some(Token::Percent) => {
                    self.next();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err("modulo by zero".to_string());
                    }
                    value %= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    // unary := '-' unary | power
    fn unary(&mut self) -> std::result::Result<f64, String> {
        if self.peek() == Some(&Token::Minus) {
            self.next();
            return Ok(-self.unary()?);
        }
        self.power()
    }

    // power := primary ('^' unary)?   (right-associative)
    fn power(&mut self) -> std::result::Result<f64, String> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.next();
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // primary := number | ident ('(' args ')')? | '(' expr ')'
    fn primary(&mut self) -> std::result::Result<f64, String> {
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.next();
                    let mut args = vec![self.expr()?];
                    while self.peek() == Some(&Token::Comma) {
                        self.next();
                        args.push(self.expr()?);
                    }
                    self.expect(Token::RParen)?;
                    apply_function(&name, &args)
                } else {
                    match name.as_str() {
                        "pi" => Ok(std::f64::consts::PI),
                        "e" => Ok(std::f64::consts::E),
                        other => Err(format!("unknown constant '{}'", other)),
                    }
                }
            }
            Some(t) => Err(format!("unexpected token {:?}", t)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn apply_function(name: &str, args: &[f64]) -> std::result::Result<f64, String> {
    let unary = |f: fn(f64) -> f64| {
        if args.len() == 1 {
            Ok(f(args[0]))
        } else {
            Err(format!("{} expects exactly one argument", name))
        }
    };

    match name {
        "sqrt" => unary(f64::sqrt),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "log" => unary(f64::ln),
        "log10" => unary(f64::log10),
        "exp" => unary(f64::exp),
        "abs" => unary(f64::abs),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(f64::round),
        "pow" => {
            if args.len() == 2 {
                Ok(args[0].powf(args[1]))
            } else {
                Err("pow expects exactly two arguments".to_string())
            }
        }
        "min" => {
            if args.is_empty() {
                Err("min expects at least one argument".to_string())
            } else {
                Ok(args.iter().cloned().fold(f64::INFINITY, f64::min))
            }
        }
        "max" => {
            if args.is_empty() {
                Err("max expects at least one argument".to_string())
            } else {
                Ok(args.iter().cloned().fold(f64::NEG_INFINITY, f64::max))
            }
        }
        other => Err(format!("unknown function '{}'", other)),
    }
}

/// Evaluate an arithmetic expression to a number.
fn evaluate(input: &str) -> std::result::Result<f64, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty expression".to_string());
    }

    let tokens = tokenize(trimmed)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;

    if parser.pos != parser.tokens.len() {
        return Err(format!(
            "unexpected trailing input after position {}",
            parser.pos
        ));
    }

    Ok(value)
}
