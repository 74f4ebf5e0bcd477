//! Two-variable numeric expression evaluator.
//!
//! The engine treats the evaluator as an opaque capability behind the
//! [`NumericEval`] trait: given an expression string and the two named
//! inputs `X` and `Y`, it returns a number or reports that the expression
//! is not numeric. The report is what flips a label dimension onto the
//! symbolic set path, so "cannot parse" is a signal here, not a failure.
//!
//! [`ExprEval`] is the built-in implementation: a small recursive-descent
//! parser over `+ - * / % ^`, parentheses, unary minus, numeric literals,
//! the variables `X`/`Y`, and the functions `min`, `max`, `abs`, `sqrt`,
//! `floor`, `ceil`. Runtime arithmetic follows IEEE 754 (division by zero
//! yields an infinity, later clamped by the algebra layer).

use crate::error::EvalError;

/// Evaluator capability consumed by the inference engine.
pub trait NumericEval {
    /// Evaluate `expr` with the given variable bindings.
    ///
    /// Returns [`EvalError::NotNumeric`] when `expr` cannot be parsed as a
    /// numeric formula; the engine uses that to switch to symbolic set
    /// semantics for the dimension.
    fn evaluate(&self, expr: &str, x: f64, y: f64) -> Result<f64, EvalError>;
}

/// The built-in recursive-descent expression evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprEval;

impl NumericEval for ExprEval {
    fn evaluate(&self, expr: &str, x: f64, y: f64) -> Result<f64, EvalError> {
        let tokens = tokenize(expr).map_err(|message| EvalError::NotNumeric {
            expr: expr.to_string(),
            message,
        })?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            x,
            y,
        };
        let value = parser.expression().map_err(|message| EvalError::NotNumeric {
            expr: expr.to_string(),
            message,
        })?;
        if parser.pos != tokens.len() {
            return Err(EvalError::NotNumeric {
                expr: expr.to_string(),
                message: "trailing input after expression".to_string(),
            });
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

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

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
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
                tokens.push(Token::Star);
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
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| format!("malformed number literal \"{literal}\""))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    x: f64,
    y: f64,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: Token) -> Result<(), String> {
        match self.advance() {
            Some(t) if *t == token => Ok(()),
            Some(t) => Err(format!("expected {token:?}, found {t:?}")),
            None => Err(format!("expected {token:?}, found end of input")),
        }
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.advance();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // term := power (('*' | '/' | '%') power)*
    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.power()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.advance();
                    value *= self.power()?;
                }
                Token::Slash => {
                    self.advance();
                    value /= self.power()?;
                }
                Token::Percent => {
                    self.advance();
                    value %= self.power()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // power := unary ('^' power)?   (right-associative)
    fn power(&mut self) -> Result<f64, String> {
        let base = self.unary()?;
        if let Some(Token::Caret) = self.peek() {
            self.advance();
            let exponent = self.power()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // unary := '-' unary | primary
    fn unary(&mut self) -> Result<f64, String> {
        if let Some(Token::Minus) = self.peek() {
            self.advance();
            return Ok(-self.unary()?);
        }
        self.primary()
    }

    // primary := number | 'X' | 'Y' | ident '(' args ')' | '(' expression ')'
    fn primary(&mut self) -> Result<f64, String> {
        match self.advance().cloned() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "X" => Ok(self.x),
                "Y" => Ok(self.y),
                _ => self.function_call(&name),
            },
            Some(other) => Err(format!("unexpected token {other:?}")),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn function_call(&mut self, name: &str) -> Result<f64, String> {
        self.expect(Token::LParen)?;
        let mut args = vec![self.expression()?];
        while let Some(Token::Comma) = self.peek() {
            self.advance();
            args.push(self.expression()?);
        }
        self.expect(Token::RParen)?;

        match (name, args.as_slice()) {
            ("min", [a, b]) => Ok(a.min(*b)),
            ("max", [a, b]) => Ok(a.max(*b)),
            ("abs", [a]) => Ok(a.abs()),
            ("sqrt", [a]) => Ok(a.sqrt()),
            ("floor", [a]) => Ok(a.floor()),
            ("ceil", [a]) => Ok(a.ceil()),
            ("min" | "max", _) => Err(format!("{name} takes exactly 2 arguments")),
            ("abs" | "sqrt" | "floor" | "ceil", _) => {
                Err(format!("{name} takes exactly 1 argument"))
            }
            _ => Err(format!("unknown function \"{name}\"")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str, x: f64, y: f64) -> f64 {
        ExprEval.evaluate(expr, x, y).unwrap()
    }

    #[test]
    fn variables_bind() {
        assert_eq!(eval("X", 0.3, 0.7), 0.3);
        assert_eq!(eval("Y", 0.3, 0.7), 0.7);
        assert_eq!(eval("X+Y", 0.25, 0.5), 0.75);
    }

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(eval("1+2*3", 0.0, 0.0), 7.0);
        assert_eq!(eval("(1+2)*3", 0.0, 0.0), 9.0);
        assert_eq!(eval("2^3^2", 0.0, 0.0), 512.0); // right-associative
        assert_eq!(eval("10-4-3", 0.0, 0.0), 3.0); // left-associative
    }

    #[test]
    fn unary_minus() {
        assert_eq!(eval("-X", 0.4, 0.0), -0.4);
        assert_eq!(eval("X--Y", 0.5, 0.25), 0.75);
        assert_eq!(eval("-(X+Y)", 0.25, 0.25), -0.5);
    }

    #[test]
    fn builtin_functions() {
        assert_eq!(eval("min(X,Y)", 0.8, 0.6), 0.6);
        assert_eq!(eval("max(X,Y)", 0.8, 0.6), 0.8);
        assert!((eval("abs(X-Y)", 0.3, 0.7) - 0.4).abs() < 1e-12);
        assert_eq!(eval("sqrt(X)", 0.25, 0.0), 0.5);
        assert_eq!(eval("floor(X)+ceil(Y)", 1.9, 0.1), 2.0);
    }

    #[test]
    fn nested_function_arguments() {
        assert_eq!(eval("min(max(X,Y), 0.9)", 0.95, 0.2), 0.9);
        assert_eq!(eval("max(X*Y, X+Y-1)", 0.5, 0.5), 0.25);
    }

    #[test]
    fn division_by_zero_is_infinite_not_error() {
        assert!(eval("X/Y", 1.0, 0.0).is_infinite());
    }

    #[test]
    fn symbolic_keywords_are_not_numeric() {
        assert!(matches!(
            ExprEval.evaluate("Union", 0.0, 0.0),
            Err(EvalError::NotNumeric { .. })
        ));
        assert!(matches!(
            ExprEval.evaluate("Intersection", 0.0, 0.0),
            Err(EvalError::NotNumeric { .. })
        ));
    }

    #[test]
    fn garbage_is_not_numeric() {
        assert!(ExprEval.evaluate("", 0.0, 0.0).is_err());
        assert!(ExprEval.evaluate("X +", 0.0, 0.0).is_err());
        assert!(ExprEval.evaluate("foo(X)", 0.0, 0.0).is_err());
        assert!(ExprEval.evaluate("X $ Y", 0.0, 0.0).is_err());
        assert!(ExprEval.evaluate("min(X)", 0.0, 0.0).is_err());
        assert!(ExprEval.evaluate("(X+Y", 0.0, 0.0).is_err());
        assert!(ExprEval.evaluate("X Y", 0.0, 0.0).is_err());
    }
}
