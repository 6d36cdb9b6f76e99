//! Recursive-descent expression parser.
//!
//! Precedence, lowest to highest: `| ^ & << >> + - * / % (unary) atom`,
//! mirroring C. Parsing either consumes all input or reports a syntax error;
//! forward references to undefined symbols are accepted here unconditionally
//! they are only resolved (or rejected) later, by the evaluator.

use super::ast::{BinOp, Expr, UnaryOp};
use super::lexer::{Lexer, Token};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError(pub String);

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse `text` into an expression tree. Lexical errors (bad numeric or
/// character literals) are returned alongside a best-effort tree built with
/// zero-valued placeholders in their place; syntax errors abort parsing
/// entirely.
pub fn parse(text: &str) -> Result<(Expr, Vec<String>), SyntaxError> {
    let mut lexer = Lexer::new(text);
    let tokens: Vec<Token> = lexer.by_ref().collect();
    let lexical_errors = std::mem::take(&mut lexer.lexical_errors);
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(SyntaxError(format!(
            "unexpected trailing input in expression \"{}\"",
            text
        )));
    }
    Ok((expr, lexical_errors))
}

/// Parse a top-level comma-separated list, as used by `.BYTE`/`.WORD`.
pub fn parse_list(text: &str) -> Result<(Vec<Expr>, Vec<String>), SyntaxError> {
    let mut lexer = Lexer::new(text);
    let tokens: Vec<Token> = lexer.by_ref().collect();
    let lexical_errors = std::mem::take(&mut lexer.lexical_errors);
    let mut parser = Parser { tokens, pos: 0 };
    let mut items = vec![parser.parse_expr()?];
    while parser.eat(&Token::Comma) {
        items.push(parser.parse_expr()?);
    }
    if parser.pos != parser.tokens.len() {
        return Err(SyntaxError(format!("unexpected trailing input in list \"{}\"", text)));
    }
    Ok((items, lexical_errors))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, context: &str) -> Result<(), SyntaxError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(SyntaxError(format!("expected {} in {}", describe(token), context)))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_xor()?;
        while self.eat(&Token::Pipe) {
            let right = self.parse_xor()?;
            left = Expr::binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_xor(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Caret) {
            let right = self.parse_and()?;
            left = Expr::binary(BinOp::Xor, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_shift()?;
        while self.eat(&Token::Amp) {
            let right = self.parse_shift()?;
            left = Expr::binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = if self.eat(&Token::Shl) {
                BinOp::Shl
            } else if self.eat(&Token::Shr) {
                BinOp::Shr
            } else {
                break;
            };
            let right = self.parse_additive()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.eat(&Token::Plus) {
                BinOp::Add
            } else if self.eat(&Token::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.eat(&Token::Star) {
                BinOp::Mul
            } else if self.eat(&Token::Slash) {
                BinOp::Div
            } else if self.eat(&Token::Percent) {
                BinOp::Mod
            } else {
                break;
            };
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Plus) => Some(UnaryOp::Plus),
            Some(Token::Tilde) => Some(UnaryOp::BitNot),
            Some(Token::Bang) => Some(UnaryOp::LogicalNot),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.parse_unary()?;
            Ok(Expr::unary(op, operand))
        } else {
            self.parse_atom()
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek().cloned() {
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(Expr::number(value))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(Expr::Symbol(name))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen, "parenthesized expression")?;
                Ok(inner)
            }
            Some(other) => Err(SyntaxError(format!("unexpected token {}", describe(&other)))),
            None => Err(SyntaxError("unexpected end of expression".to_string())),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {}", n),
        Token::Ident(name) => format!("identifier \"{}\"", name),
        Token::RParen => "')'".to_string(),
        Token::LParen => "'('".to_string(),
        Token::Comma => "','".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_precedence() {
        let (expr, errs) = parse("1 + 2 * 3").unwrap();
        assert!(errs.is_empty());
        assert_eq!(
            expr,
            Expr::binary(BinOp::Add, Expr::number(1), Expr::binary(BinOp::Mul, Expr::number(2), Expr::number(3)))
        );
    }

    #[test]
    fn parses_parentheses() {
        let (expr, _) = parse("(1 + 2) * 3").unwrap();
        assert_eq!(
            expr,
            Expr::binary(BinOp::Mul, Expr::binary(BinOp::Add, Expr::number(1), Expr::number(2)), Expr::number(3))
        );
    }

    #[test]
    fn unterminated_paren_is_syntax_error() {
        assert!(parse("(1 + 2").is_err());
    }

    #[test]
    fn trailing_input_is_syntax_error() {
        assert!(parse("1 2").is_err());
    }

    #[test]
    fn parses_unary_and_hex_literal() {
        let (expr, _) = parse("-$10").unwrap();
        assert_eq!(expr, Expr::unary(UnaryOp::Neg, Expr::number(0x10)));
    }

    #[test]
    fn parses_list() {
        let (items, _) = parse_list("SIZE, SIZE+1").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn percent_as_modulo_vs_binary_literal() {
        let (expr, _) = parse("%1010").unwrap();
        assert_eq!(expr, Expr::number(0b1010));

        let (expr, _) = parse("10 % 3").unwrap();
        assert_eq!(expr, Expr::binary(BinOp::Mod, Expr::number(10), Expr::number(3)));
    }
}
