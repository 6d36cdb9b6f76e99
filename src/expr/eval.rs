//! Expression evaluator: walks an AST against a symbol table to
//! produce a 64-bit two's-complement integer.

use super::ast::{BinOp, Expr, UnaryOp};
use crate::symtab::SymbolTable;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    UndefinedSymbol(String),
    DivisionByZero,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UndefinedSymbol(name) => write!(f, "undefined symbol {}", name),
            EvalError::DivisionByZero => write!(f, "division by zero"),
        }
    }
}

/// Evaluate `expr` against `symbols`. Division truncates toward zero;
/// modulo takes the sign of the dividend; both are the native behavior of
/// Rust's `i64` `/` and `%` operators.
pub fn eval(expr: &Expr, symbols: &SymbolTable) -> Result<i64, EvalError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Symbol(name) => symbols.get(name).ok_or_else(|| EvalError::UndefinedSymbol(name.clone())),
        Expr::Unary(op, operand) => {
            let value = eval(operand, symbols)?;
            Ok(match op {
                UnaryOp::Neg => value.wrapping_neg(),
                UnaryOp::Plus => value,
                UnaryOp::BitNot => !value,
                UnaryOp::LogicalNot => {
                    if value == 0 {
                        1
                    } else {
                        0
                    }
                }
            })
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, symbols)?;
            let right = eval(right, symbols)?;
            Ok(match op {
                BinOp::Add => left.wrapping_add(right),
                BinOp::Sub => left.wrapping_sub(right),
                BinOp::Mul => left.wrapping_mul(right),
                BinOp::Div => {
                    if right == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    left.wrapping_div(right)
                }
                BinOp::Mod => {
                    if right == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    left.wrapping_rem(right)
                }
                BinOp::And => left & right,
                BinOp::Or => left | right,
                BinOp::Xor => left ^ right,
                BinOp::Shl => left.wrapping_shl(right as u32),
                BinOp::Shr => left.wrapping_shr(right as u32),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symtab::SymbolKind;

    fn eval_text(text: &str, symbols: &SymbolTable) -> Result<i64, EvalError> {
        let (expr, _) = super::super::parser::parse(text).unwrap();
        eval(&expr, symbols)
    }

    #[test]
    fn arithmetic_precedence() {
        let symbols = SymbolTable::new();
        assert_eq!(eval_text("1 + 2 * 3", &symbols), Ok(7));
    }

    #[test]
    fn division_truncates_toward_zero() {
        let symbols = SymbolTable::new();
        assert_eq!(eval_text("-7 / 2", &symbols), Ok(-3));
    }

    #[test]
    fn modulo_has_sign_of_dividend() {
        let symbols = SymbolTable::new();
        assert_eq!(eval_text("-7 % 2", &symbols), Ok(-1));
    }

    #[test]
    fn division_by_zero_errors() {
        let symbols = SymbolTable::new();
        assert_eq!(eval_text("1 / 0", &symbols), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn undefined_symbol_errors() {
        let symbols = SymbolTable::new();
        assert_eq!(eval_text("MISSING", &symbols), Err(EvalError::UndefinedSymbol("MISSING".to_string())));
    }

    #[test]
    fn symbol_minus_itself_is_zero() {
        let mut symbols = SymbolTable::new();
        symbols.define("L", 0x1234, SymbolKind::Label, 1).unwrap();
        assert_eq!(eval_text("L - L", &symbols), Ok(0));
    }
}
