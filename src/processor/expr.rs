//! Constant expressions used by `#define` bodies and array dimensions.
//!
//! Deliberately small: integer and float arithmetic, bitwise operators,
//! shifts, comparisons, `&&`/`||`, parentheses, symbol lookup and calls of
//! single-argument macros. Integer overflow is an error rather than wrapping.

use std::fmt;

use thiserror::Error;

use super::env::{Constant, Environment};
use super::tokens::{Spanned, Token, tokenize};

const MAX_MACRO_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    Call(String, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinOp {
    fn from_punct(p: &str) -> Option<(BinOp, u8)> {
        let op = match p {
            "*" => (BinOp::Mul, 10),
            "/" => (BinOp::Div, 10),
            "%" => (BinOp::Rem, 10),
            "+" => (BinOp::Add, 9),
            "-" => (BinOp::Sub, 9),
            "<<" => (BinOp::Shl, 8),
            ">>" => (BinOp::Shr, 8),
            "<" => (BinOp::Lt, 7),
            "<=" => (BinOp::Le, 7),
            ">" => (BinOp::Gt, 7),
            ">=" => (BinOp::Ge, 7),
            "==" => (BinOp::Eq, 6),
            "!=" => (BinOp::Ne, 6),
            "&" => (BinOp::BitAnd, 5),
            "^" => (BinOp::BitXor, 4),
            "|" => (BinOp::BitOr, 3),
            "&&" => (BinOp::And, 2),
            "||" => (BinOp::Or, 1),
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne
        )
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        };
        f.write_str(sym)
    }
}

/// C spelling, fully parenthesised.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{v}"),
            Expr::Float(v) => write!(f, "{v:?}"),
            Expr::Str(s) => write!(f, "{s:?}"),
            Expr::Symbol(name) => f.write_str(name),
            Expr::Call(name, arg) => write!(f, "{name}({arg})"),
            Expr::Unary(op, operand) => write!(f, "{op}{operand}"),
            Expr::Binary(op, lhs, rhs) => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
    #[error("'{0}' has no value")]
    NotAValue(String),
    #[error("'{0}' is not a macro")]
    NotAMacro(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in '{0}'")]
    Overflow(&'static str),
    #[error("operator '{0}' does not apply to these operands")]
    TypeMismatch(&'static str),
    #[error("macro expansion nested too deeply")]
    TooDeep,
}

/// Result of evaluating an [`Expr`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl ExprValue {
    fn truthy(&self, op: &'static str) -> Result<bool, EvalError> {
        match self {
            ExprValue::Int(v) => Ok(*v != 0),
            ExprValue::Float(v) => Ok(*v != 0.0),
            ExprValue::Str(_) => Err(EvalError::TypeMismatch(op)),
        }
    }

    fn as_f64(&self, op: &'static str) -> Result<f64, EvalError> {
        match self {
            ExprValue::Int(v) => Ok(*v as f64),
            ExprValue::Float(v) => Ok(*v),
            ExprValue::Str(_) => Err(EvalError::TypeMismatch(op)),
        }
    }

    pub fn into_constant(self) -> Constant {
        match self {
            ExprValue::Int(v) => Constant::Int(v),
            ExprValue::Float(v) => Constant::Float(v),
            ExprValue::Str(s) => Constant::Str(s),
        }
    }
}

/// Parses a complete expression; trailing tokens are an error.
pub fn parse_expr(src: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(src).map_err(EvalError::Syntax)?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.parse_binary(0)?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some(tok) => Err(EvalError::Syntax(format!(
            "unexpected '{}'",
            &src[tok.start..tok.end]
        ))),
    }
}

/// Parses and evaluates `src` in one go.
pub fn evaluate(src: &str, env: &Environment) -> Result<ExprValue, EvalError> {
    parse_expr(src)?.eval(env)
}

struct ExprParser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|s| s.token.clone());
        self.pos += 1;
        tok
    }

    fn expect(&mut self, p: &str) -> Result<(), EvalError> {
        match self.next() {
            Some(Token::Punct(q)) if q == p => Ok(()),
            Some(other) => Err(EvalError::Syntax(format!("expected '{p}', found {other:?}"))),
            None => Err(EvalError::Syntax(format!("expected '{p}'"))),
        }
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some(Token::Punct(p)) = self.peek() else {
                break;
            };
            let Some((op, prec)) = BinOp::from_punct(p) else {
                break;
            };
            if prec <= min_prec {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_binary(prec)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Some(Token::Punct("-")) => Some(UnaryOp::Neg),
            Some(Token::Punct("+")) => Some(UnaryOp::Plus),
            Some(Token::Punct("!")) => Some(UnaryOp::Not),
            Some(Token::Punct("~")) => Some(UnaryOp::BitNot),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let operand = self.parse_unary()?;
                Ok(Expr::Unary(op, Box::new(operand)))
            }
            None => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Int(v)) => Ok(Expr::Int(v)),
            Some(Token::Float(v)) => Ok(Expr::Float(v)),
            Some(Token::Str(mut s)) => {
                while let Some(Token::Str(more)) = self.peek() {
                    s.push_str(more);
                    self.pos += 1;
                }
                Ok(Expr::Str(s))
            }
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::Punct("("))) {
                    self.pos += 1;
                    let arg = self.parse_binary(0)?;
                    self.expect(")")?;
                    Ok(Expr::Call(name, Box::new(arg)))
                } else {
                    Ok(Expr::Symbol(name))
                }
            }
            Some(Token::Punct("(")) => {
                let inner = self.parse_binary(0)?;
                self.expect(")")?;
                Ok(inner)
            }
            Some(other) => Err(EvalError::Syntax(format!("unexpected {other:?}"))),
            None => Err(EvalError::Syntax("unexpected end of expression".into())),
        }
    }
}

impl Expr {
    pub fn eval(&self, env: &Environment) -> Result<ExprValue, EvalError> {
        self.eval_scoped(env, None, 0)
    }

    fn eval_scoped(
        &self,
        env: &Environment,
        local: Option<(&str, &ExprValue)>,
        depth: usize,
    ) -> Result<ExprValue, EvalError> {
        match self {
            Expr::Int(v) => Ok(ExprValue::Int(*v)),
            Expr::Float(v) => Ok(ExprValue::Float(*v)),
            Expr::Str(s) => Ok(ExprValue::Str(s.clone())),
            Expr::Symbol(name) => {
                if let Some((param, value)) = local {
                    if param == name {
                        return Ok(value.clone());
                    }
                }
                match env.get(name) {
                    Some(Constant::Int(v)) => Ok(ExprValue::Int(*v)),
                    Some(Constant::Float(v)) => Ok(ExprValue::Float(*v)),
                    Some(Constant::Str(s)) => Ok(ExprValue::Str(s.clone())),
                    Some(_) => Err(EvalError::NotAValue(name.clone())),
                    None => Err(EvalError::UnknownSymbol(name.clone())),
                }
            }
            Expr::Call(name, arg) => {
                if depth >= MAX_MACRO_DEPTH {
                    return Err(EvalError::TooDeep);
                }
                let (param, body) = match env.get(name) {
                    Some(Constant::Macro { param, body }) => (param, body),
                    Some(_) => return Err(EvalError::NotAMacro(name.clone())),
                    None => return Err(EvalError::UnknownSymbol(name.clone())),
                };
                let value = arg.eval_scoped(env, local, depth)?;
                body.eval_scoped(env, Some((param, &value)), depth + 1)
            }
            Expr::Unary(op, operand) => {
                let value = operand.eval_scoped(env, local, depth)?;
                eval_unary(*op, value)
            }
            Expr::Binary(BinOp::And, lhs, rhs) => {
                let l = lhs.eval_scoped(env, local, depth)?.truthy("&&")?;
                let r = l && rhs.eval_scoped(env, local, depth)?.truthy("&&")?;
                Ok(ExprValue::Int(r as i64))
            }
            Expr::Binary(BinOp::Or, lhs, rhs) => {
                let l = lhs.eval_scoped(env, local, depth)?.truthy("||")?;
                let r = l || rhs.eval_scoped(env, local, depth)?.truthy("||")?;
                Ok(ExprValue::Int(r as i64))
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = lhs.eval_scoped(env, local, depth)?;
                let r = rhs.eval_scoped(env, local, depth)?;
                eval_binary(*op, l, r)
            }
        }
    }
}

fn eval_unary(op: UnaryOp, value: ExprValue) -> Result<ExprValue, EvalError> {
    match (op, value) {
        (UnaryOp::Plus, v @ (ExprValue::Int(_) | ExprValue::Float(_))) => Ok(v),
        (UnaryOp::Neg, ExprValue::Int(v)) => v
            .checked_neg()
            .map(ExprValue::Int)
            .ok_or(EvalError::Overflow("-")),
        (UnaryOp::Neg, ExprValue::Float(v)) => Ok(ExprValue::Float(-v)),
        (UnaryOp::Not, v) => Ok(ExprValue::Int(!v.truthy("!")? as i64)),
        (UnaryOp::BitNot, ExprValue::Int(v)) => Ok(ExprValue::Int(!v)),
        (UnaryOp::BitNot, _) => Err(EvalError::TypeMismatch("~")),
        (_, ExprValue::Str(_)) => Err(EvalError::TypeMismatch("unary")),
    }
}

fn eval_binary(op: BinOp, lhs: ExprValue, rhs: ExprValue) -> Result<ExprValue, EvalError> {
    let sym = op.symbol();
    if let (ExprValue::Int(l), ExprValue::Int(r)) = (&lhs, &rhs) {
        let (l, r) = (*l, *r);
        let value = match op {
            BinOp::Mul => l.checked_mul(r).ok_or(EvalError::Overflow(sym))?,
            BinOp::Add => l.checked_add(r).ok_or(EvalError::Overflow(sym))?,
            BinOp::Sub => l.checked_sub(r).ok_or(EvalError::Overflow(sym))?,
            BinOp::Div | BinOp::Rem if r == 0 => return Err(EvalError::DivisionByZero),
            BinOp::Div => l.checked_div(r).ok_or(EvalError::Overflow(sym))?,
            BinOp::Rem => l.checked_rem(r).ok_or(EvalError::Overflow(sym))?,
            BinOp::Shl | BinOp::Shr => {
                let shift = u32::try_from(r)
                    .ok()
                    .filter(|s| *s < 64)
                    .ok_or(EvalError::Overflow(sym))?;
                if op == BinOp::Shl {
                    l.checked_shl(shift).ok_or(EvalError::Overflow(sym))?
                } else {
                    l >> shift
                }
            }
            BinOp::BitAnd => l & r,
            BinOp::BitXor => l ^ r,
            BinOp::BitOr => l | r,
            BinOp::Lt => (l < r) as i64,
            BinOp::Le => (l <= r) as i64,
            BinOp::Gt => (l > r) as i64,
            BinOp::Ge => (l >= r) as i64,
            BinOp::Eq => (l == r) as i64,
            BinOp::Ne => (l != r) as i64,
            BinOp::And | BinOp::Or => unreachable!("short-circuit operators are handled by the caller"),
        };
        return Ok(ExprValue::Int(value));
    }

    let l = lhs.as_f64(sym)?;
    let r = rhs.as_f64(sym)?;
    let value = match op {
        BinOp::Mul => ExprValue::Float(l * r),
        BinOp::Div => ExprValue::Float(l / r),
        BinOp::Rem => ExprValue::Float(l % r),
        BinOp::Add => ExprValue::Float(l + r),
        BinOp::Sub => ExprValue::Float(l - r),
        BinOp::Lt => ExprValue::Int((l < r) as i64),
        BinOp::Le => ExprValue::Int((l <= r) as i64),
        BinOp::Gt => ExprValue::Int((l > r) as i64),
        BinOp::Ge => ExprValue::Int((l >= r) as i64),
        BinOp::Eq => ExprValue::Int((l == r) as i64),
        BinOp::Ne => ExprValue::Int((l != r) as i64),
        _ => return Err(EvalError::TypeMismatch(sym)),
    };
    Ok(value)
}
