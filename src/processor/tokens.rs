//! Small hand-written tokeniser for the code part of a logical line.
//!
//! Used by the struct grammar and by the constant-expression parser. Numeric
//! literals come out already normalised the way a C compiler reads them:
//!
//! ```text
//!      0x1FUL    → Int(31)         (suffix letters dropped)
//!      0xFFFF_FFFF_FFFF_FFFF → Int(-1)   (two's complement into i64)
//!      017       → Int(15)         (octal)
//!      2.5f      → Float(2.5)
//!      'A'       → Int(65)         (character literal → ordinal)
//! ```
//!
//! Comments never reach this module; the line lexer stripped them.

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Punct(&'static str),
}

/// A token plus its byte range in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

impl Spanned {
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(&self.token, Token::Punct(q) if *q == p)
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.token {
            Token::Ident(name) => Some(name),
            _ => None,
        }
    }
}

const PUNCTS: &[&str] = &[
    "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "->", "+", "-", "*", "/", "%", "<", ">", "!",
    "~", "&", "|", "^", "(", ")", "[", "]", "{", "}", ";", ",", "=", "?", ":", ".", "#",
];

#[derive(Clone)]
pub struct Tokenizer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.src.len(), |(i, _)| *i)
    }

    fn read_identifier(&mut self, start: usize) -> String {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.chars.next();
            } else {
                break;
            }
        }
        let end = self.offset();
        self.src[start..end].to_string()
    }

    fn read_number(&mut self, start: usize) -> Result<Token, String> {
        let mut prev = '\0';
        while let Some(c) = self.peek_char() {
            let exponent_sign = (c == '+' || c == '-')
                && (prev == 'e' || prev == 'E')
                && !self.src[start..].starts_with("0x")
                && !self.src[start..].starts_with("0X");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                prev = c;
                self.chars.next();
            } else {
                break;
            }
        }
        let end = self.offset();
        parse_number(&self.src[start..end])
    }

    fn read_escape(&mut self) -> Result<u32, String> {
        let (_, c) = self.chars.next().ok_or("unterminated escape sequence")?;
        let value = match c {
            'n' => '\n' as u32,
            't' => '\t' as u32,
            'r' => '\r' as u32,
            'a' => 0x07,
            'b' => 0x08,
            'f' => 0x0c,
            'v' => 0x0b,
            '\\' | '\'' | '"' | '?' => c as u32,
            'x' => {
                let mut digits = String::new();
                while let Some(d) = self.peek_char().filter(char::is_ascii_hexdigit) {
                    digits.push(d);
                    self.chars.next();
                }
                u32::from_str_radix(&digits, 16).map_err(|_| "bad hex escape".to_string())?
            }
            '0'..='7' => {
                let mut digits = String::from(c);
                while digits.len() < 3 {
                    match self.peek_char() {
                        Some(d @ '0'..='7') => {
                            digits.push(d);
                            self.chars.next();
                        }
                        _ => break,
                    }
                }
                u32::from_str_radix(&digits, 8).map_err(|_| "bad octal escape".to_string())?
            }
            other => return Err(format!("unknown escape \\{other}")),
        };
        Ok(value)
    }

    fn read_char_literal(&mut self) -> Result<Token, String> {
        let value = match self.chars.next() {
            Some((_, '\\')) => self.read_escape()?,
            Some((_, '\'')) => return Err("empty character literal".into()),
            Some((_, c)) => c as u32,
            None => return Err("unterminated character literal".into()),
        };
        match self.chars.next() {
            Some((_, '\'')) => Ok(Token::Int(value as i64)),
            _ => Err("character literal must hold one character".into()),
        }
    }

    fn read_string(&mut self) -> Result<Token, String> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some((_, '"')) => return Ok(Token::Str(text)),
                Some((_, '\\')) => {
                    let code = self.read_escape()?;
                    text.push(char::from_u32(code).ok_or("escape out of range")?);
                }
                Some((_, '\n')) => {}
                Some((_, c)) => text.push(c),
                None => return Err("no closing \" found".into()),
            }
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Spanned, String>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }

        let (start, ch) = self.chars.next()?;

        let token = match ch {
            c if c.is_ascii_alphabetic() || c == '_' => Ok(Token::Ident(self.read_identifier(start))),
            c if c.is_ascii_digit() => self.read_number(start),
            '.' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => self.read_number(start),
            '\'' => self.read_char_literal(),
            '"' => self.read_string(),
            _ => {
                let rest = &self.src[start..];
                match PUNCTS.iter().find(|p| rest.starts_with(**p)) {
                    Some(p) => {
                        for _ in 1..p.len() {
                            self.chars.next();
                        }
                        Ok(Token::Punct(p))
                    }
                    None => Err(format!("unexpected character {ch:?}")),
                }
            }
        };

        let end = self.offset();
        Some(token.map(|token| Spanned { token, start, end }))
    }
}

pub fn tokenize(src: &str) -> Result<Vec<Spanned>, String> {
    Tokenizer::new(src).collect()
}

fn strip_int_suffix(text: &str) -> &str {
    text.trim_end_matches(['u', 'U', 'l', 'L'])
}

fn parse_number(raw: &str) -> Result<Token, String> {
    let text = raw.replace('_', "");
    let bad = || format!("invalid numeric literal '{raw}'");

    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let digits = strip_int_suffix(hex);
        let value = u64::from_str_radix(digits, 16).map_err(|_| bad())?;
        return Ok(Token::Int(value as i64));
    }

    let is_float = text.contains('.') || text.contains(['e', 'E']);
    if is_float {
        let digits = text.trim_end_matches(['f', 'F', 'l', 'L']);
        return digits.parse::<f64>().map(Token::Float).map_err(|_| bad());
    }

    let digits = strip_int_suffix(&text);
    let value = if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).map_err(|_| bad())?
    } else {
        digits.parse::<u64>().map_err(|_| bad())?
    };
    Ok(Token::Int(value as i64))
}
