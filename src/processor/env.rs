//! Symbols collected while parsing: `#define` constants, single-argument
//! macros and struct placeholders.

use indexmap::IndexMap;

use super::expr::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Str(String),
    /// `#define FLAG` with no body.
    Empty,
    Macro { param: String, body: Expr },
    /// A declared struct; only usable as a type, never as a value.
    StructTag,
}

/// Ordered symbol table. Grows monotonically during one parse run.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    symbols: IndexMap<String, Constant>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, returning the value it shadows.
    pub fn define(&mut self, name: &str, value: Constant) -> Option<Constant> {
        self.symbols.insert(name.to_string(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Constant> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Constant)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
