//! `#include` and `#define` recognisers.

use std::io::BufRead;

use crate::error::{HeaderError, Warning};
use crate::processor::HeaderParser;
use crate::processor::env::Constant;
use crate::processor::expr::{self, ExprValue};

/// Target of an `#include` line and whether it used the quoted form.
pub fn parse_include(code: &str) -> Option<(String, bool)> {
    let rest = code
        .strip_prefix('#')?
        .trim_start()
        .strip_prefix("include")?
        .trim();
    if let Some(name) = rest.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
        return Some((name.trim().to_string(), false));
    }
    let name = rest.strip_prefix('"')?.strip_suffix('"')?;
    Some((name.trim().to_string(), true))
}

/// The pieces of a `#define` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineParts<'s> {
    pub name: &'s str,
    /// Parameter list text when `(` follows the name directly.
    pub params: Option<&'s str>,
    pub body: &'s str,
}

pub fn split_define(code: &str) -> Option<DefineParts<'_>> {
    let rest = code.strip_prefix('#')?.trim_start().strip_prefix("define")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_len == 0 || rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let (name, after) = rest.split_at(name_len);

    if let Some(inside) = after.strip_prefix('(') {
        let close = inside.find(')')?;
        return Some(DefineParts {
            name,
            params: Some(&inside[..close]),
            body: inside[close + 1..].trim(),
        });
    }
    if !after.is_empty() && !after.starts_with(char::is_whitespace) {
        return None;
    }
    Some(DefineParts {
        name,
        params: None,
        body: after.trim(),
    })
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl<'c, 'a, R: BufRead> HeaderParser<'c, 'a, R> {
    pub(super) fn include(&mut self) -> Result<bool, HeaderError> {
        let Some((name, quoted)) = parse_include(self.code()) else {
            return Ok(false);
        };
        let line = self.line_number();
        self.consume_all();

        match self.ctx.search.resolve(&name, quoted, self.dir.as_deref()) {
            Some(path) => {
                log::info!("{}: including {}", self.file, path.display());
                self.ctx.parse_file(&path)?;
            }
            None => self.warn(Warning::UnresolvedInclude { line, name }),
        }
        Ok(true)
    }

    /// `#define NAME value`
    pub(super) fn define(&mut self) -> Result<bool, HeaderError> {
        let code = self.code().to_string();
        let Some(parts) = split_define(&code) else {
            return Ok(false);
        };
        if parts.params.is_some() {
            return Ok(false);
        }
        let line = self.line_number();
        let doc = self.current.as_ref().map(|l| l.full_comment()).unwrap_or_default();
        self.consume_all();

        let value = if parts.body.is_empty() {
            Ok(Constant::Empty)
        } else {
            expr::evaluate(parts.body, &self.ctx.env).map(ExprValue::into_constant)
        };
        let value = match value {
            Ok(value) => value,
            Err(e) => {
                self.warn(Warning::ConstantEvaluation {
                    line,
                    name: parts.name.to_string(),
                    reason: e.to_string(),
                });
                return Ok(true);
            }
        };

        log::debug!("{}: #define {} = {:?}", self.file, parts.name, value);
        if self.ctx.env.define(parts.name, value.clone()).is_some() {
            self.warn(Warning::Redefinition {
                line,
                name: parts.name.to_string(),
            });
        }
        self.ctx.backend.constant(parts.name, &value, &doc)?;
        Ok(true)
    }

    /// `#define NAME(arg) body`
    pub(super) fn macro_def(&mut self) -> Result<bool, HeaderError> {
        let code = self.code().to_string();
        let Some(DefineParts {
            name,
            params: Some(param),
            body,
        }) = split_define(&code)
        else {
            return Ok(false);
        };
        let param = param.trim();
        if !is_identifier(param) || body.is_empty() {
            return Ok(false);
        }
        let line = self.line_number();
        let doc = self.current.as_ref().map(|l| l.full_comment()).unwrap_or_default();

        let body_expr = expr::parse_expr(body).map_err(|e| {
            HeaderError::parse(line, &code, format!("cannot parse body of macro {name}: {e}"))
        })?;
        self.consume_all();

        log::debug!("{}: macro {name}({param})", self.file);
        let previous = self.ctx.env.define(
            name,
            Constant::Macro {
                param: param.to_string(),
                body: body_expr.clone(),
            },
        );
        if previous.is_some() {
            self.warn(Warning::Redefinition {
                line,
                name: name.to_string(),
            });
        }
        self.ctx.backend.macro_def(name, param, &body_expr, &doc)?;
        Ok(true)
    }
}
