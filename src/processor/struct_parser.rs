//! Struct declarations and bare typedefs.
//
//  Grammar (informal):
//
//      struct   ::= ["typedef"] "struct" [TAG] ["{"]      header line
//                   ["{"]                                  next code line, if missing above
//                   field*
//                   "}" [NAME] ... ";"
//      field    ::= ("const" | "volatile" | "struct")* TYPE NAME ("[" expr "]")* ... ";"
//      typedef  ::= "typedef" ["struct"] TYPE NAME ";"
//
//  Tokens between the last bracket group and `;` are ignored.

use std::io::BufRead;

use crate::error::HeaderError;
use crate::model::{CompiledStruct, FieldDescriptor, StructDescriptor, join_comments};
use crate::processor::HeaderParser;
use crate::processor::env::Constant;
use crate::processor::expr::{self, ExprValue};
use crate::processor::layout;
use crate::processor::tokens::{Spanned, tokenize};

const QUALIFIERS: &[&str] = &["const", "volatile", "struct"];

struct StructHeader {
    typedef: bool,
    tag: Option<String>,
    /// Byte offset just past `{` when it sits on the header line.
    brace_end: Option<usize>,
}

fn match_header(tokens: &[Spanned]) -> Option<StructHeader> {
    let mut idx = 0;
    let typedef = tokens.first().and_then(Spanned::ident) == Some("typedef");
    if typedef {
        idx += 1;
    }
    if tokens.get(idx).and_then(Spanned::ident) != Some("struct") {
        return None;
    }
    idx += 1;
    let tag = tokens.get(idx).and_then(Spanned::ident).map(str::to_string);
    if tag.is_some() {
        idx += 1;
    }
    let brace_end = match tokens.get(idx) {
        None => None,
        Some(tok) if tok.is_punct("{") => Some(tok.end),
        Some(_) => return None,
    };
    Some(StructHeader {
        typedef,
        tag,
        brace_end,
    })
}

struct StructBody {
    fields: Vec<FieldDescriptor>,
    trailing_comment: String,
    name: Option<String>,
}

/// A field before its dimensions are evaluated.
struct RawField<'s> {
    type_name: &'s str,
    name: &'s str,
    dimensions: Vec<&'s str>,
    end: usize,
}

fn parse_field<'s>(code: &'s str, tokens: &'s [Spanned], line: usize) -> Result<RawField<'s>, HeaderError> {
    let err = |msg: &str| HeaderError::parse(line, code, msg);

    let mut idx = tokens
        .iter()
        .take_while(|t| t.ident().is_some_and(|w| QUALIFIERS.contains(&w)))
        .count();
    let type_name = tokens
        .get(idx)
        .and_then(Spanned::ident)
        .ok_or_else(|| err("expected a field type"))?;
    idx += 1;
    if tokens.get(idx).is_some_and(|t| t.is_punct("*")) {
        return Err(err("pointer fields are not supported"));
    }
    let name = tokens
        .get(idx)
        .and_then(Spanned::ident)
        .ok_or_else(|| err("expected a field name"))?;
    idx += 1;

    let mut dimensions = Vec::new();
    while tokens.get(idx).is_some_and(|t| t.is_punct("[")) {
        let mut depth = 0usize;
        let mut close = None;
        for (j, tok) in tokens.iter().enumerate().skip(idx) {
            if tok.is_punct("[") {
                depth += 1;
            } else if tok.is_punct("]") {
                depth -= 1;
                if depth == 0 {
                    close = Some(j);
                    break;
                }
            }
        }
        let close = close.ok_or_else(|| err("unclosed '['"))?;
        dimensions.push(code[tokens[idx].end..tokens[close].start].trim());
        idx = close + 1;
    }

    let semi = tokens[idx..]
        .iter()
        .find(|t| t.is_punct(";"))
        .ok_or_else(|| err("expected ';' after field"))?;
    Ok(RawField {
        type_name,
        name,
        dimensions,
        end: semi.end,
    })
}

/// `} [NAME] ... ;` starting at the first token. Returns the name and the
/// byte offset past `;`.
fn parse_terminator(code: &str, tokens: &[Spanned], line: usize) -> Result<(Option<String>, usize), HeaderError> {
    let name = tokens.get(1).and_then(Spanned::ident).map(str::to_string);
    let semi = tokens
        .iter()
        .find(|t| t.is_punct(";"))
        .ok_or_else(|| HeaderError::parse(line, code, "expected ';' after '}'"))?;
    Ok((name, semi.end))
}

impl<'c, 'a, R: BufRead> HeaderParser<'c, 'a, R> {
    pub(super) fn structure(&mut self) -> Result<bool, HeaderError> {
        let code = self.code().to_string();
        let Ok(tokens) = tokenize(&code) else {
            return Ok(false);
        };
        let Some(header) = match_header(&tokens) else {
            return Ok(false);
        };
        let start_line = self.line_number();
        let mut doc = self.current.as_ref().map(|l| l.full_comment()).unwrap_or_default();

        match header.brace_end {
            Some(end) => self.consume(end),
            None => {
                self.consume_all();
                self.open_body(start_line, &mut doc)?;
            }
        }
        let body = self.struct_body(start_line)?;

        // A typedef is named by its terminator, a plain struct by its tag.
        let (name, tag) = if header.typedef {
            let name = body.name.ok_or_else(|| {
                HeaderError::parse(start_line, code.as_str(), "no typedef name found")
            })?;
            let tag = header.tag.filter(|tag| *tag != name);
            (name, tag)
        } else {
            let name = header.tag.ok_or_else(|| {
                HeaderError::parse(start_line, code.as_str(), "no tag name found")
            })?;
            (name, None)
        };

        self.ctx.env.define(&name, Constant::StructTag);
        if let Some(tag) = &tag {
            self.ctx.env.define(tag, Constant::StructTag);
        }

        let descriptor = StructDescriptor {
            name: name.clone(),
            tag: tag.clone(),
            doc_comment: doc,
            fields: body.fields,
            trailing_comment: body.trailing_comment,
            line_number: start_line,
        };
        let layout = layout::compile(&descriptor, &self.ctx.types, self.ctx.endianness)?;
        log::debug!(
            "{}: struct {} with {} fields, {} bytes",
            self.file,
            name,
            descriptor.fields.len(),
            layout.packed_size
        );
        self.ctx.types.declare_struct(CompiledStruct { descriptor, layout })?;
        if let Some(tag) = &tag {
            self.ctx.types.alias(tag, &name, start_line)?;
        }

        if let Some(compiled) = self.ctx.types.get_struct(&name) {
            self.ctx
                .backend
                .emit(&compiled.descriptor, &compiled.layout, &self.ctx.types)?;
        }
        Ok(true)
    }

    /// Finds the `{` on the line after a header that did not carry it.
    fn open_body(&mut self, start_line: usize, doc: &mut String) -> Result<(), HeaderError> {
        loop {
            let Some(line) = self.advance()? else {
                return Err(HeaderError::UnexpectedEnd {
                    line: start_line,
                    construct: "struct".into(),
                });
            };
            if line.code.is_empty() {
                *doc = join_comments(&[doc, &line.leading_comment]);
                continue;
            }
            if !line.code.starts_with('{') {
                return Err(HeaderError::parse(
                    line.line_number,
                    &line.code,
                    "expected '{' after struct header",
                ));
            }
            *doc = join_comments(&[doc, &line.full_comment()]);
            self.consume(1);
            return Ok(());
        }
    }

    fn struct_body(&mut self, start_line: usize) -> Result<StructBody, HeaderError> {
        let mut fields = Vec::new();
        let mut pending = String::new();
        // The header line's own comment already went to the doc comment.
        let mut inline: Option<String> = None;

        loop {
            if self.code().is_empty() {
                let Some(line) = self.advance()? else {
                    return Err(HeaderError::UnexpectedEnd {
                        line: start_line,
                        construct: "struct body".into(),
                    });
                };
                pending = join_comments(&[&pending, &line.leading_comment]);
                inline = Some(line.inline_comment);
                continue;
            }

            let code = self.code().to_string();
            let line = self.line_number();
            let tokens = tokenize(&code).map_err(|e| HeaderError::parse(line, &code, e))?;

            if tokens.first().is_some_and(|t| t.is_punct("}")) {
                let (name, end) = parse_terminator(&code, &tokens, line)?;
                let trailing_comment = join_comments(&[&pending, &inline.take().unwrap_or_default()]);
                self.consume(end);
                return Ok(StructBody {
                    fields,
                    trailing_comment,
                    name,
                });
            }

            let raw = parse_field(&code, &tokens, line)?;
            if raw.dimensions.len() > 2 {
                return Err(HeaderError::UnsupportedType {
                    line,
                    what: format!("{}-dimensional array '{}'", raw.dimensions.len(), raw.name),
                });
            }
            let dimensions = raw
                .dimensions
                .iter()
                .map(|text| self.dimension(text, line))
                .collect::<Result<Vec<_>, _>>()?;
            let comment = join_comments(&[&pending, &inline.take().unwrap_or_default()]);
            pending.clear();

            fields.push(FieldDescriptor {
                name: raw.name.to_string(),
                type_name: raw.type_name.to_string(),
                dimensions,
                comment,
                line,
            });
            let end = raw.end;
            self.consume(end);
        }
    }

    fn dimension(&self, text: &str, line: usize) -> Result<usize, HeaderError> {
        let bad = |reason: String| HeaderError::BadDimension {
            line,
            expr: text.to_string(),
            reason,
        };
        match expr::evaluate(text, &self.ctx.env) {
            Ok(ExprValue::Int(v)) => usize::try_from(v).map_err(|_| bad(format!("negative size {v}"))),
            Ok(other) => Err(bad(format!("{other:?} is not an integer"))),
            Err(e) => Err(bad(e.to_string())),
        }
    }

    /// `typedef [struct] TYPE NAME;`
    pub(super) fn typedef(&mut self) -> Result<bool, HeaderError> {
        let code = self.code().to_string();
        let Ok(tokens) = tokenize(&code) else {
            return Ok(false);
        };
        if tokens.first().and_then(Spanned::ident) != Some("typedef") {
            return Ok(false);
        }
        let line = self.line_number();

        let mut idx = 1;
        match tokens.get(idx).and_then(Spanned::ident) {
            Some("enum") => {
                return Err(HeaderError::UnsupportedType {
                    line,
                    what: "enum typedef".into(),
                });
            }
            Some("struct") => idx += 1,
            _ => {}
        }
        let (Some(target), Some(alias)) = (
            tokens.get(idx).and_then(Spanned::ident),
            tokens.get(idx + 1).and_then(Spanned::ident),
        ) else {
            return Ok(false);
        };
        let end = match tokens.get(idx + 2) {
            Some(tok) if tok.is_punct(";") => tok.end,
            Some(tok) if tok.is_punct("[") => {
                return Err(HeaderError::UnsupportedType {
                    line,
                    what: format!("array typedef '{alias}'"),
                });
            }
            _ => return Ok(false),
        };

        let doc = self.current.as_ref().map(|l| l.full_comment()).unwrap_or_default();
        let entry = self.ctx.types.alias(alias, target, line)?;
        self.consume(end);
        log::debug!("{}: typedef {target} {alias}", self.file);
        self.ctx.backend.alias(alias, &entry, &doc)?;
        Ok(true)
    }
}
