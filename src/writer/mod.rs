//! Emission backends.
//!
//! The parser drives a [`Backend`] in declaration order. Two backends produce
//! Rust source that depends on [`crate::runtime`]; they share everything but
//! the struct bodies, which come from a [`Flavor`]. The manifest backend
//! writes the compiled layouts as JSON instead.

pub mod composable;
pub mod manifest;
pub mod native;

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::model::{LayoutPlan, MemberKind, MemberLayout, StructDescriptor};
use crate::processor::env::Constant;
use crate::processor::expr::{BinOp, Expr, UnaryOp};
use crate::processor::types::{DefaultKind, TypeEntry, TypeRegistry};

pub use composable::Composable;
pub use manifest::ManifestWriter;
pub use native::Native;

pub trait Backend {
    /// A standalone comment block.
    fn comment(&mut self, text: &str) -> io::Result<()>;

    fn constant(&mut self, name: &str, value: &Constant, doc: &str) -> io::Result<()>;

    fn macro_def(&mut self, name: &str, param: &str, body: &Expr, doc: &str) -> io::Result<()>;

    fn alias(&mut self, alias: &str, target: &TypeEntry, doc: &str) -> io::Result<()>;

    fn emit(
        &mut self,
        descriptor: &StructDescriptor,
        layout: &LayoutPlan,
        types: &TypeRegistry,
    ) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()>;
}

/// Which backend a run writes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Per-instance byte order, fields packed in sequence.
    #[default]
    Composable,
    /// Byte order fixed per type, constant field offsets.
    Native,
    /// JSON description of every compiled layout.
    Manifest,
}

pub fn make_backend<'a>(strategy: Strategy, out: Box<dyn Write + 'a>) -> Box<dyn Backend + 'a> {
    match strategy {
        Strategy::Composable => Box::new(RustWriter::new(out, Composable)),
        Strategy::Native => Box::new(RustWriter::new(out, Native)),
        Strategy::Manifest => Box::new(ManifestWriter::new(out)),
    }
}

/// The part of Rust generation that differs between strategies.
pub trait Flavor {
    fn emit_struct(
        &self,
        out: &mut dyn Write,
        descriptor: &StructDescriptor,
        layout: &LayoutPlan,
        types: &TypeRegistry,
    ) -> io::Result<()>;
}

/// Writes a Rust module for the parsed header.
pub struct RustWriter<'a, F> {
    out: Box<dyn Write + 'a>,
    flavor: F,
    started: bool,
}

impl<'a, F: Flavor> RustWriter<'a, F> {
    pub fn new(out: Box<dyn Write + 'a>, flavor: F) -> Self {
        Self {
            out,
            flavor,
            started: false,
        }
    }

    fn start(&mut self) -> io::Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        let h = &mut self.out;
        writeln!(h, "// Auto-generated by h2layout - DO NOT EDIT\n")?;
        writeln!(h, "#[allow(unused_imports)]")?;
        writeln!(h, "use h2layout::runtime::codec::*;")?;
        writeln!(h, "#[allow(unused_imports)]")?;
        writeln!(
            h,
            "use h2layout::runtime::{{Change, CodecError, Endianness, PackedStruct, Update, UpdateReport, field_path, update_text}};\n"
        )?;
        Ok(())
    }
}

impl<'a, F: Flavor> Backend for RustWriter<'a, F> {
    fn comment(&mut self, text: &str) -> io::Result<()> {
        self.start()?;
        for line in text.lines() {
            writeln!(self.out, "// {line}")?;
        }
        writeln!(self.out)
    }

    fn constant(&mut self, name: &str, value: &Constant, doc: &str) -> io::Result<()> {
        self.start()?;
        let (ty, literal) = match value {
            Constant::Int(v) => ("i64", int_literal(*v)),
            Constant::Float(v) => ("f64", float_literal(*v)),
            Constant::Str(s) => ("&str", format!("{s:?}")),
            Constant::Empty => ("()", "()".to_string()),
            Constant::Macro { .. } | Constant::StructTag => return Ok(()),
        };
        write_doc(&mut self.out, "", doc)?;
        write_allow(&mut self.out)?;
        writeln!(self.out, "pub const {}: {ty} = {literal};\n", rust_ident(name))
    }

    fn macro_def(&mut self, name: &str, param: &str, body: &Expr, doc: &str) -> io::Result<()> {
        self.start()?;
        write_doc(&mut self.out, "", doc)?;
        writeln!(self.out, "#[allow(unused_macros)]")?;
        writeln!(self.out, "macro_rules! {name} {{")?;
        writeln!(self.out, "    ($arg:expr) => {{")?;
        writeln!(self.out, "        {}", rust_expr(body, param))?;
        writeln!(self.out, "    }};")?;
        writeln!(self.out, "}}\n")
    }

    fn alias(&mut self, alias: &str, target: &TypeEntry, doc: &str) -> io::Result<()> {
        self.start()?;
        let target = match target {
            TypeEntry::Primitive(p) => p.rust_type().to_string(),
            TypeEntry::Aggregate(name) if name == alias => return Ok(()),
            TypeEntry::Aggregate(name) => rust_ident(name),
        };
        write_doc(&mut self.out, "", doc)?;
        write_allow(&mut self.out)?;
        writeln!(self.out, "pub type {} = {target};\n", rust_ident(alias))
    }

    fn emit(
        &mut self,
        descriptor: &StructDescriptor,
        layout: &LayoutPlan,
        types: &TypeRegistry,
    ) -> io::Result<()> {
        self.start()?;
        self.flavor.emit_struct(&mut self.out, descriptor, layout, types)?;
        if let Some(tag) = &descriptor.tag {
            write_allow(&mut self.out)?;
            writeln!(
                self.out,
                "pub type {} = {};\n",
                rust_ident(tag),
                rust_ident(&descriptor.name)
            )?;
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.start()?;
        self.out.flush()
    }
}

// ---------------------------------------------------------------
// Shared Rust rendering
// ---------------------------------------------------------------

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// A Rust identifier for a C name; keywords become raw identifiers.
pub fn rust_ident(name: &str) -> String {
    match name {
        "self" | "Self" | "super" | "crate" | "_" => format!("{name}_"),
        _ if KEYWORDS.contains(&name) => format!("r#{name}"),
        _ => name.to_string(),
    }
}

fn int_literal(v: i64) -> String {
    if v == i64::MIN {
        "i64::MIN".to_string()
    } else {
        v.to_string()
    }
}

fn float_literal(v: f64) -> String {
    if v.is_nan() {
        "f64::NAN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "f64::INFINITY" } else { "f64::NEG_INFINITY" }.to_string()
    } else {
        format!("{v:?}")
    }
}

/// Renders a macro body; `param` becomes the `$arg` metavariable.
pub fn rust_expr(expr: &Expr, param: &str) -> String {
    match expr {
        Expr::Int(v) if *v < 0 => format!("({})", int_literal(*v)),
        Expr::Int(v) => int_literal(*v),
        Expr::Float(v) => float_literal(*v),
        Expr::Str(s) => format!("{s:?}"),
        Expr::Symbol(name) if name == param => "($arg)".to_string(),
        Expr::Symbol(name) => rust_ident(name),
        Expr::Call(name, arg) => format!("{name}!({})", rust_expr(arg, param)),
        Expr::Unary(op, operand) => {
            let inner = rust_expr(operand, param);
            match op {
                UnaryOp::Neg => format!("(-{inner})"),
                UnaryOp::Plus => inner,
                UnaryOp::Not => format!("(({inner} == 0) as i64)"),
                UnaryOp::BitNot => format!("(!{inner})"),
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let (l, r) = (rust_expr(lhs, param), rust_expr(rhs, param));
            match op {
                BinOp::And => format!("(({l} != 0 && {r} != 0) as i64)"),
                BinOp::Or => format!("(({l} != 0 || {r} != 0) as i64)"),
                op if op.is_comparison() => format!("(({l} {} {r}) as i64)", op.symbol()),
                op => format!("({l} {} {r})", op.symbol()),
            }
        }
    }
}

/// Lints the generated names and loops would trip. An outer attribute on each
/// item, so the output also works through `include!`.
const ALLOW: &str = "#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]";

pub(crate) fn write_allow(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{ALLOW}")
}

pub(crate) fn write_doc(out: &mut dyn Write, indent: &str, doc: &str) -> io::Result<()> {
    for line in doc.lines() {
        writeln!(out, "{indent}/// {line}")?;
    }
    Ok(())
}

/// A struct field as the Rust writers see it.
pub(crate) struct FieldView<'d> {
    pub ident: String,
    pub member: &'d MemberLayout,
    pub comment: &'d str,
}

impl FieldView<'_> {
    /// `OFFSET_<name>`, spelled as the C field is.
    pub fn offset_const(&self) -> String {
        format!("OFFSET_{}", self.member.name)
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self.member.kind,
            MemberKind::Primitive {
                text_len: Some(_),
                ..
            }
        )
    }
}

/// Fields in declaration order.
pub(crate) fn field_views<'d>(descriptor: &'d StructDescriptor, layout: &'d LayoutPlan) -> Vec<FieldView<'d>> {
    descriptor
        .fields
        .iter()
        .zip(&layout.members)
        .map(|(field, member)| FieldView {
            ident: rust_ident(&field.name),
            member,
            comment: &field.comment,
        })
        .collect()
}

fn element_type(kind: &MemberKind) -> String {
    match kind {
        MemberKind::Primitive {
            text_len: Some(len),
            ..
        } => format!("[u8; {len}]"),
        MemberKind::Primitive { primitive, .. } => primitive.rust_type().to_string(),
        MemberKind::Nested { type_name, .. } => rust_ident(type_name),
    }
}

pub(crate) fn field_type(kind: &MemberKind) -> String {
    kind.shape()
        .iter()
        .rev()
        .fold(element_type(kind), |inner, len| format!("[{inner}; {len}]"))
}

pub(crate) fn default_value(kind: &MemberKind) -> String {
    match kind {
        MemberKind::Nested { type_name, shape, .. } => {
            let base = format!("{}::default()", rust_ident(type_name));
            shape
                .iter()
                .fold(base, |inner, _| format!("std::array::from_fn(|_| {inner})"))
        }
        MemberKind::Primitive {
            primitive,
            shape,
            text_len,
        } => {
            let base = match (text_len, primitive.default_kind()) {
                (Some(len), _) => format!("[0; {len}]"),
                (None, DefaultKind::Bool) => "false".to_string(),
                (None, DefaultKind::Float) => "0.0".to_string(),
                (None, _) => "0".to_string(),
            };
            shape
                .iter()
                .rev()
                .fold(base, |inner, len| format!("[{inner}; {len}]"))
        }
    }
}

/// Index suffix (`[i0][i1]`) and row-major flat index for a shape.
pub(crate) fn index_exprs(shape: &[usize]) -> (String, String) {
    let suffix: String = (0..shape.len()).map(|i| format!("[i{i}]")).collect();
    let flat = match shape {
        [] => "0".to_string(),
        [_] => "i0".to_string(),
        [_, inner] => format!("(i0 * {inner} + i1)"),
        _ => (0..shape.len())
            .map(|i| {
                let stride: usize = shape[i + 1..].iter().product();
                format!("i{i} * {stride}")
            })
            .collect::<Vec<_>>()
            .join(" + "),
    };
    (suffix, flat)
}

/// Writes `body` wrapped in one `for` loop per dimension.
pub(crate) fn write_loops(out: &mut dyn Write, indent: usize, shape: &[usize], body: &[String]) -> io::Result<()> {
    let pad = |n: usize| " ".repeat(n);
    for (depth, len) in shape.iter().enumerate() {
        writeln!(out, "{}for i{depth} in 0..{len} {{", pad(indent + depth * 4))?;
    }
    let inner = indent + shape.len() * 4;
    for line in body {
        writeln!(out, "{}{line}", pad(inner))?;
    }
    for depth in (0..shape.len()).rev() {
        writeln!(out, "{}}}", pad(indent + depth * 4))?;
    }
    Ok(())
}

/// `struct` declaration plus `Default`. `extra` is an additional
/// `(field, type, default)` placed after the C fields.
pub(crate) fn write_struct_decl(
    out: &mut dyn Write,
    descriptor: &StructDescriptor,
    fields: &[FieldView<'_>],
    extra: Option<(&str, &str, &str)>,
) -> io::Result<()> {
    let name = rust_ident(&descriptor.name);
    write_doc(out, "", &descriptor.doc_comment)?;
    write_allow(out)?;
    writeln!(out, "#[derive(Debug, Clone, PartialEq)]")?;
    writeln!(out, "pub struct {name} {{")?;
    for field in fields {
        write_doc(out, "    ", field.comment)?;
        writeln!(out, "    pub {}: {},", field.ident, field_type(&field.member.kind))?;
    }
    if let Some((ident, ty, _)) = extra {
        writeln!(out, "    pub {ident}: {ty},")?;
    }
    writeln!(out, "}}")?;
    for line in descriptor.trailing_comment.lines() {
        writeln!(out, "// {line}")?;
    }
    writeln!(out)?;

    write_allow(out)?;
    writeln!(out, "impl Default for {name} {{")?;
    writeln!(out, "    fn default() -> Self {{")?;
    writeln!(out, "        Self {{")?;
    for field in fields {
        writeln!(out, "            {}: {},", field.ident, default_value(&field.member.kind))?;
    }
    if let Some((ident, _, default)) = extra {
        writeln!(out, "            {ident}: {default},")?;
    }
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}\n")
}

/// Expression updating one field; `path` and `changes` are in scope.
fn update_expr(field: &FieldView<'_>) -> String {
    let ident = &field.ident;
    let name = &field.member.name;
    if !field.is_text() {
        return format!("self.{ident}.update(&other.{ident}, &field_path(path, {name:?}), changes)");
    }
    let shape = field.member.kind.shape();
    if shape.is_empty() {
        return format!(
            "update_text(&mut self.{ident}, &other.{ident}, &field_path(path, {name:?}), changes)"
        );
    }
    let (suffix, _) = index_exprs(shape);
    let fmt_suffix: String = (0..shape.len()).map(|i| format!("[{{i{i}}}]")).collect();
    let mut loops = String::from("{ let mut any = false; ");
    for (depth, len) in shape.iter().enumerate() {
        loops.push_str(&format!("for i{depth} in 0..{len} {{ "));
    }
    loops.push_str(&format!(
        "any |= update_text(&mut self.{ident}{suffix}, &other.{ident}{suffix}, &format!(\"{{}}{fmt_suffix}\", field_path(path, {name:?})), changes); "
    ));
    for _ in shape {
        loops.push_str("} ");
    }
    loops.push_str("any }");
    loops
}

/// `Update` impl plus the per-field `update_fields` report.
pub(crate) fn write_update_impl(out: &mut dyn Write, descriptor: &StructDescriptor, fields: &[FieldView<'_>]) -> io::Result<()> {
    let name = rust_ident(&descriptor.name);
    write_allow(out)?;
    writeln!(out, "impl Update for {name} {{")?;
    writeln!(
        out,
        "    fn update(&mut self, other: &Self, path: &str, changes: &mut Vec<Change>) -> bool {{"
    )?;
    writeln!(out, "        let mut updated = false;")?;
    for field in fields {
        writeln!(out, "        updated |= {};", update_expr(field))?;
    }
    writeln!(out, "        updated")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}\n")?;

    write_allow(out)?;
    writeln!(out, "impl {name} {{")?;
    writeln!(out, "    /// Copies differing fields from `other`, reporting each one.")?;
    writeln!(out, "    pub fn update_fields(&mut self, other: &Self) -> UpdateReport {{")?;
    writeln!(out, "        let mut log = Vec::new();")?;
    writeln!(out, "        let changes = &mut log;")?;
    writeln!(out, "        let path = \"\";")?;
    writeln!(out, "        let fields = vec![")?;
    for field in fields {
        writeln!(
            out,
            "            ({:?}.to_string(), {}),",
            field.member.name,
            update_expr(field)
        )?;
    }
    writeln!(out, "        ];")?;
    writeln!(out, "        UpdateReport {{ fields, changes: log }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}\n")
}
