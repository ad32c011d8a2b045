//! JSON description of a parse run.
//!
//! Collects everything the parser reports and writes one pretty-printed
//! document when the run finishes. Struct entries carry the flattened slot
//! table so other tools can read packed data without generated code.

use std::io::{self, Write};

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{CompiledStruct, LayoutPlan, StructDescriptor};
use crate::processor::env::Constant;
use crate::processor::expr::Expr;
use crate::processor::types::{TypeEntry, TypeRegistry};
use crate::writer::Backend;
use crate::writer::native::{Slot, slot_table};

#[derive(Debug, Serialize)]
struct ConstantEntry {
    value: serde_json::Value,
    #[serde(skip_serializing_if = "String::is_empty")]
    doc: String,
}

#[derive(Debug, Serialize)]
struct MacroEntry {
    param: String,
    body: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    doc: String,
}

#[derive(Debug, Serialize)]
struct AliasEntry {
    target: TypeEntry,
    #[serde(skip_serializing_if = "String::is_empty")]
    doc: String,
}

#[derive(Debug, Serialize)]
struct StructEntry {
    #[serde(flatten)]
    descriptor: StructDescriptor,
    format: String,
    layout: LayoutPlan,
    slots: Vec<Slot>,
}

#[derive(Debug, Default, Serialize)]
struct Manifest {
    comments: Vec<String>,
    constants: IndexMap<String, ConstantEntry>,
    macros: IndexMap<String, MacroEntry>,
    aliases: IndexMap<String, AliasEntry>,
    structs: Vec<StructEntry>,
}

pub struct ManifestWriter<'a> {
    out: Box<dyn Write + 'a>,
    manifest: Manifest,
}

impl<'a> ManifestWriter<'a> {
    pub fn new(out: Box<dyn Write + 'a>) -> Self {
        Self {
            out,
            manifest: Manifest::default(),
        }
    }
}

fn json_value(value: &Constant) -> serde_json::Value {
    match value {
        Constant::Int(v) => serde_json::Value::from(*v),
        // NaN and the infinities have no JSON spelling.
        Constant::Float(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Constant::Str(s) => serde_json::Value::String(s.clone()),
        Constant::Empty | Constant::Macro { .. } | Constant::StructTag => serde_json::Value::Null,
    }
}

impl Backend for ManifestWriter<'_> {
    fn comment(&mut self, text: &str) -> io::Result<()> {
        self.manifest.comments.push(text.to_string());
        Ok(())
    }

    fn constant(&mut self, name: &str, value: &Constant, doc: &str) -> io::Result<()> {
        self.manifest.constants.insert(
            name.to_string(),
            ConstantEntry {
                value: json_value(value),
                doc: doc.to_string(),
            },
        );
        Ok(())
    }

    fn macro_def(&mut self, name: &str, param: &str, body: &Expr, doc: &str) -> io::Result<()> {
        self.manifest.macros.insert(
            name.to_string(),
            MacroEntry {
                param: param.to_string(),
                body: body.to_string(),
                doc: doc.to_string(),
            },
        );
        Ok(())
    }

    fn alias(&mut self, alias: &str, target: &TypeEntry, doc: &str) -> io::Result<()> {
        self.manifest.aliases.insert(
            alias.to_string(),
            AliasEntry {
                target: target.clone(),
                doc: doc.to_string(),
            },
        );
        Ok(())
    }

    fn emit(
        &mut self,
        descriptor: &StructDescriptor,
        layout: &LayoutPlan,
        types: &TypeRegistry,
    ) -> io::Result<()> {
        let compiled = CompiledStruct {
            descriptor: descriptor.clone(),
            layout: layout.clone(),
        };
        let slots = slot_table(&compiled, types);
        self.manifest.structs.push(StructEntry {
            descriptor: compiled.descriptor,
            format: layout.format_string(),
            layout: compiled.layout,
            slots,
        });
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, &self.manifest).map_err(io::Error::other)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}
