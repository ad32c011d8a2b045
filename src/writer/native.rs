//! Structs with a fixed byte order and constant field offsets.
//!
//! Every primitive leaf lives at an offset known when the code is generated,
//! so a field can be read or written without touching the others. The byte
//! image is the same one the composable flavor produces for the same layout
//! and byte order.

use std::collections::HashMap;
use std::io::{self, Write};

use serde::Serialize;

use crate::model::{CompiledStruct, FormatUnit, LayoutPlan, MemberKind, StructDescriptor};
use crate::processor::types::TypeRegistry;
use crate::runtime::codec::*;
use crate::runtime::record::{Scalar, element_paths};
use crate::runtime::{Endianness, Record, RecordError, Value, field_path};
use crate::writer::{
    FieldView, Flavor, field_views, index_exprs, rust_ident, write_allow, write_loops,
    write_struct_decl, write_update_impl,
};

pub struct Native;

/// One primitive leaf of a flattened struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub path: String,
    pub offset: usize,
    pub unit: FormatUnit,
    pub endianness: Endianness,
}

/// Every leaf of `compiled`, nested structs expanded, by ascending offset.
pub fn slot_table(compiled: &CompiledStruct, types: &TypeRegistry) -> Vec<Slot> {
    let mut slots = Vec::new();
    collect_slots(&compiled.layout, types, "", 0, &mut slots);
    slots
}

fn collect_slots(layout: &LayoutPlan, types: &TypeRegistry, prefix: &str, base: usize, out: &mut Vec<Slot>) {
    for member in &layout.members {
        let path = field_path(prefix, &member.name);
        let elem = member.kind.element_size();
        for (i, leaf) in element_paths(&path, member.kind.shape()).into_iter().enumerate() {
            let at = base + member.offset + i * elem;
            match &member.kind {
                MemberKind::Primitive {
                    primitive,
                    text_len,
                    ..
                } => out.push(Slot {
                    path: leaf,
                    offset: at,
                    unit: text_len.map_or(FormatUnit::Scalar(*primitive), FormatUnit::Text),
                    endianness: layout.endianness,
                }),
                MemberKind::Nested { type_name, .. } => {
                    if let Some(inner) = types.get_struct(type_name) {
                        collect_slots(&inner.layout, types, &leaf, at, out);
                    }
                }
            }
        }
    }
}

/// Writes `record` slot by slot at fixed offsets.
pub fn pack_image(record: &Record, types: &TypeRegistry) -> Result<Vec<u8>, RecordError> {
    let compiled = types
        .get_struct(record.type_name())
        .ok_or_else(|| RecordError::UnknownType(record.type_name().to_string()))?;
    let leaves: HashMap<String, &Value> = record.leaves().into_iter().collect();

    let mut image = vec![0u8; compiled.layout.packed_size];
    for slot in slot_table(compiled, types) {
        let value = leaves
            .get(&slot.path)
            .ok_or_else(|| RecordError::ShapeMismatch {
                path: slot.path.clone(),
            })?;
        let bytes = encode_slot(&slot, value)?;
        image[slot.offset..slot.offset + bytes.len()].copy_from_slice(&bytes);
    }
    Ok(image)
}

fn encode_slot(slot: &Slot, value: &Value) -> Result<Vec<u8>, RecordError> {
    let e = slot.endianness;
    let bytes = match (slot.unit, value) {
        (FormatUnit::Text(len), Value::Text(text)) => {
            let mut bytes = text.clone();
            bytes.resize(len, 0);
            bytes
        }
        (FormatUnit::Scalar(primitive), value) => match Scalar::narrow(primitive, value, &slot.path)? {
            Scalar::Bool(v) => encode_bool(v, e).to_vec(),
            Scalar::I8(v) => encode_i8(v, e).to_vec(),
            Scalar::U8(v) => encode_u8(v, e).to_vec(),
            Scalar::I16(v) => encode_i16(v, e).to_vec(),
            Scalar::U16(v) => encode_u16(v, e).to_vec(),
            Scalar::I32(v) => encode_i32(v, e).to_vec(),
            Scalar::U32(v) => encode_u32(v, e).to_vec(),
            Scalar::I64(v) => encode_i64(v, e).to_vec(),
            Scalar::U64(v) => encode_u64(v, e).to_vec(),
            Scalar::F32(v) => encode_f32(v, e).to_vec(),
            Scalar::F64(v) => encode_f64(v, e).to_vec(),
        },
        _ => {
            return Err(RecordError::ShapeMismatch {
                path: slot.path.clone(),
            });
        }
    };
    Ok(bytes)
}

// ---------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------

/// `let at = ...;` for the element addressed by the loop indices.
fn slot_start(field: &FieldView<'_>, flat: &str) -> String {
    let offset = field.offset_const();
    if field.member.kind.shape().is_empty() {
        format!("let at = Self::{offset};")
    } else {
        format!(
            "let at = Self::{offset} + {flat} * {};",
            field.member.kind.element_size()
        )
    }
}

fn write_lines(field: &FieldView<'_>, suffix: &str, flat: &str) -> Vec<String> {
    let place = format!("self.{}{suffix}", field.ident);
    let store = match &field.member.kind {
        MemberKind::Primitive {
            text_len: Some(len), ..
        } => format!("buf[at..at + {len}].copy_from_slice(&{place});"),
        MemberKind::Primitive { primitive, .. } => format!(
            "buf[at..at + {}].copy_from_slice(&encode_{}({place}, Self::ENDIANNESS));",
            primitive.size(),
            primitive.rust_type()
        ),
        MemberKind::Nested { type_name, .. } => format!(
            "{place}.write_into(&mut buf[at..at + {}::PACKED_SIZE]);",
            rust_ident(type_name)
        ),
    };
    vec![slot_start(field, flat), store]
}

fn read_lines(field: &FieldView<'_>, suffix: &str, flat: &str) -> Vec<String> {
    let place = format!("self.{}{suffix}", field.ident);
    let load = match &field.member.kind {
        MemberKind::Primitive { text_len: Some(_), .. } => format!("{place} = read_array(buf, at);"),
        MemberKind::Primitive { primitive, .. } => format!(
            "{place} = decode_{}(read_array(buf, at), Self::ENDIANNESS);",
            primitive.rust_type()
        ),
        MemberKind::Nested { type_name, .. } => format!(
            "{place}.read_from(&buf[at..at + {}::PACKED_SIZE]);",
            rust_ident(type_name)
        ),
    };
    vec![slot_start(field, flat), load]
}

impl Flavor for Native {
    fn emit_struct(
        &self,
        out: &mut dyn Write,
        descriptor: &StructDescriptor,
        layout: &LayoutPlan,
        types: &TypeRegistry,
    ) -> io::Result<()> {
        let name = rust_ident(&descriptor.name);
        let fields = field_views(descriptor, layout);
        write_struct_decl(out, descriptor, &fields, None)?;

        write_allow(out)?;
        writeln!(out, "impl {name} {{")?;
        writeln!(out, "    pub const ENDIANNESS: Endianness = {};", layout.endianness.rust_path())?;
        writeln!(out, "    pub const PACKED_SIZE: usize = {};", layout.packed_size)?;
        writeln!(out, "    pub const FORMAT: &'static str = {:?};", layout.format_string())?;
        for field in &fields {
            writeln!(out, "    pub const {}: usize = {};", field.offset_const(), field.member.offset)?;
        }

        let compiled = CompiledStruct {
            descriptor: descriptor.clone(),
            layout: layout.clone(),
        };
        writeln!(out, "\n    /// Every leaf as `(path, offset, format)`.")?;
        writeln!(out, "    pub const LAYOUT: &'static [(&'static str, usize, &'static str)] = &[")?;
        for slot in slot_table(&compiled, types) {
            writeln!(out, "        ({:?}, {}, {:?}),", slot.path, slot.offset, slot.unit.to_string())?;
        }
        writeln!(out, "    ];\n")?;

        writeln!(out, "    /// Writes every field at its offset. `buf` holds `PACKED_SIZE` bytes.")?;
        writeln!(out, "    pub fn write_into(&self, buf: &mut [u8]) {{")?;
        for field in &fields {
            let shape = field.member.kind.shape();
            let (suffix, flat) = index_exprs(shape);
            write_loops(out, 8, shape, &write_lines(field, &suffix, &flat))?;
        }
        writeln!(out, "    }}\n")?;

        writeln!(out, "    pub fn read_from(&mut self, buf: &[u8]) {{")?;
        for field in &fields {
            let shape = field.member.kind.shape();
            let (suffix, flat) = index_exprs(shape);
            write_loops(out, 8, shape, &read_lines(field, &suffix, &flat))?;
        }
        writeln!(out, "    }}")?;
        writeln!(out, "}}\n")?;

        write_allow(out)?;
        writeln!(out, "impl PackedStruct for {name} {{")?;
        writeln!(out, "    fn packed_size(&self) -> usize {{")?;
        writeln!(out, "        Self::PACKED_SIZE")?;
        writeln!(out, "    }}\n")?;
        writeln!(out, "    fn serialize(&self) -> Vec<u8> {{")?;
        writeln!(out, "        let mut buf = vec![0u8; Self::PACKED_SIZE];")?;
        writeln!(out, "        self.write_into(&mut buf);")?;
        writeln!(out, "        buf")?;
        writeln!(out, "    }}\n")?;
        writeln!(
            out,
            "    fn deserialize_from(&mut self, buf: &[u8], offset: usize) -> Result<(), CodecError> {{"
        )?;
        writeln!(out, "        check_len(buf, offset, Self::PACKED_SIZE)?;")?;
        writeln!(out, "        self.read_from(&buf[offset..offset + Self::PACKED_SIZE]);")?;
        writeln!(out, "        Ok(())")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}\n")?;

        write_update_impl(out, descriptor, &fields)
    }
}
